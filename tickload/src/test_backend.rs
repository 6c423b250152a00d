// A backend for tests. Loads are resolved by the test itself (or immediately, if configured),
// and every request/retrieve is recorded in a log that callbacks can append to as well, so
// tests can check the relative order of backend calls and events.

use crate::{LoadError, LoadResult, PollResult, Resource, ResourceBackend, ResourceId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Behavior {
    // Stays pending until the test resolves it
    Manual,
    // Reports ready as soon as it is requested
    ReadyOnRequest,
    // Reports failed as soon as it is requested
    FailOnRequest,
    // Forgets the request, so polling reports an invalid target
    InvalidOnRequest,
    // request_load returns an error
    RejectRequest,
}

struct Entry {
    status: PollResult,
    value: Option<Box<dyn Resource>>,
}

#[derive(Default)]
struct TestBackendInner {
    behaviors: HashMap<ResourceId, Behavior>,
    values: HashMap<ResourceId, Box<dyn Resource>>,
    requested: HashMap<ResourceId, Entry>,
    request_count: usize,
    retrieve_count: usize,
}

pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

pub(crate) struct TestBackend {
    inner: Mutex<TestBackendInner>,
    default_behavior: Behavior,
    log: CallLog,
}

impl TestBackend {
    pub(crate) fn new(default_behavior: Behavior) -> Arc<Self> {
        Arc::new(TestBackend {
            inner: Mutex::new(TestBackendInner::default()),
            default_behavior,
            log: CallLog::default(),
        })
    }

    pub(crate) fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub(crate) fn log_entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn set_behavior(
        &self,
        id: &str,
        behavior: Behavior,
    ) {
        self.inner
            .lock()
            .unwrap()
            .behaviors
            .insert(id.into(), behavior);
    }

    // The value handed out when this id is loaded. Defaults to a String "loaded:<id>"
    pub(crate) fn set_value<T: Resource>(
        &self,
        id: &str,
        value: T,
    ) {
        self.inner
            .lock()
            .unwrap()
            .values
            .insert(id.into(), Box::new(value));
    }

    pub(crate) fn set_progress(
        &self,
        id: &str,
        progress: f32,
    ) {
        self.set_status(id, PollResult::pending(progress));
    }

    pub(crate) fn resolve(
        &self,
        id: &str,
    ) {
        self.set_status(id, PollResult::ready());
    }

    pub(crate) fn fail(
        &self,
        id: &str,
    ) {
        self.set_status(id, PollResult::failed());
    }

    pub(crate) fn invalidate(
        &self,
        id: &str,
    ) {
        self.set_status(id, PollResult::invalid_target());
    }

    pub(crate) fn is_requested(
        &self,
        id: &str,
    ) -> bool {
        self.inner
            .lock()
            .unwrap()
            .requested
            .contains_key(&ResourceId::from(id))
    }

    pub(crate) fn request_count(&self) -> usize {
        self.inner.lock().unwrap().request_count
    }

    pub(crate) fn retrieve_count(&self) -> usize {
        self.inner.lock().unwrap().retrieve_count
    }

    fn set_status(
        &self,
        id: &str,
        status: PollResult,
    ) {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .requested
            .get_mut(&ResourceId::from(id))
            .expect("resolving a resource that was never requested");
        entry.status = status;
    }

    fn push_log(
        &self,
        entry: String,
    ) {
        self.log.lock().unwrap().push(entry);
    }
}

impl ResourceBackend for TestBackend {
    fn request_load(
        &self,
        id: &ResourceId,
    ) -> LoadResult<()> {
        self.push_log(format!("request {}", id));

        let mut inner = self.inner.lock().unwrap();
        inner.request_count += 1;
        let behavior = inner
            .behaviors
            .get(id)
            .copied()
            .unwrap_or(self.default_behavior);

        let status = match behavior {
            Behavior::Manual => PollResult::pending(0.0),
            Behavior::ReadyOnRequest => PollResult::ready(),
            Behavior::FailOnRequest => PollResult::failed(),
            Behavior::InvalidOnRequest => PollResult::invalid_target(),
            Behavior::RejectRequest => {
                return Err(LoadError::from(format!("cannot load {}", id)));
            }
        };

        let value = inner
            .values
            .remove(id)
            .unwrap_or_else(|| Box::new(format!("loaded:{}", id)) as Box<dyn Resource>);
        inner.requested.insert(
            id.clone(),
            Entry {
                status,
                value: Some(value),
            },
        );
        Ok(())
    }

    fn poll_status(
        &self,
        id: &ResourceId,
    ) -> PollResult {
        self.inner
            .lock()
            .unwrap()
            .requested
            .get(id)
            .map(|entry| entry.status)
            .unwrap_or_else(PollResult::invalid_target)
    }

    fn retrieve(
        &self,
        id: &ResourceId,
    ) -> Option<Box<dyn Resource>> {
        self.push_log(format!("retrieve {}", id));

        let mut inner = self.inner.lock().unwrap();
        inner.retrieve_count += 1;
        let entry = inner.requested.get_mut(id)?;
        if entry.status.status == crate::LoadStatus::Ready {
            entry.value.take()
        } else {
            None
        }
    }
}
