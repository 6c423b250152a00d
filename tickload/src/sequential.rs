use crate::{
    LoadEvents, LoadItem, LoadOrchestrator, LoadResult, LoadStatus, LoadStrategy, Resource,
    ResourceBackend, ResourceId,
};
use std::sync::Arc;

// The item currently being loaded, by index into SequentialLoad::items
#[derive(Debug, Copy, Clone)]
struct InFlight {
    index: usize,
    // request_load returned an error, so there is nothing to poll
    request_failed: bool,
}

/// Strategy that loads a list of resources one at a time, in order.
///
/// The next item is always found by scanning for the first unfinished one, so items that were
/// passed in already finished are skipped and an interrupted list can be resumed by building a
/// new loader from the old items.
pub struct SequentialLoad {
    items: Vec<LoadItem>,
    current: Option<InFlight>,
}

impl SequentialLoad {
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ResourceId>,
    {
        Self::from_items(ids.into_iter().map(LoadItem::new))
    }

    pub fn from_items(items: impl IntoIterator<Item = LoadItem>) -> Self {
        SequentialLoad {
            items: items.into_iter().collect(),
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[LoadItem] {
        &self.items
    }

    /// Panics if `index` is out of range
    pub fn load_item(
        &self,
        index: usize,
    ) -> &LoadItem {
        &self.items[index]
    }

    pub fn find_load_item(
        &self,
        id: &str,
    ) -> Option<&LoadItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get<T: Resource>(
        &self,
        index: usize,
    ) -> Option<&T> {
        self.load_item(index).get::<T>()
    }

    pub fn get_by_id<T: Resource>(
        &self,
        id: &str,
    ) -> Option<&T> {
        self.find_load_item(id).and_then(|item| item.get::<T>())
    }

    pub fn finished_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_finished()).count()
    }

    /// The item whose load is in flight, if any
    pub fn current_item(&self) -> Option<&LoadItem> {
        self.current.map(|current| &self.items[current.index])
    }

    fn load_next_available(
        &mut self,
        backend: &dyn ResourceBackend,
    ) -> LoadResult<()> {
        let next_index = match self.items.iter().position(|item| !item.is_finished()) {
            Some(next_index) => next_index,
            None => {
                self.current = None;
                return Ok(());
            }
        };

        let id = self.items[next_index].id();
        log::debug!("request load {} ({}/{})", id, next_index + 1, self.items.len());
        let result = backend.request_load(id);
        if let Err(e) = &result {
            // Nothing to poll, the next step finishes the item without a resource
            log::warn!("request for {} failed: {}", id, e);
        }

        self.current = Some(InFlight {
            index: next_index,
            request_failed: result.is_err(),
        });
        result
    }

    fn finish_current(
        &mut self,
        backend: &dyn ResourceBackend,
        current: InFlight,
        status: LoadStatus,
        events: &mut LoadEvents,
    ) {
        let item = &mut self.items[current.index];
        let resource = if current.request_failed {
            None
        } else {
            backend.retrieve(item.id())
        };

        if resource.is_none() {
            log::warn!("load of {} finished without a resource ({:?})", item.id(), status);
        } else {
            log::debug!("load of {} finished", item.id());
        }

        item.finish(resource);
        events.item_complete(current.index, &self.items[current.index]);
    }

    // Fraction of the in-flight item, weighted the same as a finished item
    fn current_progress(
        &self,
        backend: &dyn ResourceBackend,
    ) -> f32 {
        let current = match self.current {
            Some(current) => current,
            None => return 0.0,
        };

        let item = &self.items[current.index];
        if item.is_finished() {
            // Already counted as finished
            return 0.0;
        }

        if current.request_failed {
            return 1.0;
        }

        let poll = backend.poll_status(item.id());
        match poll.status {
            LoadStatus::Pending => poll.clamped_progress(),
            // Terminal but not recorded yet, the next step will count it as finished
            LoadStatus::Ready | LoadStatus::Failed | LoadStatus::InvalidTarget => 1.0,
        }
    }
}

impl LoadStrategy for SequentialLoad {
    fn start(
        &mut self,
        backend: &dyn ResourceBackend,
    ) -> LoadResult<()> {
        if let Some(current) = self.current_item() {
            if !current.is_finished() {
                log::debug!("load of {} is already in flight", current.id());
                return Ok(());
            }
        }

        self.load_next_available(backend)
    }

    #[profiling::function]
    fn step(
        &mut self,
        backend: &dyn ResourceBackend,
        events: &mut LoadEvents,
    ) {
        let current = match self.current {
            Some(current) => current,
            None => return,
        };

        if self.items[current.index].is_finished() {
            return;
        }

        let status = if current.request_failed {
            LoadStatus::Failed
        } else {
            let poll = backend.poll_status(self.items[current.index].id());
            log::trace!("poll {} {:?}", self.items[current.index].id(), poll);
            poll.status
        };

        match status {
            LoadStatus::Pending => {}
            LoadStatus::Ready | LoadStatus::Failed | LoadStatus::InvalidTarget => {
                self.finish_current(backend, current, status, events);
                // A failed request is recorded on the new in-flight item and handled next step
                let _ = self.load_next_available(backend);
            }
        }
    }

    fn all_finished(&self) -> bool {
        self.items.iter().all(|item| item.is_finished())
    }

    fn total_progress(
        &self,
        backend: &dyn ResourceBackend,
    ) -> f32 {
        if self.items.is_empty() {
            return 1.0;
        }

        let finished = self.finished_count() as f32;
        let progress = (finished + self.current_progress(backend)) / self.items.len() as f32;
        progress.min(1.0)
    }
}

/// Loads a list of resources one after another.
pub type MultiLoader = LoadOrchestrator<SequentialLoad>;

impl LoadOrchestrator<SequentialLoad> {
    pub fn new<I>(
        ids: I,
        backend: Arc<dyn ResourceBackend>,
        min_load_duration: f32,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ResourceId>,
    {
        LoadOrchestrator::with_strategy(SequentialLoad::new(ids), backend, min_load_duration)
    }

    pub fn from_items(
        items: impl IntoIterator<Item = LoadItem>,
        backend: Arc<dyn ResourceBackend>,
        min_load_duration: f32,
    ) -> Self {
        LoadOrchestrator::with_strategy(
            SequentialLoad::from_items(items),
            backend,
            min_load_duration,
        )
    }

    /// Panics if `index` is out of range
    pub fn load_item(
        &self,
        index: usize,
    ) -> &LoadItem {
        self.strategy().load_item(index)
    }

    pub fn find_load_item(
        &self,
        id: &str,
    ) -> Option<&LoadItem> {
        self.strategy().find_load_item(id)
    }

    pub fn get<T: Resource>(
        &self,
        index: usize,
    ) -> Option<&T> {
        self.strategy().get::<T>(index)
    }

    pub fn get_by_id<T: Resource>(
        &self,
        id: &str,
    ) -> Option<&T> {
        self.strategy().get_by_id::<T>(id)
    }

    pub fn len(&self) -> usize {
        self.strategy().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategy().is_empty()
    }

    /// Give the items back, for example to resume loading them with another loader
    pub fn into_items(self) -> Vec<LoadItem> {
        self.into_strategy().items
    }
}
