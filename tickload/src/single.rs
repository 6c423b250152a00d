use crate::{
    LoadError, LoadEvent, LoadEvents, LoadItem, LoadOrchestrator, LoadResult, LoadStatus,
    LoadStrategy, Resource, ResourceBackend, ResourceId,
};
use std::sync::Arc;

type AssetLoadCompleteCallback<T> = Box<dyn FnMut(Option<&T>)>;

/// Strategy that loads exactly one resource and exposes it as a `T`.
pub struct SingleLoad<T: Resource> {
    item: LoadItem,
    started: bool,
    request_failed: bool,
    progress: f32,
    on_asset_load_complete: Vec<AssetLoadCompleteCallback<T>>,
}

impl<T: Resource> SingleLoad<T> {
    pub fn new(id: impl Into<ResourceId>) -> Self {
        SingleLoad {
            item: LoadItem::new(id),
            started: false,
            request_failed: false,
            progress: 0.0,
            on_asset_load_complete: Vec::default(),
        }
    }

    pub fn load_item(&self) -> &LoadItem {
        &self.item
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    fn mark_finished(
        &mut self,
        backend: &dyn ResourceBackend,
        status: LoadStatus,
    ) {
        let resource = if self.request_failed {
            None
        } else {
            backend.retrieve(self.item.id())
        };

        if resource.is_none() {
            log::warn!("load of {} finished without a resource ({:?})", self.item.id(), status);
        } else {
            log::debug!("load of {} finished", self.item.id());
        }

        self.progress = 1.0;
        self.item.finish(resource);
    }
}

impl<T: Resource> LoadStrategy for SingleLoad<T> {
    fn start(
        &mut self,
        backend: &dyn ResourceBackend,
    ) -> LoadResult<()> {
        if self.started {
            log::warn!("load of {} was already started", self.item.id());
            return Err(LoadError::AlreadyStarted);
        }

        self.started = true;
        log::debug!("request load {}", self.item.id());
        backend.request_load(self.item.id()).map_err(|e| {
            // The next advance() finishes the item without a resource
            log::warn!("request for {} failed: {}", self.item.id(), e);
            self.request_failed = true;
            e
        })
    }

    #[profiling::function]
    fn step(
        &mut self,
        backend: &dyn ResourceBackend,
        _events: &mut LoadEvents,
    ) {
        if !self.started || self.item.is_finished() {
            return;
        }

        if self.request_failed {
            self.mark_finished(backend, LoadStatus::Failed);
            return;
        }

        let poll = backend.poll_status(self.item.id());
        log::trace!("poll {} {:?}", self.item.id(), poll);
        match poll.status {
            LoadStatus::Pending => self.progress = poll.clamped_progress(),
            LoadStatus::Ready | LoadStatus::Failed | LoadStatus::InvalidTarget => {
                self.mark_finished(backend, poll.status)
            }
        }
    }

    fn all_finished(&self) -> bool {
        self.item.is_finished()
    }

    fn total_progress(
        &self,
        _backend: &dyn ResourceBackend,
    ) -> f32 {
        if self.item.is_finished() {
            1.0
        } else {
            self.progress
        }
    }

    fn send_complete_events(
        &mut self,
        events: &mut LoadEvents,
    ) {
        // A resource of the wrong type panics here, the caller asked for a type the backend
        // doesn't produce for this id
        let asset = self.item.get::<T>();
        for callback in &mut self.on_asset_load_complete {
            callback(asset);
        }
        events.send(LoadEvent::AssetLoadComplete {
            id: self.item.id().clone(),
            loaded: asset.is_some(),
        });

        events.item_complete(0, &self.item);
    }
}

/// Loads one resource and returns it typed as `T`.
pub type SingleLoader<T> = LoadOrchestrator<SingleLoad<T>>;

impl<T: Resource> LoadOrchestrator<SingleLoad<T>> {
    pub fn new(
        id: impl Into<ResourceId>,
        backend: Arc<dyn ResourceBackend>,
        min_load_duration: f32,
    ) -> Self {
        LoadOrchestrator::with_strategy(SingleLoad::new(id), backend, min_load_duration)
    }

    /// The loaded resource, once the item finished. None before that, or if the load failed.
    ///
    /// This does not wait for the minimum load duration, only for the backend.
    pub fn get(&self) -> Option<&T> {
        self.strategy().load_item().get::<T>()
    }

    /// Like [`get`](Self::get) but returns an error instead of panicking if the resource is not
    /// a `T`
    pub fn try_get(&self) -> LoadResult<Option<&T>> {
        self.strategy().load_item().try_get::<T>()
    }

    pub fn load_item(&self) -> &LoadItem {
        self.strategy().load_item()
    }

    pub fn is_started(&self) -> bool {
        self.strategy().is_started()
    }

    /// Called once on completion with the typed resource (None if the load failed), after the
    /// load complete callbacks and before the item complete callbacks
    pub fn on_asset_load_complete(
        &mut self,
        callback: impl FnMut(Option<&T>) + 'static,
    ) {
        self.strategy_mut()
            .on_asset_load_complete
            .push(Box::new(callback));
    }
}
