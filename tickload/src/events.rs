use crate::{LoadItem, ResourceId};
use crossbeam_channel::{Receiver, Sender};

/// Notifications a loader produces while it is advanced. They are queued in the order they
/// happen and can be drained by the driver after each tick.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    // An item reached a terminal status. `loaded` is false if it finished without a resource.
    ItemComplete {
        index: usize,
        id: ResourceId,
        loaded: bool,
    },
    // Every item finished and the minimum load duration elapsed. Sent exactly once.
    LoadComplete { duration: f32 },
    // The typed result of a single-resource loader is available. Sent right after LoadComplete.
    AssetLoadComplete { id: ResourceId, loaded: bool },
}

pub(crate) type LoadCompleteCallback = Box<dyn FnMut()>;
pub(crate) type ItemCompleteCallback = Box<dyn FnMut(&LoadItem)>;

/// Fans events out to the event queue and to any registered callbacks. Strategies receive it
/// in [`LoadStrategy::step`](crate::LoadStrategy::step) to report finished items.
pub struct LoadEvents {
    events_tx: Sender<LoadEvent>,
    events_rx: Receiver<LoadEvent>,
    on_load_complete: Vec<LoadCompleteCallback>,
    on_item_complete: Vec<ItemCompleteCallback>,
}

impl LoadEvents {
    pub(crate) fn new() -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        LoadEvents {
            events_tx,
            events_rx,
            on_load_complete: Vec::default(),
            on_item_complete: Vec::default(),
        }
    }

    pub(crate) fn receiver(&self) -> &Receiver<LoadEvent> {
        &self.events_rx
    }

    pub(crate) fn add_load_complete(
        &mut self,
        callback: LoadCompleteCallback,
    ) {
        self.on_load_complete.push(callback);
    }

    pub(crate) fn add_item_complete(
        &mut self,
        callback: ItemCompleteCallback,
    ) {
        self.on_item_complete.push(callback);
    }

    pub fn send(
        &self,
        event: LoadEvent,
    ) {
        // We hold the receiver ourselves, so the channel can't be disconnected
        let _ = self.events_tx.send(event);
    }

    pub(crate) fn load_complete(
        &mut self,
        duration: f32,
    ) {
        self.send(LoadEvent::LoadComplete { duration });
        for callback in &mut self.on_load_complete {
            callback();
        }
    }

    pub fn item_complete(
        &mut self,
        index: usize,
        item: &LoadItem,
    ) {
        self.send(LoadEvent::ItemComplete {
            index,
            id: item.id().clone(),
            loaded: item.is_loaded(),
        });
        for callback in &mut self.on_item_complete {
            callback(item);
        }
    }
}
