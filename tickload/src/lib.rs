//! Frame-driven resource loading.
//!
//! A loader is started once and then advanced every frame with the frame time. It polls a
//! [`ResourceBackend`] for the resources it is responsible for and reports progress, finished
//! items, and overall completion. Overall completion can be held back until a minimum amount of
//! time has passed, which is useful for loading screens that shouldn't flash by.
//!
//! - [`SingleLoader<T>`] loads one resource and returns it as a `T`
//! - [`MultiLoader`] loads a list of resources one after another
//!
//! Both are a [`LoadOrchestrator`] with a different [`LoadStrategy`].

mod backend;
mod error;
mod events;
mod load_item;
mod orchestrator;
mod resource;
mod resource_id;
mod sequential;
mod single;

#[cfg(test)]
mod test_backend;

pub use backend::{LoadStatus, PollResult, ResourceBackend};
pub use error::{LoadError, LoadResult};
pub use events::{LoadEvent, LoadEvents};
pub use load_item::LoadItem;
pub use orchestrator::{LoadOrchestrator, LoadStrategy};
pub use resource::Resource;
pub use resource_id::ResourceId;
pub use sequential::{MultiLoader, SequentialLoad};
pub use single::{SingleLoad, SingleLoader};
