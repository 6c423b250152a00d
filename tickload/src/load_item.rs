use crate::resource::downcast_resource;
use crate::{Resource, ResourceId};

/// One resource a loader is responsible for. It becomes finished exactly once, when the backend
/// reports a terminal status. A failed load is finished but has no resource, so check both.
pub struct LoadItem {
    id: ResourceId,
    finished: bool,
    resource: Option<Box<dyn Resource>>,
}

impl LoadItem {
    pub fn new(id: impl Into<ResourceId>) -> Self {
        LoadItem {
            id: id.into(),
            finished: false,
            resource: None,
        }
    }

    /// An item that is already finished. A sequential loader skips it without making a request.
    pub fn new_finished(id: impl Into<ResourceId>) -> Self {
        LoadItem {
            id: id.into(),
            finished: true,
            resource: None,
        }
    }

    /// An item that was loaded elsewhere, for example by an earlier loader that is being resumed.
    ///
    /// `resource` is boxed here, so pass the value itself. A `Box<dyn Resource>` would be stored
    /// as a resource of type `Box<dyn Resource>`, use [`LoadItem::preloaded_boxed`] for those.
    pub fn preloaded<T: Resource>(
        id: impl Into<ResourceId>,
        resource: T,
    ) -> Self {
        LoadItem {
            id: id.into(),
            finished: true,
            resource: Some(Box::new(resource)),
        }
    }

    /// Like [`LoadItem::preloaded`] for a resource that is already boxed, such as one taken out
    /// of another item with [`LoadItem::into_resource`].
    pub fn preloaded_boxed(
        id: impl Into<ResourceId>,
        resource: Box<dyn Resource>,
    ) -> Self {
        LoadItem {
            id: id.into(),
            finished: true,
            resource: Some(resource),
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Finished and holds a resource
    pub fn is_loaded(&self) -> bool {
        self.finished && self.resource.is_some()
    }

    pub fn resource(&self) -> Option<&dyn Resource> {
        self.resource.as_deref()
    }

    /// The resource as a T, if this item finished with one.
    ///
    /// Panics if the resource is some other type. Use [`LoadItem::try_get`] to get an error
    /// instead.
    pub fn get<T: Resource>(&self) -> Option<&T> {
        match self.try_get::<T>() {
            Ok(resource) => resource,
            Err(e) => panic!("LoadItem {}: {}", self.id, e),
        }
    }

    pub fn try_get<T: Resource>(&self) -> crate::LoadResult<Option<&T>> {
        if !self.finished {
            return Ok(None);
        }

        match self.resource.as_deref() {
            Some(resource) => downcast_resource::<T>(resource).map(Some),
            None => Ok(None),
        }
    }

    pub fn into_resource(self) -> Option<Box<dyn Resource>> {
        self.resource
    }

    pub(crate) fn finish(
        &mut self,
        resource: Option<Box<dyn Resource>>,
    ) {
        debug_assert!(!self.finished);
        self.finished = true;
        self.resource = resource;
    }
}

impl std::fmt::Debug for LoadItem {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LoadItem")
            .field("id", &self.id)
            .field("finished", &self.finished)
            .field("resource", &self.resource.as_deref().map(|r| r.type_name()))
            .finish()
    }
}
