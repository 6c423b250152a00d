use downcast_rs::Downcast;

// Any value a backend hands back from a completed load. Supports checked downcasting so that
// loaders can return the value as the type the caller expects
pub trait Resource: Downcast + Send {
    fn type_name(&self) -> &'static str;
}

downcast_rs::impl_downcast!(Resource);

impl<T: Send + 'static> Resource for T {
    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}

// Returns the resource as a T. A resource of some other type is a bug in the caller, so we
// report it instead of pretending the load produced nothing.
pub(crate) fn downcast_resource<T: Resource>(
    resource: &dyn Resource,
) -> crate::LoadResult<&T> {
    resource
        .downcast_ref::<T>()
        .ok_or_else(|| crate::LoadError::ResourceTypeMismatch {
            expected: core::any::type_name::<T>(),
            actual: resource.type_name(),
        })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn downcasts_to_the_stored_type() {
        let resource: Box<dyn Resource> = Box::new(String::from("scene"));
        assert_eq!(
            downcast_resource::<String>(&*resource).unwrap().as_str(),
            "scene"
        );
    }

    #[test]
    fn reports_the_actual_type_on_mismatch() {
        let resource: Box<dyn Resource> = Box::new(7u32);
        match downcast_resource::<String>(&*resource) {
            Err(crate::LoadError::ResourceTypeMismatch { actual, .. }) => {
                assert_eq!(actual, "u32")
            }
            _ => panic!("expected a type mismatch"),
        }
    }
}
