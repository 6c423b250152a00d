use serde::{de, ser};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Names a resource the backend knows how to load, for example `res://levels/intro.scene`.
/// The loader never interprets it, it is only handed back to the backend.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ResourceId(Arc<str>);

impl ResourceId {
    pub fn new(id: &str) -> Self {
        ResourceId(Arc::from(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        ResourceId::new(id)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        ResourceId(Arc::from(id))
    }
}

impl From<&String> for ResourceId {
    fn from(id: &String) -> Self {
        ResourceId::new(id)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ResourceId {
    fn eq(
        &self,
        other: &str,
    ) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for ResourceId {
    fn eq(
        &self,
        other: &&str,
    ) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_tuple("ResourceId").field(&&*self.0).finish()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: ser::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct ResourceIdVisitor;

impl<'a> de::Visitor<'a> for ResourceIdVisitor {
    type Value = ResourceId;

    fn expecting(
        &self,
        fmt: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(fmt, "a resource identifier string")
    }

    fn visit_str<E: de::Error>(
        self,
        s: &str,
    ) -> Result<Self::Value, E> {
        Ok(ResourceId::new(s))
    }

    fn visit_string<E: de::Error>(
        self,
        s: String,
    ) -> Result<Self::Value, E> {
        Ok(ResourceId::from(s))
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_string(ResourceIdVisitor)
    }
}
