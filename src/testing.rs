//! Shared fixtures for the crate's unit tests.

use serde::{Deserialize, Serialize};
use serde_core::de::DeserializeSeed;

use crate::registry::TagRegistry;
use crate::serde::DynDeserializeDriver;
use crate::DynCodable;

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub(crate) struct DetailScreen {
    #[serde(rename = "type")]
    pub(crate) tag: String,
    pub(crate) id: String,
}

impl DetailScreen {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            tag: "detailscreen".to_owned(),
            id: id.to_owned(),
        }
    }
}

impl DynCodable for DetailScreen {
    fn type_tag(&self) -> &str {
        &self.tag
    }

    fn dyn_eq(&self, other: &dyn DynCodable) -> bool {
        other.downcast_ref::<Self>().is_some_and(|other| self == other)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub(crate) struct HomeScreen {
    #[serde(rename = "type")]
    pub(crate) tag: String,
}

impl HomeScreen {
    pub(crate) fn new() -> Self {
        Self {
            tag: "homescreen".to_owned(),
        }
    }
}

impl DynCodable for HomeScreen {
    fn type_tag(&self) -> &str {
        &self.tag
    }

    fn dyn_eq(&self, other: &dyn DynCodable) -> bool {
        other.downcast_ref::<Self>().is_some_and(|other| self == other)
    }
}

/// A registry with both fixture screens under their conventional tags.
pub(crate) fn registry() -> TagRegistry {
    let mut registry = TagRegistry::new();
    registry.register::<DetailScreen>("detailscreen");
    registry.register::<HomeScreen>("homescreen");
    registry
}

/// Decodes one tagged JSON value against `registry`.
pub(crate) fn decode_str(
    input: &str,
    registry: &TagRegistry,
) -> Result<Box<dyn DynCodable>, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_str(input);
    DynDeserializeDriver::new(registry).deserialize(&mut deserializer)
}
