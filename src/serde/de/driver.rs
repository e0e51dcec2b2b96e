use core::marker::PhantomData;

use serde_core::Deserializer;
use serde_core::de::{Deserialize, DeserializeSeed, Error};

use super::SkipObserver;
use crate::node::Node;
use crate::registry::TagRegistry;
use crate::{DynCodable, DynSlot, DynValue};

// -----------------------------------------------------------------------------
// SlotDeserializeDriver

/// Deserializer for one polymorphic slot against an explicit registry.
///
/// The slot shape is chosen through the type parameter: `Box<dyn DynCodable>`
/// for a required single value, `Option<…>` for an optional one,
/// `Vec<…>` / `HashMap<String, …>` for sequences and mappings, and
/// [`DynValue`] for the fully-erased probing fallback. Prefer the shaped
/// parameters wherever the call site knows the shape statically.
///
/// The driver buffers the current document position into a [`Node`], reads
/// the type tag, resolves it in the [`TagRegistry`] and replays the node into
/// the resolved constructor. Errors of the underlying format propagate
/// unchanged; resolution and cast failures surface as [`CodecError`] values
/// rendered through the format's error type.
///
/// This is the registry-injected counterpart of the [`Dyn`](crate::Dyn) field
/// wrapper, which routes through the process-wide
/// [`default_registry`](crate::registry::default_registry).
///
/// # Examples
///
/// ```
/// use dyn_codable::DynCodable;
/// use dyn_codable::serde::SlotDeserializeDriver;
/// use serde_core::de::DeserializeSeed;
/// # use dyn_codable::registry::TagRegistry;
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// # struct HomeScreen {
/// #     #[serde(rename = "type")]
/// #     tag: String,
/// # }
/// # impl DynCodable for HomeScreen {
/// #     fn type_tag(&self) -> &str {
/// #         &self.tag
/// #     }
/// #     fn dyn_eq(&self, other: &dyn DynCodable) -> bool {
/// #         other.downcast_ref::<Self>().is_some_and(|other| self == other)
/// #     }
/// # }
///
/// let mut registry = TagRegistry::new();
/// registry.register::<HomeScreen>("homescreen");
///
/// let mut data = serde_json::Deserializer::from_str(
///     r#"[{"type":"homescreen"},{"type":"homescreen"}]"#,
/// );
///
/// let decoded: Vec<Box<dyn DynCodable>> = SlotDeserializeDriver::new(&registry)
///     .deserialize(&mut data)
///     .unwrap();
///
/// assert_eq!(decoded.len(), 2);
/// assert_eq!(decoded[0].type_tag(), "homescreen");
/// ```
///
/// [`CodecError`]: crate::CodecError
pub struct SlotDeserializeDriver<'a, T: DynSlot, O: SkipObserver = ()> {
    registry: &'a TagRegistry,
    observer: O,
    marker: PhantomData<fn() -> T>,
}

impl<'a, T: DynSlot> SlotDeserializeDriver<'a, T, ()> {
    /// Creates a driver with the default observer, which logs skipped
    /// entries.
    ///
    /// If skipped entries need to be captured, use
    /// [`with_observer`](Self::with_observer).
    #[inline]
    pub fn new(registry: &'a TagRegistry) -> Self {
        Self {
            registry,
            observer: (),
            marker: PhantomData,
        }
    }
}

impl<'a, T: DynSlot, O: SkipObserver> SlotDeserializeDriver<'a, T, O> {
    /// Creates a driver reporting skipped entries to `observer`.
    #[inline]
    pub fn with_observer(registry: &'a TagRegistry, observer: O) -> Self {
        Self {
            registry,
            observer,
            marker: PhantomData,
        }
    }
}

impl<'de, T: DynSlot, O: SkipObserver> DeserializeSeed<'de> for SlotDeserializeDriver<'_, T, O> {
    type Value = T;

    fn deserialize<D: Deserializer<'de>>(mut self, deserializer: D) -> Result<T, D::Error> {
        let node = Node::deserialize(deserializer)?;
        T::decode_with(node, self.registry, &mut self.observer).map_err(Error::custom)
    }
}

/// [`SlotDeserializeDriver`] for a required single value.
pub type DynDeserializeDriver<'a, O = ()> = SlotDeserializeDriver<'a, Box<dyn DynCodable>, O>;

/// [`SlotDeserializeDriver`] for the fully-erased probing fallback.
pub type ValueDeserializeDriver<'a, O = ()> = SlotDeserializeDriver<'a, DynValue, O>;

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_core::de::DeserializeSeed;

    use super::{DynDeserializeDriver, SlotDeserializeDriver};
    use crate::serde::SkipFn;
    use crate::testing::{DetailScreen, HomeScreen, registry};
    use crate::DynCodable;

    #[test]
    fn drives_every_slot_shape() {
        let registry = registry();

        let mut data = serde_json::Deserializer::from_str(r#"{"type":"homescreen"}"#);
        let single = DynDeserializeDriver::new(&registry)
            .deserialize(&mut data)
            .unwrap();
        assert!(single.is::<HomeScreen>());

        let mut data = serde_json::Deserializer::from_str("null");
        let optional: Option<Box<dyn DynCodable>> = SlotDeserializeDriver::new(&registry)
            .deserialize(&mut data)
            .unwrap();
        assert_eq!(optional, None);

        let mut data = serde_json::Deserializer::from_str(
            r#"[{"type":"detailscreen","id":"1"},{"type":"homescreen"}]"#,
        );
        let seq: Vec<Box<dyn DynCodable>> = SlotDeserializeDriver::new(&registry)
            .deserialize(&mut data)
            .unwrap();
        assert_eq!(seq.len(), 2);

        let mut data = serde_json::Deserializer::from_str(r#"{"a":{"type":"homescreen"}}"#);
        let map: HashMap<String, Box<dyn DynCodable>> = SlotDeserializeDriver::new(&registry)
            .deserialize(&mut data)
            .unwrap();
        assert!(map["a"].is::<HomeScreen>());
    }

    #[test]
    fn custom_observer_sees_skipped_tags() {
        let registry = registry();
        let mut skipped = Vec::new();

        let mut data = serde_json::Deserializer::from_str(
            r#"[{"type":"detailscreen","id":"1"},{"type":"wizard"},{"type":"homescreen"}]"#,
        );
        let seq: Vec<Box<dyn DynCodable>> =
            SlotDeserializeDriver::with_observer(
                &registry,
                SkipFn(|tag: &str| skipped.push(tag.to_owned())),
            )
            .deserialize(&mut data)
            .unwrap();

        assert_eq!(skipped, ["wizard"]);
        assert_eq!(
            seq[0].downcast_ref::<DetailScreen>(),
            Some(&DetailScreen::new("1"))
        );
    }

    #[test]
    fn malformed_input_surfaces_the_format_error() {
        let registry = registry();
        let mut data = serde_json::Deserializer::from_str(r#"{"type":"#);
        assert!(DynDeserializeDriver::new(&registry)
            .deserialize(&mut data)
            .is_err());
    }
}
