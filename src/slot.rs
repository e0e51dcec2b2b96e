use core::ops::{Deref, DerefMut};
use std::collections::HashMap;

use serde_core::de::{Deserialize, Deserializer, Error as _};
use serde_core::{Serialize, Serializer};

use crate::node::Node;
use crate::registry::{default_registry, TagRegistry};
use crate::serde::{
    decode_map, decode_optional, decode_probe, decode_seq, decode_single, DynSerializeDriver,
    MapSerializeDriver, OptionalSerializeDriver, SeqSerializeDriver, SkipObserver,
};
use crate::{CodecError, DynCodable, DynValue};

// -----------------------------------------------------------------------------
// DynSlot

/// A field shape that can hold registry-resolved polymorphic values.
///
/// Implemented for the four concrete slot shapes plus [`DynValue`]:
///
/// | Type | Document shape |
/// |------|----------------|
/// | `Box<dyn DynCodable>` | one tagged value |
/// | `Option<Box<dyn DynCodable>>` | one tagged value or null |
/// | `Vec<Box<dyn DynCodable>>` | a sequence of tagged values |
/// | `HashMap<String, Box<dyn DynCodable>>` | a keyed collection of tagged values |
/// | [`DynValue`] | probed at runtime |
///
/// Sealed in spirit: downstream code consumes this trait through
/// [`Dyn`] and [`SlotDeserializeDriver`](crate::serde::SlotDeserializeDriver)
/// rather than implementing it.
pub trait DynSlot: Sized {
    /// Decodes a buffered document position against `registry`, reporting
    /// skipped entries to `observer`.
    fn decode_with<O: SkipObserver>(
        node: Node,
        registry: &TagRegistry,
        observer: &mut O,
    ) -> Result<Self, CodecError>;

    /// Decodes a buffered document position against `registry`. Skipped
    /// entries are logged but otherwise silent.
    #[inline]
    fn decode(node: Node, registry: &TagRegistry) -> Result<Self, CodecError> {
        Self::decode_with(node, registry, &mut ())
    }

    /// Writes this slot's contents to `serializer`.
    fn encode<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>;
}

impl DynSlot for Box<dyn DynCodable> {
    fn decode_with<O: SkipObserver>(
        node: Node,
        registry: &TagRegistry,
        _observer: &mut O,
    ) -> Result<Self, CodecError> {
        decode_single(node, registry)
    }

    fn encode<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DynSerializeDriver::new(self.as_ref()).serialize(serializer)
    }
}

impl DynSlot for Option<Box<dyn DynCodable>> {
    fn decode_with<O: SkipObserver>(
        node: Node,
        registry: &TagRegistry,
        _observer: &mut O,
    ) -> Result<Self, CodecError> {
        decode_optional(node, registry)
    }

    fn encode<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OptionalSerializeDriver::new(self.as_deref()).serialize(serializer)
    }
}

impl DynSlot for Vec<Box<dyn DynCodable>> {
    fn decode_with<O: SkipObserver>(
        node: Node,
        registry: &TagRegistry,
        observer: &mut O,
    ) -> Result<Self, CodecError> {
        match node {
            Node::Seq(elements) => decode_seq(elements, registry, observer),
            other => Err(CodecError::invalid_type(
                other.unexpected(),
                &"a sequence of tagged values",
            )),
        }
    }

    fn encode<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SeqSerializeDriver::new(self).serialize(serializer)
    }
}

impl DynSlot for HashMap<String, Box<dyn DynCodable>> {
    fn decode_with<O: SkipObserver>(
        node: Node,
        registry: &TagRegistry,
        observer: &mut O,
    ) -> Result<Self, CodecError> {
        match node {
            Node::Map(entries) => decode_map(entries, registry, observer),
            other => Err(CodecError::invalid_type(
                other.unexpected(),
                &"a keyed collection of tagged values",
            )),
        }
    }

    fn encode<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MapSerializeDriver::new(self).serialize(serializer)
    }
}

impl DynSlot for DynValue {
    fn decode_with<O: SkipObserver>(
        node: Node,
        registry: &TagRegistry,
        observer: &mut O,
    ) -> Result<Self, CodecError> {
        decode_probe(node, registry, observer)
    }

    fn encode<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.serialize(serializer)
    }
}

// -----------------------------------------------------------------------------
// Dyn

/// A struct field holding registry-resolved polymorphic values.
///
/// Wrapping a slot shape in `Dyn` attaches (de)serialization against the
/// process-wide [`default_registry`] to an otherwise ordinary derived
/// struct, so no manual `Deserialize` impl is needed:
///
/// ```
/// use dyn_codable::{Dyn, DynCodable};
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// # struct DetailScreen {
/// #     #[serde(rename = "type")]
/// #     tag: String,
/// #     id: String,
/// # }
/// # impl DynCodable for DetailScreen {
/// #     fn type_tag(&self) -> &str {
/// #         &self.tag
/// #     }
/// #     fn dyn_eq(&self, other: &dyn DynCodable) -> bool {
/// #         other.downcast_ref::<Self>().is_some_and(|other| self == other)
/// #     }
/// # }
///
/// #[derive(Serialize, Deserialize)]
/// struct Menu {
///     title: String,
///     entries: Dyn<Vec<Box<dyn DynCodable>>>,
/// }
///
/// dyn_codable::registry::default_registry()
///     .write()
///     .register::<DetailScreen>("detailscreen");
///
/// let menu: Menu = serde_json::from_str(
///     r#"{"title": "main", "entries": [{"type": "detailscreen", "id": "1"}]}"#,
/// )
/// .unwrap();
/// assert_eq!(menu.entries.len(), 1);
/// ```
///
/// An optional slot decodes explicit null to `None`; pair it with
/// `#[serde(default)]` when an entirely absent key should mean `None` too.
///
/// Each field decode resolves against a snapshot of the registry taken as the
/// decode starts; a registration made while the decode is in flight only
/// affects subsequent decodes.
#[derive(Debug, PartialEq, Default)]
pub struct Dyn<T: DynSlot>(pub T);

impl<T: DynSlot> Dyn<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Self(value)
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DynSlot> Deref for Dyn<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: DynSlot> DerefMut for Dyn<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: DynSlot> From<T> for Dyn<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: DynSlot> Serialize for Dyn<T> {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.encode(serializer)
    }
}

impl<'de, T: DynSlot> Deserialize<'de> for Dyn<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let node = Node::deserialize(deserializer)?;
        // Clone a snapshot instead of decoding under the read lock: a variant
        // with its own `Dyn` fields re-enters the registry mid-constructor,
        // and a nested read behind a waiting writer would deadlock.
        let registry = default_registry().read().clone();
        T::decode(node, &registry)
            .map(Dyn)
            .map_err(D::Error::custom)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use super::{Dyn, DynSlot};
    use crate::node::Node;
    use crate::registry::default_registry;
    use crate::testing::{DetailScreen, HomeScreen, registry};
    use crate::{DynCodable, DynValue};

    fn seed_default_registry() {
        let mut registry = default_registry().write();
        registry.register::<DetailScreen>("detailscreen");
        registry.register::<HomeScreen>("homescreen");
    }

    fn node(input: &str) -> Node {
        serde_json::from_str(input).unwrap()
    }

    #[test]
    fn vec_slot_rejects_non_sequence_input() {
        let registry = registry();
        let err =
            <Vec<Box<dyn DynCodable>>>::decode(node(r#"{"type": "homescreen"}"#), &registry)
                .unwrap_err();
        assert!(err.to_string().contains("sequence of tagged values"));
    }

    #[test]
    fn map_slot_rejects_non_keyed_input() {
        let registry = registry();
        let err = <HashMap<String, Box<dyn DynCodable>>>::decode(node("[]"), &registry)
            .unwrap_err();
        assert!(err.to_string().contains("keyed collection"));
    }

    #[test]
    fn dyn_struct_round_trips_all_shapes() {
        seed_default_registry();

        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Menu {
            title: String,
            body: Dyn<Box<dyn DynCodable>>,
            #[serde(default)]
            overlay: Dyn<Option<Box<dyn DynCodable>>>,
            entries: Dyn<Vec<Box<dyn DynCodable>>>,
            named: Dyn<HashMap<String, Box<dyn DynCodable>>>,
        }

        let input = r#"{
            "title": "main",
            "body": {"type": "detailscreen", "id": "1"},
            "overlay": null,
            "entries": [{"type": "homescreen"}, {"type": "detailscreen", "id": "2"}],
            "named": {"fallback": {"type": "homescreen"}}
        }"#;

        let menu: Menu = serde_json::from_str(input).unwrap();
        assert_eq!(menu.title, "main");
        assert_eq!(menu.body.type_tag(), "detailscreen");
        assert!(menu.overlay.is_none());
        assert_eq!(menu.entries.len(), 2);
        assert_eq!(menu.entries[0].type_tag(), "homescreen");
        assert_eq!(menu.entries[1].type_tag(), "detailscreen");
        assert_eq!(menu.named["fallback"].type_tag(), "homescreen");

        let encoded = serde_json::to_string(&menu).unwrap();
        let reparsed: Menu = serde_json::from_str(&encoded).unwrap();
        assert_eq!(reparsed, menu);
    }

    #[test]
    fn absent_optional_key_needs_serde_default() {
        seed_default_registry();

        #[derive(Deserialize, Debug)]
        struct WithDefault {
            #[serde(default)]
            overlay: Dyn<Option<Box<dyn DynCodable>>>,
        }

        #[derive(Deserialize, Debug)]
        struct WithoutDefault {
            #[allow(dead_code)]
            overlay: Dyn<Option<Box<dyn DynCodable>>>,
        }

        let with: WithDefault = serde_json::from_str("{}").unwrap();
        assert!(with.overlay.is_none());

        let with: WithDefault = serde_json::from_str(r#"{"overlay": null}"#).unwrap();
        assert!(with.overlay.is_none());

        assert!(serde_json::from_str::<WithoutDefault>("{}").is_err());
    }

    #[test]
    fn sequence_order_is_preserved_through_a_round_trip() {
        seed_default_registry();

        let slot: Dyn<Vec<Box<dyn DynCodable>>> = Dyn(vec![
            Box::new(DetailScreen::new("first")),
            Box::new(HomeScreen::new()),
        ]);

        let encoded = serde_json::to_string(&slot).unwrap();
        assert_eq!(
            encoded,
            r#"[{"type":"detailscreen","id":"first"},{"type":"homescreen"}]"#
        );

        let decoded: Dyn<Vec<Box<dyn DynCodable>>> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, slot);
    }

    #[test]
    fn registration_proceeds_while_a_nested_decode_is_in_flight() {
        use core::time::Duration;
        use std::thread;

        seed_default_registry();

        // Stalls its own decode long enough for the writer below to queue up
        // behind the registry lock.
        #[derive(Debug, PartialEq)]
        struct Stall;

        impl Serialize for Stall {
            fn serialize<S: serde_core::Serializer>(
                &self,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                serializer.serialize_bool(true)
            }
        }

        impl<'de> Deserialize<'de> for Stall {
            fn deserialize<D: serde_core::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Self, D::Error> {
                thread::sleep(Duration::from_millis(100));
                bool::deserialize(deserializer)?;
                Ok(Stall)
            }
        }

        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Wizard {
            #[serde(rename = "type")]
            tag: String,
            stall: Stall,
            step: Dyn<Box<dyn DynCodable>>,
        }

        impl DynCodable for Wizard {
            fn type_tag(&self) -> &str {
                &self.tag
            }

            fn dyn_eq(&self, other: &dyn DynCodable) -> bool {
                other.downcast_ref::<Self>().is_some_and(|other| self == other)
            }
        }

        default_registry().write().register::<Wizard>("wizard");

        // Field order matters: `stall` decodes before `step`, so the nested
        // registry access happens after the writer has started waiting.
        // The decoded value is not Send; keep it on the decode thread and
        // hand back only the nested tag.
        let reader = thread::spawn(|| {
            let decoded = serde_json::from_str::<Dyn<Box<dyn DynCodable>>>(
                r#"{"type":"wizard","stall":true,"step":{"type":"homescreen"}}"#,
            )
            .unwrap();
            let wizard = decoded.downcast_ref::<Wizard>().unwrap();
            wizard.step.type_tag().to_owned()
        });

        thread::sleep(Duration::from_millis(25));
        let writer = thread::spawn(|| {
            default_registry()
                .write()
                .register::<DetailScreen>("detailscreen");
        });

        writer.join().unwrap();
        assert_eq!(reader.join().unwrap(), "homescreen");
    }

    #[test]
    fn mapping_keyed_by_own_tags_round_trips() {
        seed_default_registry();

        let values: Vec<Box<dyn DynCodable>> = vec![
            Box::new(DetailScreen::new("x")),
            Box::new(HomeScreen::new()),
        ];
        let slot: Dyn<HashMap<String, Box<dyn DynCodable>>> = Dyn(values
            .into_iter()
            .map(|value| (value.type_tag().to_owned(), value))
            .collect());

        let encoded = serde_json::to_string(&slot).unwrap();
        let decoded: Dyn<HashMap<String, Box<dyn DynCodable>>> =
            serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.len(), 2);
        assert!(decoded["detailscreen"].is::<DetailScreen>());
        assert!(decoded["homescreen"].is::<HomeScreen>());
        assert_eq!(decoded, slot);
    }

    #[test]
    fn probed_slot_picks_the_shape_from_the_document() {
        seed_default_registry();

        let single: Dyn<DynValue> =
            serde_json::from_str(r#"{"type": "homescreen"}"#).unwrap();
        assert_eq!(single.as_value().unwrap().type_tag(), "homescreen");

        let seq: Dyn<DynValue> =
            serde_json::from_str(r#"[{"type": "detailscreen", "id": "9"}]"#).unwrap();
        assert_eq!(seq.as_seq().unwrap().len(), 1);

        let map: Dyn<DynValue> =
            serde_json::from_str(r#"{"home": {"type": "homescreen"}}"#).unwrap();
        assert!(map.as_map().unwrap().contains_key("home"));

        let null: Dyn<DynValue> = serde_json::from_str("null").unwrap();
        assert!(null.is_null());
    }
}
