use core::any::Any;
use std::collections::HashMap;

use serde_core::ser::{Error, SerializeMap, SerializeSeq};
use serde_core::{Serialize, Serializer};

use crate::{CodecError, DynCodable, DynValue};

// -----------------------------------------------------------------------------
// DynSerializeDriver

/// Serializer for one type-erased value.
///
/// Delegates to the value's own `Serialize` implementation through the
/// [`erased_serde::Serialize`] supertrait. The tag is part of the variant's
/// own field set and is written by the variant itself; the driver injects
/// nothing.
///
/// # Examples
///
/// ```
/// use dyn_codable::DynCodable;
/// use dyn_codable::serde::DynSerializeDriver;
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
/// let value: Box<dyn DynCodable> = Box::new(HomeScreen {
///     tag: "homescreen".to_owned(),
/// });
///
/// let output = serde_json::to_string(&DynSerializeDriver::new(value.as_ref())).unwrap();
/// assert_eq!(output, r#"{"type":"homescreen"}"#);
/// ```
pub struct DynSerializeDriver<'a> {
    value: &'a dyn DynCodable,
}

impl<'a> DynSerializeDriver<'a> {
    #[inline]
    pub const fn new(value: &'a dyn DynCodable) -> Self {
        Self { value }
    }
}

impl Serialize for DynSerializeDriver<'_> {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        erased_serde::serialize(self.value, serializer)
    }
}

// -----------------------------------------------------------------------------
// OptionalSerializeDriver

/// Serializer for an optional type-erased value.
///
/// "No value" is written as an explicit null; enclosing structs that prefer
/// omission over null skip the field instead of calling the driver.
pub struct OptionalSerializeDriver<'a> {
    value: Option<&'a dyn DynCodable>,
}

impl<'a> OptionalSerializeDriver<'a> {
    #[inline]
    pub const fn new(value: Option<&'a dyn DynCodable>) -> Self {
        Self { value }
    }
}

impl Serialize for OptionalSerializeDriver<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Some(value) => serializer.serialize_some(&DynSerializeDriver::new(value)),
            None => serializer.serialize_none(),
        }
    }
}

// -----------------------------------------------------------------------------
// SeqSerializeDriver

/// Serializer for an ordered sequence of type-erased values.
///
/// Insertion order is preserved exactly.
pub struct SeqSerializeDriver<'a> {
    elements: &'a [Box<dyn DynCodable>],
}

impl<'a> SeqSerializeDriver<'a> {
    #[inline]
    pub const fn new(elements: &'a [Box<dyn DynCodable>]) -> Self {
        Self { elements }
    }
}

impl Serialize for SeqSerializeDriver<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.elements.len()))?;
        for element in self.elements {
            seq.serialize_element(&DynSerializeDriver::new(element.as_ref()))?;
        }
        seq.end()
    }
}

// -----------------------------------------------------------------------------
// MapSerializeDriver

/// Serializer for a string-keyed mapping of type-erased values.
///
/// Keys are the mapping's own, caller-chosen keys; they are independent of
/// the tags stored inside the values.
pub struct MapSerializeDriver<'a> {
    entries: &'a HashMap<String, Box<dyn DynCodable>>,
}

impl<'a> MapSerializeDriver<'a> {
    #[inline]
    pub const fn new(entries: &'a HashMap<String, Box<dyn DynCodable>>) -> Self {
        Self { entries }
    }
}

impl Serialize for MapSerializeDriver<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in self.entries {
            map.serialize_entry(key, &DynSerializeDriver::new(value.as_ref()))?;
        }
        map.end()
    }
}

// -----------------------------------------------------------------------------
// AnySerializeDriver

/// Serializer for a value whose slot shape is only known at runtime.
///
/// Probes the supported shapes in order: single value, optional, sequence,
/// mapping, then [`DynValue`]. A value matching none of them fails with
/// [`CodecError::NotEncodable`] carrying the offered type's name.
pub struct AnySerializeDriver<'a> {
    value: &'a dyn Any,
    type_name: &'static str,
}

impl<'a> AnySerializeDriver<'a> {
    pub fn new<T: Any>(value: &'a T) -> Self {
        Self {
            value,
            type_name: core::any::type_name::<T>(),
        }
    }
}

impl Serialize for AnySerializeDriver<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(value) = self.value.downcast_ref::<Box<dyn DynCodable>>() {
            DynSerializeDriver::new(value.as_ref()).serialize(serializer)
        } else if let Some(value) = self.value.downcast_ref::<Option<Box<dyn DynCodable>>>() {
            OptionalSerializeDriver::new(value.as_deref()).serialize(serializer)
        } else if let Some(elements) = self.value.downcast_ref::<Vec<Box<dyn DynCodable>>>() {
            SeqSerializeDriver::new(elements).serialize(serializer)
        } else if let Some(entries) = self
            .value
            .downcast_ref::<HashMap<String, Box<dyn DynCodable>>>()
        {
            MapSerializeDriver::new(entries).serialize(serializer)
        } else if let Some(value) = self.value.downcast_ref::<DynValue>() {
            value.serialize(serializer)
        } else {
            Err(Error::custom(CodecError::NotEncodable {
                type_name: self.type_name.into(),
            }))
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
