use std::collections::HashMap;

use serde_core::{Serialize, Serializer};

use crate::serde::{DynSerializeDriver, MapSerializeDriver, SeqSerializeDriver};
use crate::DynCodable;

// -----------------------------------------------------------------------------
// DynValue

/// A decoded value whose slot shape was only known at runtime.
///
/// Produced by [`ValueDeserializeDriver`](crate::serde::ValueDeserializeDriver)
/// and by `Dyn<DynValue>` fields, which probe the document instead of
/// requiring the caller to commit to a shape up front. Null input becomes
/// [`DynValue::Null`], a sequence becomes [`DynValue::Seq`], a keyed
/// collection carrying the tag key becomes [`DynValue::Value`], and one
/// without it becomes [`DynValue::Map`].
#[derive(Debug, PartialEq)]
pub enum DynValue {
    /// The document position held no value.
    Null,
    /// A single tagged value.
    Value(Box<dyn DynCodable>),
    /// An ordered sequence of tagged values.
    Seq(Vec<Box<dyn DynCodable>>),
    /// A string-keyed mapping of tagged values.
    Map(HashMap<String, Box<dyn DynCodable>>),
}

impl DynValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the single value, if this is [`DynValue::Value`].
    #[inline]
    pub fn as_value(&self) -> Option<&dyn DynCodable> {
        match self {
            Self::Value(value) => Some(value.as_ref()),
            _ => None,
        }
    }

    /// Returns the sequence, if this is [`DynValue::Seq`].
    #[inline]
    pub fn as_seq(&self) -> Option<&[Box<dyn DynCodable>]> {
        match self {
            Self::Seq(elements) => Some(elements),
            _ => None,
        }
    }

    /// Returns the mapping, if this is [`DynValue::Map`].
    #[inline]
    pub fn as_map(&self) -> Option<&HashMap<String, Box<dyn DynCodable>>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl Serialize for DynValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Value(value) => DynSerializeDriver::new(value.as_ref()).serialize(serializer),
            Self::Seq(elements) => SeqSerializeDriver::new(elements).serialize(serializer),
            Self::Map(entries) => MapSerializeDriver::new(entries).serialize(serializer),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::DynValue;
    use crate::testing::{DetailScreen, HomeScreen};
    use crate::DynCodable;

    #[test]
    fn accessors_match_the_held_shape() {
        let value = DynValue::Value(Box::new(DetailScreen::new("7")));
        assert!(!value.is_null());
        assert_eq!(value.as_value().unwrap().type_tag(), "detailscreen");
        assert!(value.as_seq().is_none());
        assert!(value.as_map().is_none());

        assert!(DynValue::Null.is_null());
    }

    #[test]
    fn serializes_each_shape_through_its_driver() {
        assert_eq!(serde_json::to_string(&DynValue::Null).unwrap(), "null");

        let single = DynValue::Value(Box::new(HomeScreen::new()));
        assert_eq!(
            serde_json::to_string(&single).unwrap(),
            r#"{"type":"homescreen"}"#
        );

        let seq = DynValue::Seq(vec![Box::new(DetailScreen::new("a")) as Box<dyn DynCodable>]);
        assert_eq!(
            serde_json::to_string(&seq).unwrap(),
            r#"[{"type":"detailscreen","id":"a"}]"#
        );

        let mut entries: HashMap<String, Box<dyn DynCodable>> = HashMap::new();
        entries.insert("home".to_owned(), Box::new(HomeScreen::new()));
        assert_eq!(
            serde_json::to_string(&DynValue::Map(entries)).unwrap(),
            r#"{"home":{"type":"homescreen"}}"#
        );
    }

    #[test]
    fn equality_compares_through_the_erased_values() {
        let left = DynValue::Value(Box::new(DetailScreen::new("1")));
        let right = DynValue::Value(Box::new(DetailScreen::new("1")));
        let other = DynValue::Value(Box::new(DetailScreen::new("2")));

        assert_eq!(left, right);
        assert_ne!(left, other);
        assert_ne!(left, DynValue::Null);
    }
}
