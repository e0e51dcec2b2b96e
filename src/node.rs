//! The buffered document node the decode algorithm works on.
//!
//! A polymorphic slot cannot be decoded in one streaming pass: the type tag
//! has to be inspected before the resolved constructor can consume the node's
//! fields. [`Node`] buffers exactly one position of the underlying document
//! (scalar, sequence or keyed container) so the tag can be read first and the
//! whole node replayed into the constructor afterwards.
//!
//! A `Node` is an intermediary owned by a single encode/decode call; it is
//! never retained beyond it.

use core::fmt;

use serde_core::de::{
    self, Deserialize, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer, MapAccess,
    SeqAccess, Unexpected, VariantAccess, Visitor,
};
use serde_core::forward_to_deserialize_any;

use crate::CodecError;

// -----------------------------------------------------------------------------
// Node

/// One buffered position in the underlying structured document.
///
/// Captures the self-describing shape of the input without interpreting it:
/// numbers are widened to 64 bits, keyed containers keep their entry order and
/// their keys stay uninterpreted nodes. `Node` implements both
/// [`Deserialize`] (to capture a position) and [`Deserializer`] (to replay it
/// into a concrete type).
///
/// # Example
///
/// ```
/// use dyn_codable::node::Node;
///
/// let node: Node = serde_json::from_str(r#"{"type":"homescreen"}"#).unwrap();
/// assert_eq!(node.get("type").and_then(Node::as_str), Some("homescreen"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    Seq(Vec<Node>),
    Map(Vec<(Node, Node)>),
}

impl Node {
    /// Looks up the value stored under a string key of a keyed node.
    ///
    /// Returns `None` for non-keyed nodes and missing keys alike.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(entries) => entries.iter().find_map(|(entry_key, value)| {
                matches!(entry_key, Node::String(k) if k == key).then_some(value)
            }),
            _ => None,
        }
    }

    /// Returns the string content of a string node.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` for an explicit null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub(crate) fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Node::Null => Unexpected::Unit,
            Node::Bool(value) => Unexpected::Bool(*value),
            Node::I64(value) => Unexpected::Signed(*value),
            Node::U64(value) => Unexpected::Unsigned(*value),
            Node::F64(value) => Unexpected::Float(*value),
            Node::String(value) => Unexpected::Str(value),
            Node::Seq(_) => Unexpected::Seq,
            Node::Map(_) => Unexpected::Map,
        }
    }
}

// -----------------------------------------------------------------------------
// Capturing a node

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any document node")
    }

    #[inline]
    fn visit_bool<E>(self, value: bool) -> Result<Node, E> {
        Ok(Node::Bool(value))
    }

    #[inline]
    fn visit_i64<E>(self, value: i64) -> Result<Node, E> {
        Ok(Node::I64(value))
    }

    #[inline]
    fn visit_u64<E>(self, value: u64) -> Result<Node, E> {
        Ok(Node::U64(value))
    }

    #[inline]
    fn visit_f64<E>(self, value: f64) -> Result<Node, E> {
        Ok(Node::F64(value))
    }

    #[inline]
    fn visit_str<E>(self, value: &str) -> Result<Node, E> {
        Ok(Node::String(value.to_owned()))
    }

    #[inline]
    fn visit_string<E>(self, value: String) -> Result<Node, E> {
        Ok(Node::String(value))
    }

    #[inline]
    fn visit_unit<E>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    #[inline]
    fn visit_none<E>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Node, D::Error>
    where
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Node, D::Error>
    where
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Node, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut elements = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(element) = seq.next_element()? {
            elements.push(element);
        }
        Ok(Node::Seq(elements))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Node, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(Node::Map(entries))
    }
}

impl<'de> Deserialize<'de> for Node {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

// -----------------------------------------------------------------------------
// Replaying a node

impl<'de> Deserializer<'de> for Node {
    type Error = CodecError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, CodecError>
    where
        V: Visitor<'de>,
    {
        match self {
            Node::Null => visitor.visit_unit(),
            Node::Bool(value) => visitor.visit_bool(value),
            Node::I64(value) => visitor.visit_i64(value),
            Node::U64(value) => visitor.visit_u64(value),
            Node::F64(value) => visitor.visit_f64(value),
            Node::String(value) => visitor.visit_string(value),
            Node::Seq(elements) => {
                let mut access = NodeSeqAccess {
                    iter: elements.into_iter(),
                };
                let value = visitor.visit_seq(&mut access)?;
                if access.iter.len() == 0 {
                    Ok(value)
                } else {
                    Err(de::Error::custom("trailing elements in sequence node"))
                }
            }
            Node::Map(entries) => {
                let mut access = NodeMapAccess {
                    iter: entries.into_iter(),
                    value: None,
                };
                let value = visitor.visit_map(&mut access)?;
                if access.iter.len() == 0 {
                    Ok(value)
                } else {
                    Err(de::Error::custom("trailing entries in keyed node"))
                }
            }
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, CodecError>
    where
        V: Visitor<'de>,
    {
        match self {
            Node::Null => visitor.visit_none(),
            node => visitor.visit_some(node),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CodecError>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError>
    where
        V: Visitor<'de>,
    {
        match self {
            Node::String(variant) => visitor.visit_enum(NodeEnumAccess {
                variant: Node::String(variant),
                value: None,
            }),
            Node::Map(mut entries) => {
                if entries.len() != 1 {
                    return Err(de::Error::custom(
                        "expected a keyed node with a single variant entry",
                    ));
                }
                let (variant, value) = entries.remove(0);
                visitor.visit_enum(NodeEnumAccess {
                    variant,
                    value: Some(value),
                })
            }
            other => Err(de::Error::invalid_type(other.unexpected(), &"enum")),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

impl<'de> IntoDeserializer<'de, CodecError> for Node {
    type Deserializer = Self;

    #[inline]
    fn into_deserializer(self) -> Self {
        self
    }
}

struct NodeSeqAccess {
    iter: std::vec::IntoIter<Node>,
}

impl<'de> SeqAccess<'de> for NodeSeqAccess {
    type Error = CodecError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, CodecError>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(node) => seed.deserialize(node).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct NodeMapAccess {
    iter: std::vec::IntoIter<(Node, Node)>,
    value: Option<Node>,
}

impl<'de> MapAccess<'de> for NodeMapAccess {
    type Error = CodecError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, CodecError>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, CodecError>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(de::Error::custom("entry value is missing")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct NodeEnumAccess {
    variant: Node,
    value: Option<Node>,
}

impl<'de> EnumAccess<'de> for NodeEnumAccess {
    type Error = CodecError;
    type Variant = NodeVariantAccess;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, NodeVariantAccess), CodecError>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(self.variant)?;
        Ok((variant, NodeVariantAccess { value: self.value }))
    }
}

struct NodeVariantAccess {
    value: Option<Node>,
}

impl<'de> VariantAccess<'de> for NodeVariantAccess {
    type Error = CodecError;

    fn unit_variant(self) -> Result<(), CodecError> {
        match self.value {
            None | Some(Node::Null) => Ok(()),
            Some(node) => Err(de::Error::invalid_type(node.unexpected(), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, CodecError>
    where
        T: DeserializeSeed<'de>,
    {
        match self.value {
            Some(node) => seed.deserialize(node),
            None => Err(de::Error::custom("expected a value for newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, CodecError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(node @ Node::Seq(_)) => node.deserialize_any(visitor),
            Some(node) => Err(de::Error::invalid_type(node.unexpected(), &"tuple variant")),
            None => Err(de::Error::custom("expected a value for tuple variant")),
        }
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(node @ Node::Map(_)) => node.deserialize_any(visitor),
            Some(node) => Err(de::Error::invalid_type(node.unexpected(), &"struct variant")),
            None => Err(de::Error::custom("expected a value for struct variant")),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::Node;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Record {
        id: String,
        count: u64,
        note: Option<String>,
        kind: Kind,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Kind {
        Plain,
        Nested { depth: u32 },
    }

    #[test]
    fn captures_the_document_shape() {
        let node: Node =
            serde_json::from_str(r#"{"type":"detailscreen","id":"42","flags":[true,null]}"#)
                .unwrap();

        assert_eq!(node.get("type").and_then(Node::as_str), Some("detailscreen"));
        assert_eq!(node.get("id").and_then(Node::as_str), Some("42"));
        assert_eq!(
            node.get("flags"),
            Some(&Node::Seq(vec![Node::Bool(true), Node::Null]))
        );
        assert_eq!(node.get("missing"), None);
    }

    #[test]
    fn replays_into_a_concrete_type() {
        let node: Node = serde_json::from_str(
            r#"{"id":"a","count":3,"note":null,"kind":"plain"}"#,
        )
        .unwrap();

        let record = Record::deserialize(node).unwrap();
        assert_eq!(
            record,
            Record {
                id: "a".to_owned(),
                count: 3,
                note: None,
                kind: Kind::Plain,
            }
        );
    }

    #[test]
    fn replays_struct_variants() {
        let node: Node =
            serde_json::from_str(r#"{"id":"a","count":0,"note":"n","kind":{"nested":{"depth":2}}}"#)
                .unwrap();

        let record = Record::deserialize(node).unwrap();
        assert_eq!(record.kind, Kind::Nested { depth: 2 });
        assert_eq!(record.note.as_deref(), Some("n"));
    }

    #[test]
    fn captures_ron_maps_as_keyed_nodes() {
        let node: Node = ron::from_str(r#"{"type": "homescreen"}"#).unwrap();
        assert_eq!(node.get("type").and_then(Node::as_str), Some("homescreen"));
    }

    #[test]
    fn replay_of_a_scalar_into_a_struct_fails() {
        let node = Node::Bool(true);
        assert!(Record::deserialize(node).is_err());
    }
}
