use std::collections::HashMap;

use serde_core::de::Error as _;

use super::SkipObserver;
use crate::node::Node;
use crate::registry::TagRegistry;
use crate::{CodecError, DynCodable, DynValue};

// -----------------------------------------------------------------------------
// Tag extraction

/// Reads the type tag off a keyed node without touching any other field.
///
/// Fails with [`CodecError::TagMissing`] when the node is not keyed, the tag
/// key is absent, or its value is not a string. Fields other than the tag are
/// never inspected, so a node whose remaining fields would not fit any
/// particular variant still yields its tag.
///
/// # Example
///
/// ```
/// use dyn_codable::node::Node;
/// use dyn_codable::serde::extract_tag;
///
/// let node: Node = serde_json::from_str(r#"{"type":"homescreen","stale":[1]}"#).unwrap();
/// assert_eq!(extract_tag(&node, "type").unwrap(), "homescreen");
/// assert!(extract_tag(&node, "kind").is_err());
/// ```
pub fn extract_tag<'a>(node: &'a Node, tag_key: &str) -> Result<&'a str, CodecError> {
    match node {
        Node::Map(_) => node
            .get(tag_key)
            .and_then(Node::as_str)
            .ok_or_else(|| CodecError::TagMissing {
                key: tag_key.to_owned().into(),
            }),
        _ => Err(CodecError::TagMissing {
            key: tag_key.to_owned().into(),
        }),
    }
}

// -----------------------------------------------------------------------------
// Slot decoding

/// Decodes a required single value: tag → constructor → replay of the node.
pub(crate) fn decode_single(
    node: Node,
    registry: &TagRegistry,
) -> Result<Box<dyn DynCodable>, CodecError> {
    let tag = extract_tag(&node, registry.tag_key())?.to_owned();
    let deserialize = registry.resolve(&tag)?;
    let mut erased = <dyn erased_serde::Deserializer>::erase(node);
    deserialize(&mut erased).map_err(CodecError::from)
}

/// Decodes an optional value: an explicit null is "no value", anything else
/// follows the required rule.
pub(crate) fn decode_optional(
    node: Node,
    registry: &TagRegistry,
) -> Result<Option<Box<dyn DynCodable>>, CodecError> {
    if node.is_null() {
        Ok(None)
    } else {
        decode_single(node, registry).map(Some)
    }
}

/// Decodes a sequence of values, preserving order.
///
/// An element with an unregistered tag is reported to the observer and
/// dropped; the element is already buffered, so skipping cannot wedge the
/// reader. Any other failure aborts the whole sequence.
pub(crate) fn decode_seq<O: SkipObserver>(
    elements: Vec<Node>,
    registry: &TagRegistry,
    observer: &mut O,
) -> Result<Vec<Box<dyn DynCodable>>, CodecError> {
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        match decode_single(element, registry) {
            Ok(value) => values.push(value),
            Err(CodecError::NotRegistered { tag }) => observer.on_unknown_tag(&tag),
            Err(err) => return Err(err),
        }
    }
    Ok(values)
}

/// Decodes a string-keyed mapping of values.
///
/// An entry whose value carries an unregistered tag is reported and dropped;
/// remaining entries are still decoded.
pub(crate) fn decode_map<O: SkipObserver>(
    entries: Vec<(Node, Node)>,
    registry: &TagRegistry,
    observer: &mut O,
) -> Result<HashMap<String, Box<dyn DynCodable>>, CodecError> {
    let mut values = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        let Node::String(key) = key else {
            return Err(CodecError::invalid_type(key.unexpected(), &"a string key"));
        };
        match decode_single(value, registry) {
            Ok(value) => {
                values.insert(key, value);
            }
            Err(CodecError::NotRegistered { tag }) => observer.on_unknown_tag(&tag),
            Err(err) => return Err(err),
        }
    }
    Ok(values)
}

/// Decodes a fully-erased slot by probing the node's shape.
///
/// Probe order: a sequence is taken as-is; a keyed node carrying the tag
/// field is a single value, one without it is a mapping; null is "no value".
/// A scalar fits no polymorphic shape. Call sites that know their shape
/// statically should prefer the shaped entry points over this heuristic.
pub(crate) fn decode_probe<O: SkipObserver>(
    node: Node,
    registry: &TagRegistry,
    observer: &mut O,
) -> Result<DynValue, CodecError> {
    match node {
        Node::Null => Ok(DynValue::Null),
        Node::Seq(elements) => decode_seq(elements, registry, observer).map(DynValue::Seq),
        Node::Map(entries) => {
            let tag_key = registry.tag_key();
            let has_tag = entries
                .iter()
                .any(|(key, _)| matches!(key, Node::String(k) if k == tag_key));
            if has_tag {
                decode_single(Node::Map(entries), registry).map(DynValue::Value)
            } else {
                decode_map(entries, registry, observer).map(DynValue::Map)
            }
        }
        _ => Err(CodecError::Message(
            "cannot decode a polymorphic value from a scalar node".to_owned(),
        )),
    }
}

// -----------------------------------------------------------------------------
// Tests
