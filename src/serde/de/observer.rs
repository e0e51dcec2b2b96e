// -----------------------------------------------------------------------------
// SkipObserver

/// A diagnostic hook for entries skipped during sequence and mapping decoding.
///
/// An entry whose tag resolves to no registered constructor is dropped instead
/// of failing the surrounding decode; this hook makes the drop observable.
/// The default observer `()` records the tag through [`log::warn!`]. Wrap a
/// closure in [`SkipFn`] to capture skipped tags instead:
///
/// ```
/// use dyn_codable::DynValue;
/// use dyn_codable::registry::TagRegistry;
/// use dyn_codable::serde::{SkipFn, ValueDeserializeDriver};
/// use serde_core::de::DeserializeSeed;
///
/// let registry = TagRegistry::new();
/// let mut skipped = Vec::new();
///
/// let mut data = serde_json::Deserializer::from_str(r#"[{"type":"ghost"}]"#);
/// let decoded = ValueDeserializeDriver::with_observer(
///     &registry,
///     SkipFn(|tag: &str| skipped.push(tag.to_owned())),
/// )
/// .deserialize(&mut data)
/// .unwrap();
///
/// assert_eq!(decoded, DynValue::Seq(Vec::new()));
/// assert_eq!(skipped, ["ghost"]);
/// ```
pub trait SkipObserver {
    /// Called once per skipped entry with the unresolved tag.
    fn on_unknown_tag(&mut self, tag: &str);
}

impl SkipObserver for () {
    fn on_unknown_tag(&mut self, tag: &str) {
        log::warn!("no type registered for tag `{tag}`; entry skipped");
    }
}

/// Adapts an `FnMut(&str)` closure into a [`SkipObserver`].
pub struct SkipFn<F: FnMut(&str)>(pub F);

impl<F: FnMut(&str)> SkipObserver for SkipFn<F> {
    #[inline]
    fn on_unknown_tag(&mut self, tag: &str) {
        (self.0)(tag);
    }
}
