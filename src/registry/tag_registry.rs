use std::borrow::Cow;
use std::collections::HashMap;

use serde_core::de::DeserializeOwned;

use super::registration::{DeserializeFn, deserialize_erased};
use crate::{CodecError, DynCodable};

// -----------------------------------------------------------------------------
// TagRegistry

/// A registry of tagged polymorphic types.
///
/// This struct is used as the central store mapping a type tag to the
/// constructor of the concrete variant it denotes. It is the single seam where
/// new variants are added: the decode algorithm never changes, a new variant
/// only [registers](Self::register) itself under its tag.
///
/// A registry is caller-owned and passed explicitly into the decode drivers,
/// which keeps decode calls deterministic and testable in isolation. Callers
/// that accept a single process-wide registry can use
/// [`default_registry`](super::default_registry) instead.
///
/// Registration is expected to complete during a single-threaded setup phase
/// before the first decode; a tag registered before a lookup always resolves,
/// an unregistered tag always fails with [`CodecError::NotRegistered`].
///
/// # Example
///
/// ```
/// use dyn_codable::registry::TagRegistry;
/// # use dyn_codable::DynCodable;
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
/// assert!(registry.contains("homescreen"));
/// assert!(registry.resolve("splashscreen").is_err());
/// ```
#[derive(Clone)]
pub struct TagRegistry {
    entries: HashMap<Cow<'static, str>, DeserializeFn>,
    tag_key: Cow<'static, str>,
}

impl TagRegistry {
    /// The conventional key a serialized value stores its tag under.
    pub const DEFAULT_TAG_KEY: &'static str = "type";

    /// Creates an empty registry using [`DEFAULT_TAG_KEY`](Self::DEFAULT_TAG_KEY).
    pub fn new() -> Self {
        Self::with_tag_key(Self::DEFAULT_TAG_KEY)
    }

    /// Creates an empty registry whose documents store the tag under `tag_key`.
    pub fn with_tag_key(tag_key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            entries: HashMap::new(),
            tag_key: tag_key.into(),
        }
    }

    /// The key the decode algorithm reads the tag from.
    #[inline]
    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }

    /// Registers `T`'s constructor under `tag`.
    ///
    /// Inserting an already registered tag overwrites the previous entry; the
    /// last writer wins. Already-decoded values are unaffected, only
    /// subsequent resolutions see the new constructor.
    pub fn register<T>(&mut self, tag: impl Into<Cow<'static, str>>)
    where
        T: DynCodable + DeserializeOwned,
    {
        self.register_fn(tag, deserialize_erased::<T>);
    }

    /// Registers a raw constructor function under `tag`.
    ///
    /// This is the erased form of [`register`](Self::register); useful when
    /// the constructor needs to do more than deserialize a single concrete
    /// type.
    pub fn register_fn(&mut self, tag: impl Into<Cow<'static, str>>, deserialize: DeserializeFn) {
        self.entries.insert(tag.into(), deserialize);
    }

    /// Resolves a tag to its registered constructor.
    ///
    /// A pure lookup: fails with [`CodecError::NotRegistered`] carrying the
    /// offending tag, never panics.
    pub fn resolve(&self, tag: &str) -> Result<DeserializeFn, CodecError> {
        match self.entries.get(tag) {
            Some(deserialize) => Ok(*deserialize),
            None => Err(CodecError::NotRegistered {
                tag: tag.to_owned(),
            }),
        }
    }

    /// Whether a constructor is registered for `tag`.
    #[inline]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Number of registered tags.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the registered tags.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(Cow::as_ref)
    }

    /// Registers every [`TagRegistration`](super::TagRegistration) submitted
    /// through [`inventory::submit!`].
    ///
    /// Repeated calls are cheap and keep the last-writer-wins rule; explicit
    /// registrations made afterwards still overwrite static ones.
    #[cfg(feature = "auto_register")]
    pub fn auto_register(&mut self) {
        for registration in inventory::iter::<super::TagRegistration> {
            self.register_fn(registration.tag(), registration.deserialize_fn());
        }
    }
}

impl Default for TagRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TagRegistry")
            .field("tag_key", &self.tag_key)
            .field("tags", &self.entries.keys())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// TagRegistryArc

use std::sync::{Arc, OnceLock, PoisonError};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A shared, reader-writer protected [`TagRegistry`].
///
/// Lookups never mutate, so any number of decode calls may hold read locks in
/// parallel; registration takes the write lock.
#[derive(Clone, Default)]
pub struct TagRegistryArc {
    /// The wrapped [`TagRegistry`].
    pub internal: Arc<RwLock<TagRegistry>>,
}

impl TagRegistryArc {
    /// Takes a read lock on the underlying [`TagRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, TagRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`TagRegistry`].
    pub fn write(&self) -> RwLockWriteGuard<'_, TagRegistry> {
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl core::fmt::Debug for TagRegistryArc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.read().fmt(f)
    }
}

/// The process-wide default registry used by the [`Dyn`](crate::Dyn) field
/// wrapper.
///
/// With the `auto_register` feature enabled, static registrations are applied
/// on first access; explicit registration still works through
/// [`TagRegistryArc::write`] and must happen before the first decode that
/// needs the tag. Every process decoding the same documents has to rebuild
/// this registry identically.
pub fn default_registry() -> &'static TagRegistryArc {
    static DEFAULT: OnceLock<TagRegistryArc> = OnceLock::new();
    DEFAULT.get_or_init(|| {
        let registry = TagRegistryArc::default();
        #[cfg(feature = "auto_register")]
        registry.write().auto_register();
        registry
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::TagRegistry;
    use crate::testing::{DetailScreen, HomeScreen, decode_str};
    use crate::CodecError;

    #[test]
    fn resolve_finds_registered_tags() {
        let mut registry = TagRegistry::new();
        registry.register::<HomeScreen>("homescreen");

        assert!(registry.resolve("homescreen").is_ok());
        assert_eq!(
            registry.resolve("detailscreen"),
            Err(CodecError::NotRegistered {
                tag: "detailscreen".to_owned(),
            })
        );
    }

    #[test]
    fn reregistration_overwrites_the_constructor() {
        let mut registry = TagRegistry::new();
        registry.register::<HomeScreen>("screen");

        let decoded = decode_str(r#"{"type":"screen"}"#, &registry).unwrap();
        assert!(decoded.is::<HomeScreen>());

        // Last writer wins; values decoded earlier keep their type.
        registry.register::<DetailScreen>("screen");
        let redecoded = decode_str(r#"{"type":"screen","id":"1"}"#, &registry).unwrap();
        assert!(redecoded.is::<DetailScreen>());
        assert!(decoded.is::<HomeScreen>());
    }

    #[test]
    fn tag_key_is_configurable() {
        let registry = TagRegistry::with_tag_key("kind");
        assert_eq!(registry.tag_key(), "kind");
        assert_eq!(TagRegistry::new().tag_key(), "type");
    }

    #[cfg(feature = "auto_register")]
    mod auto_register {
        use crate::registry::{TagRegistration, TagRegistry};
        use crate::testing::HomeScreen;

        inventory::submit! {
            TagRegistration::of::<HomeScreen>("homescreen/static")
        }

        #[test]
        fn collects_static_registrations() {
            let mut registry = TagRegistry::new();
            registry.auto_register();
            assert!(registry.contains("homescreen/static"));
        }
    }
}
