use core::any::{Any, TypeId};
use core::fmt;

use crate::CodecError;

// -----------------------------------------------------------------------------
// DynCodable

/// The capability a type must carry to participate in polymorphic coding.
///
/// A `DynCodable` value knows its own [type tag](DynCodable::type_tag), the
/// string that identifies its concrete type inside a serialized document. The
/// tag is part of the variant's own field set: it must be written by the
/// variant's `Serialize` implementation (usually a `String` field renamed to
/// the tag key) so that a later decode can resolve it again. The encoder never
/// injects the tag separately.
///
/// Values are serialized through the [`erased_serde::Serialize`] supertrait,
/// which is implemented automatically for every `serde::Serialize` type.
///
/// # Example
///
/// ```
/// use dyn_codable::DynCodable;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// struct HomeScreen {
///     #[serde(rename = "type")]
///     tag: String,
/// }
///
/// impl DynCodable for HomeScreen {
///     fn type_tag(&self) -> &str {
///         &self.tag
///     }
///
///     fn dyn_eq(&self, other: &dyn DynCodable) -> bool {
///         other.downcast_ref::<Self>().is_some_and(|other| self == other)
///     }
/// }
/// ```
pub trait DynCodable: erased_serde::Serialize + fmt::Debug + Any {
    /// The tag identifying this value's concrete type.
    ///
    /// Must be stable across encode/decode round trips, and must match the
    /// tag the type is registered under.
    fn type_tag(&self) -> &str;

    /// Compares against another type-erased value.
    ///
    /// Implementations downcast `other` to `Self` and compare; two values of
    /// different concrete types are never equal.
    fn dyn_eq(&self, other: &dyn DynCodable) -> bool;
}

impl dyn DynCodable {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        let any: &dyn Any = self;
        any.type_id() == TypeId::of::<T>()
    }

    /// Downcasts the value to type `T` by reference.
    ///
    /// If the underlying value is not of type `T`, returns `None`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        <dyn Any>::downcast_ref(self)
    }

    /// Downcasts the value to type `T` by mutable reference.
    ///
    /// If the underlying value is not of type `T`, returns `None`.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        <dyn Any>::downcast_mut(self)
    }

    /// Downcasts the value to type `T`, consuming the trait object.
    ///
    /// If the underlying value is not of type `T`, returns `Err(self)`.
    pub fn downcast<T: Any>(self: Box<dyn DynCodable>) -> Result<Box<T>, Box<dyn DynCodable>> {
        if self.is::<T>() {
            let any: Box<dyn Any> = self;
            // The type id was checked just above.
            any.downcast::<T>().map_err(|_| unreachable!())
        } else {
            Err(self)
        }
    }

    /// Downcasts the value to type `T`, unboxing and consuming the trait
    /// object.
    ///
    /// Fails with [`CodecError::TypeMismatch`] carrying the expected type name
    /// and the value's own tag, which points at a registry misconfiguration
    /// when it shows up after a decode.
    ///
    /// # Example
    ///
    /// ```
    /// # use dyn_codable::{CodecError, DynCodable};
    /// # use serde::Serialize;
    /// # #[derive(Serialize, Debug, PartialEq)]
    /// # struct HomeScreen {
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
    /// let value: Box<dyn DynCodable> = Box::new(HomeScreen {
    ///     tag: "homescreen".to_owned(),
    /// });
    ///
    /// let err = value.take::<u32>().unwrap_err();
    /// assert!(matches!(err, CodecError::TypeMismatch { .. }));
    /// ```
    pub fn take<T: Any>(self: Box<dyn DynCodable>) -> Result<T, CodecError> {
        match self.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(CodecError::TypeMismatch {
                expected: core::any::type_name::<T>().into(),
                actual: value.type_tag().to_owned(),
            }),
        }
    }
}

impl PartialEq for Box<dyn DynCodable> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other.as_ref())
    }
}

// -----------------------------------------------------------------------------
// Naming convention

/// Derives a type tag from `T`'s name: the bare type identifier, lowercased.
///
/// This is the documented fallback for variants that do not choose an explicit
/// tag constant. A family sharing a suffix (`DetailRoute`, `HomeRoute`, ...)
/// can drop it with [`conventional_tag_stripped`] instead.
///
/// # Example
///
/// ```
/// use dyn_codable::conventional_tag;
///
/// struct DetailScreen;
///
/// assert_eq!(conventional_tag::<DetailScreen>(), "detailscreen");
/// assert_eq!(conventional_tag::<Vec<u8>>(), "vec");
/// ```
pub fn conventional_tag<T: ?Sized>() -> String {
    type_ident::<T>().to_ascii_lowercase()
}

/// Derives a type tag from `T`'s name with a shared suffix removed.
///
/// The suffix is stripped from the bare type identifier before lowercasing;
/// an identifier that does not carry it falls back to the plain
/// [`conventional_tag`] rule.
///
/// # Example
///
/// ```
/// use dyn_codable::conventional_tag_stripped;
///
/// struct DetailRoute;
/// struct Fallback;
///
/// assert_eq!(conventional_tag_stripped::<DetailRoute>("Route"), "detail");
/// assert_eq!(conventional_tag_stripped::<Fallback>("Route"), "fallback");
/// ```
pub fn conventional_tag_stripped<T: ?Sized>(suffix: &str) -> String {
    let ident = type_ident::<T>();
    ident
        .strip_suffix(suffix)
        .unwrap_or(ident)
        .to_ascii_lowercase()
}

fn type_ident<T: ?Sized>() -> &'static str {
    let name = core::any::type_name::<T>();
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}

// -----------------------------------------------------------------------------
// Tests
