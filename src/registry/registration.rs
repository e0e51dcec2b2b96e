use serde_core::de::DeserializeOwned;

use crate::DynCodable;

// -----------------------------------------------------------------------------
// DeserializeFn

/// A type-erased constructor: builds a concrete variant from a document
/// decoding context.
///
/// Produced from a concrete type's `Deserialize` implementation when the type
/// is [registered](crate::registry::TagRegistry::register); the function
/// pointer is what the registry stores and what tag resolution hands back.
pub type DeserializeFn =
    fn(deserializer: &mut dyn erased_serde::Deserializer) -> Result<Box<dyn DynCodable>, erased_serde::Error>;

pub(crate) fn deserialize_erased<T>(
    deserializer: &mut dyn erased_serde::Deserializer,
) -> Result<Box<dyn DynCodable>, erased_serde::Error>
where
    T: DynCodable + DeserializeOwned,
{
    Ok(Box::new(erased_serde::deserialize::<T>(deserializer)?))
}

// -----------------------------------------------------------------------------
// TagRegistration

/// A static tag registration collected by
/// [`TagRegistry::auto_register`](crate::registry::TagRegistry::auto_register).
///
/// Submit one per variant with [`inventory::submit!`]:
///
/// ```
/// use dyn_codable::registry::TagRegistration;
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
/// inventory::submit! {
///     TagRegistration::of::<HomeScreen>("homescreen")
/// }
/// ```
#[cfg(feature = "auto_register")]
pub struct TagRegistration {
    tag: &'static str,
    deserialize: DeserializeFn,
}

#[cfg(feature = "auto_register")]
impl TagRegistration {
    /// Creates a registration mapping `tag` to `T`'s constructor.
    pub const fn of<T>(tag: &'static str) -> Self
    where
        T: DynCodable + DeserializeOwned,
    {
        Self {
            tag,
            deserialize: deserialize_erased::<T>,
        }
    }

    /// The tag this registration claims.
    #[inline]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    #[inline]
    pub(crate) fn deserialize_fn(&self) -> DeserializeFn {
        self.deserialize
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(TagRegistration);
