//! The central tag registry polymorphic decoding depends on.
//!
//! ## Menu
//!
//! - [`TagRegistry`]: maps type tags to [`DeserializeFn`] constructors; one
//!   lookup per polymorphic value during decode.
//! - [`TagRegistryArc`]: reader-writer protected shared registry for callers
//!   whose registration and lookup phases overlap.
//! - [`default_registry`]: the process-wide instance the
//!   [`Dyn`](crate::Dyn) field wrapper decodes through.
//! - [`TagRegistration`]: a static registration entry collected through the
//!   `inventory` crate.
//!
//! ## auto_register
//!
//! See [`TagRegistry::auto_register`].
//!
//! We use the `inventory` crate to implement static registration; not all
//! platforms support it (although major platforms do).

// -----------------------------------------------------------------------------
// Modules

mod registration;
mod tag_registry;

// -----------------------------------------------------------------------------
// Exports

pub use registration::DeserializeFn;
#[cfg(feature = "auto_register")]
pub use registration::TagRegistration;
pub use tag_registry::{TagRegistry, TagRegistryArc, default_registry};
