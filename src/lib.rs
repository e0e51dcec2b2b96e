#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod codable;
mod dyn_value;
mod error;
mod slot;

pub mod node;
pub mod registry;
pub mod serde;

#[cfg(test)]
pub(crate) mod testing;

pub use codable::{conventional_tag, conventional_tag_stripped, DynCodable};
pub use dyn_value::DynValue;
pub use error::CodecError;
pub use slot::{Dyn, DynSlot};
