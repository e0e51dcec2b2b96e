//! Serde integration for registry-driven polymorphic (de)serialization.
//!
//! Deserialization goes through driver structs implementing
//! [`serde_core::de::DeserializeSeed`]: a driver borrows a
//! [`TagRegistry`](crate::registry::TagRegistry), buffers one document
//! position, reads its tag, and replays the buffered content into the
//! registered constructor. Serialization goes through borrowing drivers
//! implementing [`serde_core::Serialize`], one per slot shape.
//!
//! Structs that want polymorphic fields without writing manual impls can
//! wrap them in [`Dyn`](crate::Dyn) instead, which routes through the same
//! drivers against the shared default registry.

mod de;
mod ser;

pub use de::{
    extract_tag, DynDeserializeDriver, SkipFn, SkipObserver, SlotDeserializeDriver,
    ValueDeserializeDriver,
};
pub(crate) use de::{decode_map, decode_optional, decode_probe, decode_seq, decode_single};
pub use ser::{
    AnySerializeDriver, DynSerializeDriver, MapSerializeDriver, OptionalSerializeDriver,
    SeqSerializeDriver,
};
