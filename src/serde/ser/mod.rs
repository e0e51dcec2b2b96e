//! Serialization drivers for type-erased values.
//!
//! Each driver borrows its value and implements [`serde_core::Serialize`],
//! so it slots directly into any format's `to_string`/`to_writer` entry
//! points or into a hand-written `Serialize` impl. One driver exists per
//! slot shape, plus [`AnySerializeDriver`] for values whose shape is only
//! known at runtime.

mod driver;

pub use driver::{
    AnySerializeDriver, DynSerializeDriver, MapSerializeDriver, OptionalSerializeDriver,
    SeqSerializeDriver,
};
