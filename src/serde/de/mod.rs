// -----------------------------------------------------------------------------
// Modules

mod decode;
mod driver;
mod observer;

// -----------------------------------------------------------------------------
// Exports

pub use decode::extract_tag;
pub use driver::{DynDeserializeDriver, SlotDeserializeDriver, ValueDeserializeDriver};
pub use observer::{SkipFn, SkipObserver};

pub(crate) use decode::{decode_map, decode_optional, decode_probe, decode_seq, decode_single};
