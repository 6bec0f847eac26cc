//! Open-addressed map keyed by 32-bit signed integers (`IntKeyMap<V>`).

mod error;
mod map;
mod probe;

pub use error::IntMapError;
pub use map::{IntKeyMap, SlotIter, SlotToken, END, FREE};
