use super::SlotToken;

/// All `IntKeyMap` errors are caller-contract violations, never transient or
/// retryable runtime conditions.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IntMapError {
    #[error("argument out of range: {argument} = {value} ({reason})")]
    ArgumentOutOfRange { argument: &'static str, value: f64, reason: &'static str },

    #[error("token {0:?} refers to a free slot")]
    InvalidSlot(SlotToken),

    #[error("key {0} not found")]
    KeyNotFound(i32),

    #[error("key {0} is reserved (FREE/END sentinel) and cannot be inserted")]
    ReservedKey(i32),

    #[error("required SIMD capability unavailable: {0}")]
    Unsupported(&'static str),
}
