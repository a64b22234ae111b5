//! Typed errors for wire encode/decode.
//!
//! Every malformed input maps to a specific variant so the caller can drop
//! just the offending connection instead of tearing the process down.

use thiserror::Error;

use super::message::MessageType;

/// Result type for wire decode operations
pub type WireResult<T> = Result<T, DecodeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown message type {0}")]
    UnknownType(u8),

    #[error("invalid side {0}")]
    InvalidSide(u8),

    #[error("payload length {actual} does not match {expected} for {kind:?}")]
    LengthMismatch {
        kind: MessageType,
        expected: usize,
        actual: usize,
    },

    #[error("invalid cell value {0}")]
    InvalidCell(u8),

    #[error("invalid tetromino value {0}")]
    InvalidTet(u8),

    #[error("invalid facing value {0}")]
    InvalidFacing(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("buffer too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}
