//! Error types shared by the codecs, the byte hosts and the session.
//!
//! Decoding never fails: a window that cannot be shown becomes
//! [`DecodedValue::NotRepresentable`](crate::codec::DecodedValue). Only edits and
//! host I/O produce errors.

use crate::fields::FieldId;
use thiserror::Error;

/// Failure of a single encoder call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input string does not parse for the target encoding
    #[error("invalid format")]
    Format,

    /// The input parsed but lies outside what the encoding can hold
    #[error("out of range: {0}")]
    Range(&'static str),
}

/// Failure reported by a [`ByteSource`](crate::buffer::ByteSource)
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("access of {len} bytes at offset {offset} exceeds data length {data_len}")]
    OutOfBounds { offset: u64, len: usize, data_len: u64 },

    #[error("buffer is read-only")]
    ReadOnly,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single-field edit. The session stays usable after any of these.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("{field}: {source}")]
    Invalid {
        field: FieldId,
        #[source]
        source: CodecError,
    },

    #[error("{field} is not available at offset {offset}")]
    Unavailable { field: FieldId, offset: u64 },

    #[error("data is read-only")]
    ReadOnly,

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl EditError {
    /// True for the uniform "format or range" case that callers report with one
    /// generic message.
    pub fn is_user_input(&self) -> bool {
        matches!(self, EditError::Invalid { .. })
    }
}
