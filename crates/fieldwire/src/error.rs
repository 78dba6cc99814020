//! Error types for the wire codecs

use crate::data_type::DataType;
use fieldwire_buffer::BufferError;
use thiserror::Error;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Buffer access failed (bounds, capacity, string encoding)
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Malformed or truncated header, or sizes that do not add up
    #[error("structural error at offset {position}: {reason}")]
    Structural { position: usize, reason: String },

    /// Stream header names another producer or an incompatible version
    #[error("protocol mismatch: expected {expected}, got {got}")]
    ProtocolMismatch { expected: String, got: String },

    /// Requested accessor does not match the field's declared tag
    #[error("type mismatch for field '{field}': expected {expected}, found {found}")]
    TypeMismatch { field: String, expected: DataType, found: DataType },

    /// Codec has no encoding for the requested type
    #[error("{codec} does not support {data_type}")]
    Unsupported { codec: &'static str, data_type: DataType },
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Structural,
    ProtocolMismatch,
    TypeMismatch,
    Capacity,
    Unsupported,
}

impl WireError {
    pub fn structural(position: usize, reason: impl Into<String>) -> Self {
        Self::Structural { position, reason: reason.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Buffer(e) if e.is_capacity_error() => ErrorKind::Capacity,
            Self::Buffer(_) | Self::Structural { .. } => ErrorKind::Structural,
            Self::ProtocolMismatch { .. } => ErrorKind::ProtocolMismatch,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
        }
    }

    /// A type mismatch leaves the stream intact: the caller can skip the field.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::TypeMismatch
    }
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, WireError>;
