//! Buffer error types

use thiserror::Error;

/// Buffer access errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Access outside the readable (`limit`) or writable (`capacity`) region
    #[error("index out of range: {width} bytes at {index} exceeds bound {bound}")]
    IndexOutOfRange { index: usize, width: usize, bound: usize },

    /// Growth request the backing storage cannot satisfy
    #[error("capacity exceeded: needed {needed} bytes, maximum is {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    /// Cursor or limit moved outside `0 <= position <= limit <= capacity`
    #[error("invalid {what}: {value} exceeds {bound}")]
    InvalidCursor { what: &'static str, value: usize, bound: usize },

    /// Negative length prefix on the wire
    #[error("negative length prefix: {0}")]
    NegativeLength(i32),

    /// Length does not fit the `i32` prefix
    #[error("length {0} does not fit an i32 prefix")]
    LengthOverflow(usize),

    /// String payload is not valid in the requested encoding
    #[error("invalid string: {0}")]
    InvalidString(String),
}

impl BufferError {
    /// True for errors caused by addressing outside the buffer's bounds
    pub fn is_capacity_error(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. } | Self::CapacityExceeded { .. } | Self::InvalidCursor { .. }
        )
    }
}

/// Result type for buffer operations
pub type Result<T> = std::result::Result<T, BufferError>;
