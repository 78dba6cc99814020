//! Byte buffer runtime for the fieldwire codecs
//!
//! This crate provides the cursor-based memory region both wire formats are
//! written into and read from. One contract, [`IoBuffer`], has two
//! implementations:
//!
//! - [`FastByteBuffer`]: owns its storage and grows on demand
//! - [`ExternalBuffer`]: adapts a caller-supplied, fixed-size region
//!
//! # Wire Primitives
//!
//! All multi-byte values are little-endian. Strings and arrays carry an
//! `i32` length prefix:
//! - Primitives occupy their natural width (1, 2, 4, or 8 bytes)
//! - Strings are `count | bytes | NUL`, where `count` includes the NUL
//! - Arrays are `count | elements`

mod buffer;
mod error;
mod external;
mod fast;


pub use buffer::IoBuffer;
pub use error::{BufferError, Result};
pub use external::ExternalBuffer;
pub use fast::{FastByteBuffer, DEFAULT_INITIAL_CAPACITY, MAX_CAPACITY};

/// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};
