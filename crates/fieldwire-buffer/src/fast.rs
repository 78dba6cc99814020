//! Owned, growable buffer
//!
//! Storage is a zero-filled `BytesMut` whose length is the buffer's
//! capacity. Growth resizes in place; `trim` truncates.

use crate::buffer::IoBuffer;
use crate::error::{BufferError, Result};
use bytes::{Bytes, BytesMut};
use tracing::trace;

/// Capacity used by [`FastByteBuffer::new`]
pub const DEFAULT_INITIAL_CAPACITY: usize = 1000;

/// Largest capacity addressable by the `i32` length prefixes
pub const MAX_CAPACITY: usize = i32::MAX as usize;

/// Dynamic buffer that owns and grows its backing storage
#[derive(Debug, Clone)]
pub struct FastByteBuffer {
    data: BytesMut,
    position: usize,
    limit: usize,
    enforce_simple_strings: bool,
}

impl FastByteBuffer {
    /// Create a buffer with [`DEFAULT_INITIAL_CAPACITY`]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    /// Create an empty buffer in write mode (`limit == capacity`)
    pub fn with_capacity(capacity: usize) -> Self {
        let mut data = BytesMut::with_capacity(capacity);
        data.resize(capacity, 0);
        Self {
            data,
            position: 0,
            limit: capacity,
            enforce_simple_strings: false,
        }
    }

    /// Wrap existing bytes; `limit` marks the end of valid data
    pub fn wrap(bytes: Vec<u8>, limit: usize) -> Result<Self> {
        if limit > bytes.len() {
            return Err(BufferError::InvalidCursor { what: "limit", value: limit, bound: bytes.len() });
        }
        Ok(Self {
            data: BytesMut::from(bytes.as_slice()),
            position: 0,
            limit,
            enforce_simple_strings: false,
        })
    }

    /// Copy a complete encoded stream into a buffer ready for reading
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: BytesMut::from(bytes),
            position: 0,
            limit: bytes.len(),
            enforce_simple_strings: false,
        }
    }

    /// Freeze the valid region (`0..limit`)
    pub fn into_bytes(self) -> Bytes {
        let mut data = self.data;
        data.truncate(self.limit);
        data.freeze()
    }
}

impl Default for FastByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl IoBuffer for FastByteBuffer {
    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn position(&self) -> usize {
        self.position
    }

    fn limit(&self) -> usize {
        self.limit
    }

    fn max_capacity(&self) -> usize {
        MAX_CAPACITY
    }

    fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(BufferError::InvalidCursor { what: "position", value: position, bound: self.limit });
        }
        self.position = position;
        Ok(())
    }

    fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.data.len() {
            return Err(BufferError::InvalidCursor { what: "limit", value: limit, bound: self.data.len() });
        }
        self.limit = limit;
        self.position = self.position.min(limit);
        Ok(())
    }

    fn ensure_capacity(&mut self, capacity: usize) -> Result<()> {
        let current = self.data.len();
        if capacity <= current {
            return Ok(());
        }
        if capacity > MAX_CAPACITY {
            return Err(BufferError::CapacityExceeded { needed: capacity, capacity: MAX_CAPACITY });
        }
        trace!(from = current, to = capacity, "growing buffer");
        let write_mode = self.limit == current;
        self.data.resize(capacity, 0);
        if write_mode {
            self.limit = capacity;
        }
        Ok(())
    }

    fn trim_to(&mut self, capacity: usize) {
        let target = capacity.max(self.position);
        if target >= self.data.len() {
            return;
        }
        trace!(from = self.data.len(), to = target, "trimming buffer");
        self.data.truncate(target);
        self.limit = self.limit.min(target);
    }

    fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    fn clear(&mut self) {
        self.position = 0;
        self.limit = self.data.len();
    }

    fn reset(&mut self) {
        self.position = 0;
    }

    fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn is_enforce_simple_strings(&self) -> bool {
        self.enforce_simple_strings
    }

    fn set_enforce_simple_strings(&mut self, enforce: bool) {
        self.enforce_simple_strings = enforce;
    }
}
