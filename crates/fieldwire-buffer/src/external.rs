//! Adapter over caller-supplied storage
//!
//! The caller keeps ownership of the region. The adapter's capacity may be
//! trimmed below the region size and grown back up to it, but never beyond:
//! a write that needs more room fails with `CapacityExceeded` instead of
//! reallocating.

use crate::buffer::IoBuffer;
use crate::error::{BufferError, Result};

/// Buffer over a fixed `&mut [u8]` region
#[derive(Debug)]
pub struct ExternalBuffer<'a> {
    region: &'a mut [u8],
    capacity: usize,
    position: usize,
    limit: usize,
    enforce_simple_strings: bool,
}

impl<'a> ExternalBuffer<'a> {
    /// Use the whole region for writing
    pub fn new(region: &'a mut [u8]) -> Self {
        let capacity = region.len();
        Self {
            region,
            capacity,
            position: 0,
            limit: capacity,
            enforce_simple_strings: false,
        }
    }

    /// Read back a region holding `limit` bytes of valid data
    pub fn wrap(region: &'a mut [u8], limit: usize) -> Result<Self> {
        if limit > region.len() {
            return Err(BufferError::InvalidCursor { what: "limit", value: limit, bound: region.len() });
        }
        let capacity = region.len();
        Ok(Self {
            region,
            capacity,
            position: 0,
            limit,
            enforce_simple_strings: false,
        })
    }

    /// Release the region back to the caller
    pub fn into_inner(self) -> &'a mut [u8] {
        self.region
    }
}

impl IoBuffer for ExternalBuffer<'_> {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn position(&self) -> usize {
        self.position
    }

    fn limit(&self) -> usize {
        self.limit
    }

    fn max_capacity(&self) -> usize {
        self.region.len()
    }

    fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(BufferError::InvalidCursor { what: "position", value: position, bound: self.limit });
        }
        self.position = position;
        Ok(())
    }

    fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity {
            return Err(BufferError::InvalidCursor { what: "limit", value: limit, bound: self.capacity });
        }
        self.limit = limit;
        self.position = self.position.min(limit);
        Ok(())
    }

    fn ensure_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity <= self.capacity {
            return Ok(());
        }
        if capacity > self.region.len() {
            return Err(BufferError::CapacityExceeded { needed: capacity, capacity: self.region.len() });
        }
        if self.limit == self.capacity {
            self.limit = capacity;
        }
        self.capacity = capacity;
        Ok(())
    }

    fn trim_to(&mut self, capacity: usize) {
        let target = capacity.max(self.position);
        if target >= self.capacity {
            return;
        }
        self.capacity = target;
        self.limit = self.limit.min(target);
    }

    fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity;
    }

    fn reset(&mut self) {
        self.position = 0;
    }

    fn as_slice(&self) -> &[u8] {
        &self.region[..self.capacity]
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.region[..self.capacity]
    }

    fn is_enforce_simple_strings(&self) -> bool {
        self.enforce_simple_strings
    }

    fn set_enforce_simple_strings(&mut self, enforce: bool) {
        self.enforce_simple_strings = enforce;
    }
}
