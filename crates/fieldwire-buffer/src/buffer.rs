//! The `IoBuffer` contract
//!
//! A buffer is a byte region with a read/write cursor:
//!
//! ```text
//! 0 <= position <= limit <= capacity
//! ```
//!
//! Relative accessors (`get_int`, `put_int`, ...) operate at `position` and
//! advance it by exactly the encoded width. Absolute accessors (`get_int_at`,
//! `put_int_at`, ...) take an explicit offset and never move the cursor.
//!
//! Reads are bounded by `limit`; writes are bounded by `capacity`. Relative
//! writes request growth first, so an owned buffer grows transparently while
//! an external one fails with [`BufferError::CapacityExceeded`].
//!
//! | Kind   | Rust type | Width |
//! |--------|-----------|-------|
//! | bool   | bool      | 1     |
//! | byte   | i8        | 1     |
//! | char   | u16       | 2     |
//! | short  | i16       | 2     |
//! | int    | i32       | 4     |
//! | long   | i64       | 8     |
//! | float  | f32       | 4     |
//! | double | f64       | 8     |

use crate::error::{BufferError, Result};
use bytes::{Buf, BufMut};

/// Width of the `i32` length prefix used by strings and arrays
pub(crate) const LENGTH_PREFIX: usize = 4;

// Relative and absolute accessors for one fixed-width primitive.
macro_rules! primitive_accessors {
    ($ty:ty, $width:expr, $get:ident, $put:ident, $get_at:ident, $put_at:ident, $buf_get:ident, $buf_put:ident) => {
        fn $get_at(&self, index: usize) -> Result<$ty> {
            self.check_read(index, $width)?;
            let mut src = &self.as_slice()[index..index + $width];
            Ok(src.$buf_get())
        }

        fn $put_at(&mut self, index: usize, value: $ty) -> Result<()> {
            self.check_write(index, $width)?;
            let mut dst = &mut self.as_mut_slice()[index..index + $width];
            dst.$buf_put(value);
            Ok(())
        }

        fn $get(&mut self) -> Result<$ty> {
            let index = self.position();
            let value = self.$get_at(index)?;
            self.set_position(index + $width)?;
            Ok(value)
        }

        fn $put(&mut self, value: $ty) -> Result<()> {
            self.ensure_additional_capacity($width)?;
            let index = self.position();
            self.$put_at(index, value)?;
            self.advance_write($width)
        }
    };
}

// Length-prefixed array accessors built on the element accessors.
macro_rules! array_accessors {
    ($ty:ty, $width:expr, $get:ident, $put:ident, $get_at:ident, $put_at:ident,
     $get_array:ident, $put_array:ident, $put_array_len:ident, $get_array_at:ident, $put_array_at:ident) => {
        fn $put_array(&mut self, values: &[$ty]) -> Result<()> {
            self.ensure_additional_capacity(LENGTH_PREFIX + values.len() * $width)?;
            self.put_length(values.len())?;
            for value in values {
                self.$put(*value)?;
            }
            Ok(())
        }

        /// Writes at most `len` elements; `None` or a negative `len` writes an empty array.
        fn $put_array_len(&mut self, values: Option<&[$ty]>, len: i32) -> Result<()> {
            match values {
                Some(values) if len >= 0 => {
                    let n = (len as usize).min(values.len());
                    self.$put_array(&values[..n])
                }
                _ => self.$put_array(&[]),
            }
        }

        fn $get_array(&mut self) -> Result<Vec<$ty>> {
            let count = self.get_length()?;
            let start = self.position();
            self.check_read(start, count.checked_mul($width).unwrap_or(usize::MAX))?;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(self.$get()?);
            }
            Ok(values)
        }

        fn $get_array_at(&self, index: usize) -> Result<Vec<$ty>> {
            let count = self.get_length_at(index)?;
            let base = index + LENGTH_PREFIX;
            self.check_read(base, count.checked_mul($width).unwrap_or(usize::MAX))?;
            (0..count).map(|i| self.$get_at(base + i * $width)).collect()
        }

        /// Returns the number of bytes written.
        fn $put_array_at(&mut self, index: usize, values: &[$ty]) -> Result<usize> {
            let total = LENGTH_PREFIX + values.len() * $width;
            self.check_write(index, total)?;
            self.put_int_at(index, length_prefix(values.len())?)?;
            let base = index + LENGTH_PREFIX;
            for (i, value) in values.iter().enumerate() {
                self.$put_at(base + i * $width, *value)?;
            }
            Ok(total)
        }
    };
}

/// Converts a length to its `i32` wire prefix
pub(crate) fn length_prefix(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| BufferError::LengthOverflow(len))
}

fn iso8859_bytes(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| if (c as u32) <= 0xFF { c as u8 } else { b'?' })
        .collect()
}

fn iso8859_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Cursor-based byte buffer
///
/// Implementors supply storage and cursor bookkeeping; every codec is a
/// provided method. The two implementations in this crate must behave
/// identically for any sequence of calls that stays within the external
/// region's size.
pub trait IoBuffer {
    /// Size of the addressable region
    fn capacity(&self) -> usize;

    /// Current read/write cursor
    fn position(&self) -> usize;

    /// End of valid data
    fn limit(&self) -> usize;

    /// Largest capacity `ensure_capacity` can reach
    fn max_capacity(&self) -> usize;

    /// Move the cursor; fails if `position > limit`
    fn set_position(&mut self, position: usize) -> Result<()>;

    /// Move the limit; fails if `limit > capacity`. Clamps the cursor.
    fn set_limit(&mut self, limit: usize) -> Result<()>;

    /// Grow so that `capacity() >= capacity`
    fn ensure_capacity(&mut self, capacity: usize) -> Result<()>;

    /// Shrink capacity to `capacity`, never below `position`. Never grows.
    fn trim_to(&mut self, capacity: usize);

    /// `limit = position`, `position = 0`
    fn flip(&mut self);

    /// `position = 0`, `limit = capacity`
    fn clear(&mut self);

    /// `position = 0`, limit unchanged
    fn reset(&mut self);

    /// The whole addressable region (`0..capacity`)
    fn as_slice(&self) -> &[u8];

    /// The whole addressable region (`0..capacity`)
    fn as_mut_slice(&mut self) -> &mut [u8];

    /// Whether `put_string`/`get_string` use the single-byte encoding
    fn is_enforce_simple_strings(&self) -> bool;

    /// Force single-byte string encoding for this buffer instance
    fn set_enforce_simple_strings(&mut self, enforce: bool);

    // Cursor helpers

    fn remaining(&self) -> usize {
        self.limit() - self.position()
    }

    fn has_remaining(&self) -> bool {
        self.position() < self.limit()
    }

    /// Bytes from the start of the buffer up to the cursor
    fn written(&self) -> &[u8] {
        &self.as_slice()[..self.position()]
    }

    /// Advance the cursor by `n` bytes without interpreting them
    fn skip(&mut self, n: usize) -> Result<()> {
        let target = self.position().checked_add(n).unwrap_or(usize::MAX);
        self.set_position(target)
    }

    /// Shrink capacity to the current position
    fn trim(&mut self) {
        let position = self.position();
        self.trim_to(position);
    }

    /// Grow if fewer than `additional` bytes remain before `capacity`.
    ///
    /// Growth is amortized: the new capacity is at least
    /// `capacity + max(additional, capacity)`, bounded by `max_capacity()`.
    fn ensure_additional_capacity(&mut self, additional: usize) -> Result<()> {
        let capacity = self.capacity();
        let required = self
            .position()
            .checked_add(additional)
            .ok_or(BufferError::CapacityExceeded { needed: usize::MAX, capacity: self.max_capacity() })?;
        if required <= capacity {
            return Ok(());
        }
        let amortized = capacity.saturating_add(additional.max(capacity));
        let target = amortized.min(self.max_capacity()).max(required);
        self.ensure_capacity(target)
    }

    /// Fails unless `index..index + width` lies below `limit`
    fn check_read(&self, index: usize, width: usize) -> Result<()> {
        match index.checked_add(width) {
            Some(end) if end <= self.limit() => Ok(()),
            _ => Err(BufferError::IndexOutOfRange { index, width, bound: self.limit() }),
        }
    }

    /// Fails unless `index..index + width` lies below `capacity`
    fn check_write(&self, index: usize, width: usize) -> Result<()> {
        match index.checked_add(width) {
            Some(end) if end <= self.capacity() => Ok(()),
            _ => Err(BufferError::IndexOutOfRange { index, width, bound: self.capacity() }),
        }
    }

    /// Move the cursor past freshly written bytes, raising `limit` if needed
    fn advance_write(&mut self, width: usize) -> Result<()> {
        let end = self.position() + width;
        if end > self.limit() {
            self.set_limit(end)?;
        }
        self.set_position(end)
    }

    // Primitives

    fn get_bool_at(&self, index: usize) -> Result<bool> {
        self.check_read(index, 1)?;
        Ok(self.as_slice()[index] != 0)
    }

    fn put_bool_at(&mut self, index: usize, value: bool) -> Result<()> {
        self.check_write(index, 1)?;
        self.as_mut_slice()[index] = u8::from(value);
        Ok(())
    }

    fn get_bool(&mut self) -> Result<bool> {
        let index = self.position();
        let value = self.get_bool_at(index)?;
        self.set_position(index + 1)?;
        Ok(value)
    }

    fn put_bool(&mut self, value: bool) -> Result<()> {
        self.ensure_additional_capacity(1)?;
        let index = self.position();
        self.put_bool_at(index, value)?;
        self.advance_write(1)
    }

    primitive_accessors!(i8, 1, get_byte, put_byte, get_byte_at, put_byte_at, get_i8, put_i8);
    primitive_accessors!(u16, 2, get_char, put_char, get_char_at, put_char_at, get_u16_le, put_u16_le);
    primitive_accessors!(i16, 2, get_short, put_short, get_short_at, put_short_at, get_i16_le, put_i16_le);
    primitive_accessors!(i32, 4, get_int, put_int, get_int_at, put_int_at, get_i32_le, put_i32_le);
    primitive_accessors!(i64, 8, get_long, put_long, get_long_at, put_long_at, get_i64_le, put_i64_le);
    primitive_accessors!(f32, 4, get_float, put_float, get_float_at, put_float_at, get_f32_le, put_f32_le);
    primitive_accessors!(f64, 8, get_double, put_double, get_double_at, put_double_at, get_f64_le, put_f64_le);

    // Length prefixes

    fn put_length(&mut self, len: usize) -> Result<()> {
        let prefix = length_prefix(len)?;
        self.put_int(prefix)
    }

    fn get_length(&mut self) -> Result<usize> {
        let prefix = self.get_int()?;
        usize::try_from(prefix).map_err(|_| BufferError::NegativeLength(prefix))
    }

    fn get_length_at(&self, index: usize) -> Result<usize> {
        let prefix = self.get_int_at(index)?;
        usize::try_from(prefix).map_err(|_| BufferError::NegativeLength(prefix))
    }

    // Arrays

    array_accessors!(bool, 1, get_bool, put_bool, get_bool_at, put_bool_at,
        get_bool_array, put_bool_array, put_bool_array_len, get_bool_array_at, put_bool_array_at);
    array_accessors!(i8, 1, get_byte, put_byte, get_byte_at, put_byte_at,
        get_byte_array, put_byte_array, put_byte_array_len, get_byte_array_at, put_byte_array_at);
    array_accessors!(u16, 2, get_char, put_char, get_char_at, put_char_at,
        get_char_array, put_char_array, put_char_array_len, get_char_array_at, put_char_array_at);
    array_accessors!(i16, 2, get_short, put_short, get_short_at, put_short_at,
        get_short_array, put_short_array, put_short_array_len, get_short_array_at, put_short_array_at);
    array_accessors!(i32, 4, get_int, put_int, get_int_at, put_int_at,
        get_int_array, put_int_array, put_int_array_len, get_int_array_at, put_int_array_at);
    array_accessors!(i64, 8, get_long, put_long, get_long_at, put_long_at,
        get_long_array, put_long_array, put_long_array_len, get_long_array_at, put_long_array_at);
    array_accessors!(f32, 4, get_float, put_float, get_float_at, put_float_at,
        get_float_array, put_float_array, put_float_array_len, get_float_array_at, put_float_array_at);
    array_accessors!(f64, 8, get_double, put_double, get_double_at, put_double_at,
        get_double_array, put_double_array, put_double_array_len, get_double_array_at, put_double_array_at);

    // Raw bytes

    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_additional_capacity(bytes.len())?;
        let index = self.position();
        self.as_mut_slice()[index..index + bytes.len()].copy_from_slice(bytes);
        self.advance_write(bytes.len())
    }

    /// Borrow `len` readable bytes starting at `index`
    fn slice_at(&self, index: usize, len: usize) -> Result<&[u8]> {
        self.check_read(index, len)?;
        Ok(&self.as_slice()[index..index + len])
    }

    // Strings

    /// Write raw string bytes as `count | bytes | NUL`
    fn put_string_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_additional_capacity(LENGTH_PREFIX + bytes.len() + 1)?;
        self.put_length(bytes.len() + 1)?;
        self.put_bytes(bytes)?;
        self.put_byte(0)
    }

    /// Read raw string bytes, dropping the trailing NUL
    fn get_string_bytes(&mut self) -> Result<Vec<u8>> {
        let count = self.get_length()?;
        let start = self.position();
        let mut bytes = self.slice_at(start, count)?.to_vec();
        self.set_position(start + count)?;
        if bytes.last() == Some(&0) {
            bytes.pop();
        }
        Ok(bytes)
    }

    /// Variable-width string: UTF-8 unless simple strings are enforced
    fn put_string(&mut self, value: &str) -> Result<()> {
        if self.is_enforce_simple_strings() {
            return self.put_string_iso8859(value);
        }
        self.put_string_bytes(value.as_bytes())
    }

    /// Single-byte string; characters above U+00FF become `?`
    fn put_string_iso8859(&mut self, value: &str) -> Result<()> {
        self.put_string_bytes(&iso8859_bytes(value))
    }

    fn get_string(&mut self) -> Result<String> {
        if self.is_enforce_simple_strings() {
            return self.get_string_iso8859();
        }
        let bytes = self.get_string_bytes()?;
        String::from_utf8(bytes).map_err(|e| BufferError::InvalidString(e.to_string()))
    }

    fn get_string_iso8859(&mut self) -> Result<String> {
        let bytes = self.get_string_bytes()?;
        Ok(iso8859_string(&bytes))
    }

    /// Returns the number of bytes written.
    fn put_string_at(&mut self, index: usize, value: &str) -> Result<usize> {
        let bytes = if self.is_enforce_simple_strings() {
            iso8859_bytes(value)
        } else {
            value.as_bytes().to_vec()
        };
        let total = LENGTH_PREFIX + bytes.len() + 1;
        self.check_write(index, total)?;
        self.put_int_at(index, length_prefix(bytes.len() + 1)?)?;
        let start = index + LENGTH_PREFIX;
        let region = self.as_mut_slice();
        region[start..start + bytes.len()].copy_from_slice(&bytes);
        region[start + bytes.len()] = 0;
        Ok(total)
    }

    fn get_string_at(&self, index: usize) -> Result<String> {
        let count = self.get_length_at(index)?;
        let mut bytes = self.slice_at(index + LENGTH_PREFIX, count)?;
        if bytes.last() == Some(&0) {
            bytes = &bytes[..bytes.len() - 1];
        }
        if self.is_enforce_simple_strings() {
            return Ok(iso8859_string(bytes));
        }
        String::from_utf8(bytes.to_vec()).map_err(|e| BufferError::InvalidString(e.to_string()))
    }

    fn put_string_array<S: AsRef<str>>(&mut self, values: &[S]) -> Result<()>
    where
        Self: Sized,
    {
        self.put_length(values.len())?;
        for value in values {
            self.put_string(value.as_ref())?;
        }
        Ok(())
    }

    fn get_string_array(&mut self) -> Result<Vec<String>> {
        let count = self.get_length()?;
        // every string needs at least its length prefix
        self.check_read(self.position(), count.checked_mul(LENGTH_PREFIX).unwrap_or(usize::MAX))?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.get_string()?);
        }
        Ok(values)
    }
}
