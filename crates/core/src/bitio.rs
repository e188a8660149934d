//! Bit-addressable byte buffer.
//!
//! [`BitBuffer`] owns a growable byte buffer and exposes it bit by bit in
//! MSB-first order: bit 0 is the most significant bit of byte 0, bit 8 the
//! most significant bit of byte 1, and so on.
//!
//! It serves both sides of the channel:
//! - the sender wraps encoded bytes and walks them with [`BitBuffer::bits`]
//! - the receiver writes bits as they arrive and realigns its current word
//!   window with [`BitBuffer::shift_window_left`]
//!
//! # Example
//! ```
//! use bitchannel_core::bitio::BitBuffer;
//!
//! let mut buf = BitBuffer::new();
//! buf.set_bit(0, true);
//! buf.set_bit(2, true);
//! assert_eq!(buf.byte(0), Some(0b1010_0000));
//! assert_eq!(buf.bit_len(), 3);
//!
//! let bits: Vec<bool> = buf.bits().collect();
//! assert_eq!(bits, vec![true, false, true]);
//! ```

/// Growable buffer with per-bit access.
///
/// # Invariants
/// - `bytes.len() * 8 >= bit_len`
/// - bits past `bit_len` inside the last byte are whatever was last written
///   there (a window shift may leave zeros behind)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    /// Backing storage
    bytes: Vec<u8>,
    /// Logical length in bits
    bit_len: usize,
}

impl BitBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `byte_capacity` bytes.
    pub fn with_capacity(byte_capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(byte_capacity),
            bit_len: 0,
        }
    }

    /// Wrap existing bytes; every bit is part of the logical length.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let bit_len = bytes.len() * 8;
        Self { bytes, bit_len }
    }

    /// Read bit `index`. Bits outside the backing storage read as `false`.
    pub fn get_bit(&self, index: usize) -> bool {
        match self.bytes.get(index >> 3) {
            Some(byte) => (byte >> (7 - (index & 7))) & 1 == 1,
            None => false,
        }
    }

    /// Write bit `index`, growing the buffer if needed.
    ///
    /// The logical length becomes at least `index + 1`.
    pub fn set_bit(&mut self, index: usize, value: bool) {
        let byte_index = index >> 3;
        if byte_index >= self.bytes.len() {
            self.grow_to(byte_index + 1);
        }

        let mask = 0x80 >> (index & 7);
        if value {
            self.bytes[byte_index] |= mask;
        } else {
            self.bytes[byte_index] &= !mask;
        }
        self.bit_len = self.bit_len.max(index + 1);
    }

    /// Left-shift the 16-bit big-endian window at `byte_offset` by `bit_count`.
    ///
    /// Bits shifted past the top of the window are discarded and zeros fill
    /// in from the right. Missing bytes are allocated (as zero) first.
    pub fn shift_window_left(&mut self, byte_offset: usize, bit_count: u32) {
        if byte_offset + 2 > self.bytes.len() {
            self.grow_to(byte_offset + 2);
        }

        let window = u16::from_be_bytes([self.bytes[byte_offset], self.bytes[byte_offset + 1]]);
        let shifted = window.checked_shl(bit_count).unwrap_or(0);
        let [hi, lo] = shifted.to_be_bytes();
        self.bytes[byte_offset] = hi;
        self.bytes[byte_offset + 1] = lo;
    }

    /// Append `count` zeroed bytes to the backing storage.
    ///
    /// Does not change the logical bit length.
    pub fn grow(&mut self, count: usize) {
        self.grow_to(self.bytes.len() + count);
    }

    /// Reallocate-and-copy to hold at least `byte_len` bytes.
    fn grow_to(&mut self, byte_len: usize) {
        if byte_len <= self.bytes.len() {
            return;
        }
        let mut grown = Vec::with_capacity(byte_len.max(self.bytes.len() * 2));
        grown.extend_from_slice(&self.bytes);
        grown.resize(byte_len, 0);
        self.bytes = grown;
    }

    /// Read a whole byte of the backing storage.
    pub fn byte(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Backing bytes, including any trailing partial byte.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Logical length in bits.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Number of bytes in the backing storage.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Set the logical length, e.g. after rolling back a bit.
    ///
    /// Never shrinks the backing storage.
    pub fn truncate_bits(&mut self, bit_len: usize) {
        self.bit_len = self.bit_len.min(bit_len);
    }

    /// Check if no bits have been written.
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Iterate over all logical bits, MSB-first.
    ///
    /// The iterator borrows the buffer; call again to restart.
    pub fn bits(&self) -> Bits<'_> {
        Bits {
            buffer: self,
            position: 0,
        }
    }
}

impl<'a> IntoIterator for &'a BitBuffer {
    type Item = bool;
    type IntoIter = Bits<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.bits()
    }
}

/// Finite iterator over the bits of a [`BitBuffer`].
#[derive(Debug, Clone)]
pub struct Bits<'a> {
    buffer: &'a BitBuffer,
    position: usize,
}

impl Iterator for Bits<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.position >= self.buffer.bit_len {
            return None;
        }
        let bit = self.buffer.get_bit(self.position);
        self.position += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.bit_len - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Bits<'_> {}
