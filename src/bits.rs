//! MSB-first bit accumulator and reader for Rice-coded column payloads.
//!
//! The writer packs bits into bytes most-significant-bit first and pads the
//! final byte with zero bits on flush. The reader mirrors that order and
//! surfaces [`PackrError::Truncated`] at end of stream; running past the end
//! is always a stream error here, never silent zero-fill, because a Rice
//! quotient that underflows must fail the whole frame.

use crate::error::{PackrError, PackrResult};

/// Accumulates bits MSB-first into a byte vector.
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Bits already used in the final byte, 0..8. 8 means "full".
    used: u8,
}

impl Default for BitWriter {
    fn default() -> Self {
        BitWriter { bytes: Vec::new(), used: 8 }
    }
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes produced so far, counting the partially filled tail byte.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn write_bit(&mut self, bit: bool) {
        if self.used == 8 {
            self.bytes.push(0);
            self.used = 0;
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 1 << (7 - self.used);
        }
        self.used += 1;
    }

    /// Write the low `n` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, n: u8) {
        debug_assert!(n <= 32);
        for i in (0..n).rev() {
            self.write_bit(value >> i & 1 == 1);
        }
    }

    /// Write `n` zero bits followed by a one bit, the unary prefix of a Rice
    /// codeword.
    pub fn write_unary(&mut self, n: u32) {
        for _ in 0..n {
            self.write_bit(false);
        }
        self.write_bit(true);
    }

    /// Pad the trailing byte with zeros and return the buffer.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads bits MSB-first from a byte slice.
pub struct BitReader<'a> {
    data: &'a [u8],
    byte: usize,
    bit: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader { data, byte: 0, bit: 0 }
    }

    /// Bytes touched so far (the current partially consumed byte counts).
    pub fn bytes_consumed(&self) -> usize {
        self.byte + if self.bit > 0 { 1 } else { 0 }
    }

    pub fn read_bit(&mut self) -> PackrResult<bool> {
        let byte = *self.data.get(self.byte).ok_or(PackrError::Truncated)?;
        let bit = byte >> (7 - self.bit) & 1 == 1;
        self.bit += 1;
        if self.bit == 8 {
            self.bit = 0;
            self.byte += 1;
        }
        Ok(bit)
    }

    /// Read `n` bits MSB-first into the low bits of a `u32`.
    pub fn read_bits(&mut self, n: u8) -> PackrResult<u32> {
        debug_assert!(n <= 32);
        let mut value = 0u32;
        for _ in 0..n {
            value = value << 1 | self.read_bit()? as u32;
        }
        Ok(value)
    }

    /// Count zero bits up to the terminating one bit. `limit` bounds how long
    /// a quotient a well-formed stream may carry.
    pub fn read_unary(&mut self, limit: u32) -> PackrResult<u32> {
        let mut n = 0u32;
        while !self.read_bit()? {
            n += 1;
            if n > limit {
                return Err(PackrError::Truncated);
            }
        }
        Ok(n)
    }
}
