//! Thin wrapper around the `crc32fast` crate providing the CRC-32 used for
//! frame trailers.
//!
//! The polynomial is the reflected IEEE one (`0xEDB88320`), initial value
//! `0xFFFFFFFF`, final XOR `0xFFFFFFFF`, i.e. the same CRC-32 as zlib and
//! Ethernet. Trailers are stored little-endian.
//!
//! # Parity vectors
//! * `crc32(b"")` == `0x00000000`
//! * `crc32(b"123456789")` == `0xCBF43926`

pub use crc32fast::Hasher as Crc32State;

/// One-shot CRC-32 over `data`.
#[inline]
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
