// Unit tests for src/crc32.rs: IEEE CRC-32 parity vectors.

use packr::crc32::{crc32, Crc32State};

#[test]
fn empty_input_is_zero() {
    assert_eq!(crc32(b""), 0x0000_0000);
}

#[test]
fn check_vector() {
    // The classic check value for the reflected IEEE polynomial.
    assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
}

#[test]
fn streaming_matches_oneshot() {
    let data = b"per-field delta state and three LRU dictionaries";
    let mut hasher = Crc32State::new();
    hasher.update(&data[..10]);
    hasher.update(&data[10..]);
    assert_eq!(hasher.finalize(), crc32(data));
}

#[test]
fn single_bit_flip_changes_checksum() {
    let data = b"telemetry frame body".to_vec();
    let base = crc32(&data);
    for byte in 0..data.len() {
        for bit in 0..8 {
            let mut flipped = data.clone();
            flipped[byte] ^= 1 << bit;
            assert_ne!(crc32(&flipped), base, "flip at byte {byte} bit {bit} undetected");
        }
    }
}
