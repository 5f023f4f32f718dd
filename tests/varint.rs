// Unit tests for src/varint.rs: varints, ZigZag, fixed-point, ByteReader.

use packr::error::PackrError;
use packr::varint::{
    fixed16_clamped, fixed16_exact, fixed16_to_f64, fixed8_exact, unzigzag32, unzigzag64,
    write_ivarint32, write_ivarint64, write_uvarint32, write_uvarint64, zigzag32, zigzag64,
    ByteReader,
};

// ---------------------------------------------------------------------------
// Unsigned varints
// ---------------------------------------------------------------------------

#[test]
fn uvarint_single_byte_values() {
    for v in [0u32, 1, 42, 127] {
        let mut buf = Vec::new();
        write_uvarint32(&mut buf, v);
        assert_eq!(buf.len(), 1, "value {v} should fit one byte");
        assert_eq!(ByteReader::new(&buf).read_uvarint32().unwrap(), v);
    }
}

#[test]
fn uvarint_known_encoding() {
    let mut buf = Vec::new();
    write_uvarint32(&mut buf, 300);
    // 300 = 0b100101100 -> AC 02 (LSB group first, MSB continuation)
    assert_eq!(buf, [0xAC, 0x02]);
}

#[test]
fn uvarint32_max_is_five_bytes() {
    let mut buf = Vec::new();
    write_uvarint32(&mut buf, u32::MAX);
    assert_eq!(buf.len(), 5);
    assert_eq!(ByteReader::new(&buf).read_uvarint32().unwrap(), u32::MAX);
}

#[test]
fn uvarint64_roundtrip_large() {
    for v in [u64::from(u32::MAX) + 1, 1 << 40, u64::MAX] {
        let mut buf = Vec::new();
        write_uvarint64(&mut buf, v);
        assert_eq!(ByteReader::new(&buf).read_uvarint64().unwrap(), v);
    }
}

#[test]
fn uvarint_truncated_input_errors() {
    // Continuation bit set but no following byte.
    let buf = [0x80u8];
    assert_eq!(
        ByteReader::new(&buf).read_uvarint32().unwrap_err(),
        PackrError::Truncated
    );
}

// ---------------------------------------------------------------------------
// ZigZag
// ---------------------------------------------------------------------------

#[test]
fn zigzag32_small_values_interleave() {
    assert_eq!(zigzag32(0), 0);
    assert_eq!(zigzag32(-1), 1);
    assert_eq!(zigzag32(1), 2);
    assert_eq!(zigzag32(-2), 3);
    assert_eq!(zigzag32(2), 4);
}

#[test]
fn zigzag32_roundtrip_extremes() {
    for v in [i32::MIN, i32::MIN + 1, -45, 0, 45, i32::MAX] {
        assert_eq!(unzigzag32(zigzag32(v)), v);
    }
}

#[test]
fn zigzag64_roundtrip_extremes() {
    for v in [i64::MIN, -1, 0, 1, i64::MAX, (i32::MAX as i64) * 2] {
        assert_eq!(unzigzag64(zigzag64(v)), v);
    }
}

#[test]
fn ivarint_roundtrip() {
    let mut buf = Vec::new();
    write_ivarint32(&mut buf, -45);
    // zigzag(-45) = 89 = 0x59, single byte
    assert_eq!(buf, [0x59]);
    assert_eq!(ByteReader::new(&buf).read_ivarint32().unwrap(), -45);

    let mut buf = Vec::new();
    write_ivarint64(&mut buf, -5_000_000_000);
    assert_eq!(ByteReader::new(&buf).read_ivarint64().unwrap(), -5_000_000_000);
}

// ---------------------------------------------------------------------------
// Fixed-point
// ---------------------------------------------------------------------------

#[test]
fn fixed8_exact_accepts_quarter_steps() {
    assert_eq!(fixed8_exact(1.5), Some(384));
    assert_eq!(fixed8_exact(-1.0), Some(-256));
    assert_eq!(fixed8_exact(0.00390625), Some(1)); // 1/256
    assert_eq!(fixed8_exact(0.001), None);
    // 200 * 256 = 51200 overflows i16.
    assert_eq!(fixed8_exact(200.0), None);
}

#[test]
fn fixed16_exact_and_clamped() {
    assert_eq!(fixed16_exact(1.5), Some(98304));
    assert_eq!(fixed16_exact(-0.25), Some(-16384));
    assert_eq!(fixed16_exact(1.0e-6), None);
    assert_eq!(fixed16_clamped(1.0e9), i32::MAX);
    assert_eq!(fixed16_clamped(-1.0e9), i32::MIN);
    assert_eq!(fixed16_clamped(1.5), 98304);
}

#[test]
fn fixed16_to_f64_inverts_exact_values() {
    for v in [-32768.0, -1.5, 0.0, 0.5, 1.25, 32767.99998474121] {
        if let Some(fx) = fixed16_exact(v) {
            assert_eq!(fixed16_to_f64(fx as i64), v);
        }
    }
}

// ---------------------------------------------------------------------------
// ByteReader
// ---------------------------------------------------------------------------

#[test]
fn byte_reader_le_helpers() {
    let data = [0x78, 0x56, 0x34, 0x12, 0xEF, 0xBE];
    let mut r = ByteReader::new(&data);
    assert_eq!(r.read_le32().unwrap(), 0x1234_5678);
    assert_eq!(r.read_le16().unwrap(), 0xBEEF);
    assert!(r.is_empty());
}

#[test]
fn byte_reader_peek_does_not_consume() {
    let data = [0xAB, 0xCD];
    let mut r = ByteReader::new(&data);
    assert_eq!(r.peek_u8().unwrap(), 0xAB);
    assert_eq!(r.read_u8().unwrap(), 0xAB);
    assert_eq!(r.remaining(), 1);
}

#[test]
fn byte_reader_reads_past_end_error() {
    let mut r = ByteReader::new(&[0x01]);
    assert_eq!(r.read_bytes(2).unwrap_err(), PackrError::Truncated);
    // The failed read must not consume anything.
    assert_eq!(r.read_u8().unwrap(), 0x01);
    assert_eq!(r.read_u8().unwrap_err(), PackrError::Truncated);
}

#[test]
fn byte_reader_advance_and_rest() {
    let data = [1u8, 2, 3, 4];
    let mut r = ByteReader::new(&data);
    r.advance(2).unwrap();
    assert_eq!(r.rest(), &[3, 4]);
    assert_eq!(r.advance(3).unwrap_err(), PackrError::Truncated);
}
