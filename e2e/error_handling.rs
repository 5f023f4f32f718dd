//! E2E Suite: every decode-side error kind reachable from the public API.

use serde_json::json;

use packr::crc32::crc32;
use packr::{DecoderConfig, Decoder, EncoderConfig, PackrError};

fn decode_err(bytes: &[u8]) -> PackrError {
    Decoder::new(DecoderConfig::default())
        .decode_frame(bytes)
        .expect_err("frame should be rejected")
}

/// Wrap a raw body in a valid unwrapped frame.
fn frame_around(body: &[u8], symbols: u8) -> Vec<u8> {
    let mut frame = b"PKR1".to_vec();
    frame.push(0x01);
    frame.push(0x00);
    frame.push(symbols);
    frame.extend_from_slice(body);
    let crc = crc32(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

// ─────────────────────────────────────────────────────────────────────────────
// Header-level failures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn bad_magic() {
    assert_eq!(decode_err(b"JSON{\"a\":1}xxxx"), PackrError::BadMagic);
}

#[test]
fn bad_version() {
    let mut frame = frame_around(&[0xD9], 1);
    frame[4] = 0x02;
    // Recompute the CRC so only the version is at fault.
    let body_end = frame.len() - 4;
    let crc = crc32(&frame[..body_end]);
    frame[body_end..].copy_from_slice(&crc.to_le_bytes());
    assert_eq!(decode_err(&frame), PackrError::BadVersion(0x02));
}

#[test]
fn reserved_flag_bits_rejected() {
    let mut frame = frame_around(&[0xD9], 1);
    frame[5] = 0x10;
    let body_end = frame.len() - 4;
    let crc = crc32(&frame[..body_end]);
    frame[body_end..].copy_from_slice(&crc.to_le_bytes());
    assert_eq!(decode_err(&frame), PackrError::BadToken(0x10));
}

#[test]
fn truncated_header() {
    assert_eq!(decode_err(b"PKR"), PackrError::Truncated);
    assert_eq!(decode_err(b"PKR1\x01"), PackrError::Truncated);
}

#[test]
fn truncated_body() {
    let frame = packr::encode(&json!({"k": "a string payload"})).unwrap();
    for cut in 1..5 {
        let short = &frame[..frame.len() - cut];
        let err = decode_err(short);
        assert!(
            matches!(err, PackrError::Truncated | PackrError::CrcMismatch { .. }),
            "cut {cut}: unexpected {err:?}"
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CRC: any single-bit flip is detected
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn every_single_bit_flip_is_detected() {
    let cfg = EncoderConfig { compress: false, ..EncoderConfig::default() };
    let frame =
        packr::encode_with(&json!({"rssi": -45, "seq": 19}), &cfg).unwrap();
    for byte in 0..frame.len() {
        for bit in 0..8 {
            let mut bent = frame.clone();
            bent[byte] ^= 1 << bit;
            assert!(
                packr::decode(&bent).is_err(),
                "flip at byte {byte} bit {bit} slipped through"
            );
        }
    }
}

#[test]
fn crc_mismatch_reports_both_values() {
    let cfg = EncoderConfig { compress: false, ..EncoderConfig::default() };
    let mut frame = packr::encode_with(&json!([1, 2, 3]), &cfg).unwrap();
    let end = frame.len();
    frame[end - 1] ^= 0xFF;
    match decode_err(&frame) {
        PackrError::CrcMismatch { stored, computed } => assert_ne!(stored, computed),
        other => panic!("expected CrcMismatch, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token-level failures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn reference_to_empty_slot() {
    // STRING_REF slot 5 with an empty dictionary.
    let frame = frame_around(&[0x45], 1);
    assert_eq!(
        decode_err(&frame),
        PackrError::EmptySlot { dict: packr::DictKind::String, slot: 5 }
    );
}

#[test]
fn mac_reference_to_empty_slot() {
    let frame = frame_around(&[0x83], 1);
    assert_eq!(
        decode_err(&frame),
        PackrError::EmptySlot { dict: packr::DictKind::Mac, slot: 3 }
    );
}

#[test]
fn field_reference_to_empty_slot() {
    // OBJECT_START, FIELD_REF 0 with no prior NEW_FIELD.
    let frame = frame_around(&[0xDC, 0x00, 0xD9, 0xDD], 1);
    assert_eq!(
        decode_err(&frame),
        PackrError::EmptySlot { dict: packr::DictKind::Field, slot: 0 }
    );
}

#[test]
fn undefined_token_byte() {
    // 0xF5 is unassigned.
    let frame = frame_around(&[0xF5], 1);
    assert_eq!(decode_err(&frame), PackrError::BadToken(0xF5));
}

#[test]
fn trailing_garbage_after_declared_symbols() {
    let frame = frame_around(&[0xD9, 0xD9], 1);
    assert_eq!(decode_err(&frame), PackrError::BadToken(0xD9));
}

#[test]
fn unbalanced_array_close() {
    // ARRAY_START count 1, a value, then OBJECT_END instead of ARRAY_END.
    let frame = frame_around(&[0xDA, 0x01, 0xD9, 0xDD], 1);
    assert_eq!(decode_err(&frame), PackrError::UnbalancedContainer);
}

#[test]
fn object_missing_end() {
    let frame = frame_around(&[0xDC, 0xD5, 0x01, b'a', 0xD9], 1);
    assert_eq!(decode_err(&frame), PackrError::Truncated);
}

// ─────────────────────────────────────────────────────────────────────────────
// Column payload failures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn batch_with_underflowing_rice_stream_fails_whole_frame() {
    // ULTRA_BATCH, 4 rows, 1 col "n", NUMERIC flags, base INT 0,
    // RICE_COLUMN count 3, K = 7, but only one byte of bitstream.
    let body = [
        0xE9, 0x04, 0x01, 0xD5, 0x01, b'n', 0x02, 0xC0, 0x00, 0xED, 0x03, 0x07,
        0x00,
    ];
    let frame = frame_around(&body, 1);
    assert_eq!(decode_err(&frame), PackrError::Truncated);
}

#[test]
fn batch_rle_overrun_fails() {
    // 4 rows but the repeat claims 9 more values.
    let body = [
        0xE9, 0x04, 0x01, 0xD5, 0x01, b'n', 0x02, 0xC0, 0x00, 0xE5, 0x09,
    ];
    let frame = frame_around(&body, 1);
    assert_eq!(decode_err(&frame), PackrError::BadToken(0xE5));
}

#[test]
fn batch_bad_column_flags() {
    // Reserved column-flag bits set.
    let body = [0xE9, 0x04, 0x01, 0xD5, 0x01, b'n', 0x80];
    let frame = frame_around(&body, 1);
    assert_eq!(decode_err(&frame), PackrError::BadToken(0x80));
}

// ─────────────────────────────────────────────────────────────────────────────
// LZ77 wrapper failures through the frame parser
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn wrapped_frame_with_bad_offset() {
    // FE 03, block format, declared 16 bytes, one literal then an offset of 5.
    let bytes = [
        0xFE, 0x03, 0x02, 16, 0, 0, 0, 0x10, b'Z', 0x05, 0x00,
    ];
    assert_eq!(decode_err(&bytes), PackrError::Lz77BadOffset);
}

#[test]
fn wrapped_frame_overflow() {
    // Declared 2 bytes but 4 literals arrive.
    let bytes = [0xFE, 0x03, 0x02, 2, 0, 0, 0, 0x40, b'a', b'b', b'c', b'd'];
    assert_eq!(decode_err(&bytes), PackrError::Lz77Overflow);
}

#[test]
fn wrapped_frame_truncated_payload() {
    let frame = packr::encode(&json!({"blob": "abcabcabc".repeat(200)})).unwrap();
    assert_eq!(&frame[..2], &[0xFE, 0x03]);
    let cut = &frame[..frame.len() / 2];
    assert!(packr::decode(cut).is_err());
}
