// Token-level tests for the scalar encoder and decoder.
//
// Frames are built with compression disabled so the body sits directly
// between the 7-byte header (magic, version, flags, 1-byte symbol count)
// and the 4-byte CRC trailer.

use serde_json::json;

use packr::error::PackrError;
use packr::{Decoder, DecoderConfig, Encoder, EncoderConfig};

fn raw_config() -> EncoderConfig {
    EncoderConfig { compress: false, ..EncoderConfig::default() }
}

/// Body bytes of an unwrapped frame with a single-byte symbol count.
fn body_of(frame: &[u8]) -> &[u8] {
    assert_eq!(&frame[..4], b"PKR1");
    assert_eq!(frame[4], 0x01);
    assert_eq!(frame[5], 0x00);
    assert!(frame[6] < 0x80, "symbol count should fit one varint byte here");
    &frame[7..frame.len() - 4]
}

// ---------------------------------------------------------------------------
// Delta tiers
// ---------------------------------------------------------------------------

#[test]
fn delta_tier_selection_per_field() {
    let mut enc = Encoder::new(raw_config());
    for v in [10i64, 10, 11, 10, 5, 55, 5055] {
        enc.value(&json!({ "v": v })).unwrap();
    }
    let frame = enc.finish().unwrap();
    let body = body_of(&frame);
    let expected: Vec<u8> = vec![
        0xDC, 0xD5, 0x01, b'v', 0xC0, 0x14, 0xDD, // literal 10
        0xDC, 0x00, 0xE6, 0xDD, // DELTA_ZERO
        0xDC, 0x00, 0xE7, 0xDD, // DELTA_ONE
        0xDC, 0x00, 0xE8, 0xDD, // DELTA_NEG_ONE
        0xDC, 0x00, 0xC6, 0xDD, // DELTA_SMALL −5
        0xDC, 0x00, 0xEC, 0x72, 0xDD, // DELTA_MEDIUM +50
        0xDC, 0x00, 0xD3, 0x90, 0x4E, 0xDD, // DELTA_LARGE +5000
    ];
    assert_eq!(body, expected.as_slice());
}

#[test]
fn no_delta_large_for_small_moves() {
    // |Δ| ≤ 7 under one field must never emit DELTA_LARGE (0xD3).
    let mut enc = Encoder::new(raw_config());
    let mut v = 100i64;
    for step in [1i64, -3, 7, -7, 2, 0, 5, -6, 4, -1] {
        v += step;
        enc.value(&json!({ "x": v })).unwrap();
    }
    let frame = enc.finish().unwrap();
    assert!(
        !body_of(&frame).contains(&0xD3),
        "small deltas must never use DELTA_LARGE"
    );
}

#[test]
fn array_elements_inherit_field_delta_context() {
    // Three ints under one field: the 2nd and 3rd ride deltas.
    let mut enc = Encoder::new(raw_config());
    enc.value(&json!({ "a": [100, 101, 102] })).unwrap();
    let frame = enc.finish().unwrap();
    let body = body_of(&frame);
    let expected: Vec<u8> = vec![
        0xDC, 0xD5, 0x01, b'a', // { "a":
        0xDA, 0x03, // ARRAY_START count 3
        0xC0, 0xC8, 0x01, // INT 100
        0xE7, // DELTA_ONE
        0xE7, // DELTA_ONE
        0xDB, // ARRAY_END
        0xDD, // }
    ];
    assert_eq!(body, expected.as_slice());
}

#[test]
fn kind_switch_resets_delta_chain() {
    // Int then float under the same field: the float re-bases as a literal,
    // and a following int re-bases again.
    let mut enc = Encoder::new(raw_config());
    enc.value(&json!({ "m": 5 })).unwrap();
    enc.value(&json!({ "m": 2.5 })).unwrap();
    enc.value(&json!({ "m": 6 })).unwrap();
    let frame = enc.finish().unwrap();
    let body = body_of(&frame);
    let expected: Vec<u8> = vec![
        0xDC, 0xD5, 0x01, b'm', 0xC0, 0x0A, 0xDD, // INT 5
        0xDC, 0x00, 0xC1, 0x80, 0x02, 0xDD, // FLOAT16 2.5 (0x0280 = 640 = 2.5*256)
        0xDC, 0x00, 0xC0, 0x0C, 0xDD, // INT 6 (fresh literal, not a delta)
    ];
    assert_eq!(body, expected.as_slice());
}

// ---------------------------------------------------------------------------
// Dictionaries on the wire
// ---------------------------------------------------------------------------

#[test]
fn string_and_mac_references_after_first_use() {
    let mut enc = Encoder::new(raw_config());
    enc.value(&json!({ "ssid": "lab", "ap": "AA:BB:CC:DD:EE:FF" })).unwrap();
    enc.value(&json!({ "ssid": "lab", "ap": "AA:BB:CC:DD:EE:FF" })).unwrap();
    let frame = enc.finish().unwrap();
    let body = body_of(&frame);
    let expected: Vec<u8> = vec![
        0xDC, 0xD5, 0x04, b's', b's', b'i', b'd', // NEW_FIELD ssid
        0xD4, 0x03, b'l', b'a', b'b', // NEW_STRING lab
        0xD5, 0x02, b'a', b'p', // NEW_FIELD ap
        0xD6, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, // NEW_MAC
        0xDD,
        0xDC, 0x00, // FIELD_REF ssid
        0x40, // STRING_REF slot 0
        0x01, // FIELD_REF ap
        0x80, // MAC_REF slot 0
        0xDD,
    ];
    assert_eq!(body, expected.as_slice());
}

#[test]
fn decoder_renders_macs_uppercase_colon_separated() {
    let v = json!({ "ap": "aa-bb-cc-00-11-22" });
    let bytes = packr::encode(&v).unwrap();
    let back = packr::decode(&bytes).unwrap();
    assert_eq!(back[0]["ap"], json!("AA:BB:CC:00:11:22"));
}

#[test]
fn near_mac_strings_stay_strings() {
    for s in ["AA:BB:CC:DD:EE:F", "AA:BB:CC:DD:EE:FG", "AA:BB:CC:DD:EE:FF:00", "hello, world 17c"] {
        let v = json!({ "s": s });
        let back = packr::decode(&packr::encode(&v).unwrap()).unwrap();
        assert_eq!(back[0]["s"], json!(s), "{s:?} must round-trip verbatim");
    }
}

// ---------------------------------------------------------------------------
// Structural balance
// ---------------------------------------------------------------------------

#[test]
fn finish_inside_open_object_fails() {
    let mut enc = Encoder::new(raw_config());
    enc.object_start().unwrap();
    assert_eq!(enc.finish().unwrap_err(), PackrError::UnbalancedContainer);
}

#[test]
fn mismatched_close_fails() {
    let mut enc = Encoder::new(raw_config());
    enc.object_start().unwrap();
    assert_eq!(enc.array_end().unwrap_err(), PackrError::UnbalancedContainer);
}

#[test]
fn field_outside_object_fails() {
    let mut enc = Encoder::new(raw_config());
    assert_eq!(enc.field("x").unwrap_err(), PackrError::UnbalancedContainer);
    let mut enc = Encoder::new(raw_config());
    enc.array_start(1).unwrap();
    assert_eq!(enc.field("x").unwrap_err(), PackrError::UnbalancedContainer);
}

// ---------------------------------------------------------------------------
// Decoder-side delta guards
// ---------------------------------------------------------------------------

#[test]
fn delta_without_base_is_rejected() {
    // Hand-build a frame whose body applies a delta to a never-based field.
    let body = [0xDC, 0xD5, 0x01, b'q', 0xE7, 0xDD]; // { q: DELTA_ONE }
    let frame = frame_around(&body, 1);
    assert_eq!(
        Decoder::new(DecoderConfig::default()).decode_frame(&frame).unwrap_err(),
        PackrError::DeltaWithoutBase
    );
}

#[test]
fn delta_at_top_level_is_rejected() {
    let body = [0xE7]; // DELTA_ONE with no field context at all
    let frame = frame_around(&body, 1);
    assert_eq!(
        Decoder::new(DecoderConfig::default()).decode_frame(&frame).unwrap_err(),
        PackrError::DeltaWithoutBase
    );
}

/// Wrap a raw body in a valid unwrapped frame.
fn frame_around(body: &[u8], symbols: u8) -> Vec<u8> {
    let mut frame = b"PKR1".to_vec();
    frame.push(0x01);
    frame.push(0x00);
    frame.push(symbols);
    frame.extend_from_slice(body);
    let crc = packr::crc32::crc32(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}
