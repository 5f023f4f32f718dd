//! E2E Suite: canonical wire-format scenarios.
//!
//! Each test pins exact byte sequences for a small input so the token
//! grammar, dictionary slots, delta tiers, and column strategies cannot
//! drift without being noticed.

use serde_json::{json, Value};

use packr::{Encoder, EncoderConfig};

fn raw_config() -> EncoderConfig {
    EncoderConfig { compress: false, ..EncoderConfig::default() }
}

fn body_of(frame: &[u8]) -> &[u8] {
    assert_eq!(&frame[..4], b"PKR1");
    &frame[7..frame.len() - 4]
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 1: single object with an int and a MAC
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn single_object_tokens() {
    let mut enc = Encoder::new(raw_config());
    enc.value(&json!({"rssi": -45, "mac": "AA:BB:CC:DD:EE:FF"})).unwrap();
    let frame = enc.finish().unwrap();
    let expected: Vec<u8> = vec![
        0xDC, // OBJECT_START
        0xD5, 0x04, b'r', b's', b's', b'i', // NEW_FIELD "rssi"
        0xC0, 0x59, // INT zigzag(-45)
        0xD5, 0x03, b'm', b'a', b'c', // NEW_FIELD "mac"
        0xD6, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, // NEW_MAC
        0xDD, // OBJECT_END
    ];
    assert_eq!(body_of(&frame), expected.as_slice());
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 2: second object over a live encoder: refs and a small delta
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn second_object_uses_refs_and_delta() {
    let mut enc = Encoder::new(raw_config());
    enc.value(&json!({"rssi": -45, "mac": "AA:BB:CC:DD:EE:FF"})).unwrap();
    let first_len = enc.body_len();
    enc.value(&json!({"rssi": -42, "mac": "AA:BB:CC:DD:EE:FF"})).unwrap();
    let frame = enc.finish().unwrap();
    let body = body_of(&frame);
    // DELTA_SMALL for +3 is 0xC3 + (3 + 8) = 0xCE; field[0]=rssi,
    // field[1]=mac, mac[0] hit.
    assert_eq!(&body[first_len..], &[0xDC, 0x00, 0xCE, 0x01, 0x80, 0xDD]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 3: constant column
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn constant_column_single_literal() {
    let mut enc = Encoder::new(raw_config());
    enc.value(&json!([{"k": 7}, {"k": 7}, {"k": 7}, {"k": 7}])).unwrap();
    let frame = enc.finish().unwrap();
    let expected: Vec<u8> = vec![
        0xE9, 0x04, 0x01, // ULTRA_BATCH, 4 rows, 1 column
        0xD5, 0x01, b'k', // NEW_FIELD "k"
        0x01, // flags: CONSTANT
        0xC0, 0x0E, // INT 7
    ];
    assert_eq!(body_of(&frame), expected.as_slice());
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 4: bit-packed column
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn bitpack_column_nibbles() {
    let mut enc = Encoder::new(raw_config());
    enc.value(&json!([{"x": 100}, {"x": 101}, {"x": 100}, {"x": 99}])).unwrap();
    let frame = enc.finish().unwrap();
    let expected: Vec<u8> = vec![
        0xE9, 0x04, 0x01, // ULTRA_BATCH, 4 rows, 1 column
        0xD5, 0x01, b'x', // NEW_FIELD "x"
        0x02, // flags: NUMERIC
        0xC0, 0xC8, 0x01, // base INT 100
        0xEB, 0x03, // BITPACK_COL, count 3
        0x97, // (+1 + 8) << 4 | (−1 + 8)
        0x78, // (−1 + 8) << 4 | padding nibble 8
    ];
    assert_eq!(body_of(&frame), expected.as_slice());
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 5: Rice column over ±200 deltas
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn rice_column_compact_and_exact() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x5EED_0042);
    let mut series = vec![0i64];
    for _ in 0..100 {
        let delta: i64 = rng.gen_range(-200..=200);
        let next = series.last().unwrap() + delta;
        series.push(next);
    }
    let rows: Vec<Value> = series.iter().map(|v| json!({ "s": v })).collect();
    let v = Value::Array(rows);

    let mut enc = Encoder::new(raw_config());
    enc.value(&v).unwrap();
    let frame = enc.finish().unwrap();
    let body = body_of(&frame);

    let rice_at = body
        .iter()
        .position(|&b| b == 0xED)
        .expect("Rice coding should be selected for these deltas");
    // RICE_COLUMN | count varint (100 → 0x64) | K | bits, bits < 150 bytes.
    assert_eq!(body[rice_at + 1], 100);
    let bitstream_len = body.len() - (rice_at + 3);
    assert!(bitstream_len < 150, "rice payload is {bitstream_len} bytes");

    let back = packr::decode(&frame).unwrap();
    assert_eq!(back[0], v, "rice series must reconstruct exactly");
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 6: MFV column with a 70% mode
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn mfv_column_mode_plus_exceptions() {
    let rows: Vec<Value> = (0..10)
        .map(|i| json!({ "status": if [2, 5, 8].contains(&i) { "err" } else { "ok" } }))
        .collect();
    let v = Value::Array(rows);
    let mut enc = Encoder::new(raw_config());
    enc.value(&v).unwrap();
    let frame = enc.finish().unwrap();
    let expected: Vec<u8> = vec![
        0xE9, 0x0A, 0x01, // ULTRA_BATCH, 10 rows, 1 column
        0xD5, 0x06, b's', b't', b'a', b't', b'u', b's', // NEW_FIELD
        0x04, // flags: RLE-capable
        0xEE, 0x0A, // MFV_COLUMN, count 10
        0xD4, 0x02, b'o', b'k', // mode NEW_STRING "ok"
        0x24, 0x01, // exception bitmap: bits 2, 5, 8
        0xD4, 0x03, b'e', b'r', b'r', // first exception NEW_STRING "err"
        0x41, 0x41, // remaining exceptions hit the dictionary
    ];
    assert_eq!(body_of(&frame), expected.as_slice());

    let back = packr::decode(&frame).unwrap();
    assert_eq!(back[0], v);
}
