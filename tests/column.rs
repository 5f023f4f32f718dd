// Token-level tests for the column analyzer, encoder, and decoder.

use serde_json::{json, Value};

use packr::{Encoder, EncoderConfig};

fn raw_config() -> EncoderConfig {
    EncoderConfig { compress: false, ..EncoderConfig::default() }
}

fn body_of(frame: &[u8]) -> &[u8] {
    &frame[7..frame.len() - 4]
}

fn encode_raw(v: &Value) -> Vec<u8> {
    let mut enc = Encoder::new(raw_config());
    enc.value(v).unwrap();
    enc.finish().unwrap()
}

fn roundtrip(v: &Value) -> Value {
    let frame = encode_raw(v);
    let mut values = packr::decode(&frame).unwrap();
    assert_eq!(values.len(), 1);
    values.remove(0)
}

// ---------------------------------------------------------------------------
// Batch triggering
// ---------------------------------------------------------------------------

#[test]
fn four_homogeneous_rows_trigger_a_batch() {
    let v = json!([{"k": 7}, {"k": 7}, {"k": 7}, {"k": 7}]);
    let body = encode_raw(&v);
    assert_eq!(body_of(&body)[0], 0xE9, "expected ULTRA_BATCH");
}

#[test]
fn three_rows_stay_scalar() {
    let v = json!([{"k": 7}, {"k": 7}, {"k": 7}]);
    let body = encode_raw(&v);
    assert_eq!(body_of(&body)[0], 0xDA, "expected plain ARRAY_START");
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn nested_containers_disqualify_the_batch() {
    let v = json!([{"k": [1]}, {"k": [2]}, {"k": [3]}, {"k": [4]}]);
    let body = encode_raw(&v);
    assert_eq!(body_of(&body)[0], 0xDA);
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn mixed_scalar_types_disqualify_the_batch() {
    let v = json!([{"k": 1}, {"k": "two"}, {"k": 3}, {"k": 4}]);
    let body = encode_raw(&v);
    assert_eq!(body_of(&body)[0], 0xDA);
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn nulls_mixed_with_values_disqualify_the_batch() {
    let v = json!([{"k": 1}, {"k": null}, {"k": 3}, {"k": 4}]);
    let body = encode_raw(&v);
    assert_eq!(body_of(&body)[0], 0xDA);
    assert_eq!(roundtrip(&v), v);
}

// ---------------------------------------------------------------------------
// Strategy payloads
// ---------------------------------------------------------------------------

#[test]
fn all_null_column_is_constant_null() {
    let v = json!([{"k": null}, {"k": null}, {"k": null}, {"k": null}]);
    let frame = encode_raw(&v);
    let body = body_of(&frame);
    // ULTRA_BATCH 4 1 | NEW_FIELD k | flags CONSTANT | NULL
    let expected: Vec<u8> =
        vec![0xE9, 0x04, 0x01, 0xD5, 0x01, b'k', 0x01, 0xD9];
    assert_eq!(body, expected.as_slice());
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn missing_keys_produce_a_validity_bitmap() {
    let v = json!([{"k": 9}, {}, {"k": 9}, {}, {"k": 9}]);
    let frame = encode_raw(&v);
    let body = body_of(&frame);
    // flags = CONSTANT | HAS_NULLS; bitmap 0b10101 = 0x15; payload INT 9.
    let expected: Vec<u8> =
        vec![0xE9, 0x05, 0x01, 0xD5, 0x01, b'k', 0x09, 0x15, 0xC0, 0x12];
    assert_eq!(body, expected.as_slice());
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn sparse_column_roundtrips() {
    let v = json!([{"a": 1, "b": 2}, {"a": 2}, {"a": 3}, {"a": 4}]);
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn long_zero_runs_use_rle_not_bitpack() {
    // Three plateaus of five: no 60% mode, all deltas small, but the two
    // step deltas are dwarfed by collapsible zero runs, so the RLE estimate
    // wins over nibble packing.
    let rows: Vec<Value> = (0..15).map(|i| json!({ "z": 1 + i / 5 })).collect();
    let v = Value::Array(rows);
    let frame = encode_raw(&v);
    let body = body_of(&frame);
    // ULTRA_BATCH 15 1 | z | NUMERIC | INT 1 | RLE 4 | Δ+1 | RLE 4 | Δ+1 | RLE 4
    let expected: Vec<u8> = vec![
        0xE9, 0x0F, 0x01, 0xD5, 0x01, b'z', 0x02, 0xC0, 0x02, 0xE5, 0x04, 0xE7,
        0xE5, 0x04, 0xE7, 0xE5, 0x04,
    ];
    assert_eq!(body, expected.as_slice());
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn rice_column_for_wider_deltas() {
    // Deltas alternate ±50: outside the nibble range, well under 1024, and
    // the Rice bitstream lands under the 1.5-bytes-per-delta bar.
    let rows: Vec<Value> =
        (0..40).map(|i| json!({ "r": 1000 + (i % 2) * 50 })).collect();
    let v = Value::Array(rows);
    let frame = encode_raw(&v);
    let body = body_of(&frame);
    let rice_at = body.iter().position(|&b| b == 0xED);
    assert!(rice_at.is_some(), "expected a RICE_COLUMN payload");
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn bool_column_majority_uses_mfv() {
    // true holds 4 of 6, clearing the 60% bar.
    let v = json!([
        {"on": true}, {"on": true}, {"on": true},
        {"on": false}, {"on": false}, {"on": true}
    ]);
    let frame = encode_raw(&v);
    let body = body_of(&frame);
    assert!(body.contains(&0xEE), "expected MFV for a 4-of-6 majority");
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn bool_column_alternating_stays_rle() {
    let v = json!([
        {"on": true}, {"on": false}, {"on": true},
        {"on": false}, {"on": true}, {"on": false}
    ]);
    let frame = encode_raw(&v);
    let body = body_of(&frame);
    assert!(!body.contains(&0xEE), "no majority, MFV must not fire");
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn string_column_consecutive_runs_collapse() {
    // 4-of-7 occupancy stays under the 60% MFV bar, so runs collapse by
    // consecutive equality instead: value then RLE_REPEAT(run − 1).
    let v = json!([
        {"s": "aa"}, {"s": "aa"}, {"s": "aa"},
        {"s": "bb"}, {"s": "bb"}, {"s": "bb"}, {"s": "aa"}
    ]);
    let frame = encode_raw(&v);
    let body = body_of(&frame);
    assert!(!body.contains(&0xEE), "MFV must not fire at 4 of 7");
    assert!(body.contains(&0xE5), "expected RLE_REPEAT runs");
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn fixed_point_column_roundtrips_exact_floats() {
    let v = json!([
        {"t": 21.5}, {"t": 21.75}, {"t": 22.0}, {"t": 21.25}
    ]);
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn double_column_roundtrips_irregular_floats() {
    let v = json!([
        {"d": 0.1}, {"d": 0.2}, {"d": 0.30000000000000004}, {"d": 1e-9}
    ]);
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn mac_cells_inside_batches_use_the_mac_dictionary() {
    let v = json!([
        {"ap": "AA:BB:CC:DD:EE:FF"}, {"ap": "AA:BB:CC:DD:EE:FF"},
        {"ap": "11:22:33:44:55:66"}, {"ap": "AA:BB:CC:DD:EE:FF"}
    ]);
    let frame = encode_raw(&v);
    let body = body_of(&frame);
    assert!(body.contains(&0xD6), "expected NEW_MAC in batch payload");
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn multi_column_batch_roundtrips() {
    let rows: Vec<Value> = (0..20)
        .map(|i| {
            json!({
                "seq": i,
                "rssi": -40 - (i % 5),
                "ssid": if i % 4 == 0 { "lab" } else { "field" },
                "ok": i % 7 != 0,
            })
        })
        .collect();
    let v = Value::Array(rows);
    let frame = encode_raw(&v);
    assert_eq!(body_of(&frame)[0], 0xE9);
    assert_eq!(roundtrip(&v), v);
}
