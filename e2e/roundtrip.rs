//! E2E Suite: whole-pipeline round trips.
//!
//! `decode(encode(v))` must reproduce `v` under the numeric lattice
//! (`int ⊑ fixed ⊑ double`): a float that is exactly an integer may come
//! back as that integer when a column constant-folds it; everything else
//! must match bit for bit.

use serde_json::{json, Value};

use packr::{DecoderConfig, Encoder, EncoderConfig};

fn roundtrip_with(v: &Value, cfg: &EncoderConfig) -> Value {
    let frame = packr::encode_with(v, cfg).unwrap();
    let mut values = packr::decode(&frame).unwrap();
    assert_eq!(values.len(), 1, "one value in, one value out");
    values.remove(0)
}

fn roundtrip(v: &Value) -> Value {
    roundtrip_with(v, &EncoderConfig::default())
}

/// Equality under the numeric lattice: numbers compare by f64 value,
/// everything else structurally.
fn lattice_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().unwrap_or(f64::NAN) == y.as_f64().unwrap_or(f64::NAN)
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| lattice_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, va)| y.get(k).is_some_and(|vb| lattice_eq(va, vb)))
        }
        _ => a == b,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scalars and small structures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scalar_leaves() {
    for v in [
        json!(null),
        json!(true),
        json!(false),
        json!(0),
        json!(-1),
        json!(i32::MAX),
        json!(i32::MIN),
        json!(1.5),
        json!(-273.15),
        json!(0.000123456789),
        json!(""),
        json!("plain string"),
        json!("AA:BB:CC:DD:EE:FF"),
    ] {
        assert_eq!(roundtrip(&v), v, "{v} must round-trip exactly");
    }
}

#[test]
fn integers_beyond_i32_take_the_double_route() {
    let v = json!(5_000_000_000i64);
    let back = roundtrip(&v);
    assert!(lattice_eq(&back, &v), "got {back}");
}

#[test]
fn nested_structures() {
    let v = json!({
        "device": "sensor-17",
        "readings": {"temp": 21.5, "hum": 48, "flags": [true, false, null]},
        "tags": ["a", "b", "a", "a"],
        "uptime": 123456
    });
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn empty_containers() {
    for v in [json!({}), json!([]), json!({"a": {}}), json!({"a": []})] {
        assert_eq!(roundtrip(&v), v);
    }
}

#[test]
fn multiple_values_per_frame() {
    let mut enc = Encoder::new(EncoderConfig::default());
    let values: Vec<Value> =
        (0..10).map(|i| json!({"seq": i, "rssi": -40 - i})).collect();
    for v in &values {
        enc.value(v).unwrap();
    }
    let frame = enc.finish().unwrap();
    let back = packr::decode(&frame).unwrap();
    assert_eq!(back, values);
}

// ─────────────────────────────────────────────────────────────────────────────
// Dictionary churn
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn more_than_64_field_names_evict_and_recover() {
    // 100 distinct fields force evictions; every object must still decode,
    // because references after eviction are preceded by fresh NEW_FIELDs.
    let mut enc = Encoder::new(EncoderConfig::default());
    let values: Vec<Value> = (0..100)
        .map(|i| {
            let mut obj = serde_json::Map::new();
            obj.insert(format!("field_{i}"), json!(i));
            obj.insert(format!("field_{}", i % 7), json!(i * 2));
            Value::Object(obj)
        })
        .collect();
    for v in &values {
        enc.value(v).unwrap();
    }
    let frame = enc.finish().unwrap();
    let back = packr::decode(&frame).unwrap();
    assert_eq!(back, values);
}

#[test]
fn string_dictionary_churn() {
    let mut enc = Encoder::new(EncoderConfig::default());
    let values: Vec<Value> = (0..300)
        .map(|i| json!({"tag": format!("t-{}", i % 90)}))
        .collect();
    for v in &values {
        enc.value(v).unwrap();
    }
    let frame = enc.finish().unwrap();
    assert_eq!(packr::decode(&frame).unwrap(), values);
}

#[test]
fn field_eviction_resets_delta_state() {
    // Fill the field table, evict the numeric field, then re-introduce it.
    // The re-introduced field must re-base with a full literal (the decoder
    // would fail on a delta without base otherwise).
    let mut enc = Encoder::new(EncoderConfig::default());
    let mut values = vec![json!({"n": 1000})];
    for i in 0..70 {
        let mut obj = serde_json::Map::new();
        obj.insert(format!("pad_{i}"), json!(i));
        values.push(Value::Object(obj));
    }
    values.push(json!({"n": 1003}));
    for v in &values {
        enc.value(v).unwrap();
    }
    let frame = enc.finish().unwrap();
    assert_eq!(packr::decode(&frame).unwrap(), values);
}

// ─────────────────────────────────────────────────────────────────────────────
// Batches end to end
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn telemetry_shaped_batch() {
    let rows: Vec<Value> = (0..50)
        .map(|i| {
            json!({
                "seq": i,
                "rssi": -45 + (i % 3),
                "mac": if i % 2 == 0 { "AA:BB:CC:DD:EE:FF" } else { "11:22:33:44:55:66" },
                "status": if i % 9 == 0 { "err" } else { "ok" },
            })
        })
        .collect();
    let v = Value::Array(rows);
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn large_array_streams_in_partial_batches() {
    let rows: Vec<Value> = (0..1000)
        .map(|i| json!({"seq": i, "val": (i * 7) % 400}))
        .collect();
    let v = Value::Array(rows);

    // Confirm the wire shape: ARRAY_STREAM … BATCH_PARTIAL … ARRAY_END.
    let cfg = EncoderConfig { compress: false, ..EncoderConfig::default() };
    let frame = packr::encode_with(&v, &cfg).unwrap();
    let body = &frame[7..frame.len() - 4];
    assert_eq!(body[0], 0xEF, "expected ARRAY_STREAM");
    assert_eq!(body[1], 0xF0, "expected BATCH_PARTIAL");
    assert_eq!(*body.last().unwrap(), 0xDB, "expected ARRAY_END");

    assert_eq!(roundtrip(&v), v);
    assert_eq!(roundtrip_with(&v, &cfg), v);
}

#[test]
fn constant_float_column_demotes_to_int_under_the_lattice() {
    let v = json!([{"f": 7.0}, {"f": 7.0}, {"f": 7.0}, {"f": 7.0}]);
    let back = roundtrip(&v);
    assert!(lattice_eq(&back, &v), "got {back}");
}

// ─────────────────────────────────────────────────────────────────────────────
// Compressed frames
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn compressed_and_uncompressed_frames_agree() {
    let rows: Vec<Value> = (0..200)
        .map(|i| json!({"seq": i, "ssid": "repeated-network-name", "ch": 6}))
        .collect();
    let v = Value::Array(rows);

    let plain = packr::encode_with(
        &v,
        &EncoderConfig { compress: false, ..EncoderConfig::default() },
    )
    .unwrap();
    let packed = packr::encode_with(&v, &EncoderConfig::default()).unwrap();

    assert_eq!(packr::decode(&plain).unwrap(), packr::decode(&packed).unwrap());
}

#[test]
fn repetitive_frames_get_wrapped() {
    let rows: Vec<Value> = (0..64)
        .map(|_| json!({"name": "the-same-string-every-time", "n": 1}))
        .collect();
    // Scalar path (below batch threshold per element shape variety is not
    // needed; force repetition through one big string value).
    let v = json!({ "rows": rows, "blob": "abcdefgh".repeat(100) });
    let packed = packr::encode(&v).unwrap();
    assert_eq!(&packed[..2], &[0xFE, 0x03], "expected the LZ77 wrap prefix");
    assert_eq!(packr::decode(&packed).unwrap(), vec![v]);
}

#[test]
fn decoder_allocation_cap_is_enforced() {
    let v = json!({ "blob": "x".repeat(100_000) });
    let frame = packr::encode(&v).unwrap();
    let tight = DecoderConfig { max_output_bytes: 1024 };
    assert_eq!(
        packr::decode_with(&frame, &tight).unwrap_err(),
        packr::PackrError::AllocationFailed
    );
}
