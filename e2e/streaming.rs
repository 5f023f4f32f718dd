//! E2E Suite: streaming frame encoder against the one-shot decoder.

use serde_json::{json, Value};

use packr::{DecoderConfig, Decoder, EncoderConfig, StreamingEncoder};

fn stream_encode(values: &[Value], cfg: EncoderConfig) -> Vec<u8> {
    let mut enc = StreamingEncoder::new(cfg, Vec::new()).unwrap();
    for v in values {
        enc.value(v).unwrap();
    }
    enc.finish().unwrap()
}

#[test]
fn compressed_stream_roundtrips() {
    let values: Vec<Value> = (0..200)
        .map(|i| json!({"seq": i, "ssid": "office-net", "rssi": -40 - (i % 6)}))
        .collect();
    let bytes = stream_encode(&values, EncoderConfig::default());
    assert_eq!(&bytes[..4], b"PKR1", "streaming header stays plaintext");
    assert_eq!(&bytes[7..9], &[0xFE, 0x03], "body rides the transform wrapper");
    assert_eq!(bytes[9], 0x03, "streaming format byte");
    let back = packr::decode(&bytes).unwrap();
    assert_eq!(back, values);
}

#[test]
fn uncompressed_stream_roundtrips() {
    let values: Vec<Value> =
        (0..20).map(|i| json!({"n": i, "tag": "x"})).collect();
    let cfg = EncoderConfig { compress: false, ..EncoderConfig::default() };
    let bytes = stream_encode(&values, cfg);
    assert_eq!(&bytes[..4], b"PKR1");
    assert_ne!(bytes[7], 0xFE, "no wrapper without compression");
    assert_eq!(packr::decode(&bytes).unwrap(), values);
}

#[test]
fn empty_stream_is_a_valid_frame() {
    let bytes = stream_encode(&[], EncoderConfig { compress: false, ..Default::default() });
    assert_eq!(packr::decode(&bytes).unwrap(), Vec::<Value>::new());
}

#[test]
fn empty_compressed_stream_is_a_valid_frame() {
    let bytes = stream_encode(&[], EncoderConfig::default());
    assert_eq!(packr::decode(&bytes).unwrap(), Vec::<Value>::new());
}

#[test]
fn streaming_and_buffered_decode_identically() {
    let values: Vec<Value> = (0..500)
        .map(|i| json!({"seq": i, "v": (i * 3) % 11, "s": "payload-string"}))
        .collect();

    let streamed = stream_encode(&values, EncoderConfig::default());

    let mut enc = packr::Encoder::new(EncoderConfig::default());
    for v in &values {
        enc.value(v).unwrap();
    }
    let buffered = enc.finish().unwrap();

    assert_eq!(packr::decode(&streamed).unwrap(), packr::decode(&buffered).unwrap());
}

#[test]
fn corrupted_streamed_body_fails_crc() {
    let values: Vec<Value> = (0..50).map(|i| json!({"n": i})).collect();
    let cfg = EncoderConfig { compress: false, ..EncoderConfig::default() };
    let mut bytes = stream_encode(&values, cfg);
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x01;
    let err = Decoder::new(DecoderConfig::default()).decode_frame(&bytes).unwrap_err();
    // A flip may be caught structurally first, but never decodes cleanly.
    assert!(
        matches!(
            err,
            packr::PackrError::CrcMismatch { .. }
                | packr::PackrError::BadToken(_)
                | packr::PackrError::Truncated
        ),
        "unexpected error {err:?}"
    );
}

#[test]
fn memory_stats_are_monotone_and_bounded() {
    let mut enc = StreamingEncoder::new(EncoderConfig::default(), Vec::new()).unwrap();
    let mut last_peak = 0;
    for i in 0..100 {
        enc.value(&json!({"seq": i, "pad": "some reading"})).unwrap();
        let stats = enc.memory_stats();
        assert!(stats.peak_bytes >= last_peak, "peak must not shrink");
        assert!(stats.peak_bytes >= stats.current_bytes || stats.current_bytes == 0);
        last_peak = stats.peak_bytes;
    }
    // Dictionaries are capped and the window is fixed; far under a megabyte.
    assert!(last_peak < 1 << 20, "working set {last_peak} bytes");
    enc.finish().unwrap();
}
