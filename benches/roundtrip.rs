//! Criterion benchmark: encode/decode a synthetic telemetry batch.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use serde_json::{json, Value};

fn telemetry_batch(rows: usize) -> Value {
    let items: Vec<Value> = (0..rows)
        .map(|i| {
            json!({
                "seq": i,
                "rssi": -40 - (i % 9),
                "mac": if i % 3 == 0 { "AA:BB:CC:DD:EE:FF" } else { "11:22:33:44:55:66" },
                "status": if i % 11 == 0 { "err" } else { "ok" },
                "temp": 20.0 + (i % 16) as f64 * 0.25,
            })
        })
        .collect();
    Value::Array(items)
}

fn bench_roundtrip(c: &mut Criterion) {
    let value = telemetry_batch(512);
    let json_len = serde_json::to_vec(&value).unwrap().len() as u64;
    let frame = packr::encode(&value).unwrap();

    let mut group = c.benchmark_group("telemetry-512");
    group.throughput(Throughput::Bytes(json_len));
    group.bench_function("encode", |b| {
        b.iter(|| packr::encode(black_box(&value)).unwrap())
    });
    group.bench_function("decode", |b| {
        b.iter(|| packr::decode(black_box(&frame)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_roundtrip);
criterion_main!(benches);
