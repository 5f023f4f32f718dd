//! E2E Suite: the `packr` binary as a black box.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::{json, Value};
use tempfile::TempDir;

/// Locate the `packr` binary produced by Cargo.
fn packr_bin() -> PathBuf {
    if let Ok(p) = std::env::var("CARGO_BIN_EXE_packr") {
        return PathBuf::from(p);
    }
    let mut p = std::env::current_exe().unwrap();
    p.pop();
    if p.ends_with("deps") {
        p.pop();
    }
    p.push("packr");
    p
}

fn make_input(dir: &TempDir, value: &Value) -> PathBuf {
    let path = dir.path().join("input.json");
    fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

fn telemetry_value() -> Value {
    let rows: Vec<Value> = (0..100)
        .map(|i| {
            json!({
                "seq": i,
                "rssi": -40 - (i % 8),
                "mac": "AA:BB:CC:DD:EE:FF",
                "status": if i % 10 == 0 { "err" } else { "ok" },
            })
        })
        .collect();
    json!({ "scan": rows })
}

// ─────────────────────────────────────────────────────────────────────────────
// encode / decode round trip
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn cli_encode_decode_roundtrip() {
    let dir = TempDir::new().unwrap();
    let value = telemetry_value();
    let input = make_input(&dir, &value);
    let packed = dir.path().join("out.pkr");
    let unpacked = dir.path().join("back.json");

    let status = Command::new(packr_bin())
        .args(["encode", input.to_str().unwrap(), "-o", packed.to_str().unwrap()])
        .status()
        .expect("failed to run packr encode");
    assert!(status.success());
    assert!(packed.exists());

    let status = Command::new(packr_bin())
        .args(["decode", packed.to_str().unwrap(), "-o", unpacked.to_str().unwrap()])
        .status()
        .expect("failed to run packr decode");
    assert!(status.success());

    let back: Value = serde_json::from_str(&fs::read_to_string(&unpacked).unwrap()).unwrap();
    assert_eq!(back, value);
}

#[test]
fn cli_default_output_name_appends_extension() {
    let dir = TempDir::new().unwrap();
    let input = make_input(&dir, &json!({"a": 1}));
    let status = Command::new(packr_bin())
        .args(["-q", "encode", input.to_str().unwrap()])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(dir.path().join("input.json.pkr").exists());
}

#[test]
fn cli_streaming_mode_roundtrips() {
    let dir = TempDir::new().unwrap();
    let value = telemetry_value();
    let input = make_input(&dir, &value);
    let packed = dir.path().join("out.pkr");

    let status = Command::new(packr_bin())
        .args([
            "encode",
            input.to_str().unwrap(),
            "-o",
            packed.to_str().unwrap(),
            "--streaming",
        ])
        .status()
        .unwrap();
    assert!(status.success());

    let bytes = fs::read(&packed).unwrap();
    let decoded = packr::decode(&bytes).unwrap();
    assert_eq!(decoded, vec![value]);
}

#[test]
fn cli_no_compress_skips_the_wrapper() {
    let dir = TempDir::new().unwrap();
    let input = make_input(&dir, &telemetry_value());
    let packed = dir.path().join("out.pkr");
    let status = Command::new(packr_bin())
        .args([
            "encode",
            input.to_str().unwrap(),
            "-o",
            packed.to_str().unwrap(),
            "--no-compress",
        ])
        .status()
        .unwrap();
    assert!(status.success());
    let bytes = fs::read(&packed).unwrap();
    assert_eq!(&bytes[..4], b"PKR1");
}

#[test]
fn cli_decode_to_stdout() {
    let dir = TempDir::new().unwrap();
    let value = json!({"k": [1, 2, 3]});
    let input = make_input(&dir, &value);
    let packed = dir.path().join("out.pkr");
    Command::new(packr_bin())
        .args(["encode", input.to_str().unwrap(), "-o", packed.to_str().unwrap()])
        .status()
        .unwrap();

    let output = Command::new(packr_bin())
        .args(["decode", packed.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let back: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(back, value);
}

#[test]
fn cli_info_reports_frame_details() {
    let dir = TempDir::new().unwrap();
    let input = make_input(&dir, &telemetry_value());
    let packed = dir.path().join("out.pkr");
    Command::new(packr_bin())
        .args(["encode", input.to_str().unwrap(), "-o", packed.to_str().unwrap()])
        .status()
        .unwrap();

    let output = Command::new(packr_bin())
        .args(["info", packed.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("crc:"), "info output: {text}");
    assert!(text.contains("values:     1"), "info output: {text}");
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure paths
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn cli_rejects_invalid_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, b"{not json").unwrap();
    let status = Command::new(packr_bin())
        .args(["-q", "encode", path.to_str().unwrap()])
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn cli_rejects_corrupt_frames() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.pkr");
    fs::write(&path, b"definitely not a frame").unwrap();
    let status = Command::new(packr_bin())
        .args(["-q", "decode", path.to_str().unwrap()])
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn cli_rejects_missing_input() {
    let status = Command::new(packr_bin())
        .args(["-q", "encode", "/nonexistent/path.json"])
        .status()
        .unwrap();
    assert!(!status.success());
}
