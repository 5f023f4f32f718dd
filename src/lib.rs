//! PACKR: structure-aware streaming codec for JSON-shaped telemetry.
//!
//! A frame of JSON values becomes a compact self-describing token stream:
//! per-category LRU dictionaries for field names, strings, and MAC
//! addresses; per-field numeric delta chains; a columnar path for arrays of
//! homogeneous objects; and an optional LZ77 post-transform under a CRC-32
//! trailer. The decoder rebuilds everything from the stream alone; no
//! schema ever leaves the frame.
//!
//! ```
//! use serde_json::json;
//!
//! let v = json!({"rssi": -45, "mac": "AA:BB:CC:DD:EE:FF"});
//! let bytes = packr::encode(&v).unwrap();
//! let back = packr::decode(&bytes).unwrap();
//! assert_eq!(back, vec![v]);
//! ```

pub mod bits;
pub mod cli;
pub mod column;
pub mod config;
pub mod crc32;
pub mod dict;
pub mod error;
pub mod frame;
pub mod json;
pub mod lz77;
pub mod mem;
pub mod scalar;
pub mod token;
pub mod varint;

use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level convenience re-exports
// ─────────────────────────────────────────────────────────────────────────────

pub use config::{DecoderConfig, EncoderConfig};
pub use error::{DictKind, PackrError, PackrResult};
pub use frame::StreamingEncoder;
pub use lz77::stream::Lz77Stream;
pub use mem::MemoryStats;
pub use scalar::decode::Decoder;
pub use scalar::encode::Encoder;

/// Encode one JSON value into a finished frame with the default
/// configuration.
pub fn encode(value: &Value) -> PackrResult<Vec<u8>> {
    encode_with(value, &EncoderConfig::default())
}

/// Encode one JSON value into a finished frame.
pub fn encode_with(value: &Value, cfg: &EncoderConfig) -> PackrResult<Vec<u8>> {
    let mut enc = Encoder::new(*cfg);
    enc.value(value)?;
    enc.finish()
}

/// Decode a frame into its top-level values with the default configuration.
pub fn decode(bytes: &[u8]) -> PackrResult<Vec<Value>> {
    decode_with(bytes, &DecoderConfig::default())
}

/// Decode a frame into its top-level values.
pub fn decode_with(bytes: &[u8], cfg: &DecoderConfig) -> PackrResult<Vec<Value>> {
    Decoder::new(*cfg).decode_frame(bytes)
}
