//! `serde_json::Value` adapter: the bridge between JSON values and the
//! event-driven encoder.
//!
//! The adapter recognizes MAC-shaped strings, routes numbers onto the
//! int / fixed-point / double lattice, and redirects qualifying arrays of
//! objects to the columnar batch encoder.

use serde_json::{Number, Value};

use crate::column::analyze::analyze;
use crate::error::PackrResult;
use crate::scalar::encode::Encoder;
use crate::varint::fixed16_exact;

/// Parse the 17-character `XX:XX:XX:XX:XX:XX` / `XX-XX-XX-XX-XX-XX` forms
/// (hex case-insensitive, one separator style throughout).
pub(crate) fn parse_mac(s: &str) -> Option<[u8; 6]> {
    let b = s.as_bytes();
    if b.len() != 17 {
        return None;
    }
    let sep = b[2];
    if sep != b':' && sep != b'-' {
        return None;
    }
    let mut out = [0u8; 6];
    for (i, chunk) in b.chunks(3).enumerate() {
        if chunk.len() == 3 && chunk[2] != sep {
            return None;
        }
        let hi = hex_nibble(chunk[0])?;
        let lo = hex_nibble(chunk[1])?;
        out[i] = hi << 4 | lo;
    }
    Some(out)
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Encoder {
    /// Encode one JSON value, batching qualifying arrays.
    pub fn value(&mut self, v: &Value) -> PackrResult<()> {
        match v {
            Value::Null => self.null(),
            Value::Bool(b) => self.bool_value(*b),
            Value::Number(n) => self.number(n),
            Value::String(s) => match parse_mac(s) {
                Some(addr) => self.mac(addr),
                None => self.string(s),
            },
            Value::Array(items) => self.array_value(items),
            Value::Object(map) => {
                self.object_start()?;
                for (key, val) in map {
                    self.field(key)?;
                    self.value(val)?;
                }
                self.object_end()
            }
        }
    }

    /// String cell that may be a MAC; shared with the column encoder so batch
    /// cells and scalar cells normalize identically.
    pub(crate) fn emit_string_or_mac(&mut self, s: &str) {
        match parse_mac(s) {
            Some(addr) => self.emit_mac_raw(addr),
            None => self.emit_string_raw(s),
        }
    }

    /// Numbers ride the lattice: i32 when it fits, fixed-point when exactly
    /// representable in 16.16, full double otherwise. Integers beyond i32
    /// take the double route with f64 semantics.
    fn number(&mut self, n: &Number) -> PackrResult<()> {
        if let Some(i) = n.as_i64() {
            if let Ok(v) = i32::try_from(i) {
                return self.int32(v);
            }
        }
        match n.as_f64() {
            Some(f) if fixed16_exact(f).is_some() => self.float(f),
            Some(f) => self.double(f),
            None => self.null(),
        }
    }

    fn array_value(&mut self, items: &[Value]) -> PackrResult<()> {
        if items.len() >= self.cfg.batch_threshold {
            if let Some(plans) = analyze(items) {
                if items.len() <= self.cfg.partial_rows {
                    self.encode_batch(items.len(), &plans, false)?;
                    self.value_done();
                    return Ok(());
                }
                // Large qualifying array: stream it out in self-contained
                // chunks. Chunk qualification follows from whole-array
                // qualification, so the per-chunk analyze cannot miss.
                drop(plans);
                self.array_stream()?;
                let chunk_rows = self.cfg.partial_rows;
                for rows in items.chunks(chunk_rows) {
                    match analyze(rows) {
                        Some(chunk_plans) => {
                            self.encode_batch(rows.len(), &chunk_plans, true)?;
                        }
                        None => {
                            for row in rows {
                                self.value(row)?;
                            }
                        }
                    }
                }
                return self.array_end();
            }
        }
        self.array_start(items.len() as u64)?;
        for item in items {
            self.value(item)?;
        }
        self.array_end()
    }
}
