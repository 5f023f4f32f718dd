//! Token-driven scalar decoder.
//!
//! The decoder is the dumb half of the pair by design: it never guesses what
//! the encoder's heuristics chose, it just dispatches on the token in front
//! of it. Dictionaries and per-field delta state are rebuilt incrementally
//! from NEW_* tokens, running the same LRU policy as the encoder so slot
//! assignments line up.

use serde_json::{Map, Number, Value};

use crate::config::DecoderConfig;
use crate::dict::Dict;
use crate::error::{DictKind, PackrError, PackrResult};
use crate::frame;
use crate::scalar::{new_field_state, FieldNum, NumKind};
use crate::token;
use crate::varint::{fixed16_to_f64, ByteReader};

/// One decoding stream. Feed it whole frames; dictionaries persist across
/// frames of the same stream.
pub struct Decoder {
    pub(crate) cfg: DecoderConfig,
    pub(crate) fields: Dict,
    pub(crate) strings: Dict,
    pub(crate) macs: Dict,
    pub(crate) field_state: [FieldNum; token::DICT_CAPACITY],
    /// Bytes materialized so far, checked against `cfg.max_output_bytes`.
    pub(crate) allocated: usize,
}

impl Decoder {
    pub fn new(cfg: DecoderConfig) -> Self {
        Decoder {
            cfg,
            fields: Dict::new(DictKind::Field),
            strings: Dict::new(DictKind::String),
            macs: Dict::new(DictKind::Mac),
            field_state: new_field_state(),
            allocated: 0,
        }
    }

    /// Decode one frame (optionally LZ77-wrapped) into its top-level values.
    /// The allocation budget is per frame; dictionaries and delta state
    /// persist across frames of the stream.
    pub fn decode_frame(&mut self, bytes: &[u8]) -> PackrResult<Vec<Value>> {
        self.allocated = 0;
        let parsed = frame::parse_frame(bytes, &self.cfg)?;
        let mut r = ByteReader::new(&parsed.body);
        let mut values = Vec::new();
        if parsed.symbol_count == 0 {
            // Streaming frames carry no up-front count; read to the end.
            while !r.is_empty() {
                values.push(self.read_value(&mut r, None)?);
            }
        } else {
            for _ in 0..parsed.symbol_count {
                values.push(self.read_value(&mut r, None)?);
            }
            if !r.is_empty() {
                return Err(PackrError::BadToken(r.peek_u8()?));
            }
        }
        Ok(values)
    }

    // ── Value dispatch ───────────────────────────────────────────────────────

    /// Read one complete value. `field` is the slot whose delta context is
    /// active: the innermost enclosing object's current field, inherited
    /// through arrays.
    pub(crate) fn read_value(
        &mut self,
        r: &mut ByteReader<'_>,
        field: Option<u8>,
    ) -> PackrResult<Value> {
        let tok = r.read_u8()?;
        match tok {
            token::OBJECT_START => self.read_object(r),
            token::ARRAY_START => {
                let count = r.read_uvarint64()?;
                let mut items = Vec::new();
                for _ in 0..count {
                    items.push(self.read_value(r, field)?);
                }
                if r.read_u8()? != token::ARRAY_END {
                    return Err(PackrError::UnbalancedContainer);
                }
                Ok(Value::Array(items))
            }
            token::ARRAY_STREAM => {
                let mut items = Vec::new();
                loop {
                    match r.peek_u8()? {
                        token::ARRAY_END => {
                            r.read_u8()?;
                            return Ok(Value::Array(items));
                        }
                        token::BATCH_PARTIAL => {
                            r.read_u8()?;
                            self.read_batch_rows(r, &mut items)?;
                        }
                        _ => items.push(self.read_value(r, field)?),
                    }
                }
            }
            token::ULTRA_BATCH => {
                let mut rows = Vec::new();
                self.read_batch_rows(r, &mut rows)?;
                Ok(Value::Array(rows))
            }
            _ => self.read_scalar(tok, r, field),
        }
    }

    fn read_object(&mut self, r: &mut ByteReader<'_>) -> PackrResult<Value> {
        let mut map = Map::new();
        loop {
            let tok = r.read_u8()?;
            let slot = match tok {
                token::OBJECT_END => return Ok(Value::Object(map)),
                token::NEW_FIELD => self.read_new_field(r)?,
                t if token::is_field_ref(t) => {
                    self.fields.touch(t)?;
                    t
                }
                t => return Err(PackrError::BadToken(t)),
            };
            let name = String::from_utf8(self.fields.get(slot)?.to_vec())
                .map_err(|_| PackrError::BadToken(token::NEW_FIELD))?;
            let value = self.read_value(r, Some(slot))?;
            map.insert(name, value);
        }
    }

    /// NEW_FIELD payload: insert the name, and kill any delta context left
    /// behind by the evicted occupant of the chosen slot.
    pub(crate) fn read_new_field(&mut self, r: &mut ByteReader<'_>) -> PackrResult<u8> {
        let len = r.read_uvarint32()? as usize;
        self.charge_alloc(len)?;
        let bytes = r.read_bytes(len)?.to_vec();
        let slot = self.fields.insert(bytes);
        self.field_state[slot as usize] = FieldNum::default();
        Ok(slot)
    }

    // ── Scalar leaves ────────────────────────────────────────────────────────

    /// Decode one scalar token, updating the active field's delta context the
    /// same way the encoder did.
    pub(crate) fn read_scalar(
        &mut self,
        tok: u8,
        r: &mut ByteReader<'_>,
        field: Option<u8>,
    ) -> PackrResult<Value> {
        match tok {
            token::NULL => Ok(Value::Null),
            token::BOOL_TRUE => Ok(Value::Bool(true)),
            token::BOOL_FALSE => Ok(Value::Bool(false)),
            token::INT => {
                let v = r.read_ivarint32()?;
                if let Some(slot) = field {
                    self.field_state[slot as usize] =
                        FieldNum { last: v as i64, kind: NumKind::Int };
                }
                Ok(Value::from(v))
            }
            token::FLOAT16 => {
                let b = r.read_bytes(2)?;
                let half = i16::from_le_bytes([b[0], b[1]]);
                let fx = (half as i64) << 8;
                if let Some(slot) = field {
                    self.field_state[slot as usize] = FieldNum { last: fx, kind: NumKind::Fixed };
                }
                json_f64(fixed16_to_f64(fx))
            }
            token::FLOAT32 => {
                let b = r.read_bytes(4)?;
                let fx = i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64;
                if let Some(slot) = field {
                    self.field_state[slot as usize] = FieldNum { last: fx, kind: NumKind::Fixed };
                }
                json_f64(fixed16_to_f64(fx))
            }
            token::DOUBLE => {
                let b = r.read_bytes(8)?;
                let v = f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]);
                if let Some(slot) = field {
                    self.field_state[slot as usize] = FieldNum::default();
                }
                json_f64(v)
            }
            token::BINARY => {
                let len = r.read_uvarint64()? as usize;
                self.charge_alloc(len)?;
                let bytes = r.read_bytes(len)?;
                Ok(Value::Array(bytes.iter().map(|&b| Value::from(b)).collect()))
            }
            token::NEW_STRING => {
                let len = r.read_uvarint32()? as usize;
                self.charge_alloc(len)?;
                let bytes = r.read_bytes(len)?.to_vec();
                let s = String::from_utf8(bytes).map_err(|_| PackrError::BadToken(tok))?;
                self.strings.insert(s.clone().into_bytes());
                Ok(Value::String(s))
            }
            t if token::is_string_ref(t) => {
                let slot = t & 0x3F;
                self.strings.touch(slot)?;
                let s = String::from_utf8(self.strings.get(slot)?.to_vec())
                    .map_err(|_| PackrError::BadToken(t))?;
                Ok(Value::String(s))
            }
            token::NEW_MAC => {
                let bytes = r.read_bytes(6)?.to_vec();
                let s = mac_string(&bytes);
                self.macs.insert(bytes);
                Ok(Value::String(s))
            }
            t if token::is_mac_ref(t) => {
                let slot = t & 0x3F;
                self.macs.touch(slot)?;
                Ok(Value::String(mac_string(self.macs.get(slot)?)))
            }
            _ => {
                let delta = read_delta_payload(tok, r)?;
                self.apply_delta(delta, field)
            }
        }
    }

    /// Apply a delta to the active field's context and produce the value.
    fn apply_delta(&mut self, delta: i64, field: Option<u8>) -> PackrResult<Value> {
        let slot = field.ok_or(PackrError::DeltaWithoutBase)?;
        let st = &mut self.field_state[slot as usize];
        match st.kind {
            NumKind::None => Err(PackrError::DeltaWithoutBase),
            NumKind::Int => {
                st.last += delta;
                Ok(Value::from(st.last))
            }
            NumKind::Fixed => {
                st.last += delta;
                json_f64(fixed16_to_f64(st.last))
            }
        }
    }

    /// Bound decoder-side materialization per `DecoderConfig`.
    pub(crate) fn charge_alloc(&mut self, bytes: usize) -> PackrResult<()> {
        self.allocated = self.allocated.saturating_add(bytes);
        if self.cfg.max_output_bytes > 0 && self.allocated > self.cfg.max_output_bytes {
            return Err(PackrError::AllocationFailed);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Free helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Decode the delta carried by a delta-class token, or reject the byte.
pub(crate) fn read_delta_payload(tok: u8, r: &mut ByteReader<'_>) -> PackrResult<i64> {
    match tok {
        token::DELTA_ZERO => Ok(0),
        token::DELTA_ONE => Ok(1),
        token::DELTA_NEG_ONE => Ok(-1),
        t if token::is_delta_small(t) => Ok(token::delta_small_value(t)),
        token::DELTA_MEDIUM => Ok(r.read_u8()? as i64 - 64),
        token::DELTA_LARGE => r.read_ivarint64(),
        t => Err(PackrError::BadToken(t)),
    }
}

/// Is this byte a delta-class token?
pub(crate) fn is_delta_token(tok: u8) -> bool {
    matches!(
        tok,
        token::DELTA_ZERO | token::DELTA_ONE | token::DELTA_NEG_ONE | token::DELTA_MEDIUM
            | token::DELTA_LARGE
    ) || token::is_delta_small(tok)
}

/// Render a 6-byte MAC in the canonical colon-separated uppercase form.
pub(crate) fn mac_string(bytes: &[u8]) -> String {
    debug_assert_eq!(bytes.len(), 6);
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Wrap a finite float as a JSON number; NaN/inf cannot appear in a valid
/// stream.
pub(crate) fn json_f64(v: f64) -> PackrResult<Value> {
    Number::from_f64(v)
        .map(Value::Number)
        .ok_or(PackrError::BadToken(token::DOUBLE))
}
