//! Event-driven scalar encoder.
//!
//! The caller (usually the JSON adapter in [`crate::json`]) drives one event
//! per logical item: container brackets, field names, scalar leaves. Numeric
//! leaves consult the delta context of the active field slot and emit the
//! tightest delta token that holds; everything else is a literal or a
//! dictionary reference.

use crate::config::EncoderConfig;
use crate::dict::Dict;
use crate::error::{DictKind, PackrError, PackrResult};
use crate::mem::MemoryStats;
use crate::scalar::{active_field, new_field_state, Container, FieldNum, NumKind};
use crate::token;
use crate::varint::{
    fixed16_clamped, write_ivarint32, write_ivarint64, write_uvarint32, write_uvarint64,
};

// ─────────────────────────────────────────────────────────────────────────────
// Shared emission helpers (also used by the column encoder)
// ─────────────────────────────────────────────────────────────────────────────

/// Emit the tightest delta token for `delta`.
pub(crate) fn emit_delta(out: &mut Vec<u8>, delta: i64) {
    match delta {
        0 => out.push(token::DELTA_ZERO),
        1 => out.push(token::DELTA_ONE),
        -1 => out.push(token::DELTA_NEG_ONE),
        -8..=7 => out.push(token::delta_small_token(delta)),
        -64..=63 => {
            out.push(token::DELTA_MEDIUM);
            out.push((delta + 64) as u8);
        }
        _ => {
            out.push(token::DELTA_LARGE);
            write_ivarint64(out, delta);
        }
    }
}

/// `INT` literal.
pub(crate) fn emit_int_literal(out: &mut Vec<u8>, v: i32) {
    out.push(token::INT);
    write_ivarint32(out, v);
}

/// Fixed-point literal: FLOAT16 when the 16.16 value collapses exactly to
/// 8.8, FLOAT32 otherwise.
pub(crate) fn emit_fixed_literal(out: &mut Vec<u8>, fx: i32) {
    if fx & 0xFF == 0 {
        if let Ok(half) = i16::try_from(fx >> 8) {
            out.push(token::FLOAT16);
            out.extend_from_slice(&half.to_le_bytes());
            return;
        }
    }
    out.push(token::FLOAT32);
    out.extend_from_slice(&fx.to_le_bytes());
}

/// `DOUBLE` literal, full IEEE-754 precision.
pub(crate) fn emit_double_literal(out: &mut Vec<u8>, v: f64) {
    out.push(token::DOUBLE);
    out.extend_from_slice(&v.to_le_bytes());
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoder
// ─────────────────────────────────────────────────────────────────────────────

/// One encoding stream: owns its dictionaries, per-field delta state, and the
/// growing token body. Finish with [`Encoder::finish`] to frame, checksum,
/// and (optionally) LZ77-wrap the result.
pub struct Encoder {
    pub(crate) cfg: EncoderConfig,
    pub(crate) out: Vec<u8>,
    pub(crate) fields: Dict,
    pub(crate) strings: Dict,
    pub(crate) macs: Dict,
    pub(crate) field_state: [FieldNum; token::DICT_CAPACITY],
    pub(crate) stack: Vec<Container>,
    pub(crate) symbols: u64,
    pub(crate) stats: MemoryStats,
}

impl Encoder {
    pub fn new(cfg: EncoderConfig) -> Self {
        Encoder {
            cfg,
            out: Vec::new(),
            fields: Dict::new(DictKind::Field),
            strings: Dict::new(DictKind::String),
            macs: Dict::new(DictKind::Mac),
            field_state: new_field_state(),
            stack: Vec::new(),
            symbols: 0,
            stats: MemoryStats::default(),
        }
    }

    /// Working-memory snapshot: dictionaries plus the output buffer.
    pub fn memory_stats(&self) -> MemoryStats {
        self.stats
    }

    /// Raw token bytes produced so far (before framing).
    pub fn body_len(&self) -> usize {
        self.out.len()
    }

    // ── Scalar leaves ────────────────────────────────────────────────────────

    pub fn null(&mut self) -> PackrResult<()> {
        self.out.push(token::NULL);
        self.value_done();
        Ok(())
    }

    pub fn bool_value(&mut self, v: bool) -> PackrResult<()> {
        self.out.push(if v { token::BOOL_TRUE } else { token::BOOL_FALSE });
        self.value_done();
        Ok(())
    }

    pub fn int32(&mut self, v: i32) -> PackrResult<()> {
        match active_field(&self.stack) {
            Some(slot) => {
                let st = &mut self.field_state[slot as usize];
                if st.kind == NumKind::Int {
                    let delta = v as i64 - st.last;
                    emit_delta(&mut self.out, delta);
                    st.last += delta;
                } else {
                    emit_int_literal(&mut self.out, v);
                    *st = FieldNum { last: v as i64, kind: NumKind::Int };
                }
            }
            None => emit_int_literal(&mut self.out, v),
        }
        self.value_done();
        Ok(())
    }

    /// Lossy fixed-point route: the value is rounded and clamped to 16.16.
    /// Use [`Encoder::double`] when full precision matters.
    pub fn float(&mut self, v: f64) -> PackrResult<()> {
        let fx = fixed16_clamped(v);
        match active_field(&self.stack) {
            Some(slot) => {
                let st = &mut self.field_state[slot as usize];
                if st.kind == NumKind::Fixed {
                    let delta = fx as i64 - st.last;
                    emit_delta(&mut self.out, delta);
                    st.last += delta;
                } else {
                    emit_fixed_literal(&mut self.out, fx);
                    *st = FieldNum { last: fx as i64, kind: NumKind::Fixed };
                }
            }
            None => emit_fixed_literal(&mut self.out, fx),
        }
        self.value_done();
        Ok(())
    }

    /// Full-precision 64-bit float. Clears the field's delta context; doubles
    /// do not participate in delta chains.
    pub fn double(&mut self, v: f64) -> PackrResult<()> {
        emit_double_literal(&mut self.out, v);
        if let Some(slot) = active_field(&self.stack) {
            self.field_state[slot as usize] = FieldNum::default();
        }
        self.value_done();
        Ok(())
    }

    pub fn binary(&mut self, data: &[u8]) -> PackrResult<()> {
        self.out.push(token::BINARY);
        write_uvarint64(&mut self.out, data.len() as u64);
        self.out.extend_from_slice(data);
        self.value_done();
        Ok(())
    }

    pub fn string(&mut self, s: &str) -> PackrResult<()> {
        self.emit_string_raw(s);
        self.value_done();
        Ok(())
    }

    pub fn mac(&mut self, addr: [u8; 6]) -> PackrResult<()> {
        self.emit_mac_raw(addr);
        self.value_done();
        Ok(())
    }

    // ── Fields ───────────────────────────────────────────────────────────────

    /// Name the field the next value belongs to. Only valid directly inside
    /// an object.
    pub fn field(&mut self, name: &str) -> PackrResult<()> {
        if !matches!(self.stack.last(), Some(Container::Object { .. })) {
            return Err(PackrError::UnbalancedContainer);
        }
        let slot = self.emit_field_raw(name);
        if let Some(Container::Object { field }) = self.stack.last_mut() {
            *field = Some(slot);
        }
        Ok(())
    }

    // ── Containers ───────────────────────────────────────────────────────────

    pub fn object_start(&mut self) -> PackrResult<()> {
        self.out.push(token::OBJECT_START);
        self.stack.push(Container::Object { field: None });
        Ok(())
    }

    pub fn object_end(&mut self) -> PackrResult<()> {
        match self.stack.pop() {
            Some(Container::Object { .. }) => {
                self.out.push(token::OBJECT_END);
                self.value_done();
                Ok(())
            }
            _ => Err(PackrError::UnbalancedContainer),
        }
    }

    pub fn array_start(&mut self, count: u64) -> PackrResult<()> {
        self.out.push(token::ARRAY_START);
        write_uvarint64(&mut self.out, count);
        self.stack.push(Container::Array);
        Ok(())
    }

    /// Open a count-unknown array; close it with [`Encoder::array_end`].
    pub fn array_stream(&mut self) -> PackrResult<()> {
        self.out.push(token::ARRAY_STREAM);
        self.stack.push(Container::ArrayStream);
        Ok(())
    }

    pub fn array_end(&mut self) -> PackrResult<()> {
        match self.stack.pop() {
            Some(Container::Array) | Some(Container::ArrayStream) => {
                self.out.push(token::ARRAY_END);
                self.value_done();
                Ok(())
            }
            _ => Err(PackrError::UnbalancedContainer),
        }
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// Dictionary-routed string emission without value bookkeeping. The
    /// column encoder uses this directly so batch cells never perturb the
    /// symbol count.
    pub(crate) fn emit_string_raw(&mut self, s: &str) {
        let (slot, is_new) = self.strings.lookup_or_insert(s.as_bytes());
        if is_new {
            self.out.push(token::NEW_STRING);
            write_uvarint32(&mut self.out, s.len() as u32);
            self.out.extend_from_slice(s.as_bytes());
        } else {
            self.out.push(token::STRING_REF_BASE + slot);
        }
    }

    /// Dictionary-routed MAC emission without value bookkeeping.
    pub(crate) fn emit_mac_raw(&mut self, addr: [u8; 6]) {
        let (slot, is_new) = self.macs.lookup_or_insert(&addr);
        if is_new {
            self.out.push(token::NEW_MAC);
            self.out.extend_from_slice(&addr);
        } else {
            self.out.push(token::MAC_REF_BASE + slot);
        }
    }

    /// Field-dictionary emission shared by object bodies and batch column
    /// headers. A fresh slot may be a recycled one; its delta context dies
    /// with the old name, at this single insertion point.
    pub(crate) fn emit_field_raw(&mut self, name: &str) -> u8 {
        let (slot, is_new) = self.fields.lookup_or_insert(name.as_bytes());
        if is_new {
            self.field_state[slot as usize] = FieldNum::default();
            self.out.push(token::NEW_FIELD);
            write_uvarint32(&mut self.out, name.len() as u32);
            self.out.extend_from_slice(name.as_bytes());
        } else {
            self.out.push(token::FIELD_REF_BASE + slot);
        }
        slot
    }

    /// Bookkeeping after a complete value: top-level values feed the frame's
    /// symbol count, and the memory high-water mark is refreshed.
    pub(crate) fn value_done(&mut self) {
        if self.stack.is_empty() {
            self.symbols += 1;
        }
        let current = self.out.capacity()
            + self.fields.byte_size()
            + self.strings.byte_size()
            + self.macs.byte_size();
        self.stats.observe(current);
    }
}
