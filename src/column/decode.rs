//! Column payload decoding: the decoder half of ULTRA_BATCH.
//!
//! The decoder never re-runs the encoder's heuristics: after the column
//! header it looks at the next token and lets that select the expansion.
//! A scalar literal opens a delta/RLE stream; MFV_COLUMN, BITPACK_COL, and
//! RICE_COLUMN announce themselves.

use serde_json::{Map, Value};

use crate::bits::BitReader;
use crate::column::read_bitmap;
use crate::error::{PackrError, PackrResult};
use crate::scalar::decode::{is_delta_token, json_f64, read_delta_payload, Decoder};
use crate::token;
use crate::varint::{fixed16_to_f64, unzigzag64, ByteReader};

/// Bound on a single Rice unary quotient; far above anything a conforming
/// encoder emits, low enough to fail fast on garbage.
const RICE_UNARY_LIMIT: u32 = 1 << 20;

/// Running numeric state while expanding one column.
enum ColCursor {
    Int(i64),
    Fixed(i64),
    /// Strings, bools, doubles, nulls; no delta arithmetic, only repeats.
    Plain(Value),
}

impl ColCursor {
    fn value(&self) -> PackrResult<Value> {
        match self {
            ColCursor::Int(v) => Ok(Value::from(*v)),
            ColCursor::Fixed(fx) => json_f64(fixed16_to_f64(*fx)),
            ColCursor::Plain(v) => Ok(v.clone()),
        }
    }

    fn apply_delta(&mut self, delta: i64) -> PackrResult<Value> {
        match self {
            ColCursor::Int(v) => {
                *v += delta;
                Ok(Value::from(*v))
            }
            ColCursor::Fixed(fx) => {
                *fx += delta;
                json_f64(fixed16_to_f64(*fx))
            }
            ColCursor::Plain(_) => Err(PackrError::DeltaWithoutBase),
        }
    }
}

impl Decoder {
    /// Expand one batch body (the bytes after an ULTRA_BATCH or BATCH_PARTIAL
    /// token) and append its rows to `rows_out`.
    pub(crate) fn read_batch_rows(
        &mut self,
        r: &mut ByteReader<'_>,
        rows_out: &mut Vec<Value>,
    ) -> PackrResult<()> {
        let rows = r.read_uvarint32()? as usize;
        let cols = r.read_uvarint32()? as usize;
        self.charge_alloc(rows.saturating_mul(cols).saturating_add(rows))?;

        let mut maps: Vec<Map<String, Value>> = vec![Map::new(); rows];
        for _ in 0..cols {
            let tok = r.read_u8()?;
            let slot = match tok {
                token::NEW_FIELD => self.read_new_field(r)?,
                t if token::is_field_ref(t) => {
                    self.fields.touch(t)?;
                    t
                }
                t => return Err(PackrError::BadToken(t)),
            };
            let name = String::from_utf8(self.fields.get(slot)?.to_vec())
                .map_err(|_| PackrError::BadToken(token::NEW_FIELD))?;

            let flags = r.read_u8()?;
            if flags & 0xF0 != 0 {
                return Err(PackrError::BadToken(flags));
            }
            let validity = if flags & token::COL_FLAG_HAS_NULLS != 0 {
                let bytes = r.read_bytes(rows.div_ceil(8))?;
                read_bitmap(bytes, rows)
            } else {
                vec![true; rows]
            };
            let present = validity.iter().filter(|&&p| p).count();

            let values = self.read_column_values(r, flags, present)?;
            debug_assert_eq!(values.len(), present);
            let mut it = values.into_iter();
            for (map, &ok) in maps.iter_mut().zip(&validity) {
                if ok {
                    map.insert(name.clone(), it.next().ok_or(PackrError::Truncated)?);
                }
            }
        }
        rows_out.extend(maps.into_iter().map(Value::Object));
        Ok(())
    }

    /// Materialize the `n` present values of one column.
    fn read_column_values(
        &mut self,
        r: &mut ByteReader<'_>,
        flags: u8,
        n: usize,
    ) -> PackrResult<Vec<Value>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        if flags & token::COL_FLAG_CONSTANT != 0 {
            let tok = r.read_u8()?;
            let v = self.read_scalar(tok, r, None)?;
            return Ok(vec![v; n]);
        }
        if r.peek_u8()? == token::MFV_COLUMN {
            return self.read_mfv_column(r, n);
        }

        // Base literal, then deltas / repeats / packed payloads until full.
        let mut out = Vec::with_capacity(n);
        let mut cursor = self.read_column_base(r)?;
        out.push(cursor.value()?);
        while out.len() < n {
            let tok = r.peek_u8()?;
            match tok {
                token::BITPACK_COL => {
                    r.read_u8()?;
                    self.read_bitpack(r, n, &mut out, &mut cursor)?;
                }
                token::RICE_COLUMN => {
                    r.read_u8()?;
                    self.read_rice(r, n, &mut out, &mut cursor)?;
                }
                token::RLE_REPEAT => {
                    r.read_u8()?;
                    let run = r.read_uvarint64()? as usize;
                    if run > n - out.len() {
                        return Err(PackrError::BadToken(token::RLE_REPEAT));
                    }
                    let last = cursor.value()?;
                    for _ in 0..run {
                        out.push(last.clone());
                    }
                }
                t if is_delta_token(t) => {
                    r.read_u8()?;
                    let delta = read_delta_payload(t, r)?;
                    out.push(cursor.apply_delta(delta)?);
                }
                _ => {
                    // A fresh literal re-bases the stream.
                    cursor = self.read_column_base(r)?;
                    out.push(cursor.value()?);
                }
            }
        }
        Ok(out)
    }

    /// Read a scalar literal and set up the matching cursor. INT keeps integer
    /// scale; FLOAT16/FLOAT32 switch the cursor to 16.16 units.
    fn read_column_base(&mut self, r: &mut ByteReader<'_>) -> PackrResult<ColCursor> {
        let tok = r.read_u8()?;
        match tok {
            token::INT => Ok(ColCursor::Int(r.read_ivarint32()? as i64)),
            token::FLOAT16 => {
                let b = r.read_bytes(2)?;
                Ok(ColCursor::Fixed((i16::from_le_bytes([b[0], b[1]]) as i64) << 8))
            }
            token::FLOAT32 => {
                let b = r.read_bytes(4)?;
                Ok(ColCursor::Fixed(i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64))
            }
            _ => Ok(ColCursor::Plain(self.read_scalar(tok, r, None)?)),
        }
    }

    fn read_mfv_column(&mut self, r: &mut ByteReader<'_>, n: usize) -> PackrResult<Vec<Value>> {
        r.read_u8()?; // MFV_COLUMN
        let count = r.read_uvarint32()? as usize;
        if count != n {
            return Err(PackrError::BadToken(token::MFV_COLUMN));
        }
        let tok = r.read_u8()?;
        let mode = self.read_scalar(tok, r, None)?;
        let bytes = r.read_bytes(n.div_ceil(8))?;
        let exceptions = read_bitmap(bytes, n);
        let mut out = Vec::with_capacity(n);
        for is_exception in exceptions {
            if is_exception {
                let tok = r.read_u8()?;
                out.push(self.read_scalar(tok, r, None)?);
            } else {
                out.push(mode.clone());
            }
        }
        Ok(out)
    }

    /// Two 4-bit deltas per byte, high nibble first, `delta = nibble − 8`.
    fn read_bitpack(
        &mut self,
        r: &mut ByteReader<'_>,
        n: usize,
        out: &mut Vec<Value>,
        cursor: &mut ColCursor,
    ) -> PackrResult<()> {
        let count = r.read_uvarint32()? as usize;
        if count > n - out.len() {
            return Err(PackrError::BadToken(token::BITPACK_COL));
        }
        let bytes = r.read_bytes(count.div_ceil(2))?;
        for k in 0..count {
            let byte = bytes[k / 2];
            let nib = if k % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            out.push(cursor.apply_delta(nib as i64 - 8)?);
        }
        Ok(())
    }

    /// ZigZag Rice codewords: unary quotient, one terminator bit, K remainder
    /// bits. The padded tail byte is consumed with the payload.
    fn read_rice(
        &mut self,
        r: &mut ByteReader<'_>,
        n: usize,
        out: &mut Vec<Value>,
        cursor: &mut ColCursor,
    ) -> PackrResult<()> {
        let count = r.read_uvarint32()? as usize;
        if count > n - out.len() {
            return Err(PackrError::BadToken(token::RICE_COLUMN));
        }
        let k = r.read_u8()?;
        if k > 7 {
            return Err(PackrError::BadToken(k));
        }
        let mut bits = BitReader::new(r.rest());
        for _ in 0..count {
            let q = bits.read_unary(RICE_UNARY_LIMIT)?;
            let rem = bits.read_bits(k)?;
            let u = ((q as u64) << k) | rem as u64;
            out.push(cursor.apply_delta(unzigzag64(u))?);
        }
        // The padded tail byte belongs to the bitstream; skip exactly what it
        // covered.
        r.advance(bits.bytes_consumed())
    }
}
