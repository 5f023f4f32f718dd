//! Column payload emission: the encoder half of ULTRA_BATCH.
//!
//! Strategy order is fixed: constant, then most-frequent-value, then nibble
//! bit-pack for all-small deltas (unless zeros dominate enough that the
//! run-length fallback wins), then Rice, then the scalar delta stream. The
//! choice itself is non-normative; only the payload formats are.

use crate::column::{write_bitmap, ColumnData, ColumnPlan};
use crate::error::PackrResult;
use crate::scalar::encode::{
    emit_delta, emit_double_literal, emit_fixed_literal, emit_int_literal, Encoder,
};
use crate::token;
use crate::varint::{write_uvarint64, zigzag64};

/// Zero-delta runs longer than this collapse to RLE_REPEAT in the fallback
/// stream; the same threshold feeds the bit-pack-versus-RLE estimate.
const ZERO_RUN_MIN: usize = 3;

impl Encoder {
    /// Emit a whole batch: header, then each column's header and payload.
    pub(crate) fn encode_batch(
        &mut self,
        rows: usize,
        plans: &[ColumnPlan],
        partial: bool,
    ) -> PackrResult<()> {
        self.out.push(if partial { token::BATCH_PARTIAL } else { token::ULTRA_BATCH });
        write_uvarint64(&mut self.out, rows as u64);
        write_uvarint64(&mut self.out, plans.len() as u64);
        for plan in plans {
            self.encode_column(plan)?;
        }
        Ok(())
    }

    fn encode_column(&mut self, plan: &ColumnPlan) -> PackrResult<()> {
        self.emit_field_raw(&plan.name);

        let n = plan.present_count();
        let has_nulls = plan.has_nulls();
        let mut flags = if has_nulls { token::COL_FLAG_HAS_NULLS } else { 0 };

        if n == 0 {
            // Validity-only column: nothing but the bitmap.
            self.out.push(flags);
            write_bitmap(&mut self.out, &plan.validity);
            return Ok(());
        }

        let constant = column_is_constant(&plan.data);
        if constant {
            flags |= token::COL_FLAG_CONSTANT;
        } else {
            match plan.data {
                ColumnData::Int(_) | ColumnData::Fixed(_) => flags |= token::COL_FLAG_NUMERIC,
                ColumnData::Str(_) | ColumnData::Bool(_) => flags |= token::COL_FLAG_RLE,
                ColumnData::Double(_) | ColumnData::Null => {}
            }
        }
        self.out.push(flags);
        if has_nulls {
            write_bitmap(&mut self.out, &plan.validity);
        }

        if constant {
            self.emit_constant(&plan.data);
            return Ok(());
        }

        match &plan.data {
            ColumnData::Int(vals) => {
                let wide: Vec<i64> = vals.iter().map(|&v| v as i64).collect();
                self.encode_numeric(&wide, false);
            }
            ColumnData::Fixed(vals) => {
                let wide: Vec<i64> = vals.iter().map(|&v| v as i64).collect();
                self.encode_numeric(&wide, true);
            }
            ColumnData::Double(vals) => self.encode_doubles(vals),
            ColumnData::Str(vals) => self.encode_strings(vals),
            ColumnData::Bool(vals) => self.encode_bools(vals),
            ColumnData::Null => unreachable!("all-null columns are constant"),
        }
        Ok(())
    }

    // ── Constant ─────────────────────────────────────────────────────────────

    /// One scalar literal; integral floats demote to INT.
    fn emit_constant(&mut self, data: &ColumnData) {
        match data {
            ColumnData::Int(vals) => emit_int_literal(&mut self.out, vals[0]),
            ColumnData::Fixed(vals) => {
                let fx = vals[0];
                if fx & 0xFFFF == 0 {
                    emit_int_literal(&mut self.out, fx >> 16);
                } else {
                    emit_fixed_literal(&mut self.out, fx);
                }
            }
            ColumnData::Double(vals) => {
                let v = vals[0];
                if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
                    emit_int_literal(&mut self.out, v as i32);
                } else {
                    emit_double_literal(&mut self.out, v);
                }
            }
            ColumnData::Str(vals) => self.emit_string_or_mac(&vals[0]),
            ColumnData::Bool(vals) => {
                self.out.push(if vals[0] { token::BOOL_TRUE } else { token::BOOL_FALSE });
            }
            ColumnData::Null => self.out.push(token::NULL),
        }
    }

    // ── Numeric strategies ───────────────────────────────────────────────────

    /// Non-constant int/fixed column: MFV, bit-pack, Rice, or delta stream.
    /// `vals` are in value units (int) or 16.16 units (fixed).
    fn encode_numeric(&mut self, vals: &[i64], fixed: bool) {
        let n = vals.len();
        if let Some((mode, exceptions)) = mfv_split(vals) {
            self.out.push(token::MFV_COLUMN);
            write_uvarint64(&mut self.out, n as u64);
            self.emit_numeric_literal(mode, fixed);
            write_bitmap(&mut self.out, &vals.iter().map(|&v| v != mode).collect::<Vec<_>>());
            for &i in &exceptions {
                self.emit_numeric_literal(vals[i], fixed);
            }
            return;
        }

        // Base value first; everything after is deltas. The base token's type
        // tells the decoder the scale, so a fixed column must not demote it.
        if fixed {
            emit_fixed_literal(&mut self.out, vals[0] as i32);
        } else {
            emit_int_literal(&mut self.out, vals[0] as i32);
        }

        let deltas: Vec<i64> = vals.windows(2).map(|w| w[1] - w[0]).collect();
        let count = deltas.len();
        let all_small = deltas.iter().all(|d| (-8..=7).contains(d));

        if all_small && !zero_rle_beats_bitpack(&deltas) {
            self.out.push(token::BITPACK_COL);
            write_uvarint64(&mut self.out, count as u64);
            for pair in deltas.chunks(2) {
                let hi = (pair[0] + 8) as u8;
                let lo = if pair.len() == 2 { (pair[1] + 8) as u8 } else { 8 };
                self.out.push(hi << 4 | lo);
            }
            return;
        }

        if !all_small {
            if let Some(k) = rice_parameter(&deltas) {
                self.out.push(token::RICE_COLUMN);
                write_uvarint64(&mut self.out, count as u64);
                self.out.push(k);
                self.out.extend_from_slice(&rice_bitstream(&deltas, k));
                return;
            }
        }

        // Scalar delta stream with zero-run collapsing.
        let mut i = 0;
        while i < count {
            if deltas[i] == 0 {
                let run = deltas[i..].iter().take_while(|&&d| d == 0).count();
                if run > ZERO_RUN_MIN {
                    self.out.push(token::RLE_REPEAT);
                    write_uvarint64(&mut self.out, run as u64);
                    i += run;
                    continue;
                }
            }
            emit_delta(&mut self.out, deltas[i]);
            i += 1;
        }
    }

    fn emit_numeric_literal(&mut self, v: i64, fixed: bool) {
        if fixed {
            emit_fixed_literal(&mut self.out, v as i32);
        } else {
            emit_int_literal(&mut self.out, v as i32);
        }
    }

    // ── Doubles, strings, bools ──────────────────────────────────────────────

    /// Full-precision column: literals with consecutive-equality collapsing.
    fn encode_doubles(&mut self, vals: &[f64]) {
        if let Some((mode, exceptions)) = mfv_split(vals) {
            self.out.push(token::MFV_COLUMN);
            write_uvarint64(&mut self.out, vals.len() as u64);
            emit_double_literal(&mut self.out, mode);
            write_bitmap(&mut self.out, &vals.iter().map(|&v| v != mode).collect::<Vec<_>>());
            for &i in &exceptions {
                emit_double_literal(&mut self.out, vals[i]);
            }
            return;
        }
        let mut i = 0;
        while i < vals.len() {
            let run = vals[i..].iter().take_while(|&&v| v == vals[i]).count();
            emit_double_literal(&mut self.out, vals[i]);
            if run > 1 {
                self.out.push(token::RLE_REPEAT);
                write_uvarint64(&mut self.out, (run - 1) as u64);
            }
            i += run;
        }
    }

    fn encode_strings(&mut self, vals: &[String]) {
        if let Some((mode, exceptions)) = mfv_split(vals) {
            self.out.push(token::MFV_COLUMN);
            write_uvarint64(&mut self.out, vals.len() as u64);
            self.emit_string_or_mac(&mode);
            write_bitmap(&mut self.out, &vals.iter().map(|v| v != &mode).collect::<Vec<_>>());
            for &i in &exceptions {
                self.emit_string_or_mac(&vals[i]);
            }
            return;
        }
        let mut i = 0;
        while i < vals.len() {
            let run = vals[i..].iter().take_while(|&v| *v == vals[i]).count();
            self.emit_string_or_mac(&vals[i]);
            if run > 1 {
                self.out.push(token::RLE_REPEAT);
                write_uvarint64(&mut self.out, (run - 1) as u64);
            }
            i += run;
        }
    }

    fn encode_bools(&mut self, vals: &[bool]) {
        if let Some((mode, exceptions)) = mfv_split(vals) {
            self.out.push(token::MFV_COLUMN);
            write_uvarint64(&mut self.out, vals.len() as u64);
            self.out.push(if mode { token::BOOL_TRUE } else { token::BOOL_FALSE });
            write_bitmap(&mut self.out, &vals.iter().map(|&v| v != mode).collect::<Vec<_>>());
            for &i in &exceptions {
                self.out.push(if vals[i] { token::BOOL_TRUE } else { token::BOOL_FALSE });
            }
            return;
        }
        let mut i = 0;
        while i < vals.len() {
            let run = vals[i..].iter().take_while(|&&v| v == vals[i]).count();
            self.out.push(if vals[i] { token::BOOL_TRUE } else { token::BOOL_FALSE });
            if run > 1 {
                self.out.push(token::RLE_REPEAT);
                write_uvarint64(&mut self.out, (run - 1) as u64);
            }
            i += run;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Strategy helpers
// ─────────────────────────────────────────────────────────────────────────────

fn column_is_constant(data: &ColumnData) -> bool {
    match data {
        ColumnData::Int(v) => v.windows(2).all(|w| w[0] == w[1]),
        ColumnData::Fixed(v) => v.windows(2).all(|w| w[0] == w[1]),
        ColumnData::Double(v) => v.windows(2).all(|w| w[0] == w[1]),
        ColumnData::Str(v) => v.windows(2).all(|w| w[0] == w[1]),
        ColumnData::Bool(v) => v.windows(2).all(|w| w[0] == w[1]),
        ColumnData::Null => true,
    }
}

/// Boyer–Moore majority sweep, verified at the 60% bar. Returns the mode and
/// the exception indices, or `None` when no value dominates.
fn mfv_split<T: PartialEq + Clone>(vals: &[T]) -> Option<(T, Vec<usize>)> {
    let mut candidate = &vals[0];
    let mut votes = 0usize;
    for v in vals {
        if votes == 0 {
            candidate = v;
            votes = 1;
        } else if v == candidate {
            votes += 1;
        } else {
            votes -= 1;
        }
    }
    let occupancy = vals.iter().filter(|v| *v == candidate).count();
    if occupancy * 5 < vals.len() * 3 {
        return None;
    }
    let exceptions = vals
        .iter()
        .enumerate()
        .filter(|(_, v)| *v != candidate)
        .map(|(i, _)| i)
        .collect();
    Some((candidate.clone(), exceptions))
}

/// Estimate whether zero-run RLE clearly beats nibble packing: about two
/// bytes per collapsible run plus one per remaining delta, against
/// `count/2 + 5`, at a 0.8 discount. Only meaningful when at least one run
/// is long enough to collapse.
fn zero_rle_beats_bitpack(deltas: &[i64]) -> bool {
    let mut rle_cost = 0usize;
    let mut collapsible = false;
    let mut i = 0;
    while i < deltas.len() {
        if deltas[i] == 0 {
            let run = deltas[i..].iter().take_while(|&&d| d == 0).count();
            if run > ZERO_RUN_MIN {
                rle_cost += 2;
                collapsible = true;
                i += run;
                continue;
            }
        }
        rle_cost += 1;
        i += 1;
    }
    let bitpack_cost = deltas.len() / 2 + 5;
    collapsible && (rle_cost as f64) < (bitpack_cost as f64) * 0.8
}

/// Rice parameter when the column is Rice-eligible: all deltas under 1024 in
/// magnitude and the bitstream strictly shorter than `1.5 × count` bytes.
fn rice_parameter(deltas: &[i64]) -> Option<u8> {
    let max_abs = deltas.iter().map(|d| d.unsigned_abs()).max().unwrap_or(0);
    if max_abs >= 1024 {
        return None;
    }
    let bitlen = 64 - (max_abs as u64).leading_zeros();
    let k = bitlen.saturating_sub(2).min(7) as u8;
    let bits: u64 = deltas
        .iter()
        .map(|&d| {
            let u = zigzag64(d);
            (u >> k) + 1 + k as u64
        })
        .sum();
    let bytes = bits.div_ceil(8);
    if (bytes as f64) < deltas.len() as f64 * 1.5 {
        Some(k)
    } else {
        None
    }
}

/// ZigZag + unary-quotient / K-bit-remainder bitstream, MSB-first, zero
/// padded to a byte boundary.
fn rice_bitstream(deltas: &[i64], k: u8) -> Vec<u8> {
    let mut bw = crate::bits::BitWriter::new();
    let mask = (1u64 << k) - 1;
    for &d in deltas {
        let u = zigzag64(d);
        bw.write_unary((u >> k) as u32);
        bw.write_bits((u & mask) as u32, k);
    }
    bw.finish()
}
