//! Batch eligibility and column extraction.
//!
//! An array qualifies when every element is an object whose values are all
//! scalars, and each column's present values unify under the numeric lattice
//! `int32 ⊑ fixed-point ⊑ double`. Strings, bools, and nulls only unify with
//! themselves; anything mixed (or any nested container) sends the whole
//! array down the plain scalar path instead.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::column::{ColumnData, ColumnPlan};
use crate::varint::fixed16_exact;

/// Scalar cell classification, pre-unification.
enum Cell {
    Null,
    Bool(bool),
    Int(i32),
    Float(f64),
    Str(String),
}

/// Largest int that survives promotion to 16.16 without overflow.
const FIXED_INT_MAX: i64 = i16::MAX as i64;
const FIXED_INT_MIN: i64 = i16::MIN as i64;

fn classify(v: &Value) -> Option<Cell> {
    match v {
        Value::Null => Some(Cell::Null),
        Value::Bool(b) => Some(Cell::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if let Ok(small) = i32::try_from(i) {
                    return Some(Cell::Int(small));
                }
            }
            n.as_f64().map(Cell::Float)
        }
        Value::String(s) => Some(Cell::Str(s.clone())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Extract typed columns from `rows`, or `None` when the array does not
/// qualify for batching. Columns come out in sorted key order (the order
/// object keys already iterate in), so encoder and decoder agree without a
/// side channel.
pub(crate) fn analyze(rows: &[Value]) -> Option<Vec<ColumnPlan>> {
    let mut objects = Vec::with_capacity(rows.len());
    for row in rows {
        match row {
            Value::Object(map) => objects.push(map),
            _ => return None,
        }
    }

    let mut keys = BTreeSet::new();
    for map in &objects {
        keys.extend(map.keys().cloned());
    }

    let mut plans = Vec::with_capacity(keys.len());
    for key in keys {
        let mut validity = Vec::with_capacity(objects.len());
        let mut cells = Vec::new();
        for map in &objects {
            match map.get(&key) {
                Some(v) => {
                    validity.push(true);
                    cells.push(classify(v)?);
                }
                None => validity.push(false),
            }
        }
        let data = unify(cells)?;
        plans.push(ColumnPlan { name: key, validity, data });
    }
    Some(plans)
}

/// Fold cells into one column type, or `None` on a non-unifiable mix.
fn unify(cells: Vec<Cell>) -> Option<ColumnData> {
    let mut saw_null = false;
    let mut saw_bool = false;
    let mut saw_str = false;
    let mut saw_num = false;
    let mut saw_float = false;
    for cell in &cells {
        match cell {
            Cell::Null => saw_null = true,
            Cell::Bool(_) => saw_bool = true,
            Cell::Str(_) => saw_str = true,
            Cell::Int(_) => saw_num = true,
            Cell::Float(_) => {
                saw_num = true;
                saw_float = true;
            }
        }
    }

    // Nulls coexist only with nulls; explicit null is a value, not a gap.
    if saw_null {
        return if saw_bool || saw_str || saw_num { None } else { Some(ColumnData::Null) };
    }
    if saw_bool {
        if saw_str || saw_num {
            return None;
        }
        return Some(ColumnData::Bool(
            cells
                .into_iter()
                .map(|c| match c {
                    Cell::Bool(b) => b,
                    _ => unreachable!(),
                })
                .collect(),
        ));
    }
    if saw_str {
        if saw_num {
            return None;
        }
        return Some(ColumnData::Str(
            cells
                .into_iter()
                .map(|c| match c {
                    Cell::Str(s) => s,
                    _ => unreachable!(),
                })
                .collect(),
        ));
    }
    if !saw_num {
        // Zero present values; the caller will emit a validity-only column.
        return Some(ColumnData::Null);
    }

    if !saw_float {
        return Some(ColumnData::Int(
            cells
                .into_iter()
                .map(|c| match c {
                    Cell::Int(i) => i,
                    _ => unreachable!(),
                })
                .collect(),
        ));
    }

    // Mixed int/float: fixed-point when everything fits 16.16 exactly,
    // otherwise full doubles.
    let mut fixed = Vec::with_capacity(cells.len());
    let mut all_fixed = true;
    for cell in &cells {
        let fx = match cell {
            Cell::Int(i) => {
                let wide = *i as i64;
                if (FIXED_INT_MIN..=FIXED_INT_MAX).contains(&wide) {
                    Some((wide << 16) as i32)
                } else {
                    None
                }
            }
            Cell::Float(f) => fixed16_exact(*f),
            _ => unreachable!(),
        };
        match fx {
            Some(fx) => fixed.push(fx),
            None => {
                all_fixed = false;
                break;
            }
        }
    }
    if all_fixed {
        return Some(ColumnData::Fixed(fixed));
    }

    Some(ColumnData::Double(
        cells
            .into_iter()
            .map(|c| match c {
                Cell::Int(i) => i as f64,
                Cell::Float(f) => f,
                _ => unreachable!(),
            })
            .collect(),
    ))
}
