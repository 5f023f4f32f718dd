//! Scalar (row-by-row) encoding and decoding.
//!
//! The shared pieces live here: the per-field numeric delta context and the
//! container stack both sides walk in lockstep.

pub mod decode;
pub mod encode;

use crate::token::DICT_CAPACITY;

/// What kind of numeric value a field slot last carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumKind {
    /// No base yet; delta tokens are invalid for this field.
    #[default]
    None,
    /// Plain 32-bit integer; `last` holds the value itself.
    Int,
    /// Fixed-point; `last` holds the value in 16.16 units regardless of
    /// whether the literal on the wire was FLOAT16 or FLOAT32.
    Fixed,
}

/// Delta context bound to one field-dictionary slot.
///
/// `last` is always the *reconstructed* previous value, the one the decoder
/// arrives at, never the raw encoder input, so the two sides cannot drift.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldNum {
    pub last: i64,
    pub kind: NumKind,
}

/// Fresh all-`None` per-field state table.
pub(crate) fn new_field_state() -> [FieldNum; DICT_CAPACITY] {
    [FieldNum::default(); DICT_CAPACITY]
}

/// One level of object/array nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    /// `field` is the slot of the most recent field token in this object.
    Object { field: Option<u8> },
    /// Counted array (`ARRAY_START n … ARRAY_END`).
    Array,
    /// Count-unknown array (`ARRAY_STREAM … ARRAY_END`).
    ArrayStream,
}

/// The field slot whose delta context applies at the current position:
/// the innermost enclosing object's current field, inherited through arrays.
pub(crate) fn active_field(stack: &[Container]) -> Option<u8> {
    for frame in stack.iter().rev() {
        if let Container::Object { field } = frame {
            return *field;
        }
    }
    None
}
