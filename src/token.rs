//! Token byte assignments and classification helpers.
//!
//! A token is a single byte whose high bits select a class; some tokens carry
//! trailing payload (varints, raw bytes, nested token runs). The assignments
//! here are normative for the wire format; the decoder dispatches on nothing
//! else.

// ─────────────────────────────────────────────────────────────────────────────
// Dictionary reference ranges (slot encoded in the byte itself)
// ─────────────────────────────────────────────────────────────────────────────

/// `0x00..=0x3F`: field-name reference, slot = byte.
pub const FIELD_REF_BASE: u8 = 0x00;
/// `0x40..=0x7F`: string reference, slot = byte & 0x3F.
pub const STRING_REF_BASE: u8 = 0x40;
/// `0x80..=0xBF`: MAC reference, slot = byte & 0x3F.
pub const MAC_REF_BASE: u8 = 0x80;

/// Entries per dictionary; also the width of each reference range.
pub const DICT_CAPACITY: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Scalar literals
// ─────────────────────────────────────────────────────────────────────────────

/// Signed 32-bit integer, ZigZag varint payload.
pub const INT: u8 = 0xC0;
/// Signed 8.8 fixed-point, 2-byte LE payload.
pub const FLOAT16: u8 = 0xC1;
/// Signed 16.16 fixed-point, 4-byte LE payload.
pub const FLOAT32: u8 = 0xC2;
/// IEEE-754 binary64, 8-byte LE payload.
pub const DOUBLE: u8 = 0xDE;
/// Length-prefixed raw bytes.
pub const BINARY: u8 = 0xDF;

pub const BOOL_TRUE: u8 = 0xD7;
pub const BOOL_FALSE: u8 = 0xD8;
pub const NULL: u8 = 0xD9;

// ─────────────────────────────────────────────────────────────────────────────
// Numeric deltas
// ─────────────────────────────────────────────────────────────────────────────

/// `0xC3..=0xD2`: inline delta, value = byte − DELTA_SMALL_BASE − 8,
/// covering −8..=+7.
pub const DELTA_SMALL_BASE: u8 = 0xC3;
/// One-byte payload holding `delta + 64`, covering −64..=+63.
pub const DELTA_MEDIUM: u8 = 0xEC;
/// ZigZag 64-bit varint payload.
pub const DELTA_LARGE: u8 = 0xD3;
pub const DELTA_ZERO: u8 = 0xE6;
pub const DELTA_ONE: u8 = 0xE7;
pub const DELTA_NEG_ONE: u8 = 0xE8;

// ─────────────────────────────────────────────────────────────────────────────
// Dictionary definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Varint length + UTF-8 bytes; appends to the string dictionary.
pub const NEW_STRING: u8 = 0xD4;
/// Varint length + bytes; appends to the field dictionary.
pub const NEW_FIELD: u8 = 0xD5;
/// 6 raw bytes; appends to the MAC dictionary.
pub const NEW_MAC: u8 = 0xD6;

// ─────────────────────────────────────────────────────────────────────────────
// Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Varint element count follows; the matching ARRAY_END still closes it.
pub const ARRAY_START: u8 = 0xDA;
pub const ARRAY_END: u8 = 0xDB;
pub const OBJECT_START: u8 = 0xDC;
pub const OBJECT_END: u8 = 0xDD;
/// Count-unknown array; terminated by ARRAY_END.
pub const ARRAY_STREAM: u8 = 0xEF;

// ─────────────────────────────────────────────────────────────────────────────
// Columnar batches
// ─────────────────────────────────────────────────────────────────────────────

pub const ULTRA_BATCH: u8 = 0xE9;
/// One chunk of a streaming batch; same body layout as ULTRA_BATCH.
pub const BATCH_PARTIAL: u8 = 0xF0;
pub const BITPACK_COL: u8 = 0xEB;
pub const RICE_COLUMN: u8 = 0xED;
pub const MFV_COLUMN: u8 = 0xEE;
/// Varint run; repeat the previous value that many more times.
pub const RLE_REPEAT: u8 = 0xE5;

// ─────────────────────────────────────────────────────────────────────────────
// Column flags byte
// ─────────────────────────────────────────────────────────────────────────────

/// All present values equal; payload is exactly one scalar literal.
pub const COL_FLAG_CONSTANT: u8 = 0x01;
/// Numeric, delta-capable column.
pub const COL_FLAG_NUMERIC: u8 = 0x02;
/// Strings / bools amenable to run-length collapsing.
pub const COL_FLAG_RLE: u8 = 0x04;
/// A validity bitmap precedes the payload.
pub const COL_FLAG_HAS_NULLS: u8 = 0x08;

// ─────────────────────────────────────────────────────────────────────────────
// Transform wrapper (not a token; recognized before frame parsing)
// ─────────────────────────────────────────────────────────────────────────────

pub const WRAP_PREFIX: [u8; 2] = [0xFE, 0x03];

// ─────────────────────────────────────────────────────────────────────────────
// Classification helpers
// ─────────────────────────────────────────────────────────────────────────────

#[inline]
pub fn is_field_ref(token: u8) -> bool {
    token <= 0x3F
}

#[inline]
pub fn is_string_ref(token: u8) -> bool {
    (STRING_REF_BASE..=0x7F).contains(&token)
}

#[inline]
pub fn is_mac_ref(token: u8) -> bool {
    (MAC_REF_BASE..=0xBF).contains(&token)
}

#[inline]
pub fn is_delta_small(token: u8) -> bool {
    (DELTA_SMALL_BASE..=0xD2).contains(&token)
}

/// Inline-delta token for a delta in −8..=+7.
#[inline]
pub fn delta_small_token(delta: i64) -> u8 {
    debug_assert!((-8..=7).contains(&delta));
    DELTA_SMALL_BASE + (delta + 8) as u8
}

/// Delta encoded by an inline-delta token.
#[inline]
pub fn delta_small_value(token: u8) -> i64 {
    debug_assert!(is_delta_small(token));
    (token - DELTA_SMALL_BASE) as i64 - 8
}
