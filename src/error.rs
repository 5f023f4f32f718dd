//! Error type shared by the encoder, decoder, and LZ77 transform.
//!
//! Every failure mode observable through the public API maps onto one
//! [`PackrError`] variant. Streams are never partially recovered: a malformed
//! column payload or checksum failure rejects the whole frame.

use core::fmt;

/// Which of the three per-stream dictionaries a slot reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictKind {
    /// Object field names (`FIELD_REF` / `NEW_FIELD`).
    Field,
    /// General strings (`STRING_REF` / `NEW_STRING`).
    String,
    /// 6-byte MAC addresses (`MAC_REF` / `NEW_MAC`).
    Mac,
}

impl DictKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            DictKind::Field => "field",
            DictKind::String => "string",
            DictKind::Mac => "mac",
        }
    }
}

/// Decode / transform error codes surfaced at the public boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackrError {
    /// The frame does not begin with the `PKR1` magic.
    BadMagic,
    /// The frame version byte is not one this build understands.
    BadVersion(u8),
    /// Input ended before the structure it was describing was complete.
    Truncated,
    /// A token byte that is not valid at the current position.
    BadToken(u8),
    /// A reference token named a dictionary slot with no prior `NEW_*` event.
    EmptySlot { dict: DictKind, slot: u8 },
    /// A delta token arrived for a field whose numeric kind is still `none`.
    DeltaWithoutBase,
    /// The CRC32 trailer does not match the frame contents.
    CrcMismatch { stored: u32, computed: u32 },
    /// An LZ77 back-reference pointed before the start of the output.
    Lz77BadOffset,
    /// LZ77 expansion produced more bytes than the block header declared.
    Lz77Overflow,
    /// A caller-provided output buffer cannot hold the result.
    OutputTooSmall,
    /// Container open/close tokens did not balance.
    UnbalancedContainer,
    /// Decoding would exceed the configured output memory cap.
    AllocationFailed,
}

pub type PackrResult<T> = Result<T, PackrError>;

impl PackrError {
    /// Stable machine-readable name for each error kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PackrError::BadMagic => "bad_magic",
            PackrError::BadVersion(_) => "bad_version",
            PackrError::Truncated => "truncated",
            PackrError::BadToken(_) => "bad_token",
            PackrError::EmptySlot { .. } => "dict_overflow",
            PackrError::DeltaWithoutBase => "delta_without_base",
            PackrError::CrcMismatch { .. } => "crc_mismatch",
            PackrError::Lz77BadOffset => "lz77_bad_offset",
            PackrError::Lz77Overflow => "lz77_overflow",
            PackrError::OutputTooSmall => "output_too_small",
            PackrError::UnbalancedContainer => "unbalanced_container",
            PackrError::AllocationFailed => "allocation_failed",
        }
    }
}

impl fmt::Display for PackrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackrError::BadMagic => write!(f, "not a PACKR frame (bad magic)"),
            PackrError::BadVersion(v) => write!(f, "unsupported frame version 0x{v:02X}"),
            PackrError::Truncated => write!(f, "truncated input"),
            PackrError::BadToken(t) => write!(f, "unexpected token byte 0x{t:02X}"),
            PackrError::EmptySlot { dict, slot } => {
                write!(f, "reference to empty {} dictionary slot {}", dict.name(), slot)
            }
            PackrError::DeltaWithoutBase => {
                write!(f, "delta token without a preceding base value")
            }
            PackrError::CrcMismatch { stored, computed } => write!(
                f,
                "crc mismatch: frame says 0x{stored:08X}, contents hash to 0x{computed:08X}"
            ),
            PackrError::Lz77BadOffset => write!(f, "lz77 back-offset outside produced output"),
            PackrError::Lz77Overflow => write!(f, "lz77 output exceeds declared length"),
            PackrError::OutputTooSmall => write!(f, "output buffer too small"),
            PackrError::UnbalancedContainer => write!(f, "unbalanced object/array nesting"),
            PackrError::AllocationFailed => write!(f, "decoded output exceeds configured memory cap"),
        }
    }
}

impl std::error::Error for PackrError {}
