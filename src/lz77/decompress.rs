//! LZ77 sequence decoder for stored, block, and streaming payloads.

use crate::error::{PackrError, PackrResult};
use crate::lz77::{FORMAT_BLOCK, FORMAT_STORED, FORMAT_STREAM};
use crate::varint::ByteReader;

/// Expand one wrapped payload (the bytes after the `0xFE 0x03` prefix).
/// `max_out` bounds the decoded size; zero means unlimited.
pub fn decompress(src: &[u8], max_out: usize) -> PackrResult<Vec<u8>> {
    let mut r = ByteReader::new(src);
    match r.read_u8()? {
        FORMAT_STORED => {
            let orig = r.read_le32()? as usize;
            check_cap(orig, max_out)?;
            if r.remaining() != orig {
                return Err(PackrError::Truncated);
            }
            Ok(r.read_bytes(orig)?.to_vec())
        }
        FORMAT_BLOCK => {
            let orig = r.read_le32()? as usize;
            check_cap(orig, max_out)?;
            let mut out = Vec::with_capacity(orig);
            decode_sequences(&mut r, &mut out, Some(orig), max_out)?;
            Ok(out)
        }
        FORMAT_STREAM => {
            let mut out = Vec::new();
            decode_sequences(&mut r, &mut out, None, max_out)?;
            Ok(out)
        }
        other => Err(PackrError::BadToken(other)),
    }
}

/// Expand a wrapped payload into a caller-provided buffer, returning the
/// number of bytes written. Suited to fixed-buffer receivers; the buffer
/// must hold the entire output.
pub fn decompress_into(src: &[u8], dst: &mut [u8]) -> PackrResult<usize> {
    let out = decompress(src, 0)?;
    if out.len() > dst.len() {
        return Err(PackrError::OutputTooSmall);
    }
    dst[..out.len()].copy_from_slice(&out);
    Ok(out.len())
}

fn check_cap(need: usize, max_out: usize) -> PackrResult<()> {
    if max_out > 0 && need > max_out {
        return Err(PackrError::AllocationFailed);
    }
    Ok(())
}

/// Replay sequences into `out`. With `target` set (block mode) the output
/// must land exactly on it; without (streaming) decoding runs to the end of
/// the input.
fn decode_sequences(
    r: &mut ByteReader<'_>,
    out: &mut Vec<u8>,
    target: Option<usize>,
    max_out: usize,
) -> PackrResult<()> {
    loop {
        match target {
            Some(t) if out.len() == t => return Ok(()),
            Some(_) if r.is_empty() => return Err(PackrError::Truncated),
            None if r.is_empty() => return Ok(()),
            _ => {}
        }

        let control = r.read_u8()?;
        let mut lit_len = (control >> 4) as usize;
        if lit_len == 15 {
            lit_len += read_len_ext(r)?;
        }
        check_cap(out.len().saturating_add(lit_len), max_out)?;
        out.extend_from_slice(r.read_bytes(lit_len)?);

        // A sequence whose literals complete the output carries no offset.
        match target {
            Some(t) if out.len() > t => return Err(PackrError::Lz77Overflow),
            Some(t) if out.len() == t => return Ok(()),
            None if r.is_empty() => return Ok(()),
            _ => {}
        }

        let offset = r.read_le16()? as usize;
        let mut match_len = (control & 0x0F) as usize + 3;
        if control & 0x0F == 15 {
            match_len += read_len_ext(r)?;
        }
        if offset == 0 {
            // Literals-only flush from the streaming compressor's window
            // slide; there is no match to copy.
            continue;
        }
        if offset > out.len() {
            return Err(PackrError::Lz77BadOffset);
        }
        if let Some(t) = target {
            if out.len() + match_len > t {
                return Err(PackrError::Lz77Overflow);
            }
        }
        check_cap(out.len().saturating_add(match_len), max_out)?;
        let start = out.len() - offset;
        // Byte-at-a-time so overlapping back-references replicate correctly.
        for k in 0..match_len {
            let b = out[start + k];
            out.push(b);
        }
    }
}

/// Nibble-overflow length chain: 255-bytes accumulate, the first byte below
/// 255 terminates and joins the sum.
fn read_len_ext(r: &mut ByteReader<'_>) -> PackrResult<usize> {
    let mut extra = 0usize;
    loop {
        let byte = r.read_u8()?;
        extra += byte as usize;
        if byte < 255 {
            return Ok(extra);
        }
    }
}
