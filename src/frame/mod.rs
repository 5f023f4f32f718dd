//! Frame assembly and parsing.
//!
//! A frame is `magic | version | flags | symbol_count (varint) | body |
//! crc32 (LE)`. The CRC always covers the bytes before any LZ77 wrap and is
//! verified after inversion. Two wrapped shapes exist on the wire:
//!
//! * buffered: the whole frame inside one block, `FE 03 | lz77(frame)`;
//! * streaming: plaintext header, then the body and CRC through the
//!   streaming compressor, `header | FE 03 | 03 | sequences(body‖crc)`.

use std::io::{self, Write};

use serde_json::Value;

use crate::config::{DecoderConfig, EncoderConfig};
use crate::crc32::{crc32, Crc32State};
use crate::error::{PackrError, PackrResult};
use crate::lz77;
use crate::lz77::compress::{compress_block, looks_incompressible};
use crate::lz77::stream::Lz77Stream;
use crate::scalar::encode::Encoder;
use crate::token::WRAP_PREFIX;
use crate::varint::{write_uvarint64, ByteReader};

/// `"PKR1"`.
pub const MAGIC: [u8; 4] = [0x50, 0x4B, 0x52, 0x31];
pub const VERSION: u8 = 0x01;

/// Flags bits 3–7 are reserved and must be zero.
const FLAGS_RESERVED_MASK: u8 = 0xF8;

// ─────────────────────────────────────────────────────────────────────────────
// Buffered finish
// ─────────────────────────────────────────────────────────────────────────────

impl Encoder {
    /// Frame the accumulated body: header, CRC trailer, and, when enabled
    /// and worthwhile, the LZ77 wrap.
    pub fn finish(self) -> PackrResult<Vec<u8>> {
        if !self.stack.is_empty() {
            return Err(PackrError::UnbalancedContainer);
        }
        let mut frame = Vec::with_capacity(self.out.len() + 16);
        frame.extend_from_slice(&MAGIC);
        frame.push(VERSION);
        frame.push(0); // flags
        write_uvarint64(&mut frame, self.symbols);
        frame.extend_from_slice(&self.out);
        let checksum = crc32(&frame);
        frame.extend_from_slice(&checksum.to_le_bytes());

        if self.cfg.compress {
            if self.cfg.entropy_precheck && looks_incompressible(&frame) {
                return Ok(frame);
            }
            let block = compress_block(&frame);
            if WRAP_PREFIX.len() + block.len() < frame.len() {
                let mut wrapped = Vec::with_capacity(2 + block.len());
                wrapped.extend_from_slice(&WRAP_PREFIX);
                wrapped.extend_from_slice(&block);
                return Ok(wrapped);
            }
        }
        Ok(frame)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parse
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct ParsedFrame {
    #[allow(dead_code)]
    pub flags: u8,
    /// Zero means "count unknown; read values to the end of the body".
    pub symbol_count: u64,
    pub body: Vec<u8>,
}

/// Strip any LZ77 wrap, validate the header, verify the CRC, and hand back
/// the raw token body.
pub(crate) fn parse_frame(bytes: &[u8], cfg: &DecoderConfig) -> PackrResult<ParsedFrame> {
    // Whole-frame wrap (buffered encoder).
    let unwrapped;
    let frame: &[u8] = if bytes.starts_with(&WRAP_PREFIX) {
        unwrapped = lz77::decompress::decompress(&bytes[2..], cfg.max_output_bytes)?;
        &unwrapped
    } else {
        bytes
    };

    if frame.len() < 4 {
        return Err(PackrError::Truncated);
    }
    if frame[..4] != MAGIC {
        return Err(PackrError::BadMagic);
    }
    let mut r = ByteReader::new(&frame[4..]);
    let version = r.read_u8()?;
    if version != VERSION {
        return Err(PackrError::BadVersion(version));
    }
    let flags = r.read_u8()?;
    if flags & FLAGS_RESERVED_MASK != 0 {
        return Err(PackrError::BadToken(flags));
    }
    let symbol_count = r.read_uvarint64()?;
    let header_len = 4 + r.position();
    let rest = r.rest();

    // Body-only wrap (streaming encoder): header stays plaintext, the
    // compressed payload holds body ‖ crc. A raw body can never start with
    // the prefix byte (0xFE is not a token), so this test is unambiguous.
    let (body, stored_crc, computed) = if rest.len() > 4
        && rest.starts_with(&WRAP_PREFIX)
        && matches!(rest[2], lz77::FORMAT_STORED | lz77::FORMAT_BLOCK | lz77::FORMAT_STREAM)
    {
        let plain = lz77::decompress::decompress(&rest[2..], cfg.max_output_bytes)?;
        if plain.len() < 4 {
            return Err(PackrError::Truncated);
        }
        let (body, crc_bytes) = plain.split_at(plain.len() - 4);
        let stored = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        let mut hasher = Crc32State::new();
        hasher.update(&frame[..header_len]);
        hasher.update(body);
        (body.to_vec(), stored, hasher.finalize())
    } else {
        if rest.len() < 4 {
            return Err(PackrError::Truncated);
        }
        let (body, crc_bytes) = rest.split_at(rest.len() - 4);
        let stored = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        (body.to_vec(), stored, crc32(&frame[..frame.len() - 4]))
    };

    if stored_crc != computed {
        return Err(PackrError::CrcMismatch { stored: stored_crc, computed });
    }
    Ok(ParsedFrame { flags, symbol_count, body })
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming encoder
// ─────────────────────────────────────────────────────────────────────────────

/// Encoder that writes straight into an [`io::Write`] sink: header first,
/// then the token body (through the streaming LZ77 when compression is on),
/// then the CRC over the plaintext. Sink errors abort the stream; there is
/// no recovery path.
pub struct StreamingEncoder<W: Write> {
    enc: Encoder,
    sink: W,
    lz: Option<Lz77Stream>,
    crc: Crc32State,
}

impl<W: Write> StreamingEncoder<W> {
    /// Write the frame header immediately and set up the body pipeline.
    /// Streaming headers carry a symbol count of zero ("unknown"); the
    /// decoder reads values until the body ends.
    pub fn new(cfg: EncoderConfig, mut sink: W) -> io::Result<Self> {
        let mut header = Vec::with_capacity(8);
        header.extend_from_slice(&MAGIC);
        header.push(VERSION);
        header.push(0); // flags
        write_uvarint64(&mut header, 0);
        sink.write_all(&header)?;
        let mut crc = Crc32State::new();
        crc.update(&header);
        let lz = if cfg.compress {
            sink.write_all(&WRAP_PREFIX)?;
            sink.write_all(&[lz77::FORMAT_STREAM])?;
            Some(Lz77Stream::new())
        } else {
            None
        };
        Ok(StreamingEncoder { enc: Encoder::new(cfg), sink, lz, crc })
    }

    /// Encode one JSON value and push whatever became final to the sink.
    pub fn value(&mut self, v: &Value) -> io::Result<()> {
        self.enc.value(v).map_err(io::Error::other)?;
        self.pump(false)
    }

    /// Flush tail literals and append the CRC; consumes the encoder.
    pub fn finish(mut self) -> io::Result<W> {
        if self.enc.body_len() > 0 {
            self.pump(false)?;
        }
        let checksum = self.crc.clone().finalize();
        let trailer = checksum.to_le_bytes();
        match self.lz.as_mut() {
            Some(lz) => {
                let tail = lz.compress_stream(&trailer, true);
                self.sink.write_all(&tail)?;
            }
            None => self.sink.write_all(&trailer)?,
        }
        self.sink.flush()?;
        Ok(self.sink)
    }

    /// Peak/current working memory, including the LZ77 window.
    pub fn memory_stats(&self) -> crate::mem::MemoryStats {
        let mut stats = self.enc.memory_stats();
        if let Some(lz) = &self.lz {
            stats.current_bytes += lz.byte_size();
            if stats.current_bytes > stats.peak_bytes {
                stats.peak_bytes = stats.current_bytes;
            }
        }
        stats
    }

    /// Drain the encoder's body buffer into the sink.
    fn pump(&mut self, flush: bool) -> io::Result<()> {
        let body = std::mem::take(&mut self.enc.out);
        self.crc.update(&body);
        match self.lz.as_mut() {
            Some(lz) => {
                let compressed = lz.compress_stream(&body, flush);
                self.sink.write_all(&compressed)
            }
            None => self.sink.write_all(&body),
        }
    }
}
