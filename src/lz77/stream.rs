//! Streaming LZ77 compressor with a sliding 4 KiB window.
//!
//! The instance buffers up to two windows of input. When the buffer fills,
//! pending literals are flushed as a literals-only sequence (offset 0, which
//! the decoder recognizes and skips), the top half of the buffer is copied
//! down, positions shift by one window, and hash entries pointing into the
//! discarded half are zeroed while the rest are decremented.

use crate::lz77::{
    common_len, hash4, window_u32, write_sequence, HASH_TABLE_SIZE, MAX_CHAIN, MAX_MATCH,
    MIN_MATCH_BARE, MIN_MATCH_WITH_LITERALS, WINDOW_STREAM,
};

/// Bytes held back until more input (or a flush) arrives, so a match is
/// never cut short by a chunk boundary.
const LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH_BARE;

/// Cooperative streaming compression state.
///
/// Feed chunks through [`Lz77Stream::compress_stream`]; each call returns the
/// sequence bytes that became safely encodable. Passing `flush = true`
/// finalizes the stream, emitting any tail literals.
pub struct Lz77Stream {
    buf: Vec<u8>,
    head: Vec<u32>,
    prev: Vec<u32>,
    pos: usize,
    lit_start: usize,
    finished: bool,
}

impl Default for Lz77Stream {
    fn default() -> Self {
        Self::new()
    }
}

impl Lz77Stream {
    pub fn new() -> Self {
        Lz77Stream {
            buf: Vec::with_capacity(2 * WINDOW_STREAM),
            head: vec![0u32; HASH_TABLE_SIZE],
            prev: vec![0u32; 2 * WINDOW_STREAM],
            pos: 0,
            lit_start: 0,
            finished: false,
        }
    }

    /// Approximate heap footprint of the window and hash state.
    pub fn byte_size(&self) -> usize {
        self.buf.capacity() + (self.head.capacity() + self.prev.capacity()) * 4
    }

    /// Consume `chunk`, returning whatever sequence bytes are now final.
    /// After a `flush = true` call the stream is finished and further input
    /// is ignored.
    pub fn compress_stream(&mut self, chunk: &[u8], flush: bool) -> Vec<u8> {
        let mut out = Vec::new();
        if self.finished {
            return out;
        }
        let mut fed = 0usize;
        while fed < chunk.len() {
            let room = 2 * WINDOW_STREAM - self.buf.len();
            let take = room.min(chunk.len() - fed);
            self.buf.extend_from_slice(&chunk[fed..fed + take]);
            fed += take;
            self.process(&mut out, false);
            if self.buf.len() == 2 * WINDOW_STREAM {
                self.slide(&mut out);
            }
        }
        if flush {
            self.process(&mut out, true);
            if self.lit_start < self.buf.len() {
                write_sequence(&mut out, &self.buf[self.lit_start..], 0, 0);
                self.lit_start = self.buf.len();
            }
            self.finished = true;
        }
        out
    }

    /// Advance the matcher as far as is safe: to the end when flushing,
    /// holding back a lookahead margin otherwise.
    fn process(&mut self, out: &mut Vec<u8>, flush: bool) {
        let len = self.buf.len();
        let stop = if flush { len } else { len.saturating_sub(LOOKAHEAD) };
        while self.pos < stop && self.pos + MIN_MATCH_BARE <= len {
            let i = self.pos;
            let h = hash4(window_u32(&self.buf, i));
            let (best_len, best_off) = self.find_match(i);
            let min_match =
                if i > self.lit_start { MIN_MATCH_WITH_LITERALS } else { MIN_MATCH_BARE };
            if best_len >= min_match {
                write_sequence(out, &self.buf[self.lit_start..i], best_len, best_off as u16);
                let end = i + best_len;
                let mut j = i;
                while j < end {
                    if j + MIN_MATCH_BARE <= len {
                        let h = hash4(window_u32(&self.buf, j));
                        self.prev[j] = self.head[h];
                        self.head[h] = (j + 1) as u32;
                    }
                    j += 1;
                }
                self.pos = end;
                self.lit_start = end;
            } else {
                self.prev[i] = self.head[h];
                self.head[h] = (i + 1) as u32;
                self.pos = i + 1;
            }
        }
        if flush {
            // Positions too close to the end to seed a hash stay literals.
            self.pos = len;
        }
    }

    fn find_match(&self, i: usize) -> (usize, usize) {
        let len = self.buf.len();
        let limit = (len - i).min(MAX_MATCH);
        let mut best_len = 0usize;
        let mut best_off = 0usize;
        let mut cand = self.head[hash4(window_u32(&self.buf, i))];
        let mut depth = 0usize;
        while cand != 0 && depth < MAX_CHAIN {
            let pos = (cand - 1) as usize;
            if pos >= i || i - pos > WINDOW_STREAM {
                break;
            }
            let mlen = common_len(&self.buf[pos..], &self.buf[i..], limit);
            if mlen > best_len {
                best_len = mlen;
                best_off = i - pos;
                if mlen == limit {
                    break;
                }
            }
            cand = self.prev[pos];
            depth += 1;
        }
        (best_len, best_off)
    }

    /// Drop the stale lower window and shift everything down by one window.
    fn slide(&mut self, out: &mut Vec<u8>) {
        if self.lit_start < self.pos {
            write_sequence(out, &self.buf[self.lit_start..self.pos], 3, 0);
            self.lit_start = self.pos;
        }
        let w = WINDOW_STREAM;
        self.buf.drain(..w);
        self.pos -= w;
        self.lit_start -= w;
        for entry in self.head.iter_mut() {
            let v = *entry as usize;
            *entry = if v <= w { 0 } else { (v - w) as u32 };
        }
        let kept = self.buf.len();
        for idx in 0..kept {
            let v = self.prev[idx + w] as usize;
            self.prev[idx] = if v <= w { 0 } else { (v - w) as u32 };
        }
        for entry in self.prev.iter_mut().skip(kept) {
            *entry = 0;
        }
    }
}
