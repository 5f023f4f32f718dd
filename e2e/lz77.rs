//! E2E Suite: LZ77 block and streaming transform.
//!
//! `decompress(compress(x)) == x` across compressible, incompressible, and
//! degenerate inputs, plus the stored-block expansion guard and the offset
//! validation on the decode side.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use packr::error::PackrError;
use packr::lz77::compress::{compress_block, looks_incompressible};
use packr::lz77::decompress::{decompress, decompress_into};
use packr::lz77::stream::Lz77Stream;
use packr::lz77::{FORMAT_BLOCK, FORMAT_STORED, FORMAT_STREAM};

fn roundtrip_block(data: &[u8]) -> Vec<u8> {
    let block = compress_block(data);
    decompress(&block, 0).expect("block must decode")
}

// ─────────────────────────────────────────────────────────────────────────────
// Block mode
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn empty_input() {
    let block = compress_block(b"");
    assert_eq!(block[0], FORMAT_STORED);
    assert_eq!(roundtrip_block(b""), b"");
}

#[test]
fn short_inputs_store() {
    for data in [&b"a"[..], b"ab", b"abc", b"abcd"] {
        let block = compress_block(data);
        assert_eq!(block[0], FORMAT_STORED, "{data:?} cannot shrink");
        assert_eq!(roundtrip_block(data), data);
    }
}

#[test]
fn repetitive_input_compresses() {
    let data = b"The quick brown fox jumps over the lazy dog. ".repeat(40);
    let block = compress_block(&data);
    assert_eq!(block[0], FORMAT_BLOCK);
    assert!(block.len() < data.len() / 2, "expected better than 2:1 here");
    assert_eq!(roundtrip_block(&data), data);
}

#[test]
fn single_byte_runs_compress() {
    let data = vec![0x42u8; 10_000];
    let block = compress_block(&data);
    assert_eq!(block[0], FORMAT_BLOCK);
    assert!(block.len() < 128);
    assert_eq!(roundtrip_block(&data), data);
}

#[test]
fn random_input_falls_back_to_stored() {
    let mut rng = StdRng::seed_from_u64(7);
    let data: Vec<u8> = (0..4096).map(|_| rng.gen()).collect();
    let block = compress_block(&data);
    assert_eq!(block[0], FORMAT_STORED, "random bytes should not shrink");
    // Stored adds exactly the 5-byte block header.
    assert_eq!(block.len(), data.len() + 5);
    assert_eq!(roundtrip_block(&data), data);
}

#[test]
fn overlapping_matches_replicate() {
    // abcabcabc… forces matches whose source overlaps their destination.
    let data: Vec<u8> = b"abc".iter().copied().cycle().take(5000).collect();
    assert_eq!(roundtrip_block(&data), data);
}

#[test]
fn matches_beyond_the_window_are_not_used() {
    // Two copies of a block separated by > 8 KiB of noise still round-trip.
    let mut rng = StdRng::seed_from_u64(99);
    let mut data = b"needle-needle-needle".to_vec();
    data.extend((0..9000).map(|_| rng.gen::<u8>()));
    data.extend_from_slice(b"needle-needle-needle");
    assert_eq!(roundtrip_block(&data), data);
}

#[test]
fn long_literal_and_match_extensions() {
    // > 15 literals then a > 18-byte match exercises both length chains.
    let mut rng = StdRng::seed_from_u64(3);
    let mut data: Vec<u8> = (0..600).map(|_| rng.gen()).collect();
    let pattern: Vec<u8> = (0..300).map(|_| rng.gen()).collect();
    data.extend_from_slice(&pattern);
    data.extend_from_slice(&pattern);
    assert_eq!(roundtrip_block(&data), data);
}

#[test]
fn mixed_telemetry_like_bytes() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut data = Vec::new();
    for i in 0..500 {
        data.extend_from_slice(b"{\"rssi\":-");
        data.extend_from_slice(format!("{}", 40 + i % 9).as_bytes());
        data.extend_from_slice(b",\"noise\":");
        data.push(rng.gen());
        data.push(b'}');
    }
    assert_eq!(roundtrip_block(&data), data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Entropy pre-check
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn precheck_flags_high_entropy_input() {
    let mut rng = StdRng::seed_from_u64(42);
    let noise: Vec<u8> = (0..1024).map(|_| rng.gen()).collect();
    assert!(looks_incompressible(&noise));
    let text = b"telemetry telemetry telemetry".repeat(40);
    assert!(!looks_incompressible(&text));
    assert!(!looks_incompressible(b""));
}

// ─────────────────────────────────────────────────────────────────────────────
// Decode-side validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn bad_offset_is_rejected() {
    // control: 1 literal, match_nib 0 (len 3); offset 9 points before start.
    let payload = [0x10, b'A', 0x09, 0x00];
    let mut block = vec![FORMAT_BLOCK, 10, 0, 0, 0];
    block.extend_from_slice(&payload);
    assert_eq!(decompress(&block, 0).unwrap_err(), PackrError::Lz77BadOffset);
}

#[test]
fn overflow_is_rejected() {
    // Declared length 4, but literals alone produce 6 bytes.
    let payload = [0x60, b'a', b'b', b'c', b'd', b'e', b'f'];
    let mut block = vec![FORMAT_BLOCK, 4, 0, 0, 0];
    block.extend_from_slice(&payload);
    assert_eq!(decompress(&block, 0).unwrap_err(), PackrError::Lz77Overflow);
}

#[test]
fn truncated_block_is_rejected() {
    let data = b"abcdefgh-abcdefgh-abcdefgh".repeat(10);
    let block = compress_block(&data);
    let cut = &block[..block.len() - 3];
    assert_eq!(decompress(cut, 0).unwrap_err(), PackrError::Truncated);
}

#[test]
fn unknown_format_byte_is_rejected() {
    let block = [0x07u8, 0, 0, 0, 0];
    assert_eq!(decompress(&block, 0).unwrap_err(), PackrError::BadToken(0x07));
}

#[test]
fn output_cap_is_enforced() {
    let data = vec![0u8; 10_000];
    let block = compress_block(&data);
    assert_eq!(decompress(&block, 100).unwrap_err(), PackrError::AllocationFailed);
}

#[test]
fn fixed_buffer_decode() {
    let data = b"fixed-buffer receivers ".repeat(20);
    let block = compress_block(&data);

    let mut exact = vec![0u8; data.len()];
    assert_eq!(decompress_into(&block, &mut exact).unwrap(), data.len());
    assert_eq!(exact, data);

    let mut small = vec![0u8; data.len() - 1];
    assert_eq!(
        decompress_into(&block, &mut small).unwrap_err(),
        PackrError::OutputTooSmall
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming mode
// ─────────────────────────────────────────────────────────────────────────────

fn stream_roundtrip(data: &[u8], chunk: usize) -> Vec<u8> {
    let mut lz = Lz77Stream::new();
    let mut payload = vec![FORMAT_STREAM];
    let mut fed = 0;
    while fed < data.len() {
        let end = (fed + chunk).min(data.len());
        payload.extend(lz.compress_stream(&data[fed..end], false));
        fed = end;
    }
    payload.extend(lz.compress_stream(&[], true));
    decompress(&payload, 0).expect("stream must decode")
}

#[test]
fn streaming_small_chunks() {
    let data = b"sensor frame sensor frame sensor frame ".repeat(100);
    for chunk in [1, 7, 64, 1024] {
        assert_eq!(stream_roundtrip(&data, chunk), data, "chunk size {chunk}");
    }
}

#[test]
fn streaming_across_window_slides() {
    // Well past 2 × 4096 so the window slides several times.
    let mut rng = StdRng::seed_from_u64(5);
    let mut data = Vec::with_capacity(40_000);
    while data.len() < 40_000 {
        if rng.gen_bool(0.7) {
            data.extend_from_slice(b"beacon-frame-payload-");
        } else {
            data.push(rng.gen());
        }
    }
    assert_eq!(stream_roundtrip(&data, 900), data);
}

#[test]
fn streaming_incompressible_data() {
    let mut rng = StdRng::seed_from_u64(13);
    let data: Vec<u8> = (0..20_000).map(|_| rng.gen()).collect();
    assert_eq!(stream_roundtrip(&data, 4096), data);
}

#[test]
fn streaming_empty_and_flush_only() {
    let mut lz = Lz77Stream::new();
    let mut payload = vec![FORMAT_STREAM];
    payload.extend(lz.compress_stream(&[], true));
    assert_eq!(decompress(&payload, 0).unwrap(), Vec::<u8>::new());
}

#[test]
fn stream_ignores_input_after_flush() {
    let mut lz = Lz77Stream::new();
    let mut payload = vec![FORMAT_STREAM];
    payload.extend(lz.compress_stream(b"final bytes", true));
    assert!(lz.compress_stream(b"late", false).is_empty());
    assert_eq!(decompress(&payload, 0).unwrap(), b"final bytes");
}
