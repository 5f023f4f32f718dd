// Unit tests for src/bits.rs: MSB-first bit writer and reader.

use packr::bits::{BitReader, BitWriter};
use packr::error::PackrError;

#[test]
fn writer_packs_msb_first() {
    let mut bw = BitWriter::new();
    bw.write_bit(true);
    bw.write_bit(false);
    bw.write_bit(true);
    // 101 followed by zero padding -> 1010_0000
    assert_eq!(bw.finish(), [0xA0]);
}

#[test]
fn writer_bits_value_msb_first() {
    let mut bw = BitWriter::new();
    bw.write_bits(0b1011, 4);
    bw.write_bits(0b0110, 4);
    assert_eq!(bw.finish(), [0xB6]);
}

#[test]
fn writer_pads_final_byte_with_zeros() {
    let mut bw = BitWriter::new();
    bw.write_bits(0x1FF, 9);
    let bytes = bw.finish();
    assert_eq!(bytes, [0xFF, 0x80]);
}

#[test]
fn unary_is_zeros_then_one() {
    let mut bw = BitWriter::new();
    bw.write_unary(3);
    // 0001 then padding
    assert_eq!(bw.finish(), [0x10]);
}

#[test]
fn reader_mirrors_writer() {
    let mut bw = BitWriter::new();
    bw.write_unary(5);
    bw.write_bits(0b101, 3);
    bw.write_unary(0);
    let bytes = bw.finish();

    let mut br = BitReader::new(&bytes);
    assert_eq!(br.read_unary(64).unwrap(), 5);
    assert_eq!(br.read_bits(3).unwrap(), 0b101);
    assert_eq!(br.read_unary(64).unwrap(), 0);
}

#[test]
fn reader_end_of_stream_is_an_error_not_zero_fill() {
    let mut br = BitReader::new(&[0xFF]);
    assert_eq!(br.read_bits(8).unwrap(), 0xFF);
    assert_eq!(br.read_bit().unwrap_err(), PackrError::Truncated);
}

#[test]
fn reader_unary_limit_rejects_runaway_quotient() {
    // All zero bits: the unary never terminates.
    let data = [0x00u8; 8];
    let mut br = BitReader::new(&data);
    assert_eq!(br.read_unary(16).unwrap_err(), PackrError::Truncated);
}

#[test]
fn bytes_consumed_counts_partial_bytes() {
    let data = [0xAA, 0xBB, 0xCC];
    let mut br = BitReader::new(&data);
    assert_eq!(br.bytes_consumed(), 0);
    br.read_bits(3).unwrap();
    assert_eq!(br.bytes_consumed(), 1);
    br.read_bits(5).unwrap();
    assert_eq!(br.bytes_consumed(), 1);
    br.read_bit().unwrap();
    assert_eq!(br.bytes_consumed(), 2);
}
