// Unit tests for src/dict.rs: 64-slot LRU dictionary behaviour.

use packr::dict::Dict;
use packr::error::{DictKind, PackrError};

fn name(i: usize) -> Vec<u8> {
    format!("field_{i}").into_bytes()
}

#[test]
fn first_insert_takes_slot_zero() {
    let mut d = Dict::new(DictKind::Field);
    assert_eq!(d.lookup_or_insert(b"rssi"), (0, true));
    assert_eq!(d.lookup_or_insert(b"mac"), (1, true));
    assert_eq!(d.len(), 2);
}

#[test]
fn hit_returns_same_slot_without_insert() {
    let mut d = Dict::new(DictKind::Field);
    d.lookup_or_insert(b"rssi");
    assert_eq!(d.lookup_or_insert(b"rssi"), (0, false));
    assert_eq!(d.len(), 1);
}

#[test]
fn capacity_never_exceeds_64() {
    let mut d = Dict::new(DictKind::String);
    for i in 0..200 {
        d.lookup_or_insert(&name(i));
        assert!(d.len() <= 64);
    }
    assert_eq!(d.len(), 64);
}

#[test]
fn eviction_picks_least_recently_used() {
    let mut d = Dict::new(DictKind::Field);
    for i in 0..64 {
        d.lookup_or_insert(&name(i));
    }
    // Touch slot 0 so slot 1 becomes the oldest.
    d.lookup_or_insert(&name(0));
    let (slot, was_new) = d.lookup_or_insert(b"newcomer");
    assert!(was_new);
    assert_eq!(slot, 1);
    // The evicted name re-inserts somewhere else as new.
    let (_, was_new) = d.lookup_or_insert(&name(1));
    assert!(was_new);
}

#[test]
fn decoder_insert_mirrors_encoder_slots() {
    // Drive an encoder-side dict and a decoder-side dict with the same event
    // stream; every slot decision must agree.
    let mut enc = Dict::new(DictKind::String);
    let mut dec = Dict::new(DictKind::String);
    for round in 0..3 {
        for i in 0..100 {
            let key = name(i * 7 % 90 + round);
            let (slot, was_new) = enc.lookup_or_insert(&key);
            if was_new {
                assert_eq!(dec.insert(key.clone()), slot, "slot divergence on {key:?}");
            } else {
                dec.touch(slot).unwrap();
                assert_eq!(dec.get(slot).unwrap(), key.as_slice());
            }
        }
    }
}

#[test]
fn empty_slot_reference_is_an_error() {
    let mut d = Dict::new(DictKind::Mac);
    assert_eq!(
        d.touch(5).unwrap_err(),
        PackrError::EmptySlot { dict: DictKind::Mac, slot: 5 }
    );
    assert!(d.get(63).is_err());
    assert!(d.is_empty());
}
