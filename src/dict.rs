//! Fixed-capacity LRU dictionary for field names, strings, and MAC addresses.
//!
//! Each stream owns three of these, 64 slots each. Lookup is a linear scan;
//! with N ≤ 64 entries that is cheaper on MCU-class targets than maintaining
//! a hash structure. Eviction picks the smallest `last_used`, so encoder and
//! decoder converge on identical slot assignments as long as they observe the
//! same sequence of lookups: every emitted reference or NEW_* token
//! corresponds to exactly one `lookup_or_insert` on the encoder side and
//! exactly one `touch` / `insert` on the decoder side.

use crate::error::{DictKind, PackrError, PackrResult};
use crate::token::DICT_CAPACITY;

struct Entry {
    bytes: Vec<u8>,
    last_used: u64,
}

/// One 64-slot LRU table keyed by raw bytes.
pub struct Dict {
    kind: DictKind,
    slots: Vec<Option<Entry>>,
    tick: u64,
}

impl Dict {
    pub fn new(kind: DictKind) -> Self {
        let mut slots = Vec::with_capacity(DICT_CAPACITY);
        slots.resize_with(DICT_CAPACITY, || None);
        Dict { kind, slots, tick: 0 }
    }

    /// Encoder-side lookup. On hit, bumps recency and returns `(slot, false)`.
    /// On miss, claims the first empty slot or evicts the least-recently-used
    /// one, and returns `(slot, true)`.
    pub fn lookup_or_insert(&mut self, bytes: &[u8]) -> (u8, bool) {
        self.tick += 1;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(entry) = slot {
                if entry.bytes == bytes {
                    entry.last_used = self.tick;
                    return (i as u8, false);
                }
            }
        }
        let slot = self.victim_slot();
        self.slots[slot as usize] = Some(Entry { bytes: bytes.to_vec(), last_used: self.tick });
        (slot, true)
    }

    /// Decoder-side insert driven by a NEW_* token. Chooses the same slot the
    /// encoder chose, because both sides run the identical victim policy over
    /// identical recency state.
    pub fn insert(&mut self, bytes: Vec<u8>) -> u8 {
        self.tick += 1;
        let slot = self.victim_slot();
        self.slots[slot as usize] = Some(Entry { bytes, last_used: self.tick });
        slot
    }

    /// Decoder-side recency bump for a reference token.
    pub fn touch(&mut self, slot: u8) -> PackrResult<()> {
        self.tick += 1;
        let tick = self.tick;
        match self.slots.get_mut(slot as usize).and_then(Option::as_mut) {
            Some(entry) => {
                entry.last_used = tick;
                Ok(())
            }
            None => Err(PackrError::EmptySlot { dict: self.kind, slot }),
        }
    }

    /// Bytes stored at `slot`, if a NEW_* event has populated it.
    pub fn get(&self, slot: u8) -> PackrResult<&[u8]> {
        self.slots
            .get(slot as usize)
            .and_then(Option::as_ref)
            .map(|e| e.bytes.as_slice())
            .ok_or(PackrError::EmptySlot { dict: self.kind, slot })
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Approximate heap footprint, for the memory counters.
    pub fn byte_size(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .map(|e| e.bytes.capacity() + core::mem::size_of::<Entry>())
            .sum::<usize>()
            + self.slots.capacity() * core::mem::size_of::<Option<Entry>>()
    }

    /// First empty slot, else the slot with the smallest `last_used` (lowest
    /// index on ties). This is the single eviction point; callers that bind
    /// per-slot state (the field dictionary) reset it whenever an insert
    /// reports a fresh slot.
    fn victim_slot(&self) -> u8 {
        let mut victim = 0usize;
        let mut oldest = u64::MAX;
        for (i, slot) in self.slots.iter().enumerate() {
            match slot {
                None => return i as u8,
                Some(entry) if entry.last_used < oldest => {
                    oldest = entry.last_used;
                    victim = i;
                }
                Some(_) => {}
            }
        }
        victim as u8
    }
}
