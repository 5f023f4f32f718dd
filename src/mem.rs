//! Working-memory accounting.
//!
//! MCU deployments care about the high-water mark more than the instantaneous
//! figure, so both are tracked: `current_bytes` is recomputed from live buffer
//! capacities on demand, `peak_bytes` only ever grows.

/// Snapshot of an encoder's or decoder's heap usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Heap bytes held right now by dictionaries, windows, and buffers.
    pub current_bytes: usize,
    /// Largest `current_bytes` observed over the instance's lifetime.
    pub peak_bytes: usize,
}

impl MemoryStats {
    /// Fold a fresh measurement into the running peak.
    pub(crate) fn observe(&mut self, current: usize) {
        self.current_bytes = current;
        if current > self.peak_bytes {
            self.peak_bytes = current;
        }
    }
}
