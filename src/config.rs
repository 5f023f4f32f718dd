//! Encoder and decoder configuration.

/// Tunables for one encoder stream. `Default` matches the behaviour of the
/// reference deployment: compression on, entropy pre-check on, batches from
/// four rows up, streaming batches chunked at 256 rows.
#[derive(Debug, Clone, Copy)]
pub struct EncoderConfig {
    /// Apply the LZ77 post-transform to finished frames (and route the
    /// streaming encoder's body through the streaming compressor).
    pub compress: bool,
    /// Skip LZ77 when the first KiB of the frame looks incompressible
    /// (more than 80% distinct byte values).
    pub entropy_precheck: bool,
    /// Minimum row count before an array of homogeneous objects is encoded
    /// as a columnar batch.
    pub batch_threshold: usize,
    /// Row count per BATCH_PARTIAL chunk; a qualifying array larger than
    /// this streams out in chunks, smaller ones go as one ULTRA_BATCH.
    pub partial_rows: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            compress: true,
            entropy_precheck: true,
            batch_threshold: 4,
            partial_rows: 256,
        }
    }
}

/// Tunables for one decoder stream.
#[derive(Debug, Clone, Copy)]
pub struct DecoderConfig {
    /// Upper bound on bytes the decoder will materialize while expanding a
    /// frame (LZ77 output in particular). Zero means unlimited. Exceeding a
    /// non-zero cap fails with `AllocationFailed`.
    pub max_output_bytes: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig { max_output_bytes: 0 }
    }
}
