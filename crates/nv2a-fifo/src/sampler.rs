//! State sampler — high-frequency, non-perturbing capture of the FIFO's
//! progress registers.
//!
//! The fill loop is itself the measurement instrument: it runs a fixed,
//! known-in-advance iteration count with no allocation, no logging, and no
//! branching beyond the loop counter, so its duration is consistent across
//! runs and sweeps from different scenarios are comparable.

use crate::bus::RegisterBus;
use nv2a_chip::pfifo;

/// Sample count the hardware diagnostics historically use per sweep.
pub const DEFAULT_SAMPLE_ENTRIES: usize = 4096;

/// One instant's reading of every progress register — a pure value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Outer-ring fetch cursor (hardware-owned).
    pub dma_get: u32,
    /// Outer-ring committed cursor (software-owned).
    pub dma_put: u32,
    /// Inner staging-ring pull cursor.
    pub cache_get: u32,
    /// Inner staging-ring stage cursor.
    pub cache_put: u32,
    /// DMA pusher state flags.
    pub dma_push: u32,
    /// Pusher enable register.
    pub push0: u32,
    /// Puller enable register.
    pub pull0: u32,
    /// CACHE1 status summary.
    pub status: u32,
}

impl Snapshot {
    /// Read the full register set once.
    pub fn capture<B: RegisterBus>(bus: &mut B) -> Self {
        Self {
            dma_get: bus.read32(pfifo::CACHE1_DMA_GET),
            dma_put: bus.read32(pfifo::CACHE1_DMA_PUT),
            cache_get: bus.read32(pfifo::CACHE1_GET),
            cache_put: bus.read32(pfifo::CACHE1_PUT),
            dma_push: bus.read32(pfifo::CACHE1_DMA_PUSH),
            push0: bus.read32(pfifo::CACHE1_PUSH0),
            pull0: bus.read32(pfifo::CACHE1_PULL0),
            status: bus.read32(pfifo::CACHE1_STATUS),
        }
    }
}

/// Preallocated fixed-length snapshot sequence.
///
/// Allocated before a timed region begins and reused across scenarios by
/// overwriting in place — the hot fill loop must never allocate.
#[derive(Debug)]
pub struct SampleBuffer {
    entries: Vec<Snapshot>,
}

impl SampleBuffer {
    /// Preallocate `len` zeroed entries.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            entries: vec![Snapshot::default(); len],
        }
    }

    /// Number of entries (fixed at construction).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds zero entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The captured sequence.
    #[must_use]
    pub fn as_slice(&self) -> &[Snapshot] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Snapshot] {
        &mut self.entries
    }
}
