//! PFIFO CACHE1 register set.
//!
//! CACHE1 is the active-channel command cache: the DMA pusher fetches words
//! from the pushbuffer in system memory (outer ring, `DMA_GET`/`DMA_PUT`
//! cursors), stages method/data pairs into an on-chip FIFO (inner ring,
//! `GET`/`PUT` cursors), and the puller hands them to the engines.
//!
//! Two facts this module preserves bit-exactly:
//!
//! - `DMA_GET` is hardware-owned and only approaches `DMA_PUT` once the
//!   doorbell in the USER block has been rung; it never passes it.
//! - The STATUS "low mark empty" bit and `GET == PUT` equality are two
//!   *independent* empty indicators computed by different parts of the
//!   pipeline; they can disagree transiently.
//!
//! Offsets are absolute within the MMIO aperture (PFIFO block base folded in).

/// RAMHT (hash table) configuration.
pub const RAMHT: usize = 0x2210;

/// CACHE1 pusher enable.
pub const CACHE1_PUSH0: usize = 0x3200;
/// CACHE1 staging-ring put cursor (software side of the inner ring).
pub const CACHE1_PUT: usize = 0x3210;
/// CACHE1 status summary.
pub const CACHE1_STATUS: usize = 0x3214;
/// DMA pusher state flags.
pub const CACHE1_DMA_PUSH: usize = 0x3220;
/// DMA pusher fetch configuration.
pub const CACHE1_DMA_FETCH: usize = 0x3224;
/// DMA pusher method-decode state.
pub const CACHE1_DMA_STATE: usize = 0x3228;
/// Outer-ring put cursor — the committed pushbuffer address.
pub const CACHE1_DMA_PUT: usize = 0x3240;
/// Outer-ring get cursor — hardware fetch progress. Read-only from software.
pub const CACHE1_DMA_GET: usize = 0x3244;
/// Return address for pushbuffer subroutine calls.
pub const CACHE1_DMA_SUBROUTINE: usize = 0x324C;
/// CACHE1 puller enable.
pub const CACHE1_PULL0: usize = 0x3250;
/// CACHE1 staging-ring get cursor (puller progress).
pub const CACHE1_GET: usize = 0x3270;
/// Staged method word (debug view of the inner ring slot).
pub const CACHE1_METHOD: usize = 0x3800;
/// Staged data word (debug view of the inner ring slot).
pub const CACHE1_DATA: usize = 0x3804;

/// CACHE1_STATUS bit definitions.
pub mod status {
    /// Inner ring is at or below the low-water mark: empty.
    pub const LOW_MARK_EMPTY: u32 = 1 << 4;
    /// Inner ring is at the high-water mark: full.
    pub const HIGH_MARK_FULL: u32 = 1 << 8;
}

/// CACHE1_DMA_PUSH bit definitions.
pub mod dma_push {
    /// DMA pusher access enabled.
    pub const ACCESS: u32 = 1 << 0;
    /// Pusher state: busy fetching/decoding.
    pub const STATE_BUSY: u32 = 1 << 4;
    /// Fetch buffer empty.
    pub const BUFFER_EMPTY: u32 = 1 << 8;
    /// Pusher suspended.
    pub const STATUS_SUSPENDED: u32 = 1 << 12;
    /// Semaphore acquire pending.
    pub const ACQUIRE_PENDING: u32 = 1 << 16;
}

/// CACHE1_PUSH0 bit definitions.
pub mod push0 {
    /// Pusher access enabled.
    pub const ACCESS: u32 = 1 << 0;
}

/// CACHE1_PULL0 bit definitions.
pub mod pull0 {
    /// Puller access enabled.
    pub const ACCESS: u32 = 1 << 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks;

    #[test]
    fn cache1_registers_inside_pfifo_block() {
        for offset in [
            CACHE1_PUSH0,
            CACHE1_PUT,
            CACHE1_STATUS,
            CACHE1_DMA_PUSH,
            CACHE1_DMA_STATE,
            CACHE1_DMA_PUT,
            CACHE1_DMA_GET,
            CACHE1_PULL0,
            CACHE1_GET,
        ] {
            assert!(offset >= blocks::PFIFO && offset < blocks::PRMA);
        }
    }

    #[test]
    fn cursor_pairs_distinct() {
        assert_ne!(CACHE1_DMA_PUT, CACHE1_DMA_GET);
        assert_ne!(CACHE1_PUT, CACHE1_GET);
        assert_ne!(CACHE1_DMA_PUT, CACHE1_PUT);
    }

    #[test]
    fn status_bits() {
        assert_eq!(status::LOW_MARK_EMPTY, 0x10);
        assert_eq!(status::HIGH_MARK_FULL, 0x100);
        assert_eq!(status::LOW_MARK_EMPTY & status::HIGH_MARK_FULL, 0);
    }
}
