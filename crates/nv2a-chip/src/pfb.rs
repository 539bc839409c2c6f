//! PFB write-combine cache control.
//!
//! CPU writes into the pushbuffer go through a write-combine aperture; the
//! GPU will not reliably observe them until the WC cache has been flushed.
//! The flush is requested by setting [`wc_cache::FLUSH_TRIGGER`] and
//! completes when [`wc_cache::FLUSH_IN_PROGRESS`] reads clear. Every
//! doorbell write must be preceded by this flush — it is the second half of
//! the commit barrier (the first half is a CPU store fence).

/// Write-combine cache control register.
pub const WC_CACHE: usize = 0x10_0410;

/// WC_CACHE bit definitions.
pub mod wc_cache {
    /// Flush completion: set while a flush is still draining.
    pub const FLUSH_IN_PROGRESS: u32 = 1 << 0;
    /// Write 1 to request a flush.
    pub const FLUSH_TRIGGER: u32 = 1 << 16;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks;

    #[test]
    fn wc_cache_inside_pfb_block() {
        assert!(WC_CACHE >= blocks::PFB && WC_CACHE < blocks::PSTRAPS);
    }

    #[test]
    fn trigger_and_progress_disjoint() {
        assert_eq!(wc_cache::FLUSH_TRIGGER & wc_cache::FLUSH_IN_PROGRESS, 0);
    }
}
