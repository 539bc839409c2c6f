//! USER block — per-channel submission area.
//!
//! The USER block exposes each channel's DMA cursors at a fixed stride.
//! Writing a pushbuffer address to the channel's `DMA_PUT` is the doorbell:
//! the single action that makes previously written command words eligible
//! for hardware fetch. `DMA_GET` mirrors the hardware's fetch progress.
//!
//! Only channel 0 is used here; the constants below are absolute offsets
//! for that channel.

use crate::blocks;

/// Per-channel stride within the USER block.
pub const CHANNEL_STRIDE: usize = 0x1_0000;

/// Channel 0 doorbell — write the masked pushbuffer address to publish it.
pub const DMA_PUT: usize = blocks::USER + 0x40;
/// Channel 0 fetch progress mirror. Read-only from software.
pub const DMA_GET: usize = blocks::USER + 0x44;

/// Mask applied to pushbuffer addresses before they are written to the
/// doorbell. The DMA engine addresses a 64 MB aperture.
pub const DMA_ADDR_MASK: u32 = 0x03FF_FFFF;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doorbell_inside_user_block() {
        assert!(DMA_PUT >= blocks::USER);
        assert_eq!(DMA_GET, DMA_PUT + 4);
    }

    #[test]
    fn mask_is_64mb_aperture() {
        assert_eq!(DMA_ADDR_MASK, (64 << 20) - 1);
    }
}
