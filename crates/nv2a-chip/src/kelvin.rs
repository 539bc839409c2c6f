//! Graphics-class (Kelvin, class 0x97) method IDs and header encoding.
//!
//! A pushbuffer entry is a header word followed by its parameter words:
//!
//! ```text
//! 31       18 17    13 12       0
//! ┌──────────┬────────┬──────────┐
//! │  count   │ subch  │  method  │   then `count` parameter words
//! └──────────┴────────┴──────────┘
//! ```
//!
//! The FIFO machinery treats every word as opaque payload; the method IDs
//! below exist only because the diagnostic scenarios need a handful of
//! well-known commands (no-op, wait-for-idle, surface clear) to exercise
//! the pipeline with.

/// Maximum parameter count encodable in a header.
pub const MAX_METHOD_COUNT: u32 = (1 << 11) - 1;

/// Does nothing; occupies one inner-ring slot.
pub const NO_OPERATION: u32 = 0x0100;
/// Stalls the puller until the graphics engine drains.
pub const WAIT_FOR_IDLE: u32 = 0x0110;
/// Sets the color used by [`CLEAR_SURFACE`].
pub const SET_COLOR_CLEAR_VALUE: u32 = 0x1D90;
/// Clears the active surface; parameter selects planes.
pub const CLEAR_SURFACE: u32 = 0x1D94;

/// CLEAR_SURFACE parameter bits.
pub mod clear_surface {
    /// Depth plane.
    pub const Z: u32 = 1 << 0;
    /// Stencil plane.
    pub const STENCIL: u32 = 1 << 1;
    /// All four color channels.
    pub const COLOR: u32 = 0xF0;
}

/// Encode a method header word.
///
/// # Panics
///
/// Panics if `method` exceeds 13 bits, `subchannel` exceeds 3 bits, or
/// `count` exceeds [`MAX_METHOD_COUNT`] — malformed headers corrupt the
/// pusher's decode state, so these are programming-time invariants.
#[must_use]
pub const fn method_header(subchannel: u32, method: u32, count: u32) -> u32 {
    assert!(method < 1 << 13);
    assert!(subchannel < 1 << 3);
    assert!(count <= MAX_METHOD_COUNT);
    (count << 18) | (subchannel << 13) | method
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        // One-parameter SET_COLOR_CLEAR_VALUE on subchannel 0.
        assert_eq!(method_header(0, SET_COLOR_CLEAR_VALUE, 1), 0x0004_1D90);
        // Zero-parameter WAIT_FOR_IDLE.
        assert_eq!(method_header(0, WAIT_FOR_IDLE, 0), 0x0000_0110);
        // Subchannel lands in bits 15:13.
        assert_eq!(method_header(1, NO_OPERATION, 1), 0x0004_2100);
    }

    #[test]
    fn clear_surface_planes_disjoint() {
        assert_eq!(clear_surface::Z & clear_surface::STENCIL, 0);
        assert_eq!((clear_surface::Z | clear_surface::STENCIL) & clear_surface::COLOR, 0);
    }
}
