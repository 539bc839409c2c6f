//! PTIMER — free-running 64-bit tick counter.
//!
//! The counter is split across two registers; `TIME_0` carries the low bits
//! (31:5, the bottom five read zero) and `TIME_1` the high 32. Reads are
//! racy across the boundary by construction; callers that only measure
//! deltas in the millisecond range read high then low and tolerate the
//! carry window, as the hardware's own diagnostics do.

/// Low word of the tick counter (bits 31:5 significant).
pub const TIME_0: usize = 0x9400;
/// High word of the tick counter.
pub const TIME_1: usize = 0x9410;
/// Alarm comparator.
pub const ALARM_0: usize = 0x9420;
/// Timer interrupt status.
pub const INTR_0: usize = 0x9100;
/// Timer interrupt enable.
pub const INTR_EN_0: usize = 0x9140;
