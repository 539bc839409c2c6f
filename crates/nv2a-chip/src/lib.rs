//! Silicon model for the NV2A (the XGPU found in the original Xbox).
//!
//! This crate has **no dependencies** and **no hardware access** — it is a
//! pure model of the silicon: the MMIO block map, the PFIFO CACHE1 register
//! set, the PFB write-combine cache flush register, the USER-block doorbell,
//! the PTIMER tick counters, and the graphics-class method encoding.
//!
//! All offsets are relative to the GPU MMIO aperture base
//! ([`blocks::MMIO_BASE`], `0xFD00_0000` on real hardware) and are bit-exact
//! with the silicon — which bit of CACHE1 STATUS means "empty" is an ABI
//! with the hardware, not a software choice.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`blocks`] | MMIO block base offsets (PMC, PFIFO, PFB, USER, …) |
//! | [`pfifo`] | CACHE1 register offsets — DMA cursors, staging ring, status bits |
//! | [`pfb`] | Write-combine cache flush register and bits |
//! | [`user`] | Channel 0 doorbell registers and the DMA address mask |
//! | [`ptimer`] | Free-running 64-bit tick counter registers |
//! | [`kelvin`] | Graphics-class (0x97) method IDs and method-header encoding |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod blocks;
pub mod kelvin;
pub mod pfb;
pub mod pfifo;
pub mod ptimer;
pub mod user;
