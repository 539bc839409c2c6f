//! Register bus abstraction.
//!
//! Every component in this crate reaches the hardware exclusively through
//! [`RegisterBus`] — a capability handed in by the caller, never an ambient
//! global. The production implementation binds the real MMIO aperture; the
//! simulator binds an in-memory register file with a scripted consumer, so
//! the whole commit/wait/sample machinery runs unmodified in CI.

use crate::backends::{MmioBus, SimBus};
use crate::error::Result;
use std::fmt::Debug;

/// Uncached, ordering-respecting access to the GPU register aperture.
///
/// `read32`/`write32` are total: a bad offset is a programming-time
/// invariant, not a runtime failure, and implementations assert it.
/// Reads take `&mut self` because on the simulated bus every register
/// access is also a tick of the modeled hardware clock.
pub trait RegisterBus: Debug + Send {
    /// Read a 32-bit register at an aperture-relative offset.
    fn read32(&mut self, offset: usize) -> u32;

    /// Write a 32-bit register at an aperture-relative offset.
    fn write32(&mut self, offset: usize, value: u32);

    /// The commit barrier: fence outstanding CPU stores, then request a
    /// write-combine cache flush and poll it to completion.
    ///
    /// Blocks only while the device reports flush-in-progress. A flush that
    /// never clears is an unrecoverable hardware fault; implementations
    /// bound the poll with a large guard and panic rather than spin forever.
    fn flush_wc(&mut self);
}

impl RegisterBus for Box<dyn RegisterBus> {
    fn read32(&mut self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        (**self).write32(offset, value);
    }

    fn flush_wc(&mut self) {
        (**self).flush_wc();
    }
}

/// Bus selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusSelection {
    /// Simulated register file with a scripted consumer (no hardware).
    Sim,
    /// Real MMIO aperture via `/dev/mem` (requires the GPU and root).
    Mmio,
}

impl std::fmt::Display for BusSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sim => write!(f, "sim"),
            Self::Mmio => write!(f, "mmio"),
        }
    }
}

impl std::str::FromStr for BusSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "sim" => Ok(Self::Sim),
            "mmio" => Ok(Self::Mmio),
            other => Err(format!("unknown bus '{other}' (expected sim|mmio)")),
        }
    }
}

/// Construct the selected register bus.
///
/// `sim_drain_interval` configures the simulator's consumer speed (one word
/// drained per that many register accesses; 0 stalls the consumer) and is
/// ignored for the hardware bus.
///
/// # Errors
///
/// Returns an error if the hardware aperture cannot be mapped.
pub fn select_bus(selection: BusSelection, sim_drain_interval: u32) -> Result<Box<dyn RegisterBus>> {
    match selection {
        BusSelection::Sim => {
            tracing::info!("Using simulated register bus (drain interval {sim_drain_interval})");
            Ok(Box::new(SimBus::with_drain_interval(sim_drain_interval)))
        }
        BusSelection::Mmio => {
            let bus = MmioBus::map()?;
            tracing::info!("Using hardware MMIO bus");
            Ok(Box::new(bus))
        }
    }
}
