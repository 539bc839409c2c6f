//! Pure Rust driver for the NV2A PFIFO DMA push channel.
//!
//! Software produces fixed-size command words into a ring buffer; an
//! autonomous hardware consumer drains them on its own clock. The only
//! channel between the two is a small set of memory-mapped registers — no
//! interrupts, no callbacks — so this crate is built around three things:
//! a commit protocol whose ordering guarantees rest entirely on a
//! write-combine flush barrier preceding the doorbell write, polling-based
//! waits, and a non-perturbing state sampler whose traces are run-length
//! compressed for reading.
//!
//! # Bus hierarchy
//!
//! ```text
//! Hardware:
//!   MmioBus — the real 16 MB register aperture via /dev/mem (needs root)
//!
//! Development / CI:
//!   SimBus  — in-memory register file, scripted consumer drain model
//! ```
//!
//! # Quick start
//!
//! ```
//! use nv2a_chip::kelvin;
//! use nv2a_fifo::{EmptyCheck, FifoChannel, Pushbuffer, SampleBuffer, SimBus, trace};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut chan = FifoChannel::new(SimBus::new());
//! let mut pb = Pushbuffer::new(0x0010_0000, 4096);
//! chan.reset(&mut pb);
//!
//! let mut p = pb.begin();
//! p = pb.push_method(p, 0, kelvin::SET_COLOR_CLEAR_VALUE, &[0x7F7F_7F7F])?;
//! p = pb.push_method(p, 0, kelvin::CLEAR_SURFACE, &[kelvin::clear_surface::COLOR])?;
//! pb.end(p);
//! chan.commit(&pb, p);
//!
//! let mut samples = SampleBuffer::new(256);
//! chan.fill_samples(&mut samples);
//! chan.wait_cache1_empty(EmptyCheck::Either, 0x1_0000);
//!
//! let mut out = Vec::new();
//! trace::render(samples.as_slice(), &mut out)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Register words are intentionally truncated/split when modeling the
// 64-bit tick counter.
#![allow(clippy::cast_possible_truncation)]

pub mod backends;
mod bus;
mod channel;
mod error;
pub mod profile;
mod pushbuf;
mod sampler;
pub mod trace;

pub use backends::{MmioBus, SimBus};
pub use bus::{select_bus, BusSelection, RegisterBus};
pub use channel::{EmptyCheck, FifoChannel, DEFAULT_SPIN_ITERS};
pub use error::{FifoError, Result};
pub use pushbuf::{BatchCursor, Pushbuffer};
pub use sampler::{SampleBuffer, Snapshot, DEFAULT_SAMPLE_ENTRIES};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        BusSelection, EmptyCheck, FifoChannel, FifoError, Pushbuffer, RegisterBus, Result,
        SampleBuffer, SimBus, Snapshot,
    };
}
