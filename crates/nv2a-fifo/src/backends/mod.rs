//! Register bus implementations
//!
//! Two backends available:
//!
//! - [`MmioBus`] — the real GPU register aperture, mapped from `/dev/mem`.
//! - [`SimBus`] — an in-memory register file whose consumer side is driven
//!   by a scripted drain model, for tests and hardware-free development.

mod mmio;
mod sim;

pub use mmio::MmioBus;
pub use sim::SimBus;
