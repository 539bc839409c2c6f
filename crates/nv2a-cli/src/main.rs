//! `nv2a` — command-line interface for PFIFO observation.
//!
//! ```text
//! USAGE:
//!   nv2a snapshot                 One reading of the full register set
//!   nv2a watch [--samples N]      Timed sweep, rendered as a compressed trace
//!   nv2a drain [--timeout-ms N]   Submit an idle marker and wait for empty
//! ```
//!
//! All subcommands run against the simulated bus by default; pass
//! `--backend mmio` on hardware (requires root for `/dev/mem`).

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use nv2a_fifo::{
    select_bus, trace, BusSelection, EmptyCheck, FifoChannel, Pushbuffer, RegisterBus,
    SampleBuffer,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DMA_BASE: u32 = 0x0010_0000;
const RING_WORDS: usize = 8192;

#[derive(Parser)]
#[command(name = "nv2a", about = "NV2A PFIFO observation CLI", version)]
struct Cli {
    /// Register bus: sim | mmio
    #[arg(long, default_value = "sim", global = true)]
    backend: String,

    /// Simulated consumer speed (words per N accesses; 0 = wedged)
    #[arg(long, default_value_t = 3, global = true)]
    drain_interval: u32,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print one reading of the full progress register set.
    Snapshot,
    /// Capture a fixed-length sample sweep and render the compressed trace.
    Watch {
        /// Snapshots to capture.
        #[arg(long, default_value_t = nv2a_fifo::DEFAULT_SAMPLE_ENTRIES)]
        samples: usize,
    },
    /// Submit a trailing idle marker and wait for the ring to empty.
    Drain {
        /// Give up after this many milliseconds.
        #[arg(long, default_value_t = 2048)]
        timeout_ms: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    let selection: BusSelection = cli.backend.parse().map_err(|e: String| anyhow!(e))?;
    let bus = select_bus(selection, cli.drain_interval)?;
    let mut chan = FifoChannel::new(bus);

    match cli.command {
        Cmd::Snapshot => cmd_snapshot(&mut chan)?,
        Cmd::Watch { samples } => cmd_watch(&mut chan, samples)?,
        Cmd::Drain { timeout_ms } => cmd_drain(&mut chan, timeout_ms)?,
    }

    Ok(())
}

fn cmd_snapshot(chan: &mut FifoChannel<Box<dyn RegisterBus>>) -> Result<()> {
    let snap = chan.snapshot();
    trace::render_snapshot("Current state", &snap, &mut std::io::stdout())?;
    Ok(())
}

fn cmd_watch(chan: &mut FifoChannel<Box<dyn RegisterBus>>, samples: usize) -> Result<()> {
    let mut sweep = SampleBuffer::new(samples);
    chan.fill_samples(&mut sweep);
    trace::render(sweep.as_slice(), &mut std::io::stdout())?;
    Ok(())
}

fn cmd_drain(chan: &mut FifoChannel<Box<dyn RegisterBus>>, timeout_ms: u64) -> Result<()> {
    let mut pb = Pushbuffer::new(DMA_BASE, RING_WORDS);
    chan.reset(&mut pb);
    let idle = chan.wait_idle(
        &mut pb,
        EmptyCheck::Either,
        Duration::from_millis(timeout_ms),
    )?;
    if idle {
        println!("Ring empty.");
    } else {
        println!("Ring still draining after {timeout_ms} ms.");
    }
    Ok(())
}
