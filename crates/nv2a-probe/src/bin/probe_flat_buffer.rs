// SPDX-License-Identifier: AGPL-3.0-only

//! Flat-buffer probe — submits one very large pushbuffer in a single
//! commit and measures, in GPU ticks, how long the consumer takes to
//! drain it.
//!
//! Consecutive sample sweeps are captured back-to-back while the ring
//! drains, then a bounded spin waits for empty. `--wait-for-idle` swaps
//! the per-set trailing no-op for WAIT_FOR_IDLE, which serializes the
//! engines and dominates the drain time.
//!
//! Usage:
//!   cargo run --bin probe_flat_buffer
//!   cargo run --bin probe_flat_buffer -- --wait-for-idle --sweeps 4

use anyhow::{anyhow, Result};
use nv2a_chip::kelvin;
use nv2a_fifo::{
    profile, select_bus, trace, BusSelection, EmptyCheck, FifoChannel, Pushbuffer, SampleBuffer,
    DEFAULT_SPIN_ITERS,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOOPS: usize = 4;
const DEFAULT_SETS_PER_LOOP: usize = 52;
const DEFAULT_SWEEPS: usize = 4;
const DEFAULT_SAMPLES: usize = 4096;
const DEFAULT_RING_WORDS: usize = 8192;
const DEFAULT_DRAIN_INTERVAL: usize = 3;
const DMA_BASE: u32 = 0x0010_0000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let loops = parse_arg(&args, "--loops", DEFAULT_LOOPS);
    let sets = parse_arg(&args, "--sets-per-loop", DEFAULT_SETS_PER_LOOP);
    let sweeps = parse_arg(&args, "--sweeps", DEFAULT_SWEEPS);
    let samples = parse_arg(&args, "--samples", DEFAULT_SAMPLES);
    let drain = parse_arg(&args, "--drain-interval", DEFAULT_DRAIN_INTERVAL);
    let backend = parse_str_arg(&args, "--backend", "sim");
    let wait_for_idle = args.iter().any(|a| a == "--wait-for-idle");

    println!("== Flat-buffer probe ==");
    println!("Backend       : {backend}");
    println!("Total sets    : {}", loops * sets);
    println!("Wait for idle : {wait_for_idle}");
    println!();

    let selection: BusSelection = backend.parse().map_err(|e: String| anyhow!(e))?;
    let bus = select_bus(selection, drain as u32)?;
    let mut chan = FifoChannel::new(bus);
    let mut pb = Pushbuffer::new(DMA_BASE, DEFAULT_RING_WORDS);
    chan.reset(&mut pb);
    chan.wait_idle(&mut pb, EmptyCheck::StatusBit, Duration::from_secs(2))?;

    println!("DMA/CACHE1 state prior to the submission:");
    let snap = chan.snapshot();
    trace::render_snapshot("Current state", &snap, &mut std::io::stdout())?;

    // The whole flat buffer is built before anything is published.
    let mut p = pb.begin();
    for loop_idx in 0..loops {
        for _ in 0..sets {
            p = pb.push_method(
                p,
                0,
                kelvin::SET_COLOR_CLEAR_VALUE,
                &[0xFFFF_0000 + (loop_idx as u32) * 64],
            )?;
            p = pb.push_method(
                p,
                0,
                kelvin::CLEAR_SURFACE,
                &[kelvin::clear_surface::COLOR
                    | kelvin::clear_surface::STENCIL
                    | kelvin::clear_surface::Z],
            )?;
            let trailer = if wait_for_idle {
                kelvin::WAIT_FOR_IDLE
            } else {
                kelvin::NO_OPERATION
            };
            p = pb.push_method(p, 0, trailer, &[0])?;
        }
    }
    pb.end(p);

    let mut sample_sets: Vec<SampleBuffer> =
        (0..sweeps).map(|_| SampleBuffer::new(samples)).collect();

    let start = chan.ticks();
    chan.commit(&pb, p);
    for sweep in &mut sample_sets {
        chan.fill_samples(sweep);
    }
    let emptied = chan.wait_cache1_empty(EmptyCheck::Either, DEFAULT_SPIN_ITERS);
    let delta = profile::ticks_since(chan.bus_mut(), start);

    println!("Processed pushbuffer [Emptied:{}] in {delta} ticks", u32::from(emptied));

    for sweep in &sample_sets {
        trace::render(sweep.as_slice(), &mut std::io::stdout())?;
    }

    chan.reset(&mut pb);
    Ok(())
}

fn parse_arg(args: &[String], flag: &str, default: usize) -> usize {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn parse_str_arg(args: &[String], flag: &str, default: &str) -> String {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map_or_else(|| default.to_string(), |w| w[1].clone())
}
