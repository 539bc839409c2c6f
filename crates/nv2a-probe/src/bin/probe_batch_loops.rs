//! Looped-batching probe — submits batches in a loop, capturing a full
//! sample sweep after each submission.
//!
//! Every loop pushes the same clear-color/clear-surface sets; the third
//! command of each set is a no-op by default, or WAIT_FOR_IDLE with
//! `--wait-for-idle`, which is the whole difference between the fast and
//! slow variants of this scenario.
//!
//! Usage:
//!   cargo run --bin probe_batch_loops
//!   cargo run --bin probe_batch_loops -- --wait-for-idle
//!   cargo run --bin probe_batch_loops -- --loops 8 --sets-per-loop 26

use anyhow::{anyhow, Result};
use nv2a_chip::kelvin;
use nv2a_fifo::{
    select_bus, trace, BusSelection, EmptyCheck, FifoChannel, Pushbuffer, RegisterBus,
    SampleBuffer,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOOPS: usize = 4;
const DEFAULT_SETS_PER_LOOP: usize = 52;
const DEFAULT_SAMPLES: usize = 4096;
const DEFAULT_RING_WORDS: usize = 8192;
const DEFAULT_DRAIN_INTERVAL: usize = 3;
const DMA_BASE: u32 = 0x0010_0000;
const SETTLE: Duration = Duration::from_millis(1000);

/// Words per clear set: three commands of two words each.
const WORDS_PER_SET: usize = 6;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let loops = parse_arg(&args, "--loops", DEFAULT_LOOPS);
    let sets = parse_arg(&args, "--sets-per-loop", DEFAULT_SETS_PER_LOOP);
    let samples = parse_arg(&args, "--samples", DEFAULT_SAMPLES);
    let drain = parse_arg(&args, "--drain-interval", DEFAULT_DRAIN_INTERVAL);
    let backend = parse_str_arg(&args, "--backend", "sim");
    let wait_for_idle = args.iter().any(|a| a == "--wait-for-idle");

    println!("== Looped batching probe ==");
    println!("Backend        : {backend}");
    println!("Loops          : {loops}");
    println!("Sets per loop  : {sets}");
    println!("Wait for idle  : {wait_for_idle}");
    println!();

    let selection: BusSelection = backend.parse().map_err(|e: String| anyhow!(e))?;
    let bus = select_bus(selection, drain as u32)?;
    let mut chan = FifoChannel::new(bus);
    let mut pb = Pushbuffer::new(DMA_BASE, DEFAULT_RING_WORDS);
    chan.reset(&mut pb);
    chan.wait_idle(&mut pb, EmptyCheck::StatusBit, Duration::from_secs(2))?;

    println!("DMA/CACHE1 state prior to the first submission:");
    print_current_state(&mut chan)?;

    // Sweeps are preallocated before anything is timed.
    let mut sweeps: Vec<SampleBuffer> = (0..loops).map(|_| SampleBuffer::new(samples)).collect();

    for (loop_idx, sweep) in sweeps.iter_mut().enumerate() {
        let mut p = pb.begin();
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
        pb.end(p);
        chan.commit(&pb, p);
        chan.fill_samples(sweep);
    }

    for (loop_idx, sweep) in sweeps.iter().enumerate() {
        println!(
            "DMA/CACHE1 state after submission {loop_idx} [{} words = {} bytes]",
            sets * WORDS_PER_SET,
            sets * WORDS_PER_SET * 4
        );
        trace::render(sweep.as_slice(), &mut std::io::stdout())?;
    }

    std::thread::sleep(SETTLE);

    println!("State after final settle");
    let mut final_sweep = SampleBuffer::new(samples);
    chan.fill_samples(&mut final_sweep);
    trace::render(final_sweep.as_slice(), &mut std::io::stdout())?;

    chan.reset(&mut pb);
    Ok(())
}

fn print_current_state(chan: &mut FifoChannel<Box<dyn RegisterBus>>) -> Result<()> {
    let snap = chan.snapshot();
    trace::render_snapshot("Current state", &snap, &mut std::io::stdout())?;
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
