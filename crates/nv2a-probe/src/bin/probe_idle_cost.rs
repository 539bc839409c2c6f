//! Idle-cost probe — measures what a WAIT_FOR_IDLE actually costs.
//!
//! Submits a run of WAIT_FOR_IDLE commands and times the drain in GPU
//! ticks, then does the same with NO_OPERATION. `--with-clears`
//! interleaves a CLEAR_SURFACE after every command, which is where the
//! two diverge dramatically: the no-op run drains at fetch speed while
//! every WAIT_FOR_IDLE stalls the puller behind the previous clear.
//!
//! Usage:
//!   cargo run --bin probe_idle_cost
//!   cargo run --bin probe_idle_cost -- --with-clears --entries 200

use anyhow::{anyhow, Result};
use nv2a_chip::kelvin;
use nv2a_fifo::{
    profile, select_bus, trace, BusSelection, EmptyCheck, FifoChannel, Pushbuffer, RegisterBus,
    SampleBuffer, DEFAULT_SPIN_ITERS,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_ENTRIES: usize = 100;
const DEFAULT_SAMPLES: usize = 4096;
const DEFAULT_RING_WORDS: usize = 8192;
const DEFAULT_DRAIN_INTERVAL: usize = 3;
const DMA_BASE: u32 = 0x0010_0000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let entries = parse_arg(&args, "--entries", DEFAULT_ENTRIES);
    let samples = parse_arg(&args, "--samples", DEFAULT_SAMPLES);
    let drain = parse_arg(&args, "--drain-interval", DEFAULT_DRAIN_INTERVAL);
    let backend = parse_str_arg(&args, "--backend", "sim");
    let with_clears = args.iter().any(|a| a == "--with-clears");

    println!("== Idle-cost probe ==");
    println!("Backend     : {backend}");
    println!("Entries     : {entries}");
    println!("With clears : {with_clears}");
    println!();

    let selection: BusSelection = backend.parse().map_err(|e: String| anyhow!(e))?;
    let bus = select_bus(selection, drain as u32)?;
    let mut chan = FifoChannel::new(bus);
    let mut pb = Pushbuffer::new(DMA_BASE, DEFAULT_RING_WORDS);
    chan.reset(&mut pb);

    let mut sweep = SampleBuffer::new(samples);

    println!("\tTesting WAIT_FOR_IDLE");
    run_command_batch(
        &mut chan,
        &mut pb,
        &mut sweep,
        kelvin::WAIT_FOR_IDLE,
        entries,
        with_clears,
    )?;

    println!("\tTesting NO_OPERATION");
    run_command_batch(
        &mut chan,
        &mut pb,
        &mut sweep,
        kelvin::NO_OPERATION,
        entries,
        with_clears,
    )?;

    println!("Probe completed, resetting the pushbuffer pointers");
    chan.reset(&mut pb);
    Ok(())
}

fn run_command_batch(
    chan: &mut FifoChannel<Box<dyn RegisterBus>>,
    pb: &mut Pushbuffer,
    sweep: &mut SampleBuffer,
    command: u32,
    entries: usize,
    with_clears: bool,
) -> Result<()> {
    chan.wait_idle(pb, EmptyCheck::StatusBit, Duration::from_secs(2))?;
    let snap = chan.snapshot();
    trace::render_snapshot("Current state", &snap, &mut std::io::stdout())?;

    let mut p = pb.begin();
    for _ in 0..entries {
        p = pb.push_method(p, 0, command, &[0])?;
        if with_clears {
            p = pb.push_method(
                p,
                0,
                kelvin::CLEAR_SURFACE,
                &[kelvin::clear_surface::COLOR
                    | kelvin::clear_surface::STENCIL
                    | kelvin::clear_surface::Z],
            )?;
        }
    }
    pb.end(p);

    let start = chan.ticks();
    chan.commit(pb, p);
    chan.fill_samples(sweep);
    let emptied = chan.wait_cache1_empty(EmptyCheck::Either, DEFAULT_SPIN_ITERS);
    let delta = profile::ticks_since(chan.bus_mut(), start);

    println!("DMA/CACHE1 state after committing {entries} entries");
    trace::render(sweep.as_slice(), &mut std::io::stdout())?;
    println!("Processed pushbuffer [Emptied:{}] in {delta} ticks", u32::from(emptied));

    chan.reset(pb);
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
