//! Kickoff probe — proves that neither the DMA cursor nor the CACHE1
//! cursors move until the doorbell carries the new put address.
//!
//! A tiny pushbuffer that sets the clear color and clears the active
//! surface is built but *not* submitted; the progress registers are then
//! captured at full poll rate. Only after the commit should any cursor
//! move.
//!
//! Usage:
//!   cargo run --bin probe_no_kickoff
//!   cargo run --bin probe_no_kickoff -- --samples 8192 --backend sim
//!   cargo run --bin probe_no_kickoff -- --backend mmio   (hardware, root)

use anyhow::{anyhow, Result};
use nv2a_chip::kelvin;
use nv2a_fifo::{
    select_bus, trace, BusSelection, EmptyCheck, FifoChannel, Pushbuffer, RegisterBus,
    SampleBuffer,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_SAMPLES: usize = 4096;
const DEFAULT_RING_WORDS: usize = 8192;
const DEFAULT_DRAIN_INTERVAL: usize = 3;
const DMA_BASE: u32 = 0x0010_0000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let samples = parse_arg(&args, "--samples", DEFAULT_SAMPLES);
    let drain = parse_arg(&args, "--drain-interval", DEFAULT_DRAIN_INTERVAL);
    let backend = parse_str_arg(&args, "--backend", "sim");

    println!("== Kickoff probe ==");
    println!("Backend : {backend}");
    println!("Samples : {samples}");
    println!();

    let selection: BusSelection = backend.parse().map_err(|e: String| anyhow!(e))?;
    let bus = select_bus(selection, drain as u32)?;
    let mut chan = FifoChannel::new(bus);
    let mut pb = Pushbuffer::new(DMA_BASE, DEFAULT_RING_WORDS);
    chan.reset(&mut pb);
    chan.wait_idle(&mut pb, EmptyCheck::StatusBit, Duration::from_secs(2))?;

    print_current_state(&mut chan)?;

    let mut p = pb.begin();
    p = pb.push_method(p, 0, kelvin::SET_COLOR_CLEAR_VALUE, &[0x7F7F_7F7F])?;
    p = pb.push_method(
        p,
        0,
        kelvin::CLEAR_SURFACE,
        &[kelvin::clear_surface::COLOR | kelvin::clear_surface::STENCIL | kelvin::clear_surface::Z],
    )?;
    pb.end(p);

    println!(
        "The pushbuffer now exists in memory but has not been submitted; \
         capturing the DMA and CACHE1 pointers repeatedly."
    );
    let mut buffer = SampleBuffer::new(samples);
    chan.fill_samples(&mut buffer);
    trace::render(buffer.as_slice(), &mut std::io::stdout())?;
    println!();

    println!("Submitting the pushbuffer by ringing the doorbell.");
    chan.commit(&pb, p);
    chan.fill_samples(&mut buffer);

    println!("DMA/CACHE1 state immediately following the commit:");
    trace::render(buffer.as_slice(), &mut std::io::stdout())?;

    println!("Probe completed, resetting the pushbuffer pointers");
    chan.wait_idle(&mut pb, EmptyCheck::StatusBit, Duration::from_secs(2))?;
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
