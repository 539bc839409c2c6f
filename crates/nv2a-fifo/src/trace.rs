//! Trace compression and rendering.
//!
//! A polling sweep is heavily autocorrelated — thousands of consecutive
//! identical snapshots with a handful of transitions buried between them.
//! Rendering run-length-compresses the sequence: each distinct snapshot is
//! emitted once, followed by a repeat marker when it recurred. A register
//! changing value is the only signal of interest; steady periods are noise.
//!
//! Compression is lossless: [`expand`] is the exact inverse of
//! [`compress`], so a rendered trace accounts for every captured sample.

use crate::sampler::Snapshot;
use std::io::{self, Write};

/// One run of identical consecutive snapshots: the snapshot plus how many
/// *extra* times it repeated after its first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// The snapshot value.
    pub snapshot: Snapshot,
    /// Occurrences beyond the first.
    pub repeats: u32,
}

/// Run-length encode a sample sequence.
#[must_use]
pub fn compress(samples: &[Snapshot]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for &snapshot in samples {
        match runs.last_mut() {
            Some(run) if run.snapshot == snapshot => run.repeats += 1,
            _ => runs.push(Run {
                snapshot,
                repeats: 0,
            }),
        }
    }
    runs
}

/// Expand runs back into the original sample sequence.
#[must_use]
pub fn expand(runs: &[Run]) -> Vec<Snapshot> {
    let mut samples = Vec::new();
    for run in runs {
        for _ in 0..=run.repeats {
            samples.push(run.snapshot);
        }
    }
    samples
}

/// Render a sample sequence to a text sink, one line per distinct snapshot
/// plus repeat markers.
///
/// # Errors
///
/// Returns any error from the sink.
pub fn render<W: Write>(samples: &[Snapshot], out: &mut W) -> io::Result<()> {
    for run in compress(samples) {
        write_entry(&run.snapshot, out)?;
        if run.repeats > 0 {
            writeln!(out, "\t    ... repeated {} times ...", run.repeats)?;
        }
    }
    Ok(())
}

/// Render a single labeled snapshot (the before/after comparison form).
///
/// # Errors
///
/// Returns any error from the sink.
pub fn render_snapshot<W: Write>(label: &str, snap: &Snapshot, out: &mut W) -> io::Result<()> {
    write!(out, "{label}:")?;
    write_entry(snap, out)
}

fn write_entry<W: Write>(s: &Snapshot, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "\tDMA: GET 0x{:08X} PUT 0x{:08X}  CACHE1: GET 0x{:08X} PUT 0x{:08X} \
         DmaPush: 0x{:08X} CachePush0: 0x{:08X} CachePull0: 0x{:08X} Cache1Status: 0x{:08X}",
        s.dma_get, s.dma_put, s.cache_get, s.cache_put, s.dma_push, s.push0, s.pull0, s.status
    )
}
