//! End-to-end FIFO protocol properties on the simulated bus.
//!
//! These are the load-bearing guarantees of the commit protocol: batches
//! are inert until committed, the consumer only ever walks toward the
//! committed put, and a rendered trace accounts for every sample.

use nv2a_chip::kelvin;
use nv2a_fifo::{trace, EmptyCheck, FifoChannel, Pushbuffer, SampleBuffer, SimBus};
use std::time::Duration;

const DMA_BASE: u32 = 0x0010_0000;
const RING_WORDS: usize = 4096;

fn fresh_channel(drain_interval: u32) -> (FifoChannel<SimBus>, Pushbuffer) {
    let mut chan = FifoChannel::new(SimBus::with_drain_interval(drain_interval));
    let mut pb = Pushbuffer::new(DMA_BASE, RING_WORDS);
    chan.reset(&mut pb);
    (chan, pb)
}

/// Build the two-command batch the diagnostics use everywhere: set a clear
/// color, then clear all planes of the active surface.
fn build_clear_batch(pb: &mut Pushbuffer) -> nv2a_fifo::BatchCursor {
    let p = pb.begin();
    let p = pb
        .push_method(p, 0, kelvin::SET_COLOR_CLEAR_VALUE, &[0x7F7F_7F7F])
        .unwrap();
    let p = pb
        .push_method(
            p,
            0,
            kelvin::CLEAR_SURFACE,
            &[kelvin::clear_surface::COLOR
                | kelvin::clear_surface::STENCIL
                | kelvin::clear_surface::Z],
        )
        .unwrap();
    pb.end(p);
    p
}

#[test]
fn idle_wait_is_idempotent() {
    let (mut chan, _pb) = fresh_channel(1);
    for _ in 0..8 {
        assert!(chan.wait_cache1_empty(EmptyCheck::Either, 16));
    }
    // Success mutated nothing: the snapshot is the reset-state snapshot.
    let a = chan.snapshot();
    let b = chan.snapshot();
    assert_eq!(a, b);
}

#[test]
fn uncommitted_batch_never_kicks_off() {
    let (mut chan, mut pb) = fresh_channel(1);
    let _cursor = build_clear_batch(&mut pb);

    let mut samples = SampleBuffer::new(4096);
    chan.fill_samples(&mut samples);
    let first = samples.as_slice()[0];
    assert!(
        samples.as_slice().iter().all(|s| *s == first),
        "consumer moved without a doorbell write"
    );
    assert_eq!(first.dma_get, DMA_BASE);
}

#[test]
fn consumer_walks_monotonically_toward_committed_put() {
    let (mut chan, mut pb) = fresh_channel(2);
    let cursor = build_clear_batch(&mut pb);
    chan.commit(&pb, cursor);
    let put = chan.committed_put();

    let mut samples = SampleBuffer::new(1024);
    chan.fill_samples(&mut samples);

    let mut last = samples.as_slice()[0].dma_get;
    for s in samples.as_slice() {
        assert!(s.dma_get >= last, "consumer cursor moved backwards");
        assert!(s.dma_get <= put, "consumer cursor passed the committed put");
        last = s.dma_get;
    }
    assert_eq!(last, put, "consumer never reached the committed put");
}

#[test]
fn scenario_tiny_batch_static_before_commit_moves_after() {
    let (mut chan, mut pb) = fresh_channel(3);
    let cursor = build_clear_batch(&mut pb);

    // Before the commit: 4096 samples, all bit-for-bit identical.
    let mut pre = SampleBuffer::new(4096);
    chan.fill_samples(&mut pre);
    let runs = trace::compress(pre.as_slice());
    assert_eq!(runs.len(), 1, "pre-commit sweep should be one long run");
    assert_eq!(runs[0].repeats, 4095);
    let pre_get = runs[0].snapshot.dma_get;

    chan.commit(&pb, cursor);

    // After: at least one snapshot shows the consumer cursor elsewhere.
    let mut post = SampleBuffer::new(4096);
    chan.fill_samples(&mut post);
    assert!(
        post.as_slice().iter().any(|s| s.dma_get != pre_get),
        "consumer cursor never moved after the commit"
    );

    // The rendered trace collapses the identical tail into one marker.
    let mut rendered = Vec::new();
    trace::render(post.as_slice(), &mut rendered).unwrap();
    let text = String::from_utf8(rendered).unwrap();
    assert!(text.contains("... repeated"));

    // Round-trip law on a real captured sweep.
    assert_eq!(
        trace::expand(&trace::compress(post.as_slice())),
        post.as_slice()
    );
}

#[test]
fn wait_idle_reports_failure_on_wedged_engine_and_success_after_drain() {
    // Wedged: the marker batch is published but never pulled.
    let (mut chan, mut pb) = fresh_channel(0);
    let idle = chan
        .wait_idle(&mut pb, EmptyCheck::StatusBit, Duration::from_millis(5))
        .unwrap();
    assert!(!idle, "wedged engine cannot reach idle");

    // Healthy: same call drains and succeeds.
    let (mut chan, mut pb) = fresh_channel(1);
    let idle = chan
        .wait_idle(&mut pb, EmptyCheck::StatusBit, Duration::from_millis(200))
        .unwrap();
    assert!(idle);
}

#[test]
fn batches_across_reset_reuse_the_ring() {
    let (mut chan, mut pb) = fresh_channel(1);
    for _ in 0..4 {
        let cursor = build_clear_batch(&mut pb);
        chan.commit(&pb, cursor);
        assert!(chan.wait_cache1_empty(EmptyCheck::Either, 1 << 16));
        chan.reset(&mut pb);
        assert_eq!(chan.committed_put(), pb.dma_base());
    }
}
