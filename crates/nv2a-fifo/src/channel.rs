// SPDX-License-Identifier: AGPL-3.0-only

//! Commit & synchronization protocol for the DMA push channel.
//!
//! Ordering rests on one sequence and nothing else: the producer's words
//! must be durably visible to the device *before* the doorbell carries the
//! new put address. [`FifoChannel::commit`] is the only place that sequence
//! exists — locally record the put, run the write-combine flush barrier,
//! then ring the doorbell.
//!
//! There are no interrupts anywhere in this protocol. Both wait primitives
//! poll: a bounded busy-spin for precise timing, and a coarse
//! sleep-and-recheck for when millisecond granularity is enough. Both
//! surface exhaustion as `false`, never as an error — "hardware may still
//! be draining" is a fact for the caller to weigh, not a failure.

use crate::bus::RegisterBus;
use crate::error::Result;
use crate::pushbuf::{BatchCursor, Pushbuffer};
use crate::sampler::{SampleBuffer, Snapshot};
use nv2a_chip::{kelvin, pfifo, user};
use std::time::Duration;

/// Which empty indicator a wait trusts.
///
/// The status low-mark bit and `GET == PUT` equality are computed by
/// different parts of the pipeline and can disagree transiently; neither is
/// documented as authoritative, so both are surfaced and the caller
/// chooses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyCheck {
    /// Trust the CACHE1 STATUS low-mark-empty bit.
    StatusBit,
    /// Trust inner-ring `GET == PUT` equality.
    GetEqPut,
    /// Accept whichever reports empty first.
    Either,
}

/// Default busy-spin bound for [`FifoChannel::wait_cache1_empty`].
pub const DEFAULT_SPIN_ITERS: u32 = 0x07FF_FFFF;

/// Sleep granularity of [`FifoChannel::wait_idle`].
const IDLE_POLL_STEP: Duration = Duration::from_millis(1);

/// The software end of one DMA push channel: owns the register bus and the
/// locally tracked put cursor.
#[derive(Debug)]
pub struct FifoChannel<B> {
    bus: B,
    put: u32,
}

impl<B: RegisterBus> FifoChannel<B> {
    /// Wrap a register bus.
    pub fn new(bus: B) -> Self {
        Self { bus, put: 0 }
    }

    /// The underlying bus (register-level escape hatch).
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Last committed put address.
    #[must_use]
    pub const fn committed_put(&self) -> u32 {
        self.put
    }

    /// Rewind the channel and ring to their initial state.
    ///
    /// Reprograms both channel cursors to the ring base. Only valid while
    /// the consumer is idle — the caller's responsibility, same as
    /// [`Pushbuffer::reset`].
    pub fn reset(&mut self, pb: &mut Pushbuffer) {
        pb.reset();
        let base = pb.dma_base();
        self.bus.write32(user::DMA_GET, base);
        self.bus.write32(user::DMA_PUT, base);
        self.put = base;
        tracing::debug!("channel reset to {base:#010x}");
    }

    /// Publish everything up to `cursor`: record the put locally, run the
    /// barrier, then write the masked address into the doorbell.
    ///
    /// This is the single point at which batch data becomes visible to the
    /// consumer; before it, any amount of appended data is inert.
    pub fn commit(&mut self, pb: &Pushbuffer, cursor: BatchCursor) {
        self.put = pb.dma_address(cursor);
        self.bus.flush_wc();
        self.bus.write32(user::DMA_PUT, self.put);
        tracing::trace!("committed put={:#010x}", self.put);
    }

    /// Busy-spin until CACHE1 reports empty, at most `max_iters` polls.
    ///
    /// Returns `true` on empty, `false` when the bound is exhausted —
    /// which means "hardware may still be draining", not an error.
    /// On a truly empty ring this returns `true` on the first poll and
    /// mutates nothing, so it is idempotent.
    pub fn wait_cache1_empty(&mut self, check: EmptyCheck, max_iters: u32) -> bool {
        let mut i = 0;
        while i < max_iters {
            if self.is_cache1_empty(check) {
                break;
            }
            i += 1;
        }
        let emptied = i < max_iters;
        if !emptied {
            tracing::debug!("cache1 still draining after {max_iters} polls");
        }
        emptied
    }

    /// Submit a trailing idle marker, then sleep-and-recheck until the ring
    /// reports empty or `timeout` elapses.
    ///
    /// The marker is a handful of no-ops followed by a wait-for-idle, so an
    /// empty CACHE1 afterwards implies the engines drained everything that
    /// preceded it. Millisecond granularity; use
    /// [`wait_cache1_empty`](Self::wait_cache1_empty) when timing matters.
    ///
    /// # Errors
    ///
    /// Returns [`FifoError::Overrun`](crate::FifoError::Overrun) if the
    /// marker batch does not fit in the ring.
    pub fn wait_idle(
        &mut self,
        pb: &mut Pushbuffer,
        check: EmptyCheck,
        timeout: Duration,
    ) -> Result<bool> {
        let mut p = pb.begin();
        for _ in 0..6 {
            p = pb.push_method(p, 0, kelvin::NO_OPERATION, &[1])?;
        }
        p = pb.push_method(p, 0, kelvin::WAIT_FOR_IDLE, &[0])?;
        pb.end(p);
        self.commit(pb, p);

        let mut waited = Duration::ZERO;
        while waited < timeout {
            if self.is_cache1_empty(check) {
                return Ok(true);
            }
            std::thread::sleep(IDLE_POLL_STEP);
            waited += IDLE_POLL_STEP;
        }
        let emptied = self.is_cache1_empty(check);
        if !emptied {
            tracing::debug!("ring not idle after {timeout:?}");
        }
        Ok(emptied)
    }

    /// One poll of the selected empty indicator(s).
    fn is_cache1_empty(&mut self, check: EmptyCheck) -> bool {
        match check {
            EmptyCheck::StatusBit => self.status_reports_empty(),
            EmptyCheck::GetEqPut => self.inner_cursors_equal(),
            EmptyCheck::Either => self.status_reports_empty() || self.inner_cursors_equal(),
        }
    }

    fn status_reports_empty(&mut self) -> bool {
        self.bus.read32(pfifo::CACHE1_STATUS) & pfifo::status::LOW_MARK_EMPTY != 0
    }

    fn inner_cursors_equal(&mut self) -> bool {
        self.bus.read32(pfifo::CACHE1_GET) == self.bus.read32(pfifo::CACHE1_PUT)
    }

    /// Single-sample read of the full register set.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::capture(&mut self.bus)
    }

    /// Fill `samples` with exactly `samples.len()` consecutive snapshots.
    ///
    /// Fixed iteration count, no allocation, no logging, no early exit —
    /// the loop is the measurement instrument.
    pub fn fill_samples(&mut self, samples: &mut SampleBuffer) {
        for slot in samples.entries_mut() {
            *slot = Snapshot::capture(&mut self.bus);
        }
    }

    /// Current 64-bit PTIMER tick count.
    pub fn ticks(&mut self) -> u64 {
        crate::profile::gpu_ticks(&mut self.bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::SimBus;

    fn drained_channel() -> (FifoChannel<SimBus>, Pushbuffer) {
        let mut chan = FifoChannel::new(SimBus::with_drain_interval(1));
        let mut pb = Pushbuffer::new(0x0010_0000, 256);
        chan.reset(&mut pb);
        (chan, pb)
    }

    #[test]
    fn commit_rings_doorbell_with_masked_address() {
        let (mut chan, mut pb) = drained_channel();
        let p = pb.begin();
        let p = pb.push_method(p, 0, kelvin::NO_OPERATION, &[1]).unwrap();
        pb.end(p);
        chan.commit(&pb, p);
        assert_eq!(chan.committed_put(), 0x0010_0008);
        assert_eq!(chan.bus_mut().read32(user::DMA_PUT), 0x0010_0008);
    }

    #[test]
    fn empty_wait_succeeds_immediately_on_idle_ring() {
        let (mut chan, _pb) = drained_channel();
        for _ in 0..3 {
            assert!(chan.wait_cache1_empty(EmptyCheck::Either, 4));
            assert!(chan.wait_cache1_empty(EmptyCheck::StatusBit, 4));
            assert!(chan.wait_cache1_empty(EmptyCheck::GetEqPut, 4));
        }
    }

    #[test]
    fn bounded_wait_reports_exhaustion_on_wedged_consumer() {
        let mut chan = FifoChannel::new(SimBus::with_drain_interval(0));
        let mut pb = Pushbuffer::new(0x0010_0000, 256);
        chan.reset(&mut pb);
        let p = pb.begin();
        let p = pb.push_method(p, 0, kelvin::NO_OPERATION, &[1]).unwrap();
        pb.end(p);
        chan.commit(&pb, p);
        // One word got staged at kickoff and the engine never pulls it.
        assert!(!chan.wait_cache1_empty(EmptyCheck::StatusBit, 64));
        assert!(!chan.wait_cache1_empty(EmptyCheck::GetEqPut, 64));
        assert!(!chan.wait_cache1_empty(EmptyCheck::Either, 64));
        assert!(!is_outer_ring_drained(&mut chan));
    }

    fn is_outer_ring_drained(chan: &mut FifoChannel<SimBus>) -> bool {
        let bus = chan.bus_mut();
        bus.read32(pfifo::CACHE1_DMA_GET) == bus.read32(pfifo::CACHE1_DMA_PUT)
    }

    #[test]
    fn wait_idle_drains_committed_work() {
        let (mut chan, mut pb) = drained_channel();
        let mut p = pb.begin();
        for _ in 0..16 {
            p = pb.push_method(p, 0, kelvin::NO_OPERATION, &[1]).unwrap();
        }
        pb.end(p);
        chan.commit(&pb, p);
        let idle = chan
            .wait_idle(&mut pb, EmptyCheck::StatusBit, Duration::from_millis(100))
            .unwrap();
        assert!(idle);
        assert!(is_outer_ring_drained(&mut chan));
    }

    #[test]
    fn wait_idle_overrun_propagates() {
        let mut chan = FifoChannel::new(SimBus::new());
        // Too small to hold the idle marker batch (14 words).
        let mut pb = Pushbuffer::new(0, 8);
        let err = chan
            .wait_idle(&mut pb, EmptyCheck::Either, Duration::from_millis(1))
            .unwrap_err();
        assert!(matches!(err, crate::FifoError::Overrun { .. }));
    }
}
