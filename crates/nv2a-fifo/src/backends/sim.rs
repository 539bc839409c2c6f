// SPDX-License-Identifier: AGPL-3.0-only

//! Simulated register bus with a scripted hardware consumer.
//!
//! Models exactly the register set the driver touches: the outer-ring DMA
//! cursors, the CACHE1 staging cursors and flags, the WC cache handshake,
//! the channel 0 doorbell, and the PTIMER tick counter. The consumer side
//! runs on a scripted clock: every register access is one tick, and every
//! `drain_interval` ticks the modeled hardware fetches one committed word
//! and pulls one staged word.
//!
//! Two properties of the silicon are reproduced faithfully because the
//! whole test suite rests on them:
//!
//! 1. **No auto-kickoff** — `DMA_GET` never moves until the doorbell
//!    (`user::DMA_PUT`) has been written, no matter how many words sit in
//!    the pushbuffer.
//! 2. **Monotonic drain** — once rung, `DMA_GET` advances one word at a
//!    time toward `DMA_PUT` and never passes it.
//!
//! The model fetches linearly between resets; a committed batch that wraps
//! the ring parks the consumer until the next reset, which is conservative
//! but keeps the model free of ring-geometry knowledge.

use crate::bus::RegisterBus;
use nv2a_chip::{pfb, pfifo, ptimer, user};

/// Inner staging ring size in bytes (128 slots of 4 bytes).
const INNER_RING_BYTES: u32 = 0x200;

/// PTIMER ticks elapsed per register access.
const TICKS_PER_ACCESS: u64 = 32;

/// Default consumer speed: one word drained per this many accesses.
const DEFAULT_DRAIN_INTERVAL: u32 = 3;

/// In-memory register file with scripted consumer-side advancement.
#[derive(Debug)]
pub struct SimBus {
    dma_put: u32,
    dma_get: u32,
    cache_put: u32,
    cache_get: u32,
    dma_push: u32,
    push0: u32,
    pull0: u32,
    status: u32,
    dma_state: u32,
    dma_subroutine: u32,
    /// Set once the doorbell has been rung; the consumer stays parked
    /// before that.
    kicked: bool,
    /// One word drained per this many accesses; 0 parks the consumer.
    drain_interval: u32,
    accesses: u64,
    ticks: u64,
}

impl SimBus {
    /// Simulator with the default consumer speed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_drain_interval(DEFAULT_DRAIN_INTERVAL)
    }

    /// Simulator draining one word per `interval` register accesses.
    /// `interval == 0` parks the consumer permanently (a wedged engine),
    /// which is what liveness-failure tests want.
    #[must_use]
    pub fn with_drain_interval(interval: u32) -> Self {
        Self {
            dma_put: 0,
            dma_get: 0,
            cache_put: 0,
            cache_get: 0,
            dma_push: pfifo::dma_push::ACCESS | pfifo::dma_push::BUFFER_EMPTY,
            push0: pfifo::push0::ACCESS,
            pull0: pfifo::pull0::ACCESS,
            status: pfifo::status::LOW_MARK_EMPTY,
            dma_state: 0,
            dma_subroutine: 0,
            kicked: false,
            drain_interval: interval,
            accesses: 0,
            ticks: 0,
        }
    }

    /// Change the consumer speed mid-run.
    pub fn set_drain_interval(&mut self, interval: u32) {
        self.drain_interval = interval;
    }

    /// One tick of the modeled hardware clock.
    fn tick(&mut self) {
        self.accesses += 1;
        self.ticks += TICKS_PER_ACCESS;
        if self.kicked
            && self.drain_interval != 0
            && self.accesses % u64::from(self.drain_interval) == 0
        {
            self.step_consumer();
        }
    }

    /// Fetch one committed word and pull one staged word.
    fn step_consumer(&mut self) {
        if self.cache_get != self.cache_put {
            self.cache_get = (self.cache_get + 4) % INNER_RING_BYTES;
        }
        if self.dma_get < self.dma_put {
            self.dma_get += 4;
            self.cache_put = (self.cache_put + 4) % INNER_RING_BYTES;
        }
        self.update_summaries();
    }

    /// Recompute the hardware-computed summary bits from the cursors.
    fn update_summaries(&mut self) {
        if self.cache_get == self.cache_put {
            self.status |= pfifo::status::LOW_MARK_EMPTY;
        } else {
            self.status &= !pfifo::status::LOW_MARK_EMPTY;
        }
        if self.dma_get == self.dma_put {
            self.dma_push |= pfifo::dma_push::BUFFER_EMPTY;
            self.dma_push &= !pfifo::dma_push::STATE_BUSY;
        } else {
            self.dma_push &= !pfifo::dma_push::BUFFER_EMPTY;
            self.dma_push |= pfifo::dma_push::STATE_BUSY;
        }
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for SimBus {
    fn read32(&mut self, offset: usize) -> u32 {
        self.tick();
        match offset {
            pfifo::CACHE1_DMA_PUT | user::DMA_PUT => self.dma_put,
            pfifo::CACHE1_DMA_GET | user::DMA_GET => self.dma_get,
            pfifo::CACHE1_PUT => self.cache_put,
            pfifo::CACHE1_GET => self.cache_get,
            pfifo::CACHE1_DMA_PUSH => self.dma_push,
            pfifo::CACHE1_PUSH0 => self.push0,
            pfifo::CACHE1_PULL0 => self.pull0,
            pfifo::CACHE1_STATUS => self.status,
            pfifo::CACHE1_DMA_STATE => self.dma_state,
            pfifo::CACHE1_DMA_SUBROUTINE => self.dma_subroutine,
            // Flushes complete instantly in the model.
            pfb::WC_CACHE => 0,
            ptimer::TIME_0 => (self.ticks as u32) & 0xFFFF_FFE0,
            ptimer::TIME_1 => (self.ticks >> 32) as u32,
            other => panic!("read of unmapped register {other:#x}"),
        }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        self.tick();
        match offset {
            user::DMA_PUT => {
                // The doorbell: publication point and consumer enable. The
                // pusher reacts immediately, staging the first fetch before
                // any further software access.
                self.dma_put = value;
                self.kicked = true;
                if self.dma_get < self.dma_put {
                    self.dma_get += 4;
                    self.cache_put = (self.cache_put + 4) % INNER_RING_BYTES;
                }
                self.update_summaries();
            }
            user::DMA_GET => {
                // Software may reprogram this only while idle (reset).
                self.dma_get = value;
                self.kicked = false;
                self.update_summaries();
            }
            pfb::WC_CACHE => {
                // Accept the flush trigger; completion is immediate.
            }
            pfifo::CACHE1_PUSH0 => self.push0 = value,
            pfifo::CACHE1_PULL0 => self.pull0 = value,
            other => panic!("write of unmapped register {other:#x}"),
        }
    }

    fn flush_wc(&mut self) {
        let ctrl = self.read32(pfb::WC_CACHE);
        self.write32(pfb::WC_CACHE, ctrl | pfb::wc_cache::FLUSH_TRIGGER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parked_until_doorbell() {
        let mut bus = SimBus::with_drain_interval(1);
        for _ in 0..100 {
            assert_eq!(bus.read32(pfifo::CACHE1_DMA_GET), 0);
        }
    }

    #[test]
    fn drains_toward_put_after_doorbell() {
        let mut bus = SimBus::with_drain_interval(1);
        bus.write32(user::DMA_PUT, 16);
        let mut last = bus.read32(pfifo::CACHE1_DMA_GET);
        for _ in 0..100 {
            let get = bus.read32(pfifo::CACHE1_DMA_GET);
            assert!(get >= last && get <= 16, "get={get} last={last}");
            last = get;
        }
        assert_eq!(last, 16);
        // Fully drained: both empty signals agree again.
        assert_ne!(
            bus.read32(pfifo::CACHE1_STATUS) & pfifo::status::LOW_MARK_EMPTY,
            0
        );
    }

    #[test]
    fn wedged_consumer_stages_one_fetch_then_parks() {
        let mut bus = SimBus::with_drain_interval(0);
        bus.write32(user::DMA_PUT, 64);
        for _ in 0..1000 {
            // The doorbell kicked off exactly one fetch; nothing drains.
            assert_eq!(bus.read32(pfifo::CACHE1_DMA_GET), 4);
            assert_eq!(
                bus.read32(pfifo::CACHE1_STATUS) & pfifo::status::LOW_MARK_EMPTY,
                0
            );
        }
    }

    #[test]
    fn consumer_can_be_unwedged_mid_run() {
        let mut bus = SimBus::with_drain_interval(0);
        bus.write32(user::DMA_PUT, 16);
        for _ in 0..100 {
            assert!(bus.read32(pfifo::CACHE1_DMA_GET) < 16);
        }
        bus.set_drain_interval(1);
        for _ in 0..100 {
            let _ = bus.read32(pfifo::CACHE1_STATUS);
        }
        assert_eq!(bus.read32(pfifo::CACHE1_DMA_GET), 16);
    }

    #[test]
    fn empty_bit_tracks_inner_ring() {
        let mut bus = SimBus::with_drain_interval(1);
        assert_ne!(
            bus.read32(pfifo::CACHE1_STATUS) & pfifo::status::LOW_MARK_EMPTY,
            0
        );
        bus.write32(user::DMA_PUT, 8);
        // Drain both words plus the staged lag, then the bit returns.
        for _ in 0..50 {
            let _ = bus.read32(pfifo::CACHE1_STATUS);
        }
        assert_ne!(
            bus.read32(pfifo::CACHE1_STATUS) & pfifo::status::LOW_MARK_EMPTY,
            0
        );
        assert_eq!(bus.read32(pfifo::CACHE1_GET), bus.read32(pfifo::CACHE1_PUT));
    }

    #[test]
    fn ptimer_advances_with_accesses() {
        let mut bus = SimBus::new();
        let t0 = bus.read32(ptimer::TIME_0);
        for _ in 0..16 {
            let _ = bus.read32(pfifo::CACHE1_STATUS);
        }
        assert!(bus.read32(ptimer::TIME_0) > t0);
    }
}
