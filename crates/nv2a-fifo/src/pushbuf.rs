//! Pushbuffer producer — the software side of the outer command ring.
//!
//! A batch is built by chaining cursor-returning appends between `begin`
//! and `end`, exactly the protocol the hardware's DMA pusher expects to
//! find in memory. Nothing here is visible to the GPU: a batch stays inert
//! until [`FifoChannel::commit`](crate::FifoChannel::commit) publishes the
//! end cursor through the doorbell.
//!
//! The producer is opcode-agnostic — every word is opaque payload. The
//! [`push_method`](Pushbuffer::push_method) convenience only exists because
//! well-formed batches start each command with a header word.

use crate::error::{FifoError, Result};
use nv2a_chip::{kelvin, user};

/// Position of an in-flight batch: the next free word plus enough context
/// to detect the batch wrapping into itself.
#[derive(Debug, Clone, Copy)]
pub struct BatchCursor {
    index: usize,
    words: usize,
}

impl BatchCursor {
    /// Word index the next append will write.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Words appended to this batch so far.
    #[must_use]
    pub const fn words(&self) -> usize {
        self.words
    }
}

/// Fixed-capacity contiguous word ring plus the DMA base address hardware
/// fetches it from.
///
/// Single writer: software owns every word and the write cursor; hardware
/// only ever reads. That single-writer-per-field discipline is what makes
/// the lock-free register protocol sound.
#[derive(Debug)]
pub struct Pushbuffer {
    words: Vec<u32>,
    dma_base: u32,
    tail: usize,
}

impl Pushbuffer {
    /// Allocate a ring of `capacity_words` words fetched from `dma_base`.
    ///
    /// The backing region is owned here; on real hardware the bootstrap
    /// layer supplies a GPU-visible region and its physical address, which
    /// is where `dma_base` comes from.
    ///
    /// # Panics
    ///
    /// Panics if `capacity_words` is zero.
    #[must_use]
    pub fn new(dma_base: u32, capacity_words: usize) -> Self {
        assert!(capacity_words > 0, "ring must hold at least one word");
        Self {
            words: vec![0; capacity_words],
            dma_base,
            tail: 0,
        }
    }

    /// Ring capacity in words.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    /// Logical tail: where the next batch begins.
    #[must_use]
    pub const fn tail(&self) -> usize {
        self.tail
    }

    /// Masked DMA address of the ring start.
    #[must_use]
    pub const fn dma_base(&self) -> u32 {
        self.dma_base & user::DMA_ADDR_MASK
    }

    /// Masked DMA address a cursor corresponds to — the value the doorbell
    /// takes when the batch ending at `cursor` is committed.
    #[must_use]
    pub fn dma_address(&self, cursor: BatchCursor) -> u32 {
        (self.dma_base + 4 * cursor.index as u32) & user::DMA_ADDR_MASK
    }

    /// Open a batch at the current tail. No side effect.
    #[must_use]
    pub const fn begin(&self) -> BatchCursor {
        BatchCursor {
            index: self.tail,
            words: 0,
        }
    }

    /// Append one word, returning the advanced cursor.
    ///
    /// Wraps to the ring start at the limit; the caller guarantees the
    /// consumer has already passed the wrap point (same contract as
    /// [`reset`](Self::reset)). A batch that would occupy more words than
    /// the ring holds has wrapped into its own start — that is a fatal
    /// overrun and is reported rather than truncated.
    ///
    /// # Errors
    ///
    /// Returns [`FifoError::Overrun`] if the batch exceeds ring capacity.
    pub fn push(&mut self, mut cursor: BatchCursor, word: u32) -> Result<BatchCursor> {
        if cursor.words == self.words.len() {
            return Err(FifoError::overrun(self.words.len(), cursor.words + 1));
        }
        self.words[cursor.index] = word;
        cursor.index += 1;
        if cursor.index == self.words.len() {
            cursor.index = 0;
        }
        cursor.words += 1;
        Ok(cursor)
    }

    /// Append a method header followed by its parameter words.
    ///
    /// # Errors
    ///
    /// Returns [`FifoError::Overrun`] if the batch exceeds ring capacity.
    ///
    /// # Panics
    ///
    /// Panics if `params` exceeds the encodable method count — a malformed
    /// header is a programming-time invariant, not a runtime condition.
    pub fn push_method(
        &mut self,
        cursor: BatchCursor,
        subchannel: u32,
        method: u32,
        params: &[u32],
    ) -> Result<BatchCursor> {
        assert!(params.len() <= kelvin::MAX_METHOD_COUNT as usize);
        #[allow(clippy::cast_possible_truncation)]
        let mut p = self.push(
            cursor,
            kelvin::method_header(subchannel, method, params.len() as u32),
        )?;
        for &param in params {
            p = self.push(p, param)?;
        }
        Ok(p)
    }

    /// Close a batch: advance the logical tail to `cursor`.
    ///
    /// Does **not** publish anything — hardware first observes the batch
    /// when the cursor is committed through the doorbell.
    pub fn end(&mut self, cursor: BatchCursor) {
        self.tail = cursor.index;
    }

    /// Rewind to the initial empty state.
    ///
    /// Only valid while the consumer is idle; resetting with commands still
    /// in flight lets hardware read words a later batch is overwriting,
    /// which is undefined.
    pub fn reset(&mut self) {
        self.tail = 0;
    }

    /// The backing words (for inspection; hardware reads these directly).
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_chain_writes_contiguously() {
        let mut pb = Pushbuffer::new(0, 16);
        let p = pb.begin();
        let p = pb.push(p, 0xAAAA_0001).unwrap();
        let p = pb.push(p, 0xAAAA_0002).unwrap();
        assert_eq!(p.index(), 2);
        assert_eq!(p.words(), 2);
        pb.end(p);
        assert_eq!(pb.tail(), 2);
        assert_eq!(&pb.words()[..2], &[0xAAAA_0001, 0xAAAA_0002]);
    }

    #[test]
    fn method_push_encodes_header_then_params() {
        let mut pb = Pushbuffer::new(0, 16);
        let p = pb.begin();
        let p = pb
            .push_method(p, 0, kelvin::SET_COLOR_CLEAR_VALUE, &[0x7F7F_7F7F])
            .unwrap();
        assert_eq!(p.words(), 2);
        assert_eq!(pb.words()[0], 0x0004_1D90);
        assert_eq!(pb.words()[1], 0x7F7F_7F7F);
    }

    #[test]
    fn wraps_at_limit() {
        let mut pb = Pushbuffer::new(0, 4);
        // Drain a previous batch of 3 words, then wrap mid-batch.
        let p = pb.begin();
        let p = pb.push(p, 1).unwrap();
        let p = pb.push(p, 2).unwrap();
        let p = pb.push(p, 3).unwrap();
        pb.end(p);

        let p = pb.begin();
        let p = pb.push(p, 4).unwrap();
        let p = pb.push(p, 5).unwrap(); // crosses the limit, lands at 0
        assert_eq!(p.index(), 1);
        assert_eq!(pb.words()[0], 5);
    }

    #[test]
    fn overrun_is_detected_not_truncated() {
        let mut pb = Pushbuffer::new(0, 4);
        let mut p = pb.begin();
        for word in 10..14 {
            p = pb.push(p, word).unwrap();
        }
        let err = pb.push(p, 99).unwrap_err();
        match err {
            FifoError::Overrun {
                capacity,
                batch_words,
            } => {
                assert_eq!(capacity, 4);
                assert_eq!(batch_words, 5);
            }
            other => panic!("expected overrun, got {other}"),
        }
        // The colliding word never landed.
        assert_eq!(pb.words()[0], 10);
    }

    #[test]
    fn dma_addresses_are_masked() {
        let pb = Pushbuffer::new(0xF410_0000, 8);
        assert_eq!(pb.dma_base(), 0x0010_0000);
        let p = pb.begin();
        assert_eq!(pb.dma_address(p), 0x0010_0000);
    }

    #[test]
    fn end_without_commit_is_pure_bookkeeping() {
        let mut pb = Pushbuffer::new(0, 8);
        let p = pb.begin();
        let p = pb.push(p, 7).unwrap();
        pb.end(p);
        // Nothing here touches a bus; visibility is commit's job alone.
        assert_eq!(pb.tail(), 1);
    }
}
