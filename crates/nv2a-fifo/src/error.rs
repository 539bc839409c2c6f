//! Error types for PFIFO driver operations

use thiserror::Error;

/// Result type alias for PFIFO operations
pub type Result<T> = std::result::Result<T, FifoError>;

/// Errors that can occur during PFIFO operations
///
/// Bounded waits are deliberately *not* errors: they report exhaustion
/// through their boolean result, and the caller decides whether to proceed.
/// Only conditions that must never be papered over live here.
#[derive(Debug, Error)]
pub enum FifoError {
    /// A batch grew past the ring capacity. Fatal: truncating would corrupt
    /// the command stream for every later batch.
    #[error("Pushbuffer overrun: batch of {batch_words} words exceeds ring capacity {capacity}")]
    Overrun {
        /// Ring capacity in words
        capacity: usize,
        /// Words the batch attempted to occupy
        batch_words: usize,
    },

    /// The MMIO aperture could not be mapped
    #[error("Cannot map MMIO aperture: {reason}")]
    Map {
        /// Reason for failure
        reason: String,
    },

    /// I/O error during device access
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl FifoError {
    /// Create an overrun error
    pub fn overrun(capacity: usize, batch_words: usize) -> Self {
        Self::Overrun {
            capacity,
            batch_words,
        }
    }

    /// Create a map failure error
    pub fn map_failed(reason: impl Into<String>) -> Self {
        Self::Map {
            reason: reason.into(),
        }
    }
}
