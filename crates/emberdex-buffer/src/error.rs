//! Typed errors for buffer construction and flush worker lifecycle.
//!
//! Admission drops and short or empty batches are deliberately not errors:
//! they surface through the drop counter and the returned batch length.

use std::io;

use thiserror::Error;

/// Errors produced when building the buffer or running the flush worker.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Buffer capacity must admit at least one message.
    #[error("buffer capacity must be greater than zero")]
    ZeroCapacity,
    /// Flush batches must carry at least one message.
    #[error("flush batch size must be greater than zero")]
    ZeroBatchSize,
    /// Flush worker thread could not be spawned.
    #[error("failed to spawn flush worker: {source}")]
    SpawnFlushWorker {
        /// I/O error returned by thread spawn.
        #[source]
        source: io::Error,
    },
    /// Flush worker thread panicked.
    #[error("flush worker thread panicked")]
    WorkerPanicked,
}
