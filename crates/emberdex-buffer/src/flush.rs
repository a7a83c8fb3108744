//! Flush worker: the consumer loop feeding drained batches to a sink.
//!
//! # Loop structure
//!
//! The worker alternates between a deadline-bounded batch take (so stop
//! requests are noticed within one poll interval) and a sink flush. Shutdown
//! performs a final non-blocking sweep so messages admitted before the stop
//! request are still flushed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{BufferConfig, FlushConfig};
use crate::error::BufferError;
use crate::message::Completable;
use crate::queue::{BufferQueue, InMemoryBufferQueue};

/// Destination for drained batches. The index-write backend implements this.
pub trait BatchSink<M>: Send {
    fn flush(&mut self, batch: &[M]) -> anyhow::Result<()>;
}

/// Handle to a running flush worker thread.
pub struct FlushWorker {
    stop: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl FlushWorker {
    pub fn start<M, Q, S>(queue: Q, sink: S, config: FlushConfig) -> Result<Self, BufferError>
    where
        M: Completable + Send + 'static,
        Q: BufferQueue<M> + 'static,
        S: BatchSink<M> + 'static,
    {
        if config.batch_size == 0 {
            return Err(BufferError::ZeroBatchSize);
        }
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let join = std::thread::Builder::new()
            .name("emberdex-flush-worker".to_string())
            .spawn(move || flush_worker_main(queue, sink, config, worker_stop))
            .map_err(|source| BufferError::SpawnFlushWorker { source })?;
        Ok(Self { stop, join })
    }

    /// Stops the worker after its current poll and joins the thread.
    pub fn shutdown(self) -> Result<(), BufferError> {
        self.stop.store(true, Ordering::Release);
        self.join.join().map_err(|_| BufferError::WorkerPanicked)
    }
}

/// Builds a buffer and its flush worker from one config.
pub fn start_flush_pipeline<M, S>(
    config: BufferConfig,
    sink: S,
) -> Result<(InMemoryBufferQueue<M>, FlushWorker), BufferError>
where
    M: Completable + Send + 'static,
    S: BatchSink<M> + 'static,
{
    let queue = InMemoryBufferQueue::new(config.queue_capacity)?;
    let worker = FlushWorker::start(queue.clone(), sink, config.flush)?;
    Ok((queue, worker))
}

fn flush_worker_main<M, Q, S>(queue: Q, mut sink: S, config: FlushConfig, stop: Arc<AtomicBool>)
where
    M: Completable + Send + 'static,
    Q: BufferQueue<M> + 'static,
    S: BatchSink<M> + 'static,
{
    debug!(batch_size = config.batch_size, "flush worker started");
    while !stop.load(Ordering::Acquire) {
        let batch = queue.take(config.batch_size, config.poll_interval);
        if batch.is_empty() {
            continue;
        }
        flush_batch(&queue, &mut sink, batch);
    }
    // Final sweep for messages admitted before the stop request.
    loop {
        let batch = queue.take(config.batch_size, Duration::ZERO);
        if batch.is_empty() {
            break;
        }
        flush_batch(&queue, &mut sink, batch);
    }
    debug!("flush worker stopped");
}

fn flush_batch<M, Q, S>(queue: &Q, sink: &mut S, batch: Vec<M>)
where
    M: Completable,
    Q: BufferQueue<M>,
    S: BatchSink<M>,
{
    if let Err(error) = sink.flush(&batch) {
        // Ownership transferred at take, so a failed batch is released, not
        // redelivered.
        warn!(count = batch.len(), error = %error, "batch flush failed");
    }
    queue.ack(batch);
}
