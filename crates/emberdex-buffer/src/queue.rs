//! Bounded in-process buffer between index-mutation producers and the batch
//! flush path.
//!
//! # Drain protocol
//!
//! `take` blocks for the first message, bounded by a deadline fixed at call
//! entry, then drains whatever else is already buffered without further
//! waiting, up to the requested batch size. An empty or short batch means
//! the window closed, never an error.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use tracing::trace;

use crate::error::BufferError;
use crate::message::Completable;

/// Producer and consumer surface of the index mutation buffer.
///
/// `offer` is the producer side; `take` and `ack` belong to consumers.
/// Implementations are shared handles, so one instance can be handed to any
/// number of producers and flush workers.
pub trait BufferQueue<M: Completable>: Send + Sync {
    /// Admits `message` if there is room, drops it otherwise. Never blocks.
    ///
    /// The message's completion signal fires exactly once either way, before
    /// this call returns.
    fn offer(&self, message: M);

    /// Collects up to `max_items` messages within `timeout`.
    ///
    /// Blocks for the first message only; the rest of the batch is whatever
    /// is already buffered at that point. Returns an empty batch when
    /// nothing arrived inside the window.
    fn take(&self, max_items: usize, timeout: Duration) -> Vec<M>;

    /// Acknowledges a processed batch.
    ///
    /// Reserved for future delivery tracking; callers must not assume any
    /// effect today.
    fn ack(&self, batch: Vec<M>);
}

/// Fixed-capacity FIFO buffer backed by a bounded channel.
///
/// Clones share the same channel and drop counter.
pub struct InMemoryBufferQueue<M> {
    tx: Sender<M>,
    rx: Receiver<M>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl<M> InMemoryBufferQueue<M> {
    /// Builds a buffer holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Ok(Self {
            tx,
            rx,
            capacity,
            dropped: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Messages rejected because the buffer was full at offer time.
    pub fn dropped_total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<M> Clone for InMemoryBufferQueue<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            capacity: self.capacity,
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<M> BufferQueue<M> for InMemoryBufferQueue<M>
where
    M: Completable + Send,
{
    fn offer(&self, message: M) {
        // The signal fires before the insert attempt: on success the message
        // moves into the channel, so this is the last point it can fire from.
        message.done();
        match self.tx.try_send(message) {
            Ok(()) => {},
            Err(TrySendError::Full(rejected)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(capacity = self.capacity, "buffer full, dropping message");
                drop(rejected);
            },
            Err(TrySendError::Disconnected(rejected)) => {
                // Unreachable while any handle is alive: every handle owns
                // both channel ends.
                drop(rejected);
            },
        }
    }

    fn take(&self, max_items: usize, timeout: Duration) -> Vec<M> {
        let mut batch = Vec::with_capacity(max_items.min(self.capacity));
        if max_items == 0 {
            return batch;
        }
        let deadline = Instant::now() + timeout;
        // A buffered message is returned even when the deadline has already
        // passed, so a zero timeout still sweeps what is available.
        match self.rx.recv_deadline(deadline) {
            Ok(message) => batch.push(message),
            Err(RecvTimeoutError::Timeout) => return batch,
            Err(RecvTimeoutError::Disconnected) => return batch,
        }
        while batch.len() < max_items {
            match self.rx.try_recv() {
                Ok(message) => batch.push(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        batch
    }

    fn ack(&self, batch: Vec<M>) {
        drop(batch);
    }
}
