#![deny(clippy::wildcard_imports)]

pub mod config;
pub mod error;
pub mod flush;
pub mod message;
pub mod queue;

pub use config::{BufferConfig, FlushConfig};
pub use error::BufferError;
pub use flush::{BatchSink, FlushWorker, start_flush_pipeline};
pub use message::Completable;
pub use queue::{BufferQueue, InMemoryBufferQueue};
