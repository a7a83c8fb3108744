use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BufferConfig {
    pub queue_capacity: usize,
    pub flush: FlushConfig,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            flush: FlushConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlushConfig {
    pub batch_size: usize,
    pub poll_interval: Duration,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            batch_size: 128,
            poll_interval: Duration::from_millis(250),
        }
    }
}
