//! Pacing between batch tasks.
//!
//! The batch runner asks its pacer to pause between consecutive tasks so
//! the downstream provider quota is not overwhelmed. Tests swap in a
//! pacer that does not touch the wall clock.

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait before the next task may start
    async fn pause(&self);
}

/// Fixed delay between tasks
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    delay: Duration,
}

impl FixedInterval {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl Pacer for FixedInterval {
    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// No pacing at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

#[async_trait]
impl Pacer for Unpaced {
    async fn pause(&self) {}
}
