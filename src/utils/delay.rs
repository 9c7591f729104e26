use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::TimingConfig;

/// Randomized pause between requests to the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Politeness {
    min_ms: u64,
    max_ms: u64,
}

impl Politeness {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.delay_min_ms, timing.delay_max_ms)
    }

    pub fn next_delay(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}
