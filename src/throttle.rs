//! Per-source request spacing.
//!
//! Each source gets its own slot holding the instant of its last request.
//! Waiting on one source never delays another, so concurrent scrapes of
//! different sources proceed in parallel while hits on the same site stay at
//! least `interval` apart.

use crate::models::Source;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

#[derive(Debug)]
pub struct SourceThrottle {
    interval: Duration,
    slots: HashMap<Source, Mutex<Option<Instant>>>,
}

impl SourceThrottle {
    pub fn new(interval: Duration) -> Self {
        let slots = Source::ALL.iter().map(|s| (*s, Mutex::new(None))).collect();
        Self { interval, slots }
    }

    /// Wait until `source` may be hit again, then claim the slot.
    pub async fn acquire(&self, source: Source) {
        if self.interval.is_zero() {
            return;
        }
        let Some(slot) = self.slots.get(&source) else {
            return;
        };

        let mut last = slot.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.interval;
            if ready_at > Instant::now() {
                debug!(%source, wait_ms = (ready_at - Instant::now()).as_millis() as u64, "Throttling");
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_source_is_spaced() {
        let throttle = SourceThrottle::new(Duration::from_millis(80));
        let start = Instant::now();
        throttle.acquire(Source::Finviz).await;
        throttle.acquire(Source::Finviz).await;
        throttle.acquire(Source::Finviz).await;
        assert!(start.elapsed() >= Duration::from_millis(160));
    }

    #[tokio::test]
    async fn test_sources_do_not_block_each_other() {
        let throttle = SourceThrottle::new(Duration::from_millis(500));
        let start = Instant::now();
        for source in Source::ALL {
            throttle.acquire(source).await;
        }
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let throttle = SourceThrottle::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            throttle.acquire(Source::GoogleNews).await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
