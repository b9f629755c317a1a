use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::clock::Clock;
use crate::config::BasketConfig;
use crate::error::{HarvestError, Result};

/// Fixed-window request budget for one source: at most `limit` calls per
/// `window`. The window start resets the first time the elapsed time meets
/// the window length, so a burst of up to `2×limit` calls can straddle a
/// boundary; strict rate smoothing is a non-goal.
pub struct Basket {
    label: &'static str,
    limit: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    window_start: DateTime<Utc>,
    count: u32,
}

impl Basket {
    pub fn new(label: &'static str, cfg: BasketConfig, clock: Arc<dyn Clock>) -> Self {
        let window_start = clock.now();
        Self {
            label,
            limit: cfg.limit,
            window: Duration::from_secs(cfg.window_secs),
            clock,
            window_start,
            count: 0,
        }
    }

    /// Suspends until one more call fits the budget, then records it.
    /// Fails with [`HarvestError::Cancelled`] instead of sleeping once the
    /// run has been aborted; an in-flight wait is preempted the same way.
    pub async fn acquire(&mut self, cancel: &CancelToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(HarvestError::Cancelled);
        }

        let mut elapsed = self.elapsed();
        if elapsed >= self.window {
            self.window_start = self.clock.now();
            self.count = 0;
            elapsed = Duration::ZERO;
        }

        if self.count >= self.limit {
            let wait = self.window.saturating_sub(elapsed) + Duration::from_secs(1);
            debug!(
                source = self.label,
                wait_secs = wait.as_secs(),
                "basket full, waiting for the window to roll over"
            );
            let clock = Arc::clone(&self.clock);
            tokio::select! {
                _ = clock.sleep(wait) => {}
                _ = cancel.cancelled() => return Err(HarvestError::Cancelled),
            }
            self.window_start = self.clock.now();
            self.count = 0;
        }

        self.count += 1;
        Ok(())
    }

    fn elapsed(&self) -> Duration {
        (self.clock.now() - self.window_start)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
