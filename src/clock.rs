use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of time for the throttle windows and the collection cutoff.
/// Injected everywhere time is read so both are deterministic under test.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    async fn sleep(&self, dur: Duration);
}

/// Wall clock backed by the tokio timer.
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Clock whose time only moves when `sleep` or `advance` is called.
    /// Every sleep is recorded so tests can assert on throttle behavior.
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
        slept: Mutex<Vec<Duration>>,
    }

    impl ManualClock {
        pub fn at(start: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(start),
                slept: Mutex::new(Vec::new()),
            }
        }

        pub fn advance(&self, dur: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += chrono::Duration::from_std(dur).unwrap();
        }

        pub fn slept(&self) -> Vec<Duration> {
            self.slept.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        async fn sleep(&self, dur: Duration) {
            self.advance(dur);
            self.slept.lock().unwrap().push(dur);
        }
    }
}
