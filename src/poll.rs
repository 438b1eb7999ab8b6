//! Time source and bounded readiness polling.
//!
//! Every wait in the server goes through a [`Clock`] so that engine start-up
//! polls, settle delays and the rate-limit window can be driven by virtual
//! time in tests.

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Source of the current instant and of delays.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// Wall-clock time backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Virtual clock that only moves when told to.
///
/// `sleep` advances the clock by the requested duration and returns
/// immediately, so a sixty second poll completes instantly.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += by;
    }

    /// Total virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        self.advance(duration);
        Box::pin(async {})
    }
}

/// Probe `ready` every `interval` until it returns true or `timeout` elapses.
///
/// The probe runs once immediately and once more after the deadline has been
/// reached, so a readiness that lands exactly on the deadline is observed.
/// Returns whether the probe succeeded.
pub async fn wait_until<F, Fut>(
    clock: &dyn Clock,
    interval: Duration,
    timeout: Duration,
    mut ready: F,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = clock.now() + timeout;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        if ready().await {
            debug!("Readiness probe succeeded after {} attempt(s)", attempt);
            return true;
        }

        if clock.now() >= deadline {
            debug!("Readiness probe gave up after {} attempt(s)", attempt);
            return false;
        }

        clock.sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now() - start, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_wait_until_immediate_success() {
        let clock = ManualClock::new();
        let ok = wait_until(&clock, Duration::from_secs(1), Duration::from_secs(60), || async {
            true
        })
        .await;
        assert!(ok);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_wait_until_succeeds_after_polls() {
        let clock = ManualClock::new();
        let calls = AtomicU32::new(0);
        let ok = wait_until(&clock, Duration::from_secs(1), Duration::from_secs(60), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { n >= 4 }
        })
        .await;

        assert!(ok);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(clock.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_wait_until_times_out() {
        let clock = ManualClock::new();
        let calls = AtomicU32::new(0);
        let ok = wait_until(&clock, Duration::from_secs(1), Duration::from_secs(60), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;

        assert!(!ok);
        assert_eq!(clock.elapsed(), Duration::from_secs(60));
        assert_eq!(calls.load(Ordering::SeqCst), 61);
    }
}
