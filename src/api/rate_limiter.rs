use crate::poll::{Clock, SystemClock};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sliding-window call budget.
///
/// Holds the instants of the calls made inside the last `window`; a call is
/// permitted while fewer than `max_calls` remain after pruning. Pruning and
/// recording happen under one lock, so concurrent callers can never jointly
/// exceed the budget.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self::with_clock(max_calls, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_calls: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_calls,
            window,
            clock,
            calls: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// Record a call if the budget allows it.
    pub fn check_limit(&self) -> bool {
        let now = self.clock.now();
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());

        while let Some(oldest) = calls.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }

        if calls.len() >= self.max_calls {
            return false;
        }

        calls.push_back(now);
        true
    }

    /// Time until the oldest call inside the window leaves it.
    pub fn time_until_reset(&self) -> Duration {
        let now = self.clock.now();
        let calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());

        calls
            .iter()
            .map(|t| now.saturating_duration_since(*t))
            .find(|age| *age < self.window)
            .map(|age| self.window - age)
            .unwrap_or(Duration::ZERO)
    }

    /// Calls still available in the current window.
    pub fn remaining(&self) -> usize {
        let now = self.clock.now();
        let calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        let in_window = calls
            .iter()
            .filter(|t| now.saturating_duration_since(**t) < self.window)
            .count();
        self.max_calls.saturating_sub(in_window)
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
