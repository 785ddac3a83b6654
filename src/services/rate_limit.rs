//! Fixed-window per-client rate limiting.

use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counts hits per client key within a fixed window.
pub struct RateLimiter {
    max: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            windows: DashMap::new(),
        }
    }

    /// Count a hit for `key`; returns false once the window's budget is spent.
    pub fn try_acquire(&self, key: &str) -> bool {
        self.try_acquire_at(key, Instant::now())
    }

    /// True if `key` has no budget left in its current window. Does not count a hit.
    pub fn is_exhausted(&self, key: &str) -> bool {
        let now = Instant::now();
        self.windows
            .get(key)
            .is_some_and(|w| now.duration_since(w.started) < self.window && w.count >= self.max)
    }

    /// Count a hit without checking the budget (e.g. a failed login).
    pub fn record(&self, key: &str) {
        let _ = self.try_acquire_at(key, Instant::now());
    }

    /// Drop windows that have expired.
    pub fn prune_expired(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    fn try_acquire_at(&self, key: &str, now: Instant) -> bool {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max {
            return false;
        }
        entry.count += 1;
        true
    }
}
