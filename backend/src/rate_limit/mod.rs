//! Fixed-window rate limiting keyed by string
//!
//! Login attempts are keyed by email and their window restarts at every
//! accepted attempt. Generation requests are keyed by user and their window
//! runs from the first request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// Where a window is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAnchor {
    /// Window starts at the first request and resets after it elapses
    FirstRequest,
    /// Window restarts at every accepted request
    LastRequest,
}

/// Rejection carrying the time until the window reopens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after: Duration,
}

impl RateLimited {
    /// Whole seconds for a `Retry-After` header, at least 1
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
    last: Instant,
}

#[derive(Debug)]
pub struct FixedWindowLimiter {
    max: u32,
    window: Duration,
    anchor: WindowAnchor,
    entries: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(max: u32, window: Duration, anchor: WindowAnchor) -> Self {
        Self {
            max,
            window,
            anchor,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn anchor_of(&self, window: &Window) -> Instant {
        match self.anchor {
            WindowAnchor::FirstRequest => window.started,
            WindowAnchor::LastRequest => window.last,
        }
    }

    fn window_end(&self, window: &Window) -> Instant {
        self.anchor_of(window) + self.window
    }

    /// Count a request for `key`
    pub fn check(&self, key: &str) -> Result<(), RateLimited> {
        self.check_at(key, Instant::now())
    }

    pub(crate) fn check_at(&self, key: &str, now: Instant) -> Result<(), RateLimited> {
        let mut entries = self.lock();
        let fresh = Window {
            count: 1,
            started: now,
            last: now,
        };

        let Some(current) = entries.get(key).copied() else {
            entries.insert(key.to_string(), fresh);
            return Ok(());
        };

        let ends = self.window_end(&current);
        if now >= ends {
            entries.insert(key.to_string(), fresh);
            return Ok(());
        }

        if current.count >= self.max {
            debug!(key, count = current.count, "Rate limit exceeded");
            return Err(RateLimited {
                retry_after: ends - now,
            });
        }

        entries.insert(
            key.to_string(),
            Window {
                count: current.count + 1,
                started: current.started,
                last: now,
            },
        );
        Ok(())
    }

    /// Forget `key`, e.g. after a successful login
    pub fn reset(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Requests left in the current window
    pub fn remaining(&self, key: &str) -> u32 {
        let now = Instant::now();
        match self.lock().get(key) {
            Some(w) if now.saturating_duration_since(self.anchor_of(w)) < self.window => {
                self.max.saturating_sub(w.count)
            }
            _ => self.max,
        }
    }

    /// When the current window for `key` ends; a fresh window for unknown keys
    pub fn reset_at(&self, key: &str) -> Instant {
        match self.lock().get(key) {
            Some(w) => self.window_end(w),
            None => Instant::now() + self.window,
        }
    }

    /// Drop windows that have elapsed
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub(crate) fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, w| now < self.window_end(w));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Purge `limiter` on a fixed period
pub fn spawn_cleanup(
    limiter: Arc<FixedWindowLimiter>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let purged = limiter.purge_expired();
            if purged > 0 {
                debug!(purged, "Purged expired rate limit windows");
            }
        }
    })
}
