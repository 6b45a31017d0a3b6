use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;

pub const DEFAULT_MAX_CALLS: usize = 5;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_TRACKED_KEYS: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Calls allowed per key within one window.
    pub max_calls: usize,
    pub window: Duration,
    /// Upper bound on the number of keys remembered at once.
    pub max_tracked_keys: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: DEFAULT_MAX_CALLS,
            window: DEFAULT_WINDOW,
            max_tracked_keys: DEFAULT_MAX_TRACKED_KEYS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("rate limit reached, retry in {} second(s)", self.retry_after_secs())]
pub struct RateLimited {
    pub retry_after: Duration,
}

impl RateLimited {
    /// Wait time rounded up to whole seconds.
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after.as_secs() + u64::from(self.retry_after.subsec_nanos() > 0)
    }
}

struct CallWindow {
    calls: VecDeque<Instant>,
    last_seen: Instant,
}

impl CallWindow {
    fn new(now: Instant) -> Self {
        Self {
            calls: VecDeque::new(),
            last_seen: now,
        }
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.calls.front() {
            if now.duration_since(*oldest) >= window {
                self.calls.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        self.calls
            .back()
            .map_or(true, |latest| now.duration_since(*latest) >= window)
    }
}

/// Per-key sliding window limiter.
///
/// Keys are compared after trimming and lower-casing, so the same address typed in a
/// different case shares one window.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, CallWindow>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Records a call for `key` if the window allows it.
    pub fn check(&self, key: &str) -> Result<(), RateLimited> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), RateLimited> {
        let key = key.trim().to_lowercase();
        let window = self.config.window;

        let mut windows = self.windows.lock().unwrap_or_else(|err| err.into_inner());

        if !windows.contains_key(&key) && windows.len() >= self.config.max_tracked_keys {
            self.evict(&mut windows, now);
        }

        let entry = windows
            .entry(key)
            .or_insert_with(|| CallWindow::new(now));
        entry.prune(now, window);
        entry.last_seen = now;

        if entry.calls.len() >= self.config.max_calls {
            let retry_after = entry
                .calls
                .front()
                .map_or(window, |oldest| window.saturating_sub(now.duration_since(*oldest)));

            return Err(RateLimited { retry_after });
        }

        entry.calls.push_back(now);
        Ok(())
    }

    /// Frees room for one more key: expired windows first, then the least recently used.
    fn evict(&self, windows: &mut HashMap<String, CallWindow>, now: Instant) {
        let window = self.config.window;
        windows.retain(|_, calls| !calls.is_expired(now, window));

        while !windows.is_empty() && windows.len() >= self.config.max_tracked_keys {
            let lru = windows
                .iter()
                .min_by_key(|(_, calls)| calls.last_seen)
                .map(|(key, _)| key.clone());

            match lru {
                Some(key) => {
                    tracing::debug!(key, "evicting least recently used rate limit window");
                    windows.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Number of keys currently remembered.
    pub fn tracked_keys(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
