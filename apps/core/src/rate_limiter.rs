use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Sliding-window limiter keyed by website API key.
///
/// A limit of zero lets every request through. Keys without a request inside
/// the window are dropped by a sweep that runs at most once per window.
#[derive(Debug)]
pub struct RateLimiter {
    /// Request timestamps per key, oldest first.
    requests: HashMap<String, Vec<Instant>>,
    limit: usize,
    window: Duration,
    last_sweep: Instant,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        RateLimiter {
            requests: HashMap::new(),
            limit,
            window,
            last_sweep: Instant::now(),
        }
    }

    /// Records a request for `key` and reports whether it fits the window.
    pub fn check(&mut self, key: &str) -> bool {
        if self.limit == 0 {
            return true;
        }

        let now = Instant::now();
        if now.duration_since(self.last_sweep) >= self.window {
            self.sweep(now);
        }

        let window = self.window;
        let recent = self.requests.entry(key.to_string()).or_default();
        recent.retain(|&at| now.duration_since(at) < window);

        if recent.len() < self.limit {
            recent.push(now);
            true
        } else {
            false
        }
    }

    fn sweep(&mut self, now: Instant) {
        let window = self.window;
        self.requests.retain(|_, recent| {
            recent.retain(|&at| now.duration_since(at) < window);
            !recent.is_empty()
        });
        self.last_sweep = now;
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.requests.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_blocks_after_limit() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("site-a"));
        }
        assert!(!limiter.check("site-a"));
        assert!(limiter.check("site-b"));
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_window_slides() {
        let mut limiter = RateLimiter::new(1, Duration::from_millis(40));
        assert!(limiter.check("site"));
        assert!(!limiter.check("site"));

        thread::sleep(Duration::from_millis(60));

        assert!(limiter.check("site"));
    }

    #[test]
    fn test_idle_keys_are_dropped() {
        let mut limiter = RateLimiter::new(5, Duration::from_millis(40));
        assert!(limiter.check("deleted-site"));
        assert!(limiter.check("other-site"));
        assert_eq!(limiter.tracked_keys(), 2);

        thread::sleep(Duration::from_millis(60));

        assert!(limiter.check("live-site"));
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let mut limiter = RateLimiter::new(0, Duration::from_secs(1));
        for _ in 0..100 {
            assert!(limiter.check("site"));
        }
        assert_eq!(limiter.tracked_keys(), 0);
    }
}
