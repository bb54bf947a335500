//! Fixed-window rate limiting for the classification endpoint.
//!
//! State is held in process memory and resets on restart. Anonymous
//! callers are identified by an `ip:`-prefixed address and get a stricter
//! budget than authenticated users.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Requests per window for authenticated callers.
pub const AUTHENTICATED_LIMIT: u32 = 5;
/// Requests per window for anonymous (`ip:`-identified) callers.
pub const ANONYMOUS_LIMIT: u32 = 2;
/// Window length.
pub const WINDOW: Duration = Duration::from_secs(60);

struct Window {
    count: u32,
    reset_at: Instant,
}

/// Per-identifier fixed-window counter.
pub struct RateLimiter {
    windows: HashMap<String, Window>,
}

impl RateLimiter {
    /// Creates an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }

    /// Records one request from `identifier` and reports whether it is
    /// within budget. The first request of an expired window always
    /// passes and opens a fresh window.
    pub fn check(&mut self, identifier: &str) -> bool {
        self.check_at(identifier, Instant::now())
    }

    fn check_at(&mut self, identifier: &str, now: Instant) -> bool {
        let limit = limit_for(identifier);

        match self.windows.get_mut(identifier) {
            Some(window) if now <= window.reset_at => {
                if window.count >= limit {
                    return false;
                }
                window.count += 1;
                true
            }
            _ => {
                self.windows.insert(
                    identifier.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + WINDOW,
                    },
                );
                true
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// The budget for an identifier: anonymous callers carry an `ip:` prefix
/// and get the stricter limit.
fn limit_for(identifier: &str) -> u32 {
    if identifier.starts_with("ip:") {
        ANONYMOUS_LIMIT
    } else {
        AUTHENTICATED_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_budget_is_five() {
        let mut limiter = RateLimiter::new();
        let now = Instant::now();
        for _ in 0..AUTHENTICATED_LIMIT {
            assert!(limiter.check_at("user-42", now));
        }
        assert!(!limiter.check_at("user-42", now));
    }

    #[test]
    fn anonymous_budget_is_two() {
        let mut limiter = RateLimiter::new();
        let now = Instant::now();
        assert!(limiter.check_at("ip:203.0.113.9", now));
        assert!(limiter.check_at("ip:203.0.113.9", now));
        assert!(!limiter.check_at("ip:203.0.113.9", now));
    }

    #[test]
    fn identifiers_are_independent() {
        let mut limiter = RateLimiter::new();
        let now = Instant::now();
        assert!(limiter.check_at("ip:203.0.113.9", now));
        assert!(limiter.check_at("ip:203.0.113.9", now));
        assert!(!limiter.check_at("ip:203.0.113.9", now));
        assert!(limiter.check_at("ip:198.51.100.7", now));
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let mut limiter = RateLimiter::new();
        let start = Instant::now();
        assert!(limiter.check_at("ip:203.0.113.9", start));
        assert!(limiter.check_at("ip:203.0.113.9", start));
        assert!(!limiter.check_at("ip:203.0.113.9", start));

        let later = start + WINDOW + Duration::from_secs(1);
        assert!(limiter.check_at("ip:203.0.113.9", later));
        assert!(limiter.check_at("ip:203.0.113.9", later));
        assert!(!limiter.check_at("ip:203.0.113.9", later));
    }
}
