//! Rate limiting service for controlling request frequency.

use crate::config::RateLimitConfig;
use crate::utils::http::extract_client_ip;
use actix_web::{HttpRequest, HttpResponse};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Simple in-memory rate limiter
///
/// This implementation uses a sliding window approach to track requests
/// per client IP and enforce rate limits.
#[derive(Clone)]
pub struct SimpleRateLimiter {
    config: RateLimitConfig,
    storage: Arc<Mutex<HashMap<String, (usize, Instant)>>>,
}

impl SimpleRateLimiter {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            storage: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check if the given key (typically a client IP) is within rate limits
    ///
    /// Returns `true` if the request should be allowed, `false` if rate limited.
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let mut storage = self.storage.lock().unwrap();
        let now = Instant::now();

        // Clean up expired entries
        storage.retain(|_, (_, timestamp)| {
            now.duration_since(*timestamp) < Duration::from_secs(self.config.period_seconds)
        });

        match storage.get_mut(key) {
            Some((count, timestamp)) => {
                if now.duration_since(*timestamp) < Duration::from_secs(self.config.period_seconds)
                {
                    if *count >= self.config.requests_per_minute {
                        false // Rate limit exceeded
                    } else {
                        *count += 1;
                        true
                    }
                } else {
                    // Reset the counter for a new period
                    *count = 1;
                    *timestamp = now;
                    true
                }
            }
            None => {
                storage.insert(key.to_string(), (1, now));
                true
            }
        }
    }
}

/// Rate limiting guard using a function-based approach
///
/// Dashboard API handlers call this before doing any work; it resolves the
/// client IP (honoring proxy headers) and returns a 429 response when the
/// limit is exceeded.
pub fn rate_limit_middleware(
    req: &HttpRequest,
    limiter: &SimpleRateLimiter,
) -> Result<(), HttpResponse> {
    let ip = extract_client_ip(req);

    if !limiter.check_rate_limit(&ip) {
        // Rate limit exceeded, return 429
        return Err(HttpResponse::TooManyRequests().json(serde_json::json!({
            "error": "Too Many Requests",
            "message": "Rate limit exceeded. Please try again later."
        })));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(requests_per_minute: usize) -> SimpleRateLimiter {
        SimpleRateLimiter::new(RateLimitConfig {
            requests_per_minute,
            period_seconds: 60,
        })
    }

    #[test]
    fn allows_requests_under_the_limit() {
        let limiter = limiter(3);
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.1"));
    }

    #[test]
    fn blocks_requests_over_the_limit() {
        let limiter = limiter(2);
        assert!(limiter.check_rate_limit("10.0.0.2"));
        assert!(limiter.check_rate_limit("10.0.0.2"));
        assert!(!limiter.check_rate_limit("10.0.0.2"));
    }

    #[test]
    fn keys_are_tracked_independently() {
        let limiter = limiter(1);
        assert!(limiter.check_rate_limit("10.0.0.3"));
        assert!(!limiter.check_rate_limit("10.0.0.3"));
        assert!(limiter.check_rate_limit("10.0.0.4"));
    }
}
