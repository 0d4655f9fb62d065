//! Configuration for the monitoring backend client
//!
//! Provides environment-based configuration for the backend client with
//! sensible defaults for production use. Leaving `BACKEND_BASE_URL` unset
//! (or empty) selects the built-in sample dataset.

use crate::services::backend::{BackendConfig, CircuitBreakerConfig, RetryConfig};
use std::env;

impl BackendConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let base_url = env::var("BACKEND_BASE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let request_timeout_seconds = env::var("BACKEND_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let connect_timeout_seconds = env::var("BACKEND_CONNECT_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        Self {
            base_url,
            request_timeout_seconds,
            connect_timeout_seconds,
            retry: RetryConfig::from_env(),
            circuit_breaker: CircuitBreakerConfig::from_env(),
        }
    }
}

impl RetryConfig {
    /// Load retry configuration from environment variables
    pub fn from_env() -> Self {
        let max_attempts = env::var("BACKEND_RETRY_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let initial_delay_ms = env::var("BACKEND_RETRY_INITIAL_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        let max_delay_ms = env::var("BACKEND_RETRY_MAX_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        // Parse retry status codes from comma-separated values
        let retry_on_status = env::var("BACKEND_RETRY_ON_STATUS")
            .ok()
            .map(|v| {
                v.split(',')
                    .filter_map(|s| s.trim().parse::<u16>().ok())
                    .collect()
            })
            .unwrap_or_else(|| vec![408, 429, 500, 502, 503, 504]);

        Self {
            max_attempts,
            initial_delay_ms,
            max_delay_ms,
            retry_on_status,
        }
    }
}

impl CircuitBreakerConfig {
    /// Load circuit breaker configuration from environment variables
    pub fn from_env() -> Self {
        let failure_threshold = env::var("BACKEND_CB_FAILURE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let success_threshold = env::var("BACKEND_CB_SUCCESS_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let timeout_seconds = env::var("BACKEND_CB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self {
            failure_threshold,
            success_threshold,
            timeout_seconds,
        }
    }
}
