//! Metrics configuration.

use std::env;

/// Configuration for application metrics collection.
///
/// When disabled, the `/api/metrics` scrape endpoint answers 503 and no
/// Prometheus output is produced. Request counters are still updated so
/// re-enabling does not lose in-process history.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MetricsConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let enabled = env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Self { enabled }
    }
}
