//! Cross-project analytics data models.

use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

/// Top-line aggregates across the selected projects.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsKpis {
    pub total_requests: u64,
    /// Request-weighted mean response time in milliseconds.
    pub avg_latency: f64,
}

/// One leaderboard row: a grouped endpoint ranked by latency or errors.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    /// Normalized endpoint path, e.g. `/posts/{id}`.
    pub endpoint: String,
    pub method: String,
    pub avg_latency: f64,
    pub total_requests: u64,
    pub error_rate: f64,
    pub project_name: String,
}

/// Response body for the analytics overview.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub kpis: AnalyticsKpis,
    pub top_slowest_endpoints: Vec<LeaderboardRow>,
    pub top_errored_endpoints: Vec<LeaderboardRow>,
    pub generated_at: String,
}
