//! Cross-project analytics endpoint handler.

use crate::handlers::map_backend_error;
use crate::models::AnalyticsSummary;
use crate::services::backend::DataSource;
use crate::services::endpoints::{EndpointAnalyzer, TIME_RANGES};
use crate::services::rate_limit::{rate_limit_middleware, SimpleRateLimiter};
use actix_web::{web, Error, HttpRequest, Result};
use chrono::Utc;
use paperclip::actix::{api_v2_operation, Apiv2Schema};
use serde::Deserialize;
use tracing::info;

/// Query parameters for the analytics summary
#[derive(Debug, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    /// Comma-separated project ids; empty selects every project
    #[serde(default)]
    pub projects: String,
    /// Time range: "1h", "24h", "7d" or "30d"
    #[serde(default = "default_time_range")]
    pub time_range: String,
}

fn default_time_range() -> String {
    "24h".to_string()
}

/// Analytics summary endpoint
///
/// Aggregates endpoint records across the selected projects into top-line
/// KPIs plus leaderboards of the slowest and most error-prone endpoint
/// groups.
#[api_v2_operation(
    summary = "Analytics Summary",
    description = "Returns cross-project KPIs and endpoint leaderboards.",
    tags("Analytics"),
    parameters(
        ("projects" = Option<String>, Query, description = "Comma-separated project ids"),
        ("timeRange" = Option<String>, Query, description = "Time range: 1h, 24h, 7d, 30d"),
    ),
    responses(
        (status = 200, description = "Successful response", body = AnalyticsSummary),
        (status = 400, description = "Bad Request - Invalid query parameters"),
        (status = 429, description = "Too Many Requests"),
        (status = 502, description = "Monitoring backend unavailable")
    )
)]
pub async fn analytics_summary(
    req: HttpRequest,
    query: web::Query<AnalyticsQuery>,
    source: web::Data<DataSource>,
) -> Result<web::Json<AnalyticsSummary>, Error> {
    if let Some(limiter) = req.app_data::<web::Data<SimpleRateLimiter>>() {
        if let Err(_response) = rate_limit_middleware(&req, limiter) {
            return Err(actix_web::error::ErrorTooManyRequests(
                "Rate limit exceeded. Please try again later.",
            ));
        }
    }

    if !TIME_RANGES.contains(&query.time_range.as_str()) {
        return Err(actix_web::error::ErrorBadRequest(
            "Time range must be one of 1h, 24h, 7d, 30d",
        ));
    }

    let project_ids: Option<Vec<String>> = {
        let ids: Vec<String> = query
            .projects
            .split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() { None } else { Some(ids) }
    };

    let dataset = source
        .analytics_dataset(project_ids.as_deref(), &query.time_range)
        .await
        .map_err(map_backend_error)?;

    let analyzer = EndpointAnalyzer::new();
    let kpis = analyzer.kpis(&dataset);

    info!(
        projects = dataset.len(),
        total_requests = kpis.total_requests,
        time_range = %query.time_range,
        "Computed analytics summary"
    );

    let (top_slowest_endpoints, top_errored_endpoints) = analyzer.leaderboards(dataset);

    Ok(web::Json(AnalyticsSummary {
        kpis,
        top_slowest_endpoints,
        top_errored_endpoints,
        generated_at: Utc::now().to_rfc3339(),
    }))
}
