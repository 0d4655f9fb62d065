//! Grouped endpoints listing endpoint handler.
//!
//! This is the dashboard's main view: raw endpoint records are fetched for
//! one project, folded into one row per normalized path, and returned with
//! display-ready strings alongside the raw aggregates.

use crate::handlers::map_backend_error;
use crate::models::{EndpointFilters, EndpointPage, EndpointStatus};
use crate::services::backend::DataSource;
use crate::services::endpoints::{
    EndpointAnalyzer, EndpointSelection, EndpointSortField, SortOrder, MAX_PAGE_LIMIT, TIME_RANGES,
};
use crate::services::rate_limit::{rate_limit_middleware, SimpleRateLimiter};
use actix_web::{web, Error, HttpRequest, Result};
use chrono::Utc;
use paperclip::actix::{api_v2_operation, Apiv2Schema};
use serde::Deserialize;
use tracing::info;

/// Methods the dashboard's filter menu offers.
const METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Query parameters for the grouped endpoints listing
#[derive(Debug, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointListQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Raw records per page (max 100)
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Method filter: "all" or one HTTP method
    #[serde(default = "default_all")]
    pub method: String,
    /// Status filter: "all", "healthy", "warning" or "error"
    #[serde(default = "default_all")]
    pub status: String,
    /// Time range: "1h", "24h", "7d" or "30d"
    #[serde(default = "default_time_range")]
    pub time_range: String,
    /// Sort key: "path", "avgResponseTime", "errorRate", "requestCount" or "lastRequest"
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    /// Sort direction: "asc" or "desc"
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

fn default_all() -> String {
    "all".to_string()
}

fn default_time_range() -> String {
    "24h".to_string()
}

fn default_sort_by() -> String {
    "path".to_string()
}

fn default_order() -> String {
    "asc".to_string()
}

impl EndpointListQuery {
    /// Validates the raw query and turns it into a selection.
    fn to_selection(&self) -> Result<EndpointSelection, Error> {
        if self.page == 0 {
            return Err(actix_web::error::ErrorBadRequest(
                "Page must be at least 1",
            ));
        }

        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(actix_web::error::ErrorBadRequest(
                "Limit must be between 1 and 100",
            ));
        }

        let method = match self.method.as_str() {
            "all" => None,
            m if METHODS.contains(&m) => Some(m.to_string()),
            _ => {
                return Err(actix_web::error::ErrorBadRequest(
                    "Method must be 'all' or one of GET, POST, PUT, DELETE, PATCH",
                ));
            }
        };

        let status = match self.status.as_str() {
            "all" => None,
            other => match EndpointStatus::parse(other) {
                Some(status) => Some(status),
                None => {
                    return Err(actix_web::error::ErrorBadRequest(
                        "Status must be 'all', 'healthy', 'warning' or 'error'",
                    ));
                }
            },
        };

        if !TIME_RANGES.contains(&self.time_range.as_str()) {
            return Err(actix_web::error::ErrorBadRequest(
                "Time range must be one of 1h, 24h, 7d, 30d",
            ));
        }

        let sort_by = EndpointSortField::parse(&self.sort_by).ok_or_else(|| {
            actix_web::error::ErrorBadRequest(
                "Sort key must be one of path, avgResponseTime, errorRate, requestCount, lastRequest",
            )
        })?;

        let order = SortOrder::parse(&self.order)
            .ok_or_else(|| actix_web::error::ErrorBadRequest("Order must be 'asc' or 'desc'"))?;

        Ok(EndpointSelection {
            method,
            status,
            time_range: self.time_range.clone(),
            sort_by,
            order,
            page: self.page,
            limit: self.limit,
        })
    }
}

/// Grouped endpoints listing endpoint
///
/// Fetches one raw page of a project's endpoint records and folds it into
/// one row per `method:normalizedPath` signature. Each row carries raw
/// aggregates plus the formatted strings the dashboard renders directly.
#[api_v2_operation(
    summary = "List Grouped Endpoints",
    description = "Returns a project's endpoints grouped by normalized path, with aggregated stats and display strings.",
    tags("Endpoints"),
    parameters(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Raw records per page, max 100"),
        ("method" = Option<String>, Query, description = "Method filter: all or one HTTP method"),
        ("status" = Option<String>, Query, description = "Status filter: all, healthy, warning, error"),
        ("timeRange" = Option<String>, Query, description = "Time range: 1h, 24h, 7d, 30d"),
        ("sortBy" = Option<String>, Query, description = "Sort key"),
        ("order" = Option<String>, Query, description = "Sort direction: asc or desc"),
    ),
    responses(
        (status = 200, description = "Successful response", body = EndpointPage),
        (status = 400, description = "Bad Request - Invalid query parameters"),
        (status = 404, description = "Project not found"),
        (status = 429, description = "Too Many Requests"),
        (status = 502, description = "Monitoring backend unavailable")
    )
)]
pub async fn list_endpoints(
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<EndpointListQuery>,
    source: web::Data<DataSource>,
) -> Result<web::Json<EndpointPage>, Error> {
    if let Some(limiter) = req.app_data::<web::Data<SimpleRateLimiter>>() {
        if let Err(_response) = rate_limit_middleware(&req, limiter) {
            return Err(actix_web::error::ErrorTooManyRequests(
                "Rate limit exceeded. Please try again later.",
            ));
        }
    }

    let selection = query.to_selection()?;
    let project_id = path.into_inner();

    let Some((records, pagination)) = source
        .endpoint_page(&project_id, &selection)
        .await
        .map_err(map_backend_error)?
    else {
        return Err(actix_web::error::ErrorNotFound("Project not found"));
    };

    let analyzer = EndpointAnalyzer::new();
    let endpoints = analyzer.grouped_views(records, Utc::now());

    info!(
        project_id = %project_id,
        groups = endpoints.len(),
        total = pagination.total,
        "Served grouped endpoints page"
    );

    Ok(web::Json(EndpointPage {
        endpoints,
        pagination,
        filters: EndpointFilters {
            method: query.method.clone(),
            status: query.status.clone(),
            time_range: query.time_range.clone(),
            sort_by: query.sort_by.clone(),
            order: query.order.clone(),
        },
    }))
}
