//! Request log listing endpoint handler.

use crate::handlers::map_backend_error;
use crate::models::{RequestFilters, RequestLogPage};
use crate::services::backend::DataSource;
use crate::services::endpoints::{
    RequestLogSelection, RequestSortField, SortOrder, StatusCodeFilter, MAX_PAGE_LIMIT,
    TIME_RANGES,
};
use crate::services::rate_limit::{rate_limit_middleware, SimpleRateLimiter};
use actix_web::{web, Error, HttpRequest, Result};
use paperclip::actix::{api_v2_operation, Apiv2Schema};
use serde::Deserialize;
use tracing::info;

const METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Query parameters for the request log listing
#[derive(Debug, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct RequestListQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Entries per page (max 100)
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Method filter: "all" or one HTTP method
    #[serde(default = "default_all")]
    pub method: String,
    /// Status code filter: "all", a class like "4xx", or an exact code
    #[serde(default = "default_all")]
    pub status_code: String,
    /// Time range: "1h", "24h", "7d" or "30d"
    #[serde(default = "default_time_range")]
    pub time_range: String,
    /// Sort key: "createdAt", "durationMs" or "statusCode"
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
    "createdAt".to_string()
}

// The log view shows newest entries first.
fn default_order() -> String {
    "desc".to_string()
}

impl RequestListQuery {
    fn to_selection(&self) -> Result<RequestLogSelection, Error> {
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

        let status_code = match self.status_code.as_str() {
            "all" => None,
            other => match StatusCodeFilter::parse(other) {
                Some(filter) => Some(filter),
                None => {
                    return Err(actix_web::error::ErrorBadRequest(
                        "Status code must be 'all', a class like '4xx', or an exact code",
                    ));
                }
            },
        };

        if !TIME_RANGES.contains(&self.time_range.as_str()) {
            return Err(actix_web::error::ErrorBadRequest(
                "Time range must be one of 1h, 24h, 7d, 30d",
            ));
        }

        let sort_by = RequestSortField::parse(&self.sort_by).ok_or_else(|| {
            actix_web::error::ErrorBadRequest(
                "Sort key must be one of createdAt, durationMs, statusCode",
            )
        })?;

        let order = SortOrder::parse(&self.order)
            .ok_or_else(|| actix_web::error::ErrorBadRequest("Order must be 'asc' or 'desc'"))?;

        Ok(RequestLogSelection {
            method,
            status_code,
            time_range: self.time_range.clone(),
            sort_by,
            order,
            page: self.page,
            limit: self.limit,
        })
    }
}

/// Request log listing endpoint
///
/// Returns one page of a project's raw request log, newest first by
/// default.
#[api_v2_operation(
    summary = "List Request Logs",
    description = "Returns a page of a project's request log entries.",
    tags("Requests"),
    parameters(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Entries per page, max 100"),
        ("method" = Option<String>, Query, description = "Method filter: all or one HTTP method"),
        ("statusCode" = Option<String>, Query, description = "Status filter: all, a class like 4xx, or an exact code"),
        ("timeRange" = Option<String>, Query, description = "Time range: 1h, 24h, 7d, 30d"),
        ("sortBy" = Option<String>, Query, description = "Sort key"),
        ("order" = Option<String>, Query, description = "Sort direction: asc or desc"),
    ),
    responses(
        (status = 200, description = "Successful response", body = RequestLogPage),
        (status = 400, description = "Bad Request - Invalid query parameters"),
        (status = 404, description = "Project not found"),
        (status = 429, description = "Too Many Requests"),
        (status = 502, description = "Monitoring backend unavailable")
    )
)]
pub async fn list_requests(
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<RequestListQuery>,
    source: web::Data<DataSource>,
) -> Result<web::Json<RequestLogPage>, Error> {
    if let Some(limiter) = req.app_data::<web::Data<SimpleRateLimiter>>() {
        if let Err(_response) = rate_limit_middleware(&req, limiter) {
            return Err(actix_web::error::ErrorTooManyRequests(
                "Rate limit exceeded. Please try again later.",
            ));
        }
    }

    let selection = query.to_selection()?;
    let project_id = path.into_inner();

    let Some((requests, pagination)) = source
        .request_page(&project_id, &selection)
        .await
        .map_err(map_backend_error)?
    else {
        return Err(actix_web::error::ErrorNotFound("Project not found"));
    };

    info!(
        project_id = %project_id,
        entries = requests.len(),
        total = pagination.total,
        "Served request log page"
    );

    Ok(web::Json(RequestLogPage {
        requests,
        pagination,
        filters: RequestFilters {
            method: query.method.clone(),
            status_code: query.status_code.clone(),
            time_range: query.time_range.clone(),
            sort_by: query.sort_by.clone(),
            order: query.order.clone(),
        },
    }))
}
