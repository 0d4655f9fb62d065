//! Endpoint analytics service: selection pipeline, grouped views and
//! leaderboards.
//!
//! Raw endpoint records are filtered, ordered and paginated first; the page
//! is then folded into grouped rows. Pagination totals therefore count raw
//! records, and a grouped page can hold fewer rows than the limit.

use crate::models::{
    AnalyticsKpis, EndpointGroup, EndpointGroupDisplay, EndpointRecord, EndpointStatus,
    GroupedEndpoint, LeaderboardRow, Pagination, Project, ProjectStats, RequestLogEntry,
};
use crate::utils::format::{
    format_error_rate, format_relative_time, format_request_count, format_response_time,
    parse_timestamp,
};
use crate::utils::route::{format_normalized_path, group_endpoints_by_normalized_path};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::env;
use tracing::debug;

/// Hard cap on the page size a client may request.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_LIMIT: u64 = 20;

/// Raw-record fetch size used when aggregating a project for analytics.
pub const ANALYTICS_FETCH_LIMIT: u64 = 500;

/// Accepted time-range tokens for dashboard queries.
pub const TIME_RANGES: [&str; 4] = ["1h", "24h", "7d", "30d"];

const DEFAULT_LEADERBOARD_LIMIT: usize = 5;

/// Sort keys accepted by the grouped endpoints view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSortField {
    Path,
    AvgResponseTime,
    ErrorRate,
    RequestCount,
    LastRequest,
}

impl EndpointSortField {
    /// Parses the camelCase token the dashboard sends.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(EndpointSortField::Path),
            "avgResponseTime" => Some(EndpointSortField::AvgResponseTime),
            "errorRate" => Some(EndpointSortField::ErrorRate),
            "requestCount" => Some(EndpointSortField::RequestCount),
            "lastRequest" => Some(EndpointSortField::LastRequest),
            _ => None,
        }
    }

    /// The token forwarded to the monitoring backend.
    pub fn as_query_value(self) -> &'static str {
        match self {
            EndpointSortField::Path => "path",
            EndpointSortField::AvgResponseTime => "avgResponseTime",
            EndpointSortField::ErrorRate => "errorRate",
            EndpointSortField::RequestCount => "requestCount",
            EndpointSortField::LastRequest => "lastRequest",
        }
    }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_query_value(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Status-code filter for request logs: an exact code or an `Nxx` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCodeFilter {
    Exact(u16),
    Class(u16),
}

impl StatusCodeFilter {
    /// Parses `2xx`-style class tokens or a literal status code.
    pub fn parse(value: &str) -> Option<Self> {
        let lower = value.to_ascii_lowercase();
        if let Some(class) = lower.strip_suffix("xx") {
            let class: u16 = class.parse().ok()?;
            return (1..=5).contains(&class).then_some(StatusCodeFilter::Class(class));
        }
        let code: u16 = lower.parse().ok()?;
        (100..=599).contains(&code).then_some(StatusCodeFilter::Exact(code))
    }

    pub fn matches(self, status_code: u16) -> bool {
        match self {
            StatusCodeFilter::Exact(code) => status_code == code,
            StatusCodeFilter::Class(class) => status_code / 100 == class,
        }
    }

    pub fn as_query_value(self) -> String {
        match self {
            StatusCodeFilter::Exact(code) => code.to_string(),
            StatusCodeFilter::Class(class) => format!("{class}xx"),
        }
    }
}

/// Sort keys accepted by the request log view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSortField {
    CreatedAt,
    DurationMs,
    StatusCode,
}

impl RequestSortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(RequestSortField::CreatedAt),
            "durationMs" => Some(RequestSortField::DurationMs),
            "statusCode" => Some(RequestSortField::StatusCode),
            _ => None,
        }
    }

    pub fn as_query_value(self) -> &'static str {
        match self {
            RequestSortField::CreatedAt => "createdAt",
            RequestSortField::DurationMs => "durationMs",
            RequestSortField::StatusCode => "statusCode",
        }
    }
}

/// Validated selection parameters for the grouped endpoints view.
#[derive(Debug, Clone)]
pub struct EndpointSelection {
    /// `None` means no method filter.
    pub method: Option<String>,
    /// `None` means no status filter.
    pub status: Option<EndpointStatus>,
    pub time_range: String,
    pub sort_by: EndpointSortField,
    pub order: SortOrder,
    pub page: u64,
    pub limit: u64,
}

impl EndpointSelection {
    /// Wide-open selection used when aggregating a project for analytics.
    pub fn for_analytics(time_range: &str) -> Self {
        Self {
            method: None,
            status: None,
            time_range: time_range.to_string(),
            sort_by: EndpointSortField::Path,
            order: SortOrder::Asc,
            page: 1,
            limit: ANALYTICS_FETCH_LIMIT,
        }
    }
}

/// Validated selection parameters for the request log view.
#[derive(Debug, Clone)]
pub struct RequestLogSelection {
    pub method: Option<String>,
    pub status_code: Option<StatusCodeFilter>,
    pub time_range: String,
    pub sort_by: RequestSortField,
    pub order: SortOrder,
    pub page: u64,
    pub limit: u64,
}

/// Applies filters, ordering and pagination to raw endpoint records.
pub fn select_endpoint_page(
    records: Vec<EndpointRecord>,
    selection: &EndpointSelection,
) -> (Vec<EndpointRecord>, Pagination) {
    let mut records: Vec<EndpointRecord> = records
        .into_iter()
        .filter(|record| selection.method.as_ref().is_none_or(|m| record.method == *m))
        .filter(|record| selection.status.is_none_or(|s| record.status == s))
        .collect();

    records.sort_by(|a, b| {
        let ordering = match selection.sort_by {
            EndpointSortField::Path => a.path.cmp(&b.path),
            EndpointSortField::AvgResponseTime => {
                a.avg_response_time.total_cmp(&b.avg_response_time)
            }
            EndpointSortField::ErrorRate => a.error_rate.total_cmp(&b.error_rate),
            EndpointSortField::RequestCount => a.request_count.cmp(&b.request_count),
            // Unparseable timestamps sort oldest.
            EndpointSortField::LastRequest => {
                parse_timestamp(&a.last_request).cmp(&parse_timestamp(&b.last_request))
            }
        };
        selection.order.apply(ordering)
    });

    let pagination = Pagination::for_page(selection.page, selection.limit, records.len() as u64);
    (page_slice(records, selection.page, selection.limit), pagination)
}

/// Applies filters, ordering and pagination to raw request log entries.
pub fn select_request_page(
    entries: Vec<RequestLogEntry>,
    selection: &RequestLogSelection,
) -> (Vec<RequestLogEntry>, Pagination) {
    let mut entries: Vec<RequestLogEntry> = entries
        .into_iter()
        .filter(|entry| selection.method.as_ref().is_none_or(|m| entry.method == *m))
        .filter(|entry| {
            selection
                .status_code
                .is_none_or(|filter| filter.matches(entry.status_code))
        })
        .collect();

    entries.sort_by(|a, b| {
        let ordering = match selection.sort_by {
            RequestSortField::CreatedAt => {
                parse_timestamp(&a.created_at).cmp(&parse_timestamp(&b.created_at))
            }
            RequestSortField::DurationMs => a.duration_ms.cmp(&b.duration_ms),
            RequestSortField::StatusCode => a.status_code.cmp(&b.status_code),
        };
        selection.order.apply(ordering)
    });

    let pagination = Pagination::for_page(selection.page, selection.limit, entries.len() as u64);
    (page_slice(entries, selection.page, selection.limit), pagination)
}

fn page_slice<T>(items: Vec<T>, page: u64, limit: u64) -> Vec<T> {
    let start = page.saturating_sub(1).saturating_mul(limit);
    items
        .into_iter()
        .skip(start as usize)
        .take(limit as usize)
        .collect()
}

/// Computes a project's stats card from its endpoint records.
///
/// The response time and error rate are request-weighted means, and
/// `last_request` carries the latest parseable timestamp.
pub fn compute_project_stats(records: &[EndpointRecord]) -> ProjectStats {
    let total_requests: u64 = records.iter().map(|r| r.request_count).sum();

    let (avg_response_time, error_rate) = if total_requests == 0 {
        (0.0, 0.0)
    } else {
        let weight = total_requests as f64;
        let latency: f64 = records
            .iter()
            .map(|r| r.avg_response_time * r.request_count as f64)
            .sum();
        let errors: f64 = records
            .iter()
            .map(|r| r.error_rate * r.request_count as f64)
            .sum();
        (latency / weight, errors / weight)
    };

    let last_request = records
        .iter()
        .filter_map(|r| parse_timestamp(&r.last_request).map(|ts| (ts, &r.last_request)))
        .max_by_key(|(ts, _)| *ts)
        .map(|(_, raw)| raw.clone())
        .unwrap_or_default();

    ProjectStats {
        total_requests,
        avg_response_time,
        error_rate,
        last_request,
    }
}

/// Builds the grouped views and leaderboards the dashboard renders.
pub struct EndpointAnalyzer {
    leaderboard_limit: usize,
}

impl EndpointAnalyzer {
    /// Create an analyzer configured from the environment.
    pub fn new() -> Self {
        let leaderboard_limit = env::var("LEADERBOARD_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT);

        Self { leaderboard_limit }
    }

    /// Groups one raw page of records and attaches display strings.
    pub fn grouped_views(
        &self,
        records: Vec<EndpointRecord>,
        now: DateTime<Utc>,
    ) -> Vec<GroupedEndpoint> {
        let groups = group_endpoints_by_normalized_path(records);
        debug!(groups = groups.len(), "Grouped endpoint records");
        groups.into_iter().map(|group| view_of(group, now)).collect()
    }

    /// Top-line KPIs across every project in the dataset.
    pub fn kpis(&self, dataset: &[(Project, Vec<EndpointRecord>)]) -> AnalyticsKpis {
        let records = dataset.iter().flat_map(|(_, records)| records);
        let total_requests: u64 = records.clone().map(|r| r.request_count).sum();

        let avg_latency = if total_requests == 0 {
            0.0
        } else {
            records
                .map(|r| r.avg_response_time * r.request_count as f64)
                .sum::<f64>()
                / total_requests as f64
        };

        AnalyticsKpis {
            total_requests,
            avg_latency,
        }
    }

    /// Ranks grouped endpoints across projects: slowest by average latency,
    /// and most error-prone among those with a non-zero error rate.
    pub fn leaderboards(
        &self,
        dataset: Vec<(Project, Vec<EndpointRecord>)>,
    ) -> (Vec<LeaderboardRow>, Vec<LeaderboardRow>) {
        let mut rows: Vec<LeaderboardRow> = Vec::new();
        for (project, records) in dataset {
            for group in group_endpoints_by_normalized_path(records) {
                rows.push(LeaderboardRow {
                    endpoint: group.normalized_path,
                    method: group.method,
                    avg_latency: group.avg_response_time,
                    total_requests: group.request_count,
                    error_rate: group.error_rate,
                    project_name: project.name.clone(),
                });
            }
        }

        let mut slowest = rows.clone();
        slowest.sort_by(|a, b| b.avg_latency.total_cmp(&a.avg_latency));
        slowest.truncate(self.leaderboard_limit);

        let mut errored: Vec<LeaderboardRow> =
            rows.into_iter().filter(|row| row.error_rate > 0.0).collect();
        errored.sort_by(|a, b| b.error_rate.total_cmp(&a.error_rate));
        errored.truncate(self.leaderboard_limit);

        (slowest, errored)
    }
}

fn view_of(group: EndpointGroup, now: DateTime<Utc>) -> GroupedEndpoint {
    let display = EndpointGroupDisplay {
        path: format_normalized_path(&group.normalized_path),
        avg_response_time: format_response_time(group.avg_response_time),
        error_rate: format_error_rate(group.error_rate),
        request_count: format_request_count(group.request_count),
        last_request: format_relative_time(&group.last_request, now),
    };

    GroupedEndpoint {
        method: group.method,
        path: group.path,
        normalized_path: group.normalized_path,
        count: group.count,
        avg_response_time: group.avg_response_time,
        error_rate: group.error_rate,
        request_count: group.request_count,
        last_request: group.last_request,
        status: group.status,
        original_endpoints: group.original_endpoints,
        display,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(method: &str, path: &str, avg: f64, err: f64, count: u64, last: &str) -> EndpointRecord {
        EndpointRecord {
            id: format!("{method} {path}"),
            method: method.to_string(),
            path: path.to_string(),
            avg_response_time: avg,
            error_rate: err,
            request_count: count,
            last_request: last.to_string(),
            status: EndpointStatus::Healthy,
        }
    }

    fn selection() -> EndpointSelection {
        EndpointSelection {
            method: None,
            status: None,
            time_range: "24h".to_string(),
            sort_by: EndpointSortField::Path,
            order: SortOrder::Asc,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }

    #[test]
    fn method_filter_drops_other_methods() {
        let mut sel = selection();
        sel.method = Some("GET".to_string());

        let (page, pagination) = select_endpoint_page(
            vec![
                record("GET", "/a", 1.0, 0.0, 1, ""),
                record("POST", "/b", 1.0, 0.0, 1, ""),
            ],
            &sel,
        );

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].method, "GET");
        assert_eq!(pagination.total, 1);
    }

    #[test]
    fn status_filter_keeps_matching_records() {
        let mut warning = record("GET", "/a", 1.0, 0.0, 1, "");
        warning.status = EndpointStatus::Warning;
        let healthy = record("GET", "/b", 1.0, 0.0, 1, "");

        let mut sel = selection();
        sel.status = Some(EndpointStatus::Warning);

        let (page, _) = select_endpoint_page(vec![warning, healthy], &sel);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].path, "/a");
    }

    #[test]
    fn sorting_covers_every_field() {
        let records = || {
            vec![
                record("GET", "/b", 30.0, 0.3, 5, "2024-03-02T00:00:00Z"),
                record("GET", "/a", 10.0, 0.1, 15, "not-a-timestamp"),
                record("GET", "/c", 20.0, 0.2, 10, "2024-03-03T00:00:00Z"),
            ]
        };

        let mut sel = selection();
        let (page, _) = select_endpoint_page(records(), &sel);
        assert_eq!(page[0].path, "/a");

        sel.sort_by = EndpointSortField::AvgResponseTime;
        sel.order = SortOrder::Desc;
        let (page, _) = select_endpoint_page(records(), &sel);
        assert_eq!(page[0].avg_response_time, 30.0);

        sel.sort_by = EndpointSortField::RequestCount;
        sel.order = SortOrder::Asc;
        let (page, _) = select_endpoint_page(records(), &sel);
        assert_eq!(page[0].request_count, 5);

        // Unparseable timestamps sort oldest.
        sel.sort_by = EndpointSortField::LastRequest;
        let (page, _) = select_endpoint_page(records(), &sel);
        assert_eq!(page[0].last_request, "not-a-timestamp");
        assert_eq!(page[2].last_request, "2024-03-03T00:00:00Z");
    }

    #[test]
    fn pagination_slices_after_sorting() {
        let records: Vec<EndpointRecord> = (0..5)
            .map(|i| record("GET", &format!("/p{i}"), 1.0, 0.0, 1, ""))
            .collect();

        let mut sel = selection();
        sel.page = 2;
        sel.limit = 2;

        let (page, pagination) = select_endpoint_page(records, &sel);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].path, "/p2");
        assert_eq!(pagination.total, 5);
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_next);
        assert!(pagination.has_prev);
    }

    #[test]
    fn pages_beyond_the_end_are_empty() {
        let mut sel = selection();
        sel.page = 9;
        let (page, pagination) = select_endpoint_page(vec![record("GET", "/a", 1.0, 0.0, 1, "")], &sel);
        assert!(page.is_empty());
        assert!(!pagination.has_next);
    }

    #[test]
    fn status_code_filters_parse_classes_and_exact_codes() {
        assert_eq!(StatusCodeFilter::parse("2xx"), Some(StatusCodeFilter::Class(2)));
        assert_eq!(StatusCodeFilter::parse("5XX"), Some(StatusCodeFilter::Class(5)));
        assert_eq!(StatusCodeFilter::parse("404"), Some(StatusCodeFilter::Exact(404)));
        assert_eq!(StatusCodeFilter::parse("9xx"), None);
        assert_eq!(StatusCodeFilter::parse("teapot"), None);

        assert!(StatusCodeFilter::Class(4).matches(418));
        assert!(!StatusCodeFilter::Class(4).matches(500));
        assert!(StatusCodeFilter::Exact(200).matches(200));
    }

    #[test]
    fn project_stats_weight_by_request_volume() {
        let stats = compute_project_stats(&[
            record("GET", "/a", 100.0, 0.0, 90, "2024-03-01T00:00:00Z"),
            record("GET", "/b", 200.0, 0.1, 10, "2024-03-02T00:00:00Z"),
        ]);

        assert_eq!(stats.total_requests, 100);
        assert_eq!(stats.avg_response_time, 110.0);
        assert!((stats.error_rate - 0.01).abs() < 1e-9);
        assert_eq!(stats.last_request, "2024-03-02T00:00:00Z");
    }

    #[test]
    fn project_stats_handle_empty_input() {
        let stats = compute_project_stats(&[]);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.avg_response_time, 0.0);
        assert_eq!(stats.last_request, "");
    }

    #[test]
    fn grouped_views_attach_display_strings() {
        let analyzer = EndpointAnalyzer::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let views = analyzer.grouped_views(
            vec![
                record("GET", "/posts/1", 100.0, 0.02, 1500, "2024-03-01T11:55:00Z"),
                record("GET", "/posts/2", 200.0, 0.05, 500, "2024-03-01T09:00:00Z"),
            ],
            now,
        );

        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.normalized_path, "/posts/{id}");
        assert_eq!(view.display.path, "/posts/<span class=\"param\">{id}</span>");
        assert_eq!(view.display.avg_response_time, "125ms");
        assert_eq!(view.display.error_rate, "5.0%");
        assert_eq!(view.display.request_count, "2.0K");
        assert_eq!(view.display.last_request, "5m ago");
    }

    fn project(name: &str) -> Project {
        Project {
            id: name.to_lowercase(),
            name: name.to_string(),
            original_base_url: "https://api.example.com".to_string(),
            proxy_url: "https://proxy.example.com".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            request_log_count: 0,
        }
    }

    #[test]
    fn leaderboards_rank_across_projects() {
        let analyzer = EndpointAnalyzer::new();
        let dataset = vec![
            (
                project("Blog"),
                vec![
                    record("GET", "/posts/1", 400.0, 0.0, 100, ""),
                    record("GET", "/comments", 50.0, 0.25, 40, ""),
                ],
            ),
            (
                project("Shop"),
                vec![record("POST", "/orders", 900.0, 0.02, 60, "")],
            ),
        ];

        let kpis = analyzer.kpis(&dataset);
        assert_eq!(kpis.total_requests, 200);

        let (slowest, errored) = analyzer.leaderboards(dataset);
        // Pairwise averaging halves a single record's latency.
        assert_eq!(slowest[0].endpoint, "/orders");
        assert_eq!(slowest[0].avg_latency, 450.0);
        assert_eq!(slowest[0].project_name, "Shop");

        assert_eq!(errored[0].endpoint, "/comments");
        assert_eq!(errored[0].error_rate, 0.25);
        // Zero-error endpoints stay off the error board.
        assert!(errored.iter().all(|row| row.error_rate > 0.0));
    }
}
