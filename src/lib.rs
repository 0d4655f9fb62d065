//! ApiScope - an API monitoring dashboard service built with Actix Web
//!
//! ApiScope serves the dashboard's backend-for-frontend API. It fetches raw
//! endpoint and request-log records from the monitoring backend (or from
//! built-in sample data when no backend is configured), normalizes dynamic
//! path segments into placeholders, groups endpoints by their normalized
//! path, and exposes the aggregated views the dashboard renders:
//! - Path normalization and endpoint grouping
//! - Paginated, filterable endpoint and request-log listings
//! - Cross-project analytics (KPIs plus slowest/most-erroring leaderboards)
//! - Prometheus metrics integration
//! - Rate limiting and security headers
//! - OpenAPI documentation
//!
//! ## Architecture
//!
//! The codebase is organized into focused modules:
//! - `models/` - Data structures and request/response models
//! - `handlers/` - HTTP request handlers for each endpoint
//! - `middleware/` - Custom middleware for cross-cutting concerns
//! - `services/` - Business logic: backend client, grouping, analytics
//! - `utils/` - Path normalization core and formatting helpers
//! - `config/` - Configuration structures and environment loading
//!
//! ## Quick Start
//!
//! ```no_run
//! use apiscope::create_base_app;
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let app = create_base_app();
//!     // Configure and run the server
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions for convenience
pub use config::{MetricsConfig, RateLimitConfig, SecurityHeadersConfig, ServerConfig};
pub use handlers::{
    analytics_summary, create_base_app, create_openapi_spec, get_metrics, get_project,
    get_project_stats, health, list_endpoints, list_projects, list_requests, version,
};
pub use middleware::{MetricsMiddleware, RequestIdMiddleware, SecurityHeaders};
pub use models::{
    AnalyticsKpis, AnalyticsSummary, EndpointFilters, EndpointGroup, EndpointGroupDisplay,
    EndpointPage, EndpointRecord, EndpointStatus, GroupedEndpoint, HealthResponse,
    LeaderboardRow, Pagination, Project, ProjectStats, RequestFilters, RequestLogEntry,
    RequestLogPage, VersionResponse,
};
pub use services::{
    AppMetrics, BackendClient, BackendConfig, BackendError, CircuitBreaker, CircuitBreakerConfig,
    DataSource, EndpointAnalyzer, EndpointSelection, RequestLogSelection, RetryConfig,
    SimpleRateLimiter, rate_limit_middleware,
};
pub use utils::{
    extract_client_ip, extract_route_pattern, extract_user_agent, format_normalized_path,
    group_endpoints_by_normalized_path, is_dynamic_segment, normalize_endpoint_path,
    parameter_name,
};
