//! OpenAPI specification generation and app factory.

use crate::{
    config::{MetricsConfig, RateLimitConfig, SecurityHeadersConfig},
    handlers::{
        analytics_summary, get_metrics, get_project, get_project_stats, health, list_endpoints,
        list_projects, list_requests, version,
    },
    middleware::{MetricsMiddleware, RequestIdMiddleware, SecurityHeaders},
    services::{
        backend::{BackendConfig, DataSource},
        rate_limit::SimpleRateLimiter,
        AppMetrics,
    },
};
use actix_web::App;
use paperclip::actix::{web, OpenApiExt};
use paperclip::v2::models::{DefaultApiRaw, Info};

/// Creates the shared OpenAPI specification for the dashboard API
///
/// This documents how endpoint grouping works and how the service is
/// pointed at a monitoring backend.
pub fn create_openapi_spec() -> DefaultApiRaw {
    DefaultApiRaw {
        info: Info {
            title: "ApiScope".into(),
            version: "1.0.0".into(),
            description: Some(
                "API monitoring dashboard service built with Actix and Paperclip\n\n\
                ## Endpoint Grouping\n\
                Observed request paths are normalized before display: dynamic segments \
                (numeric ids, UUIDs, long opaque tokens) are replaced with `{name}` \
                placeholders, so `/api/users/123` and `/api/users/456` both render as \
                `/api/users/{id}` and share one row. Rows aggregate hit counts, response \
                times, error rates and health status across their raw records.\n\
                \n\
                **List endpoints support:**\n\
                - `page` / `limit`: pagination over raw records (limit capped at 100)\n\
                - `method`: `all` or one of GET, POST, PUT, DELETE, PATCH\n\
                - `status` (endpoints): `all`, `healthy`, `warning`, `error`\n\
                - `statusCode` (requests): `all`, a class like `4xx`, or an exact code\n\
                - `timeRange`: `1h`, `24h`, `7d`, `30d`\n\
                - `sortBy` / `order`: field-specific sort keys, `asc` or `desc`\n\
                \n\
                ## Data Sources\n\
                Set `BACKEND_BASE_URL` to serve live data from a monitoring backend; \
                requests to it are retried with exponential backoff behind a circuit \
                breaker. Without it the service answers from a built-in sample dataset, \
                which is handy for local development and demos.".into()
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Creates a basic app with shared configuration
///
/// This factory function creates a pre-configured Actix Web application with:
/// - Project, endpoint, request log and analytics endpoints
/// - Health and version endpoints
/// - OpenAPI specification
/// - Rate limiting
/// - Security headers
/// - Metrics collection
///
/// This can be used both for testing and as a base for the main application.
pub fn create_base_app() -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let config = RateLimitConfig::from_env();
    let limiter = SimpleRateLimiter::new(config.clone());
    let security_config = SecurityHeadersConfig::from_env();
    let metrics_config = MetricsConfig::from_env();
    let metrics = AppMetrics::new().expect("Failed to create metrics");
    let backend_config = BackendConfig::from_env();
    let source = DataSource::from_config(&backend_config, Some(metrics.clone()))
        .expect("Failed to create data source");

    App::new()
        .wrap(SecurityHeaders::new(security_config))
        .wrap(RequestIdMiddleware)
        .wrap(MetricsMiddleware)
        .wrap_api_with_spec(create_openapi_spec())
        .app_data(web::Data::new(config))
        .app_data(web::Data::new(limiter))
        .app_data(web::Data::new(metrics_config))
        .app_data(web::Data::new(metrics))
        .app_data(web::Data::new(source))
        .service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/version").route(web::get().to(version)))
        .service(web::resource("/api/metrics").route(web::get().to(get_metrics)))
        .service(web::resource("/api/projects").route(web::get().to(list_projects)))
        .service(web::resource("/api/projects/{project_id}").route(web::get().to(get_project)))
        .service(
            web::resource("/api/projects/{project_id}/stats")
                .route(web::get().to(get_project_stats)),
        )
        .service(
            web::resource("/api/projects/{project_id}/endpoints")
                .route(web::get().to(list_endpoints)),
        )
        .service(
            web::resource("/api/projects/{project_id}/requests")
                .route(web::get().to(list_requests)),
        )
        .service(web::resource("/api/analytics").route(web::get().to(analytics_summary)))
        .with_json_spec_at("/api/spec/v2")
        .build()
}
