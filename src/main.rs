use actix_web::{App, HttpResponse, HttpServer};
use apiscope::{
    AppMetrics, BackendConfig, DataSource, MetricsConfig, MetricsMiddleware, RateLimitConfig,
    RequestIdMiddleware, SecurityHeaders, SecurityHeadersConfig, ServerConfig, SimpleRateLimiter,
    analytics_summary, create_openapi_spec, get_metrics, get_project, get_project_stats, health,
    list_endpoints, list_projects, list_requests, version,
};
use paperclip::actix::{
    // extension trait for actix_web::App and proc-macro attributes
    OpenApiExt, api_v2_operation,
    // Import the paperclip web module
    web::{self},
};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>ApiScope - Endpoint Dashboard</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            margin: 0;
            padding: 0;
            background: #f5f5f5;
            color: #333;
        }
        .container {
            max-width: 960px;
            margin: 40px auto;
            padding: 20px;
            background: #fff;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
            border-radius: 8px;
        }
        h1 {
            text-align: center;
        }
        .kpis {
            text-align: center;
            color: #666;
            margin-bottom: 20px;
        }
        table {
            width: 100%;
            border-collapse: collapse;
        }
        th, td {
            text-align: left;
            padding: 8px 10px;
            border-bottom: 1px solid #eee;
            font-size: 14px;
        }
        th {
            background: #eee;
        }
        td.num {
            text-align: right;
        }
        .param {
            color: #7c3aed;
            background: #f3e8ff;
            border-radius: 3px;
            padding: 0 2px;
        }
        .status-healthy { color: #16a34a; }
        .status-warning { color: #d97706; }
        .status-error { color: #dc2626; }
    </style>
</head>
<body>
    <div class="container">
        <h1 id="project">Loading...</h1>
        <p class="kpis" id="kpis"></p>
        <table>
            <thead>
                <tr>
                    <th>Status</th>
                    <th>Method</th>
                    <th>Endpoint</th>
                    <th>Requests</th>
                    <th>Avg</th>
                    <th>Errors</th>
                    <th>Last seen</th>
                </tr>
            </thead>
            <tbody id="endpoints"></tbody>
        </table>
    </div>
    <script>
        async function loadDashboard() {
            const projects = await fetch('/api/projects').then(r => r.json());
            if (projects.length === 0) {
                document.getElementById('project').textContent = 'No projects';
                return;
            }
            const project = projects[0];
            document.getElementById('project').textContent = project.name;

            const analytics = await fetch('/api/analytics?projects=' + project.id)
                .then(r => r.json());
            document.getElementById('kpis').textContent =
                analytics.kpis.totalRequests + ' requests | ' +
                analytics.kpis.avgLatency.toFixed(0) + 'ms avg latency';

            const page = await fetch('/api/projects/' + project.id + '/endpoints?limit=50')
                .then(r => r.json());
            document.getElementById('endpoints').innerHTML = page.endpoints.map(e =>
                '<tr>' +
                '<td class="status-' + e.status + '">&#9679;</td>' +
                '<td>' + e.method + '</td>' +
                '<td>' + e.display.path + '</td>' +
                '<td class="num">' + e.display.requestCount + '</td>' +
                '<td class="num">' + e.display.avgResponseTime + '</td>' +
                '<td class="num">' + e.display.errorRate + '</td>' +
                '<td>' + e.display.lastRequest + '</td>' +
                '</tr>').join('');
        }
        loadDashboard().catch(error => {
            document.getElementById('project').textContent = 'Error loading dashboard: ' + error;
        });
    </script>
</body>
</html>"#;

#[api_v2_operation(
    summary = "Dashboard Page",
    description = "Serves the endpoint dashboard: grouped endpoints for the first project plus headline KPIs.",
    tags("Dashboard"),
    responses(
        (status = 200, description = "Successful response")
    )
)]
async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html")
        .body(INDEX_HTML)
}

/// Initialize the tracing subscriber.
///
/// Honors RUST_LOG for filtering and switches to JSON output when
/// LOG_FORMAT=json, which is what the hosted deployments set.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_output = env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json_output {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    let server_config = ServerConfig::from_env();
    let rate_limit_config = RateLimitConfig::from_env();
    let limiter = SimpleRateLimiter::new(rate_limit_config.clone());
    let security_config = SecurityHeadersConfig::from_env();
    let metrics_config = MetricsConfig::from_env();
    let metrics = AppMetrics::new().expect("Failed to create metrics");
    let backend_config = BackendConfig::from_env();
    let source = DataSource::from_config(&backend_config, Some(metrics.clone()))
        .expect("Failed to create data source");

    // Built once and cloned into each worker, so every worker shares the
    // same metric registry, rate limiter window and circuit breaker.
    let rate_limit_data = web::Data::new(rate_limit_config);
    let limiter_data = web::Data::new(limiter);
    let metrics_config_data = web::Data::new(metrics_config);
    let metrics_data = web::Data::new(metrics);
    let source_data = web::Data::new(source);

    info!(
        addr = %server_config.bind_addr,
        mode = source_data.mode(),
        "Starting ApiScope dashboard server"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(SecurityHeaders::new(security_config.clone()))
            .wrap(RequestIdMiddleware)
            .wrap(MetricsMiddleware)
            .wrap_api_with_spec(create_openapi_spec())
            .app_data(rate_limit_data.clone())
            .app_data(limiter_data.clone())
            .app_data(metrics_config_data.clone())
            .app_data(metrics_data.clone())
            .app_data(source_data.clone())
            .service(web::resource("/").route(web::get().to(index)))
            .service(web::resource("/api/health").route(web::get().to(health)))
            .service(web::resource("/api/version").route(web::get().to(version)))
            .service(web::resource("/api/metrics").route(web::get().to(get_metrics)))
            .service(web::resource("/api/projects").route(web::get().to(list_projects)))
            .service(
                web::resource("/api/projects/{project_id}").route(web::get().to(get_project)),
            )
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
    })
    .bind(&server_config.bind_addr)?
    .run()
    .await
}
