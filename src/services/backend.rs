//! Monitoring backend client with retries, timeouts, and a circuit breaker.
//!
//! The dashboard talks to one monitoring backend over HTTP. Requests use
//! exponential backoff with jitter, a per-request timeout, and a circuit
//! breaker so a struggling backend is given room to recover. When no
//! backend is configured the [`DataSource`] falls back to the built-in
//! sample dataset.

use crate::models::{EndpointRecord, Pagination, Project, ProjectStats, RequestLogEntry};
use crate::services::endpoints::{
    compute_project_stats, select_endpoint_page, select_request_page, EndpointSelection,
    RequestLogSelection,
};
use crate::services::metrics::AppMetrics;
use crate::services::sample;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, error, info, warn};
use url::Url;

/// Configuration for the monitoring backend client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the monitoring backend; `None` selects sample mode
    pub base_url: Option<String>,

    /// Timeout for one request attempt (in seconds)
    pub request_timeout_seconds: u64,

    /// Connection timeout (in seconds)
    pub connect_timeout_seconds: u64,

    /// Retry configuration
    pub retry: RetryConfig,

    /// Circuit breaker configuration
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_attempts: usize,

    /// Initial retry delay in milliseconds
    pub initial_delay_ms: u64,

    /// Maximum retry delay in milliseconds
    pub max_delay_ms: u64,

    /// Retry on these HTTP status codes
    pub retry_on_status: Vec<u16>,
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failure threshold to open the circuit
    pub failure_threshold: usize,

    /// Success threshold to close the circuit
    pub success_threshold: usize,

    /// Timeout before attempting to close circuit (in seconds)
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_seconds: 10,
            connect_timeout_seconds: 3,
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 3,
            timeout_seconds: 60,
        }
    }
}

/// Circuit breaker state
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Circuit breaker guarding calls to the monitoring backend
#[derive(Debug)]
pub struct CircuitBreaker {
    state: CircuitState,
    failure_count: usize,
    success_count: usize,
    config: CircuitBreakerConfig,
    last_failure_time: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            config,
            last_failure_time: None,
        }
    }

    pub fn call_allowed(&mut self) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if let Some(last_failure) = self.last_failure_time {
                    if last_failure.elapsed() >= Duration::from_secs(self.config.timeout_seconds) {
                        self.state = CircuitState::HalfOpen;
                        self.success_count = 0;
                        true
                    } else {
                        false
                    }
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => true,
        }
    }

    pub fn on_success(&mut self) {
        self.failure_count = 0;

        if self.state == CircuitState::HalfOpen {
            self.success_count += 1;
            if self.success_count >= self.config.success_threshold {
                self.state = CircuitState::Closed;
            }
        }
    }

    pub fn on_failure(&mut self) {
        self.failure_count += 1;
        self.last_failure_time = Some(Instant::now());

        if self.failure_count >= self.config.failure_threshold {
            self.state = CircuitState::Open;
        }
    }

    pub fn state(&self) -> &CircuitState {
        &self.state
    }
}

/// Errors that can occur talking to the monitoring backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("Retryable status code: {0}")]
    RetryableStatus(u16),

    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("Resource not found")]
    NotFound,

    #[error("Unreadable backend response: {0}")]
    Decode(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Whether another attempt against the backend could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::Network(_) | BackendError::Timeout | BackendError::RetryableStatus(_)
        )
    }

    /// Get a user-friendly error message for API responses
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Network(_) => {
                "Monitoring backend temporarily unavailable due to network issues".to_string()
            }
            BackendError::Timeout => {
                "Monitoring backend temporarily unavailable due to timeout".to_string()
            }
            BackendError::CircuitOpen => {
                "Monitoring backend temporarily unavailable, please try again later".to_string()
            }
            BackendError::RetryableStatus(status) => {
                format!("Monitoring backend returned error status {}, please try again", status)
            }
            BackendError::UnexpectedStatus(status) => {
                format!("Monitoring backend returned unexpected status {}", status)
            }
            BackendError::NotFound => "Resource not found".to_string(),
            BackendError::Decode(_) => {
                "Monitoring backend returned an unreadable response".to_string()
            }
            BackendError::InvalidUrl(_) => "Monitoring backend is misconfigured".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EndpointPageWire {
    endpoints: Vec<EndpointRecord>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct RequestPageWire {
    requests: Vec<RequestLogEntry>,
    pagination: Pagination,
}

/// Typed HTTP client for the monitoring backend
pub struct BackendClient {
    client: Client,
    base_url: Url,
    config: BackendConfig,
    circuit_breaker: Mutex<CircuitBreaker>,
    metrics: Option<AppMetrics>,
}

impl BackendClient {
    /// Create a new backend client for the given base URL
    pub fn new(
        base_url: &str,
        config: BackendConfig,
        metrics: Option<AppMetrics>,
    ) -> Result<Self, BackendError> {
        // A trailing slash keeps Url::join from replacing the last path
        // segment of the base.
        let mut normalized = base_url.trim_end_matches('/').to_string();
        normalized.push('/');
        let base_url =
            Url::parse(&normalized).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()?;

        let circuit_breaker = Mutex::new(CircuitBreaker::new(config.circuit_breaker.clone()));

        Ok(Self {
            client,
            base_url,
            config,
            circuit_breaker,
            metrics,
        })
    }

    pub async fn fetch_projects(&self) -> Result<Vec<Project>, BackendError> {
        self.get_json("projects", "api/projects", &[]).await
    }

    pub async fn fetch_project(&self, project_id: &str) -> Result<Option<Project>, BackendError> {
        let path = format!("api/projects/{project_id}");
        found_or_none(self.get_json("project", &path, &[]).await)
    }

    pub async fn fetch_project_stats(
        &self,
        project_id: &str,
    ) -> Result<Option<ProjectStats>, BackendError> {
        let path = format!("api/projects/{project_id}/stats");
        found_or_none(self.get_json("project_stats", &path, &[]).await)
    }

    /// Fetches one raw page of endpoint records, forwarding the selection
    /// parameters so the backend does the filtering and ordering.
    pub async fn fetch_endpoint_page(
        &self,
        project_id: &str,
        selection: &EndpointSelection,
    ) -> Result<Option<(Vec<EndpointRecord>, Pagination)>, BackendError> {
        let path = format!("api/projects/{project_id}/endpoints");
        let mut query: Vec<(&str, String)> = vec![
            ("page", selection.page.to_string()),
            ("limit", selection.limit.to_string()),
            ("timeRange", selection.time_range.clone()),
            ("sortBy", selection.sort_by.as_query_value().to_string()),
            ("order", selection.order.as_query_value().to_string()),
        ];
        if let Some(method) = &selection.method {
            query.push(("method", method.clone()));
        }
        if let Some(status) = selection.status {
            query.push(("status", status.as_str().to_string()));
        }

        let result = self.get_json::<EndpointPageWire>("endpoints", &path, &query).await;
        found_or_none(result.map(|page| (page.endpoints, page.pagination)))
    }

    /// Fetches one raw page of request log entries.
    pub async fn fetch_request_page(
        &self,
        project_id: &str,
        selection: &RequestLogSelection,
    ) -> Result<Option<(Vec<RequestLogEntry>, Pagination)>, BackendError> {
        let path = format!("api/projects/{project_id}/requests");
        let mut query: Vec<(&str, String)> = vec![
            ("page", selection.page.to_string()),
            ("limit", selection.limit.to_string()),
            ("timeRange", selection.time_range.clone()),
            ("sortBy", selection.sort_by.as_query_value().to_string()),
            ("order", selection.order.as_query_value().to_string()),
        ];
        if let Some(method) = &selection.method {
            query.push(("method", method.clone()));
        }
        if let Some(filter) = selection.status_code {
            query.push(("statusCode", filter.as_query_value()));
        }

        let result = self.get_json::<RequestPageWire>("requests", &path, &query).await;
        found_or_none(result.map(|page| (page.requests, page.pagination)))
    }

    /// Execute a GET request with full resilience pattern implementation
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| BackendError::InvalidUrl(e.to_string()))?;

        // Check circuit breaker first
        if !self.circuit_breaker.lock().unwrap().call_allowed() {
            warn!(
                operation = operation,
                url = %url,
                "Circuit breaker is open, rejecting backend request"
            );
            self.record_request(operation, "circuit_open", Duration::ZERO);
            return Err(BackendError::CircuitOpen);
        }

        let timeout = Duration::from_secs(self.config.request_timeout_seconds);

        // Retry strategy with exponential backoff and jitter
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry.initial_delay_ms)
            .max_delay(Duration::from_millis(self.config.retry.max_delay_ms))
            .map(jitter)
            .take(self.config.retry.max_attempts);

        let started = Instant::now();
        let result = RetryIf::spawn(
            retry_strategy,
            || self.attempt::<T>(operation, url.clone(), query, timeout),
            |err: &BackendError| err.is_retryable(),
        )
        .await;

        let duration = started.elapsed();
        match &result {
            Ok(_) => {
                self.circuit_breaker.lock().unwrap().on_success();
                self.record_request(operation, "success", duration);
            }
            // A missing resource is an answer, not a backend failure.
            Err(BackendError::NotFound) => {
                self.circuit_breaker.lock().unwrap().on_success();
                self.record_request(operation, "not_found", duration);
            }
            Err(err) => {
                self.circuit_breaker.lock().unwrap().on_failure();
                let outcome = match err {
                    BackendError::RetryableStatus(_) => "retry_exhausted",
                    BackendError::Network(_) => "network_error",
                    BackendError::Timeout => "timeout",
                    _ => "error",
                };
                self.record_request(operation, outcome, duration);
            }
        }

        result
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, BackendError> {
        let start = Instant::now();
        let request = self.client.get(url.clone()).query(query);

        match tokio::time::timeout(timeout, request.send()).await {
            Ok(Ok(response)) => {
                let status = response.status().as_u16();
                let duration = start.elapsed();

                if status == 404 {
                    debug!(
                        operation = operation,
                        url = %url,
                        "Backend reported a missing resource"
                    );
                    return Err(BackendError::NotFound);
                }

                if self.config.retry.retry_on_status.contains(&status) {
                    warn!(
                        operation = operation,
                        url = %url,
                        status = status,
                        duration_ms = duration.as_millis(),
                        "Backend request failed with retryable status"
                    );
                    return Err(BackendError::RetryableStatus(status));
                }

                if !response.status().is_success() {
                    warn!(
                        operation = operation,
                        url = %url,
                        status = status,
                        duration_ms = duration.as_millis(),
                        "Backend request failed with unexpected status"
                    );
                    return Err(BackendError::UnexpectedStatus(status));
                }

                debug!(
                    operation = operation,
                    url = %url,
                    status = status,
                    duration_ms = duration.as_millis(),
                    "Backend request completed successfully"
                );
                response
                    .json::<T>()
                    .await
                    .map_err(|e| BackendError::Decode(e.to_string()))
            }
            Ok(Err(e)) => {
                error!(
                    operation = operation,
                    url = %url,
                    error = %e,
                    duration_ms = start.elapsed().as_millis(),
                    "Backend request failed with network error"
                );
                Err(BackendError::Network(e))
            }
            Err(_) => {
                warn!(
                    operation = operation,
                    url = %url,
                    timeout_seconds = timeout.as_secs(),
                    "Backend request timed out"
                );
                Err(BackendError::Timeout)
            }
        }
    }

    fn record_request(&self, operation: &str, outcome: &str, duration: Duration) {
        if let Some(metrics) = &self.metrics {
            metrics.record_backend_request(operation, outcome, duration.as_secs_f64());
        }
    }
}

fn found_or_none<T>(result: Result<T, BackendError>) -> Result<Option<T>, BackendError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(BackendError::NotFound) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Where dashboard data comes from: a configured monitoring backend, or the
/// built-in sample dataset when none is configured.
pub enum DataSource {
    Backend(BackendClient),
    Sample,
}

impl DataSource {
    /// Build the data source selected by configuration.
    pub fn from_config(
        config: &BackendConfig,
        metrics: Option<AppMetrics>,
    ) -> Result<Self, BackendError> {
        match &config.base_url {
            Some(base_url) => {
                info!(base_url = %base_url, "Using monitoring backend data source");
                let client = BackendClient::new(base_url, config.clone(), metrics)?;
                Ok(DataSource::Backend(client))
            }
            None => {
                info!("No backend configured, serving the built-in sample dataset");
                Ok(DataSource::Sample)
            }
        }
    }

    /// Mode label used in logs and the health endpoint.
    pub fn mode(&self) -> &'static str {
        match self {
            DataSource::Backend(_) => "backend",
            DataSource::Sample => "sample",
        }
    }

    pub async fn projects(&self) -> Result<Vec<Project>, BackendError> {
        match self {
            DataSource::Backend(client) => client.fetch_projects().await,
            DataSource::Sample => Ok(sample::sample_projects()),
        }
    }

    pub async fn project(&self, project_id: &str) -> Result<Option<Project>, BackendError> {
        match self {
            DataSource::Backend(client) => client.fetch_project(project_id).await,
            DataSource::Sample => Ok(sample::sample_project(project_id)),
        }
    }

    pub async fn project_stats(
        &self,
        project_id: &str,
    ) -> Result<Option<ProjectStats>, BackendError> {
        match self {
            DataSource::Backend(client) => client.fetch_project_stats(project_id).await,
            DataSource::Sample => Ok(sample::sample_endpoint_records(project_id)
                .map(|records| compute_project_stats(&records))),
        }
    }

    /// One raw page of endpoint records for a project, or `None` when the
    /// project is unknown.
    pub async fn endpoint_page(
        &self,
        project_id: &str,
        selection: &EndpointSelection,
    ) -> Result<Option<(Vec<EndpointRecord>, Pagination)>, BackendError> {
        match self {
            DataSource::Backend(client) => client.fetch_endpoint_page(project_id, selection).await,
            DataSource::Sample => Ok(sample::sample_endpoint_records(project_id)
                .map(|records| select_endpoint_page(records, selection))),
        }
    }

    /// One raw page of request log entries for a project, or `None` when
    /// the project is unknown.
    pub async fn request_page(
        &self,
        project_id: &str,
        selection: &RequestLogSelection,
    ) -> Result<Option<(Vec<RequestLogEntry>, Pagination)>, BackendError> {
        match self {
            DataSource::Backend(client) => client.fetch_request_page(project_id, selection).await,
            DataSource::Sample => Ok(sample::sample_request_logs(project_id)
                .map(|entries| select_request_page(entries, selection))),
        }
    }

    /// Collects the raw records of every selected project for analytics.
    ///
    /// A project that disappears between the listing and the per-project
    /// fetch is skipped rather than failing the whole aggregation.
    pub async fn analytics_dataset(
        &self,
        project_ids: Option<&[String]>,
        time_range: &str,
    ) -> Result<Vec<(Project, Vec<EndpointRecord>)>, BackendError> {
        let projects = self.projects().await?;
        let projects: Vec<Project> = match project_ids {
            Some(ids) => projects.into_iter().filter(|p| ids.contains(&p.id)).collect(),
            None => projects,
        };

        let selection = EndpointSelection::for_analytics(time_range);
        let mut dataset = Vec::with_capacity(projects.len());
        for project in projects {
            if let Some((records, _)) = self.endpoint_page(&project.id, &selection).await? {
                dataset.push((project, records));
            }
        }

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::endpoints::{EndpointSortField, SortOrder};

    #[test]
    fn circuit_breaker_opens_after_failure_threshold() {
        let mut breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            success_threshold: 1,
            timeout_seconds: 60,
        });

        assert!(breaker.call_allowed());
        breaker.on_failure();
        assert_eq!(*breaker.state(), CircuitState::Closed);
        breaker.on_failure();
        assert_eq!(*breaker.state(), CircuitState::Open);
        assert!(!breaker.call_allowed());
    }

    #[test]
    fn circuit_breaker_recovers_through_half_open() {
        let mut breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 2,
            timeout_seconds: 0,
        });

        breaker.on_failure();
        assert_eq!(*breaker.state(), CircuitState::Open);

        // Zero timeout lets the very next call probe the backend.
        assert!(breaker.call_allowed());
        assert_eq!(*breaker.state(), CircuitState::HalfOpen);

        breaker.on_success();
        assert_eq!(*breaker.state(), CircuitState::HalfOpen);
        breaker.on_success();
        assert_eq!(*breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_circuit_reopens_on_failure() {
        let mut breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 2,
            timeout_seconds: 0,
        });

        breaker.on_failure();
        assert!(breaker.call_allowed());
        assert_eq!(*breaker.state(), CircuitState::HalfOpen);

        breaker.on_failure();
        assert_eq!(*breaker.state(), CircuitState::Open);
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(BackendError::Timeout.is_retryable());
        assert!(BackendError::RetryableStatus(503).is_retryable());
        assert!(!BackendError::UnexpectedStatus(400).is_retryable());
        assert!(!BackendError::NotFound.is_retryable());
        assert!(!BackendError::CircuitOpen.is_retryable());
        assert!(!BackendError::Decode("boom".to_string()).is_retryable());
    }

    #[test]
    fn user_messages_never_leak_internals() {
        let message = BackendError::Decode("expected value at line 1".to_string()).user_message();
        assert!(!message.contains("line 1"));

        assert!(BackendError::RetryableStatus(503).user_message().contains("503"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = BackendClient::new("not a url", BackendConfig::default(), None);
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn sample_mode_serves_fixtures() {
        let source = DataSource::from_config(&BackendConfig::default(), None).unwrap();
        assert_eq!(source.mode(), "sample");

        let projects = source.projects().await.unwrap();
        assert_eq!(projects.len(), 2);

        assert!(source.project("1").await.unwrap().is_some());
        assert!(source.project("nope").await.unwrap().is_none());

        let selection = EndpointSelection {
            method: None,
            status: None,
            time_range: "24h".to_string(),
            sort_by: EndpointSortField::Path,
            order: SortOrder::Asc,
            page: 1,
            limit: 20,
        };
        let (records, pagination) = source.endpoint_page("1", &selection).await.unwrap().unwrap();
        assert_eq!(pagination.total, records.len() as u64);
        assert!(source.endpoint_page("nope", &selection).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn analytics_dataset_honors_the_project_filter() {
        let source = DataSource::Sample;
        let ids = vec!["2".to_string()];

        let dataset = source.analytics_dataset(Some(&ids), "24h").await.unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset[0].0.id, "2");

        let full = source.analytics_dataset(None, "24h").await.unwrap();
        assert_eq!(full.len(), 2);
    }
}
