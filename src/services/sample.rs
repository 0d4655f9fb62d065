//! Built-in sample dataset served when no monitoring backend is configured.
//!
//! The fixtures are deterministic apart from their timestamps, which are
//! anchored to the current time so relative labels stay sensible.

use crate::models::{EndpointRecord, EndpointStatus, Project, RequestLogEntry};
use chrono::{Duration, Utc};

/// Projects visible in sample mode.
pub fn sample_projects() -> Vec<Project> {
    let created = (Utc::now() - Duration::days(45)).to_rfc3339();
    vec![
        Project {
            id: "1".to_string(),
            name: "User Service API".to_string(),
            original_base_url: "https://users.internal.example.com".to_string(),
            proxy_url: "https://proxy.apiscope.dev/1".to_string(),
            created_at: created.clone(),
            request_log_count: 8,
        },
        Project {
            id: "2".to_string(),
            name: "Payment Gateway API".to_string(),
            original_base_url: "https://payments.internal.example.com".to_string(),
            proxy_url: "https://proxy.apiscope.dev/2".to_string(),
            created_at: created,
            request_log_count: 6,
        },
    ]
}

/// Looks up a single sample project.
pub fn sample_project(project_id: &str) -> Option<Project> {
    sample_projects().into_iter().find(|p| p.id == project_id)
}

fn endpoint(
    id: &str,
    method: &str,
    path: &str,
    avg: f64,
    err: f64,
    count: u64,
    minutes_ago: i64,
    status: EndpointStatus,
) -> EndpointRecord {
    EndpointRecord {
        id: id.to_string(),
        method: method.to_string(),
        path: path.to_string(),
        avg_response_time: avg,
        error_rate: err,
        request_count: count,
        last_request: (Utc::now() - Duration::minutes(minutes_ago)).to_rfc3339(),
        status,
    }
}

/// Raw endpoint records for one sample project, or `None` when the project
/// does not exist.
pub fn sample_endpoint_records(project_id: &str) -> Option<Vec<EndpointRecord>> {
    match project_id {
        "1" => Some(vec![
            endpoint("e1", "GET", "/api/users/101", 64.4, 0.0, 18234, 2, EndpointStatus::Healthy),
            endpoint("e2", "GET", "/api/users/205", 71.2, 0.01, 9120, 14, EndpointStatus::Healthy),
            endpoint("e3", "GET", "/api/users/309", 58.9, 0.0, 4411, 95, EndpointStatus::Healthy),
            endpoint(
                "e4",
                "GET",
                "/api/users/9f1b2c3d-4e5f-6789-abcd-ef0123456789/profile",
                112.1,
                0.03,
                2874,
                31,
                EndpointStatus::Warning,
            ),
            endpoint("e5", "POST", "/auth/login", 112.0, 0.08, 30155, 1, EndpointStatus::Warning),
            endpoint("e6", "PUT", "/auth/logout", 85.2, 0.41, 1201, 160, EndpointStatus::Error),
            endpoint(
                "e7",
                "GET",
                "/api/posts/hello-world-2024",
                96.5,
                0.0,
                781,
                2950,
                EndpointStatus::Healthy,
            ),
            endpoint(
                "e8",
                "DELETE",
                "/api/sessions/a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6",
                44.0,
                0.0,
                153,
                12600,
                EndpointStatus::Healthy,
            ),
        ]),
        "2" => Some(vec![
            endpoint("p1", "POST", "/api/payments/process", 412.7, 0.06, 52100, 3, EndpointStatus::Warning),
            endpoint("p2", "GET", "/api/payments/pay_1GqIC8", 156.2, 0.0, 3310, 45, EndpointStatus::Healthy),
            endpoint("p3", "GET", "/api/payments/pay_9ZtRo2", 149.8, 0.02, 2890, 28, EndpointStatus::Healthy),
            endpoint("p4", "POST", "/api/refunds", 523.0, 0.11, 880, 410, EndpointStatus::Error),
            endpoint("p5", "GET", "/api/v1/orders/88", 78.9, 0.0, 12044, 7, EndpointStatus::Healthy),
            endpoint("p6", "GET", "/api/v1/orders/1024", 81.3, 0.01, 9932, 19, EndpointStatus::Healthy),
        ]),
        _ => None,
    }
}

fn log_entry(
    id: &str,
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
    ip_address: &str,
    location: &str,
    minutes_ago: i64,
) -> RequestLogEntry {
    RequestLogEntry {
        id: id.to_string(),
        method: method.to_string(),
        path: path.to_string(),
        status_code,
        duration_ms,
        ip_address: ip_address.to_string(),
        location: location.to_string(),
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)".to_string(),
        created_at: (Utc::now() - Duration::minutes(minutes_ago)).to_rfc3339(),
    }
}

/// Recent request log entries for one sample project, or `None` when the
/// project does not exist.
pub fn sample_request_logs(project_id: &str) -> Option<Vec<RequestLogEntry>> {
    match project_id {
        "1" => Some(vec![
            log_entry("r1", "GET", "/api/users/101", 200, 64, "203.0.113.7", "Berlin, Germany", 2),
            log_entry("r2", "POST", "/auth/login", 201, 112, "198.51.100.23", "Amsterdam, Netherlands", 4),
            log_entry("r3", "PUT", "/auth/logout", 401, 85, "192.0.2.41", "London, UK", 9),
            log_entry("r4", "GET", "/api/users/42", 404, 23, "203.0.113.89", "Paris, France", 15),
            log_entry("r5", "DELETE", "/api/posts/42", 204, 98, "198.51.100.5", "New York, USA", 22),
            log_entry("r6", "GET", "/api/users/205", 200, 71, "203.0.113.120", "Tokyo, Japan", 38),
            log_entry("r7", "POST", "/auth/login", 422, 79, "192.0.2.200", "Sydney, Australia", 61),
            log_entry("r8", "GET", "/api/users/309", 500, 156, "198.51.100.77", "Toronto, Canada", 180),
        ]),
        "2" => Some(vec![
            log_entry("s1", "POST", "/api/payments/process", 200, 402, "203.0.113.50", "Berlin, Germany", 1),
            log_entry("s2", "POST", "/api/payments/process", 502, 3012, "198.51.100.9", "London, UK", 6),
            log_entry("s3", "GET", "/api/payments/pay_1GqIC8", 200, 151, "192.0.2.77", "Paris, France", 12),
            log_entry("s4", "POST", "/api/refunds", 500, 890, "203.0.113.14", "New York, USA", 47),
            log_entry("s5", "GET", "/api/v1/orders/88", 200, 80, "198.51.100.61", "Tokyo, Japan", 73),
            log_entry("s6", "GET", "/api/v1/orders/1024", 200, 77, "192.0.2.123", "Singapore", 210),
        ]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::route::group_endpoints_by_normalized_path;

    #[test]
    fn unknown_projects_have_no_fixtures() {
        assert!(sample_project("99").is_none());
        assert!(sample_endpoint_records("99").is_none());
        assert!(sample_request_logs("99").is_none());
    }

    #[test]
    fn user_service_records_collapse_into_groups() {
        let records = sample_endpoint_records("1").unwrap();
        let groups = group_endpoints_by_normalized_path(records);

        let user_group = groups
            .iter()
            .find(|g| g.normalized_path == "/api/users/{id}")
            .unwrap();
        assert_eq!(user_group.count, 3);

        assert!(groups.iter().any(|g| g.normalized_path == "/api/users/{uuid}/profile"));
        assert!(groups.iter().any(|g| g.normalized_path == "/api/posts/{post}"));
        assert!(groups.iter().any(|g| g.normalized_path == "/api/sessions/{uuid}"));
    }

    #[test]
    fn payment_fixtures_group_stripe_style_tokens() {
        let records = sample_endpoint_records("2").unwrap();
        let groups = group_endpoints_by_normalized_path(records);

        let payment_group = groups
            .iter()
            .find(|g| g.normalized_path == "/api/payments/{payment}")
            .unwrap();
        assert_eq!(payment_group.count, 2);

        assert!(groups.iter().any(|g| g.normalized_path == "/api/v1/orders/{id}"));
    }
}
