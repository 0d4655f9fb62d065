//! HTTP utility functions for extracting request information.

use actix_web::HttpRequest;

/// Proxy headers that may carry the real client address, in order of
/// preference.
const IP_HEADERS: [&str; 7] = [
    "X-Forwarded-For",
    "X-Real-IP",
    "CF-Connecting-IP",
    "X-Cluster-Client-IP",
    "X-Forwarded",
    "Forwarded-For",
    "Forwarded",
];

/// Extract the client IP address from a request.
///
/// Walks the known proxy headers first and falls back to the connection's
/// remote address. A comma-separated `X-Forwarded-For` chain yields its
/// first entry.
pub fn extract_client_ip(req: &HttpRequest) -> String {
    let from_headers = IP_HEADERS.iter().find_map(|name| {
        let value = req.headers().get(*name)?.to_str().ok()?;
        let ip = value.split(',').next().unwrap_or(value).trim();
        (!ip.is_empty()).then(|| ip.to_string())
    });

    from_headers.unwrap_or_else(|| {
        req.connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_string()
    })
}

/// Extract the user agent from request headers, if present.
pub fn extract_user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn forwarded_chain_yields_the_first_hop() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.9, 10.0.0.1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn missing_headers_fall_back_to_peer_address() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_client_ip(&req), "unknown");
    }

    #[test]
    fn user_agent_is_optional() {
        let req = TestRequest::default()
            .insert_header(("User-Agent", "apiscope-tests/1.0"))
            .to_http_request();
        assert_eq!(extract_user_agent(&req).as_deref(), Some("apiscope-tests/1.0"));

        let bare = TestRequest::default().to_http_request();
        assert_eq!(extract_user_agent(&bare), None);
    }
}
