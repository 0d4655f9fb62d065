//! Route pattern normalization and endpoint grouping.
//!
//! Observed request paths arrive with concrete values baked in
//! (`/posts/5`, `/posts/42`). The dashboard wants one row per logical
//! endpoint, so this module classifies each path segment as static or
//! dynamic, substitutes dynamic segments with named placeholders
//! (`/posts/{id}`), and folds raw endpoint records into groups keyed by
//! method plus normalized path.

use crate::models::{EndpointGroup, EndpointRecord};
use crate::utils::format::parse_timestamp;
use actix_web::HttpRequest;
use regex::Regex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::OnceLock;

/// Segments of at most this many characters made up purely of letters are
/// assumed to be static route words (`api`, `me`, `new`).
const SHORT_ALPHA_MAX_LEN: usize = 3;

/// Alphanumeric tokens at least this long are assumed to be opaque
/// identifiers or slugs.
const OPAQUE_TOKEN_MIN_LEN: usize = 9;

/// Route words that are never treated as parameters, regardless of shape.
const STATIC_WORDS: [&str; 12] = [
    "api", "v1", "v2", "v3", "admin", "public", "static", "assets", "css", "js", "img", "images",
];

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+$").expect("hard-coded pattern compiles"))
}

fn uuid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("hard-coded pattern compiles")
    })
}

fn plain_uuid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^[0-9a-f]{32}$").expect("hard-coded pattern compiles"))
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("hard-coded pattern compiles"))
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([^}]+)\}").expect("hard-coded pattern compiles"))
}

/// Decides whether a single `/`-delimited path segment looks like a dynamic
/// parameter value rather than a fixed route component.
///
/// The rules are ordered and the first match wins. Short all-letter words
/// and a fixed vocabulary of route words are always static; digit runs and
/// UUIDs are always dynamic; long tokens and anything mixing digits with
/// letters are assumed to be identifiers or slugs.
pub fn is_dynamic_segment(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }

    if segment.len() <= SHORT_ALPHA_MAX_LEN && segment.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }

    if STATIC_WORDS.contains(&segment.to_lowercase().as_str()) {
        return false;
    }

    // Numeric IDs.
    if numeric_pattern().is_match(segment) {
        return true;
    }

    // UUIDs, with or without dashes.
    if uuid_pattern().is_match(segment) || plain_uuid_pattern().is_match(segment) {
        return true;
    }

    // Long tokens are opaque IDs or slugs.
    if token_pattern().is_match(segment) && segment.len() >= OPAQUE_TOKEN_MIN_LEN {
        return true;
    }

    // Anything mixing digits and letters is assumed to carry a value.
    segment.chars().any(|c| c.is_ascii_digit()) && segment.chars().any(|c| c.is_ascii_alphabetic())
}

/// Picks the placeholder name for a segment already classified as dynamic.
///
/// Digit runs become `id` and UUID shapes become `uuid`. Anything else is
/// named after the preceding segment, lowercased and naively singularized
/// by stripping one trailing `s` (`posts` becomes `post`, `categories`
/// becomes `categorie`). Without a usable preceding segment the name falls
/// back to `id`.
pub fn parameter_name(segment: &str, preceding: &[&str]) -> String {
    if numeric_pattern().is_match(segment) {
        return "id".to_string();
    }

    if uuid_pattern().is_match(segment) || plain_uuid_pattern().is_match(segment) {
        return "uuid".to_string();
    }

    if let Some(prev) = preceding.last()
        && let Some(singular) = prev.strip_suffix('s')
    {
        return singular.to_lowercase();
    }

    "id".to_string()
}

/// Normalizes an observed path by substituting dynamic segments with
/// `{name}` placeholders.
///
/// Empty input is returned unchanged. Empty segments from doubled, leading
/// or trailing slashes are dropped, and the result always starts with a
/// single `/`. The output is deterministic for a given input and serves as
/// the grouping key for "same logical endpoint".
pub fn normalize_endpoint_path(path: &str) -> String {
    if path.is_empty() {
        return path.to_string();
    }

    let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();

    let normalized: Vec<String> = segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            if is_dynamic_segment(segment) {
                format!("{{{}}}", parameter_name(segment, &segments[..index]))
            } else {
                (*segment).to_string()
            }
        })
        .collect();

    format!("/{}", normalized.join("/"))
}

/// Folds raw endpoint records into one group per distinct
/// `method:normalized_path` key, preserving first-insertion key order.
///
/// Every record is moved into exactly one group's `original_endpoints`, in
/// fold order, and `path` keeps the first raw path seen for the key. The
/// aggregation rules match what the dashboard has always shown: `count` and
/// `request_count` accumulate, `error_rate` keeps the maximum, `status`
/// keeps the most severe value, and `last_request` is replaced only when
/// both the current and candidate timestamps parse and the candidate is
/// strictly later. The response time is a running pairwise average seeded
/// from zero, so later records weigh more; consumers rely on the exact
/// values it produces.
pub fn group_endpoints_by_normalized_path(records: Vec<EndpointRecord>) -> Vec<EndpointGroup> {
    let mut groups: Vec<EndpointGroup> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for record in records {
        let normalized_path = normalize_endpoint_path(&record.path);
        let key = format!("{}:{}", record.method, normalized_path);

        let slot = match slots.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                groups.push(EndpointGroup {
                    method: record.method.clone(),
                    path: record.path.clone(),
                    normalized_path,
                    count: 0,
                    avg_response_time: 0.0,
                    error_rate: 0.0,
                    request_count: 0,
                    last_request: record.last_request.clone(),
                    status: record.status,
                    original_endpoints: Vec::new(),
                });
                *entry.insert(groups.len() - 1)
            }
        };

        let group = &mut groups[slot];
        group.count += 1;
        group.request_count += record.request_count;
        group.avg_response_time = (group.avg_response_time + record.avg_response_time) / 2.0;
        group.error_rate = group.error_rate.max(record.error_rate);

        if let (Some(current), Some(candidate)) = (
            parse_timestamp(&group.last_request),
            parse_timestamp(&record.last_request),
        ) && candidate > current
        {
            group.last_request = record.last_request.clone();
        }

        if record.status.severity() > group.status.severity() {
            group.status = record.status;
        }

        group.original_endpoints.push(record);
    }

    groups
}

/// Renders a normalized path as display markup, wrapping every `{param}`
/// placeholder in `<span class="param">` tags.
///
/// Literal text and parameter names are HTML-escaped before the spans are
/// added, so the result is safe to hand to the rendering surface as-is.
/// Paths without markup-significant characters come through byte-identical
/// apart from the added spans.
pub fn format_normalized_path(normalized_path: &str) -> String {
    let escaped = escape_html(normalized_path);
    placeholder_pattern()
        .replace_all(&escaped, "<span class=\"param\">{$1}</span>")
        .into_owned()
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Extract the route pattern for an incoming request.
///
/// Prefers the matched resource template so every hit on
/// `/api/projects/{project_id}` shares one metrics label. Unmatched paths
/// fall back to heuristic normalization, which keeps label cardinality
/// bounded even for scans and typos.
pub fn extract_route_pattern(req: &HttpRequest) -> String {
    req.match_pattern()
        .unwrap_or_else(|| normalize_endpoint_path(req.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EndpointStatus;
    use actix_web::test::TestRequest;

    fn record(
        method: &str,
        path: &str,
        avg_response_time: f64,
        error_rate: f64,
        request_count: u64,
        last_request: &str,
        status: EndpointStatus,
    ) -> EndpointRecord {
        EndpointRecord {
            id: format!("{method} {path}"),
            method: method.to_string(),
            path: path.to_string(),
            avg_response_time,
            error_rate,
            request_count,
            last_request: last_request.to_string(),
            status,
        }
    }

    #[test]
    fn numeric_segments_are_dynamic() {
        assert!(is_dynamic_segment("0"));
        assert!(is_dynamic_segment("5"));
        assert!(is_dynamic_segment("1234567890"));
    }

    #[test]
    fn short_alpha_segments_are_static() {
        assert!(!is_dynamic_segment("me"));
        assert!(!is_dynamic_segment("new"));
        assert!(!is_dynamic_segment("abc"));
    }

    #[test]
    fn static_vocabulary_wins_regardless_of_case() {
        assert!(!is_dynamic_segment("api"));
        assert!(!is_dynamic_segment("API"));
        assert!(!is_dynamic_segment("Images"));
        assert!(!is_dynamic_segment("V1"));
        assert!(!is_dynamic_segment("admin"));
    }

    #[test]
    fn uuids_are_dynamic_in_both_shapes() {
        assert!(is_dynamic_segment("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_dynamic_segment("550E8400-E29B-41D4-A716-446655440000"));
        assert!(is_dynamic_segment("550e8400e29b41d4a716446655440000"));
    }

    #[test]
    fn long_tokens_are_treated_as_identifiers() {
        assert!(is_dynamic_segment("a1b2c3d4e5"));
        assert!(is_dynamic_segment("my-first-post"));
        assert!(is_dynamic_segment("endpoints"));
    }

    #[test]
    fn mixed_alphanumerics_are_dynamic() {
        assert!(is_dynamic_segment("a1"));
        assert!(is_dynamic_segment("v1x"));
        assert!(is_dynamic_segment("order66"));
    }

    #[test]
    fn plain_words_and_punctuation_stay_static() {
        assert!(!is_dynamic_segment(""));
        assert!(!is_dynamic_segment("users"));
        assert!(!is_dynamic_segment("profile"));
        assert!(!is_dynamic_segment("short-a"));
        assert!(!is_dynamic_segment("file.txt"));
    }

    #[test]
    fn numeric_parameters_are_named_id() {
        assert_eq!(parameter_name("42", &["posts"]), "id");
        assert_eq!(parameter_name("42", &[]), "id");
    }

    #[test]
    fn uuid_parameters_are_named_uuid() {
        assert_eq!(
            parameter_name("550e8400-e29b-41d4-a716-446655440000", &["users"]),
            "uuid"
        );
        assert_eq!(
            parameter_name("550e8400e29b41d4a716446655440000", &["users"]),
            "uuid"
        );
    }

    #[test]
    fn slug_parameters_take_the_singularized_parent_name() {
        assert_eq!(parameter_name("my-first-post", &["posts"]), "post");
        assert_eq!(parameter_name("some-long-slug", &["api", "users"]), "user");
        assert_eq!(parameter_name("some-long-slug", &["categories"]), "categorie");
    }

    #[test]
    fn slug_parameters_without_a_plural_parent_fall_back_to_id() {
        assert_eq!(parameter_name("some-long-slug", &["search"]), "id");
        assert_eq!(parameter_name("some-long-slug", &[]), "id");
        // The trailing-s check is case sensitive.
        assert_eq!(parameter_name("some-long-slug", &["ITEMS"]), "id");
    }

    #[test]
    fn normalize_substitutes_dynamic_segments() {
        assert_eq!(normalize_endpoint_path("/posts/123"), "/posts/{id}");
        assert_eq!(
            normalize_endpoint_path("/users/550e8400-e29b-41d4-a716-446655440000/posts"),
            "/users/{uuid}/posts"
        );
        assert_eq!(normalize_endpoint_path("/api/v1/orders/42"), "/api/v1/orders/{id}");
        assert_eq!(normalize_endpoint_path("/posts/my-first-post"), "/posts/{post}");
        assert_eq!(normalize_endpoint_path("/api/health"), "/api/health");
    }

    #[test]
    fn normalize_handles_slash_noise() {
        assert_eq!(normalize_endpoint_path(""), "");
        assert_eq!(normalize_endpoint_path("/"), "/");
        assert_eq!(normalize_endpoint_path("//posts//5"), "/posts/{id}");
        assert_eq!(normalize_endpoint_path("posts/5"), "/posts/{id}");
        assert_eq!(normalize_endpoint_path("/posts/5/"), "/posts/{id}");
    }

    #[test]
    fn normalize_names_parameters_from_the_raw_parent_segment() {
        // "categories" itself looks like a long token, so both segments
        // turn into placeholders; the second is still named after the raw
        // parent.
        assert_eq!(normalize_endpoint_path("/categories/5"), "/{id}/{categorie}");
        // A parent of exactly "s" singularizes to the empty string.
        assert_eq!(normalize_endpoint_path("/s/abc123xyz123"), "/s/{}");
    }

    #[test]
    fn normalize_is_stable_over_its_own_output() {
        for path in [
            "/posts/123",
            "/users/550e8400-e29b-41d4-a716-446655440000",
            "/api/v1/orders/42",
        ] {
            let once = normalize_endpoint_path(path);
            assert_eq!(normalize_endpoint_path(&once), once);
        }
        // Hand-written placeholders with digits inside are re-classified.
        assert_eq!(normalize_endpoint_path("/x/{id2}"), "/x/{id}");
    }

    #[test]
    fn grouping_folds_records_with_the_same_signature() {
        let groups = group_endpoints_by_normalized_path(vec![
            record("GET", "/posts/1", 100.0, 0.01, 10, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
            record("GET", "/posts/2", 200.0, 0.05, 25, "2024-03-01T12:00:00Z", EndpointStatus::Warning),
        ]);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.method, "GET");
        assert_eq!(group.normalized_path, "/posts/{id}");
        assert_eq!(group.path, "/posts/1");
        assert_eq!(group.count, 2);
        assert_eq!(group.request_count, 35);
        assert_eq!(group.original_endpoints.len(), 2);
        assert_eq!(group.original_endpoints[0].path, "/posts/1");
        assert_eq!(group.original_endpoints[1].path, "/posts/2");
    }

    #[test]
    fn grouping_separates_methods() {
        let groups = group_endpoints_by_normalized_path(vec![
            record("GET", "/posts/1", 100.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
            record("DELETE", "/posts/1", 100.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].method, "GET");
        assert_eq!(groups[1].method, "DELETE");
    }

    #[test]
    fn grouping_preserves_first_seen_key_order() {
        let groups = group_endpoints_by_normalized_path(vec![
            record("GET", "/users/7", 1.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
            record("GET", "/posts/1", 1.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
            record("GET", "/users/9", 1.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
            record("POST", "/posts", 1.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
        ]);

        let keys: Vec<String> = groups
            .iter()
            .map(|g| format!("{}:{}", g.method, g.normalized_path))
            .collect();
        assert_eq!(keys, vec!["GET:/users/{id}", "GET:/posts/{id}", "POST:/posts"]);
    }

    #[test]
    fn grouping_averages_pairwise_from_a_zero_seed() {
        let single = group_endpoints_by_normalized_path(vec![record(
            "GET",
            "/posts/1",
            100.0,
            0.0,
            1,
            "2024-03-01T10:00:00Z",
            EndpointStatus::Healthy,
        )]);
        assert_eq!(single[0].avg_response_time, 50.0);

        let pair = group_endpoints_by_normalized_path(vec![
            record("GET", "/posts/1", 100.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
            record("GET", "/posts/2", 200.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
        ]);
        assert_eq!(pair[0].avg_response_time, 125.0);
    }

    #[test]
    fn grouping_keeps_the_maximum_error_rate() {
        let groups = group_endpoints_by_normalized_path(vec![
            record("GET", "/posts/1", 1.0, 0.08, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
            record("GET", "/posts/2", 1.0, 0.02, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
        ]);
        assert_eq!(groups[0].error_rate, 0.08);
    }

    #[test]
    fn grouping_escalates_status_without_downgrading() {
        let groups = group_endpoints_by_normalized_path(vec![
            record("GET", "/posts/1", 1.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Healthy),
            record("GET", "/posts/2", 1.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Error),
            record("GET", "/posts/3", 1.0, 0.0, 1, "2024-03-01T10:00:00Z", EndpointStatus::Warning),
        ]);
        assert_eq!(groups[0].status, EndpointStatus::Error);
    }

    #[test]
    fn grouping_keeps_the_latest_parseable_timestamp() {
        let groups = group_endpoints_by_normalized_path(vec![
            record("GET", "/posts/1", 1.0, 0.0, 1, "2024-03-01T12:00:00Z", EndpointStatus::Healthy),
            record("GET", "/posts/2", 1.0, 0.0, 1, "2024-03-01T09:00:00Z", EndpointStatus::Healthy),
            record("GET", "/posts/3", 1.0, 0.0, 1, "2024-03-02T08:00:00Z", EndpointStatus::Healthy),
        ]);
        assert_eq!(groups[0].last_request, "2024-03-02T08:00:00Z");
    }

    #[test]
    fn unparseable_timestamps_never_win_or_lose_the_slot() {
        // An unparseable candidate does not replace a valid timestamp.
        let groups = group_endpoints_by_normalized_path(vec![
            record("GET", "/posts/1", 1.0, 0.0, 1, "2024-03-01T12:00:00Z", EndpointStatus::Healthy),
            record("GET", "/posts/2", 1.0, 0.0, 1, "not-a-timestamp", EndpointStatus::Healthy),
        ]);
        assert_eq!(groups[0].last_request, "2024-03-01T12:00:00Z");

        // An unparseable seed is never replaced, because both sides must
        // parse before the comparison happens.
        let groups = group_endpoints_by_normalized_path(vec![
            record("GET", "/posts/1", 1.0, 0.0, 1, "not-a-timestamp", EndpointStatus::Healthy),
            record("GET", "/posts/2", 1.0, 0.0, 1, "2024-03-01T12:00:00Z", EndpointStatus::Healthy),
        ]);
        assert_eq!(groups[0].last_request, "not-a-timestamp");
    }

    #[test]
    fn grouping_empty_input_yields_no_groups() {
        assert!(group_endpoints_by_normalized_path(Vec::new()).is_empty());
    }

    #[test]
    fn formatting_wraps_placeholders_in_spans() {
        assert_eq!(
            format_normalized_path("/posts/{id}"),
            "/posts/<span class=\"param\">{id}</span>"
        );
        assert_eq!(
            format_normalized_path("/users/{uuid}/posts/{post}"),
            "/users/<span class=\"param\">{uuid}</span>/posts/<span class=\"param\">{post}</span>"
        );
        assert_eq!(format_normalized_path("/api/health"), "/api/health");
    }

    #[test]
    fn formatting_escapes_literal_markup() {
        assert_eq!(
            format_normalized_path("/<script>/{id}"),
            "/&lt;script&gt;/<span class=\"param\">{id}</span>"
        );
        assert_eq!(format_normalized_path("/a&b"), "/a&amp;b");
    }

    #[test]
    fn route_pattern_falls_back_to_normalization() {
        let req = TestRequest::default().uri("/posts/77").to_http_request();
        assert_eq!(extract_route_pattern(&req), "/posts/{id}");
    }
}
