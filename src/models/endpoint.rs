//! Endpoint observation and grouping data models.

use crate::models::api::Pagination;
use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Health classification reported for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    #[default]
    Healthy,
    Warning,
    Error,
}

impl EndpointStatus {
    /// Escalation rank: `error` outranks `warning` outranks `healthy`.
    pub fn severity(self) -> u8 {
        match self {
            EndpointStatus::Healthy => 1,
            EndpointStatus::Warning => 2,
            EndpointStatus::Error => 3,
        }
    }

    /// Parses a dashboard filter value. `None` for anything unknown.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "healthy" => Some(EndpointStatus::Healthy),
            "warning" => Some(EndpointStatus::Warning),
            "error" => Some(EndpointStatus::Error),
            _ => None,
        }
    }

    /// The lowercase wire token, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointStatus::Healthy => "healthy",
            EndpointStatus::Warning => "warning",
            EndpointStatus::Error => "error",
        }
    }
}

/// One observed endpoint signature, as supplied by the monitoring backend.
///
/// Numeric fields tolerate missing, null or malformed JSON values; anything
/// unusable is read as zero instead of rejecting the whole record. An
/// unrecognized status falls back to `healthy`.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    #[serde(default)]
    pub id: String,
    pub method: String,
    pub path: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_response_time: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub error_rate: f64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub request_count: u64,
    #[serde(default)]
    pub last_request: String,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: EndpointStatus,
}

/// Aggregate of every raw record sharing one `method:normalized_path` key.
///
/// `path` keeps the first raw path seen for the key, and
/// `original_endpoints` owns the folded records in fold order so callers
/// can drill into a concrete observation.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointGroup {
    pub method: String,
    pub path: String,
    pub normalized_path: String,
    pub count: u64,
    pub avg_response_time: f64,
    pub error_rate: f64,
    pub request_count: u64,
    pub last_request: String,
    pub status: EndpointStatus,
    pub original_endpoints: Vec<EndpointRecord>,
}

/// Display-ready strings for one grouped endpoint row.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointGroupDisplay {
    /// Markup for the normalized path with `{param}` placeholders wrapped
    /// in highlight spans. Escaped at the formatting boundary, so safe to
    /// inject as-is.
    pub path: String,
    pub avg_response_time: String,
    pub error_rate: String,
    pub request_count: String,
    pub last_request: String,
}

/// One row of the grouped endpoints table: the aggregate plus the strings
/// the dashboard renders for it.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct GroupedEndpoint {
    pub method: String,
    pub path: String,
    pub normalized_path: String,
    pub count: u64,
    pub avg_response_time: f64,
    pub error_rate: f64,
    pub request_count: u64,
    pub last_request: String,
    pub status: EndpointStatus,
    pub original_endpoints: Vec<EndpointRecord>,
    pub display: EndpointGroupDisplay,
}

/// Filter echo returned with a grouped endpoints page.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointFilters {
    pub method: String,
    pub status: String,
    pub time_range: String,
    pub sort_by: String,
    pub order: String,
}

/// Response body for the grouped endpoints listing.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointPage {
    pub endpoints: Vec<GroupedEndpoint>,
    pub pagination: Pagination,
    pub filters: EndpointFilters,
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number
            .as_u64()
            .unwrap_or_else(|| number.as_f64().map_or(0, |float| float as u64)),
        Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_status<'de, D>(deserializer: D) -> Result<EndpointStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => EndpointStatus::parse(&text).unwrap_or_default(),
        _ => EndpointStatus::default(),
    })
}
