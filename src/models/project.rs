//! Monitored project data models.

use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Deserializer, Serialize};

/// One monitored project: an upstream API observed through its proxy URL.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub original_base_url: String,
    pub proxy_url: String,
    pub created_at: String,
    /// Number of logged requests. Backends that nest this under
    /// `_count.requestLogs` are accepted too; responses always carry it flat.
    #[serde(default, alias = "_count", deserialize_with = "request_log_count")]
    pub request_log_count: u64,
}

fn request_log_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CountWire {
        Flat(u64),
        Nested {
            #[serde(rename = "requestLogs")]
            request_logs: u64,
        },
    }

    Ok(match CountWire::deserialize(deserializer)? {
        CountWire::Flat(count) => count,
        CountWire::Nested { request_logs } => request_logs,
    })
}

/// Traffic summary for a project's stats card.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_requests: u64,
    pub avg_response_time: f64,
    pub error_rate: f64,
    pub last_request: String,
}
