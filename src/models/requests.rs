//! Request log data models.

use crate::models::api::Pagination;
use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

/// One logged request, trimmed to the fields the dashboard renders.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogEntry {
    pub id: String,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub duration_ms: u64,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub user_agent: String,
    pub created_at: String,
}

/// Filter echo returned with a request log page.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct RequestFilters {
    pub method: String,
    pub status_code: String,
    pub time_range: String,
    pub sort_by: String,
    pub order: String,
}

/// Response body for the request log listing.
#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogPage {
    pub requests: Vec<RequestLogEntry>,
    pub pagination: Pagination,
    pub filters: RequestFilters,
}
