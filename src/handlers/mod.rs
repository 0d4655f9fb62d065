//! HTTP request handlers for API endpoints.
//!
//! This module contains all the HTTP request handlers that process
//! incoming requests and generate responses.

use crate::services::backend::BackendError;
use tracing::error;

pub mod analytics;
pub mod endpoints;
pub mod health;
pub mod metrics;
pub mod openapi;
pub mod projects;
pub mod requests;
pub mod version;

pub use analytics::*;
pub use endpoints::*;
pub use health::*;
pub use metrics::*;
pub use openapi::*;
pub use projects::*;
pub use requests::*;
pub use version::*;

/// Maps a backend failure onto the HTTP error the dashboard client sees.
///
/// An open circuit reads as 503 and a timeout as 504; everything else is a
/// 502 with the error's user-facing message.
pub(crate) fn map_backend_error(err: BackendError) -> actix_web::Error {
    error!(error = %err, "Monitoring backend request failed");

    match err {
        BackendError::CircuitOpen => {
            actix_web::error::ErrorServiceUnavailable(err.user_message())
        }
        BackendError::Timeout => actix_web::error::ErrorGatewayTimeout(err.user_message()),
        _ => actix_web::error::ErrorBadGateway(err.user_message()),
    }
}
