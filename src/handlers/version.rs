//! Version information endpoint handler.

use crate::{
    models::VersionResponse,
    services::rate_limit::{rate_limit_middleware, SimpleRateLimiter},
};
use actix_web::{web, Error, HttpRequest, Result};
use paperclip::actix::api_v2_operation;

/// Version information endpoint
///
/// Returns the current service version, commit hash, and build time.
/// This endpoint includes rate limiting.
#[api_v2_operation(
    summary = "Version Information Endpoint",
    description = "Returns the current service version, commit hash, and build time.",
    tags("Version"),
    responses(
        (status = 200, description = "Successful response", body = VersionResponse),
        (status = 429, description = "Too Many Requests")
    )
)]
pub async fn version(req: HttpRequest) -> Result<web::Json<VersionResponse>, Error> {
    // Check if rate limiter is available in app data
    if let Some(limiter) = req.app_data::<web::Data<SimpleRateLimiter>>() {
        // Apply rate limiting to version endpoint
        if let Err(_response) = rate_limit_middleware(&req, limiter) {
            return Err(actix_web::error::ErrorTooManyRequests(
                "Rate limit exceeded. Please try again later.",
            ));
        }
    }

    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("VERGEN_GIT_SHA").to_string(),
        build_time: env!("VERGEN_BUILD_TIMESTAMP").to_string(),
    };

    Ok(web::Json(response))
}
