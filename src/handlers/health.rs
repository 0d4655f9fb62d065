//! Health check endpoint handler.

use crate::models::HealthResponse;
use crate::services::backend::DataSource;
use actix_web::{web, Error, HttpRequest, Result};
use paperclip::actix::api_v2_operation;

/// Health check endpoint
///
/// Returns the current health status of the service. This endpoint can be
/// used by load balancers, monitoring systems, and health check probes.
#[api_v2_operation(
    summary = "Health Check Endpoint",
    description = "Returns the current health status of the service in JSON format.",
    tags("Health"),
    responses(
        (status = 200, description = "Successful response", body = HealthResponse)
    )
)]
pub async fn health(req: HttpRequest) -> Result<web::Json<HealthResponse>, Error> {
    // Report which data source this instance serves from
    let mode = req
        .app_data::<web::Data<DataSource>>()
        .map(|source| source.mode())
        .unwrap_or("sample")
        .to_string();

    let response = HealthResponse {
        status: "healthy".to_string(),
        mode,
    };

    Ok(web::Json(response))
}
