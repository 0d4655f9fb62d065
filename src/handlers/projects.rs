//! Project listing and stats endpoint handlers.

use crate::handlers::map_backend_error;
use crate::models::{Project, ProjectStats};
use crate::services::backend::DataSource;
use crate::services::rate_limit::{rate_limit_middleware, SimpleRateLimiter};
use actix_web::{web, Error, HttpRequest, Result};
use paperclip::actix::api_v2_operation;
use tracing::info;

/// Project listing endpoint
///
/// Returns every monitored project visible to this dashboard instance.
#[api_v2_operation(
    summary = "List Projects",
    description = "Returns all monitored projects.",
    tags("Projects"),
    responses(
        (status = 200, description = "Successful response"),
        (status = 429, description = "Too Many Requests"),
        (status = 502, description = "Monitoring backend unavailable")
    )
)]
pub async fn list_projects(
    req: HttpRequest,
    source: web::Data<DataSource>,
) -> Result<web::Json<Vec<Project>>, Error> {
    if let Some(limiter) = req.app_data::<web::Data<SimpleRateLimiter>>() {
        if let Err(_response) = rate_limit_middleware(&req, limiter) {
            return Err(actix_web::error::ErrorTooManyRequests(
                "Rate limit exceeded. Please try again later.",
            ));
        }
    }

    let projects = source.projects().await.map_err(map_backend_error)?;
    info!(count = projects.len(), "Listed projects");

    Ok(web::Json(projects))
}

/// Single project endpoint
#[api_v2_operation(
    summary = "Get Project",
    description = "Returns one monitored project by id.",
    tags("Projects"),
    responses(
        (status = 200, description = "Successful response"),
        (status = 404, description = "Project not found"),
        (status = 429, description = "Too Many Requests"),
        (status = 502, description = "Monitoring backend unavailable")
    )
)]
pub async fn get_project(
    req: HttpRequest,
    path: web::Path<String>,
    source: web::Data<DataSource>,
) -> Result<web::Json<Project>, Error> {
    if let Some(limiter) = req.app_data::<web::Data<SimpleRateLimiter>>() {
        if let Err(_response) = rate_limit_middleware(&req, limiter) {
            return Err(actix_web::error::ErrorTooManyRequests(
                "Rate limit exceeded. Please try again later.",
            ));
        }
    }

    let project_id = path.into_inner();
    match source.project(&project_id).await.map_err(map_backend_error)? {
        Some(project) => Ok(web::Json(project)),
        None => Err(actix_web::error::ErrorNotFound("Project not found")),
    }
}

/// Project stats endpoint
///
/// Returns the request-weighted aggregate stats shown on a project's
/// overview card.
#[api_v2_operation(
    summary = "Get Project Stats",
    description = "Returns aggregate traffic stats for one project.",
    tags("Projects"),
    responses(
        (status = 200, description = "Successful response"),
        (status = 404, description = "Project not found"),
        (status = 429, description = "Too Many Requests"),
        (status = 502, description = "Monitoring backend unavailable")
    )
)]
pub async fn get_project_stats(
    req: HttpRequest,
    path: web::Path<String>,
    source: web::Data<DataSource>,
) -> Result<web::Json<ProjectStats>, Error> {
    if let Some(limiter) = req.app_data::<web::Data<SimpleRateLimiter>>() {
        if let Err(_response) = rate_limit_middleware(&req, limiter) {
            return Err(actix_web::error::ErrorTooManyRequests(
                "Rate limit exceeded. Please try again later.",
            ));
        }
    }

    let project_id = path.into_inner();
    match source
        .project_stats(&project_id)
        .await
        .map_err(map_backend_error)?
    {
        Some(stats) => Ok(web::Json(stats)),
        None => Err(actix_web::error::ErrorNotFound("Project not found")),
    }
}
