use axum::extract::{Query, State};
use axum::Json;
use lifecycle_core::naming::slugify;
use orchestrator::StatusReport;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusQuery {
    /// Project name or slug.
    pub project: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/status",
    params(StatusQuery),
    responses(
        (status = 200, description = "Live resource status", body = StatusReport),
        (status = 400, description = "Missing project parameter", body = crate::error::ErrorResponse)
    ),
    tag = "provisioning"
)]
pub async fn project_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusReport>, AppError> {
    let project = query
        .project
        .as_deref()
        .map(slugify)
        .filter(|slug| !slug.is_empty())
        .ok_or_else(|| AppError::BadRequest("project query parameter is required".to_string()))?;

    Ok(Json(state.orchestrator.status(&project).await))
}
