use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use lifecycle_core::{ProvisionRequest, TeardownRequest};
use tracing::info;

use crate::error::AppError;
use crate::routes::sse::progress_stream;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/provision",
    request_body = ProvisionRequest,
    responses(
        (status = 200, description = "Progress events as server-sent events", content_type = "text/event-stream", body = events::ProgressEvent),
        (status = 400, description = "Invalid JSON or missing required field", body = crate::error::ErrorResponse)
    ),
    tag = "provisioning"
)]
pub async fn provision(
    State(state): State<AppState>,
    payload: Result<Json<ProvisionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let job = request.validate()?;

    info!(
        project = %job.project,
        domain = %job.domain,
        environments = ?job.environments,
        "Accepted provisioning request"
    );
    Ok(progress_stream(state.orchestrator.start_provision(job)))
}

#[utoipa::path(
    post,
    path = "/api/teardown",
    request_body = TeardownRequest,
    responses(
        (status = 200, description = "Progress events as server-sent events", content_type = "text/event-stream", body = events::ProgressEvent),
        (status = 400, description = "Invalid JSON or missing project_name", body = crate::error::ErrorResponse)
    ),
    tag = "provisioning"
)]
/// Tear a project down, or with `dry_run` only report what would be deleted.
pub async fn teardown(
    State(state): State<AppState>,
    payload: Result<Json<TeardownRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let job = request.validate()?;

    info!(project = %job.project, dry_run = job.dry_run, "Accepted teardown request");
    Ok(progress_stream(state.orchestrator.start_teardown(job)))
}
