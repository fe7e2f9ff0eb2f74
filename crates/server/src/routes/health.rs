use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Where provisioned resources land.
#[derive(Serialize, ToSchema)]
pub struct ProvisioningTarget {
    github_org: String,
    aws_region: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    target: ProvisioningTarget,
}

/// Liveness plus the configured provisioning target. Upstream services are
/// not contacted.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let orchestrator = &state.orchestrator;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        target: ProvisioningTarget {
            github_org: orchestrator.github_org().to_string(),
            aws_region: orchestrator.aws_region().to_string(),
        },
    })
}
