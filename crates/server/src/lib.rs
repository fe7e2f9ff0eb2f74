pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "API Lifecycle Provisioner",
        version = "0.1.0",
        description = "Provisions and tears down API projects across GitHub, Postman and AWS, streaming progress as server-sent events"
    ),
    paths(
        routes::health_check,
        routes::provision,
        routes::teardown,
        routes::project_status,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::ProvisioningTarget,
        error::ErrorResponse,
        lifecycle_core::ProvisionRequest,
        lifecycle_core::TeardownRequest,
        events::ProgressEvent,
        events::EventStatus,
        orchestrator::StatusReport,
        orchestrator::ResourceStatus,
        orchestrator::FinalData,
        orchestrator::final_data::PostmanSummary,
        orchestrator::final_data::AwsSummary,
        orchestrator::final_data::EnvironmentEndpoint,
        orchestrator::final_data::LintSummary,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "provisioning", description = "Provisioning, teardown and status"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/provision", post(routes::provision))
        .route("/api/teardown", post(routes::teardown))
        .route("/api/status", get(routes::project_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
