//! Point-in-time check of which provisioned resources exist.

use github::GitHubClient;
use lifecycle_core::naming::{self, vars};
use lifecycle_core::DEFAULT_ENVIRONMENT;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::final_data::text_var;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResourceStatus {
    pub github: bool,
    pub postman: bool,
    pub lambda: bool,
    pub api_gateway: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusReport {
    pub active_project: Option<String>,
    pub resources: ResourceStatus,
    /// Always `"live"`: nothing is cached.
    pub source: &'static str,
}

/// Environments recorded for a project, defaulting to the single default
/// environment when the variable is missing or unreadable.
pub(crate) async fn recorded_environments(github: &GitHubClient, project: &str) -> Vec<String> {
    let raw = text_var(github, project, vars::ENVIRONMENTS).await;
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(list) => lifecycle_core::normalize_environments(list),
        Err(_) => {
            if !raw.is_empty() {
                debug!(project, value = %raw, "ENVIRONMENTS is not a JSON list");
            }
            vec![DEFAULT_ENVIRONMENT.to_string()]
        }
    }
}

pub async fn inspect(github: &GitHubClient, project: &str) -> StatusReport {
    if github.get_repo(project).await.is_none() {
        return StatusReport {
            active_project: None,
            resources: ResourceStatus::default(),
            source: "live",
        };
    }

    let postman = !text_var(github, project, vars::POSTMAN_WORKSPACE_ID)
        .await
        .is_empty();
    let lambda = !text_var(github, project, vars::FUNCTION_NAME).await.is_empty();

    let mut api_gateway = false;
    for environment in recorded_environments(github, project).await {
        let url = text_var(github, project, &naming::gateway_url_variable(&environment)).await;
        if !url.is_empty() {
            api_gateway = true;
            break;
        }
    }

    StatusReport {
        active_project: Some(project.to_string()),
        resources: ResourceStatus {
            github: true,
            postman,
            lambda,
            api_gateway,
        },
        source: "live",
    }
}
