//! Summary payload of a successful provisioning run.

use github::GitHubClient;
use lifecycle_core::naming::{self, vars};
use postman::PostmanClient;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FinalData {
    pub project: String,
    pub repo_url: String,
    pub postman: PostmanSummary,
    pub aws: AwsSummary,
    pub lint: LintSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PostmanSummary {
    pub workspace_id: String,
    pub workspace_url: String,
    pub baseline_collection_uid: String,
    pub smoke_collection_uid: String,
    pub contract_collection_uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AwsSummary {
    pub function_name: String,
    pub environments: Vec<EnvironmentEndpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct EnvironmentEndpoint {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct LintSummary {
    pub errors: u64,
    pub warnings: u64,
}

/// Variable value, or `""` when it cannot be read.
pub(crate) async fn text_var(github: &GitHubClient, repo: &str, name: &str) -> String {
    github.get_variable(repo, name).await.unwrap_or_default()
}

/// Variable parsed as a count, or `0` when missing or not a number.
pub(crate) async fn count_var(github: &GitHubClient, repo: &str, name: &str) -> u64 {
    let raw = text_var(github, repo, name).await;
    raw.trim().parse().unwrap_or_else(|_| {
        if !raw.is_empty() {
            debug!(variable = name, value = %raw, "Variable is not a count");
        }
        0
    })
}

/// Reads the run's output variables. Never fails: every value that cannot
/// be read falls back to an empty string or zero.
pub async fn build_final_data(
    github: &GitHubClient,
    project: &str,
    environments: &[String],
) -> FinalData {
    let workspace_id = text_var(github, project, vars::POSTMAN_WORKSPACE_ID).await;
    let workspace_url = if workspace_id.is_empty() {
        String::new()
    } else {
        PostmanClient::workspace_url(&workspace_id)
    };

    let mut endpoints = Vec::with_capacity(environments.len());
    for environment in environments {
        endpoints.push(EnvironmentEndpoint {
            name: environment.clone(),
            url: text_var(github, project, &naming::gateway_url_variable(environment)).await,
        });
    }

    FinalData {
        project: project.to_string(),
        repo_url: github.html_url(project),
        postman: PostmanSummary {
            workspace_id,
            workspace_url,
            baseline_collection_uid: text_var(github, project, vars::BASELINE_COLLECTION_UID).await,
            smoke_collection_uid: text_var(github, project, vars::SMOKE_COLLECTION_UID).await,
            contract_collection_uid: text_var(github, project, vars::CONTRACT_COLLECTION_UID).await,
        },
        aws: AwsSummary {
            function_name: text_var(github, project, vars::FUNCTION_NAME).await,
            environments: endpoints,
        },
        lint: LintSummary {
            errors: count_var(github, project, vars::LINT_ERRORS).await,
            warnings: count_var(github, project, vars::LINT_WARNINGS).await,
        },
    }
}
