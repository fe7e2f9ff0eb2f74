//! Teardown pipeline: Postman workspace, AWS resources, then the repository.
//!
//! Every step runs no matter how the previous ones went. Each outcome is
//! recorded in the final `results` map as `"deleted"` or the error text.
//! A dry run only looks resources up and records `"would delete"` or
//! `"not found"` instead.

use std::sync::Arc;

use events::{EventStream, ProgressEvent};
use github::GitHubClient;
use lifecycle_core::naming::{self, vars};
use postman::PostmanClient;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::cloud::CloudResources;
use crate::error::Result;
use crate::phases::Phase;
use crate::status::recorded_environments;

const DELETED: &str = "deleted";
const WOULD_DELETE: &str = "would delete";
const NOT_FOUND: &str = "not found";

pub(crate) struct TeardownPipeline {
    pub github: Arc<GitHubClient>,
    pub postman: Arc<PostmanClient>,
    pub cloud: Arc<dyn CloudResources>,
    pub stream: Arc<EventStream>,
    pub project: String,
    pub dry_run: bool,
}

/// Collects per-resource results for one result key. `Ok(true)` means the
/// resource was deleted (or, in a dry run, exists).
#[derive(Default)]
struct Outcome {
    errors: Vec<String>,
    found: usize,
}

impl Outcome {
    fn record<E: ToString>(&mut self, result: std::result::Result<bool, E>) {
        match result {
            Ok(true) => self.found += 1,
            Ok(false) => {}
            Err(e) => self.errors.push(e.to_string()),
        }
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn into_value(self, dry_run: bool) -> Value {
        if !self.errors.is_empty() {
            Value::from(self.errors.join("; "))
        } else if !dry_run {
            Value::from(DELETED)
        } else if self.found > 0 {
            Value::from(WOULD_DELETE)
        } else {
            Value::from(NOT_FOUND)
        }
    }
}

impl TeardownPipeline {
    pub(crate) async fn run(self) -> Result<()> {
        info!(project = %self.project, dry_run = self.dry_run, "Teardown started");
        let mut results = Map::new();

        self.delete_workspace(&mut results).await;
        self.delete_cloud_resources(&mut results).await;
        self.delete_repository(&mut results).await;

        info!(project = %self.project, dry_run = self.dry_run, "Teardown finished");
        let event = if self.dry_run {
            ProgressEvent::complete(Phase::Complete.id(), "Teardown preview complete").with_data(
                json!({ "project": self.project, "dry_run": true, "results": results }),
            )
        } else {
            ProgressEvent::complete(Phase::Complete.id(), "Teardown complete")
                .with_data(json!({ "project": self.project, "results": results }))
        };
        self.stream.send(event);
        Ok(())
    }

    async fn delete_workspace(&self, results: &mut Map<String, Value>) {
        let phase = Phase::Postman.id();
        let workspace_id = self
            .github
            .get_variable(&self.project, vars::POSTMAN_WORKSPACE_ID)
            .await
            .filter(|id| !id.trim().is_empty());

        let Some(workspace_id) = workspace_id else {
            self.stream.send(ProgressEvent::complete(
                phase,
                "No Postman workspace recorded, nothing to delete",
            ));
            return;
        };

        if self.dry_run {
            self.preview_workspace(&workspace_id, results).await;
            return;
        }

        self.stream.send(ProgressEvent::running(
            phase,
            format!("Deleting Postman workspace {}", workspace_id),
        ));
        match self.postman.delete_workspace(&workspace_id).await {
            Ok(()) => {
                results.insert("postman".to_string(), Value::from(DELETED));
                self.stream
                    .send(ProgressEvent::complete(phase, "Postman workspace deleted"));
            }
            Err(e) => {
                warn!(project = %self.project, workspace_id = %workspace_id, error = %e, "Workspace deletion failed");
                results.insert("postman".to_string(), Value::from(e.to_string()));
                self.stream.send(ProgressEvent::error(
                    phase,
                    format!("Failed to delete Postman workspace: {}", e),
                ));
            }
        }
    }

    async fn preview_workspace(&self, workspace_id: &str, results: &mut Map<String, Value>) {
        let phase = Phase::Postman.id();
        match self.postman.find_workspace(workspace_id).await {
            Ok(Some(name)) => {
                results.insert("postman".to_string(), Value::from(WOULD_DELETE));
                self.stream.send(ProgressEvent::complete(
                    phase,
                    format!("Would delete Postman workspace {} ({})", name, workspace_id),
                ));
            }
            Ok(None) => {
                results.insert("postman".to_string(), Value::from(NOT_FOUND));
                self.stream.send(ProgressEvent::complete(
                    phase,
                    format!("Postman workspace {} not found", workspace_id),
                ));
            }
            Err(e) => {
                warn!(project = %self.project, workspace_id, error = %e, "Workspace lookup failed");
                results.insert("postman".to_string(), Value::from(e.to_string()));
                self.stream.send(ProgressEvent::error(
                    phase,
                    format!("Failed to look up Postman workspace: {}", e),
                ));
            }
        }
    }

    async fn delete_cloud_resources(&self, results: &mut Map<String, Value>) {
        let phase = Phase::Aws.id();
        self.stream.send(ProgressEvent::running(
            phase,
            if self.dry_run {
                "Looking up AWS resources"
            } else {
                "Deleting AWS resources"
            },
        ));

        let base = self
            .github
            .get_variable(&self.project, vars::FUNCTION_NAME)
            .await
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.project.clone());

        let mut gateways = Outcome::default();
        let mut functions = Outcome::default();
        let mut logs = Outcome::default();
        let cloud = self.cloud.as_ref();

        for environment in recorded_environments(&self.github, &self.project).await {
            let function = naming::function_name(&base, &environment);
            let gateway = naming::gateway_name(&function);
            let log_group = naming::log_group_name(&function);
            if self.dry_run {
                gateways.record(cloud.gateway_exists(&gateway).await);
                functions.record(cloud.function_exists(&function).await);
                logs.record(cloud.log_group_exists(&log_group).await);
            } else {
                // The gateway integration points at the function, so it goes first.
                gateways.record(cloud.delete_gateway(&gateway).await.map(|()| true));
                functions.record(cloud.delete_function(&function).await.map(|()| true));
                logs.record(cloud.delete_log_group(&log_group).await.map(|()| true));
            }
        }

        let role_name = naming::role_name(&base);
        let mut role = Outcome::default();
        if self.dry_run {
            role.record(cloud.role_exists(&role_name).await);
        } else {
            role.record(cloud.delete_role(&role_name).await.map(|()| true));
        }

        let mut failed = Vec::new();
        let mut found = 0;
        for (key, outcome) in [
            ("api_gateway", gateways),
            ("lambda", functions),
            ("logs", logs),
            ("iam", role),
        ] {
            if !outcome.is_ok() {
                failed.push(key);
            }
            found += outcome.found;
            results.insert(key.to_string(), outcome.into_value(self.dry_run));
        }

        if !failed.is_empty() {
            warn!(project = %self.project, failed = ?failed, "Some AWS resources were not handled");
            let message = if self.dry_run {
                "Some AWS resources could not be looked up"
            } else {
                "Some AWS resources could not be deleted"
            };
            self.stream.send(
                ProgressEvent::error(phase, message).with_data(json!({ "failed": failed })),
            );
        } else if self.dry_run {
            self.stream.send(ProgressEvent::complete(
                phase,
                format!("Would delete {} AWS resources", found),
            ));
        } else {
            self.stream
                .send(ProgressEvent::complete(phase, "AWS resources deleted"));
        }
    }

    async fn delete_repository(&self, results: &mut Map<String, Value>) {
        let phase = Phase::Github.id();
        let full_name = format!("{}/{}", self.github.org(), self.project);

        if self.dry_run {
            let (value, message) = match self.github.get_repo(&self.project).await {
                Some(_) => (WOULD_DELETE, format!("Would delete repository {}", full_name)),
                None => (NOT_FOUND, format!("Repository {} not found", full_name)),
            };
            results.insert("github".to_string(), Value::from(value));
            self.stream.send(ProgressEvent::complete(phase, message));
            return;
        }

        self.stream.send(ProgressEvent::running(
            phase,
            format!("Deleting repository {}", full_name),
        ));

        match self.github.delete_repo(&self.project).await {
            Ok(()) => {
                results.insert("github".to_string(), Value::from(DELETED));
                self.stream
                    .send(ProgressEvent::complete(phase, "Repository deleted"));
            }
            Err(e) => {
                warn!(project = %self.project, error = %e, "Repository deletion failed");
                results.insert("github".to_string(), Value::from(e.to_string()));
                self.stream.send(ProgressEvent::error(
                    phase,
                    format!("Failed to delete repository: {}", e),
                ));
            }
        }
    }
}
