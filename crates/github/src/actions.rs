//! Workflow dispatch and run inspection.

use serde_json::Value;
use tracing::{debug, info};

use crate::client::GitHubClient;
use crate::error::Result;
use crate::types::{JobsResponse, RemoteStep, RunsResponse, WorkflowRun};

impl GitHubClient {
    /// Trigger a `workflow_dispatch` run of `workflow_file` on `git_ref`.
    pub async fn dispatch_workflow(
        &self,
        repo: &str,
        workflow_file: &str,
        git_ref: &str,
        inputs: &Value,
    ) -> Result<()> {
        self.octocrab
            .actions()
            .create_workflow_dispatch(self.org.as_str(), repo, workflow_file, git_ref)
            .inputs(inputs.clone())
            .send()
            .await?;

        info!(repo, workflow = workflow_file, git_ref, "Dispatched workflow");
        Ok(())
    }

    /// Most recent run of `workflow_file`, if any exists yet.
    pub async fn latest_workflow_run(&self, repo: &str, workflow_file: &str) -> Option<WorkflowRun> {
        let route = self.repo_route(repo, &format!("/actions/workflows/{}/runs", workflow_file));
        let runs: octocrab::Result<RunsResponse> =
            self.octocrab.get(route, Some(&[("per_page", "1")])).await;
        match runs {
            Ok(runs) => runs.workflow_runs.into_iter().next(),
            Err(e) => {
                debug!(repo, error = %e, "Workflow runs could not be listed");
                None
            }
        }
    }

    pub async fn get_workflow_run(&self, repo: &str, run_id: u64) -> Option<WorkflowRun> {
        self.lookup(
            &self.repo_route(repo, &format!("/actions/runs/{}", run_id)),
            "get workflow run",
        )
        .await
    }

    /// Steps of every job in the run, in job order, each tagged with its
    /// job id. Empty when the jobs cannot be read.
    pub async fn list_run_steps(&self, repo: &str, run_id: u64) -> Vec<RemoteStep> {
        let route = self.repo_route(repo, &format!("/actions/runs/{}/jobs", run_id));
        let Some(jobs) = self.lookup::<JobsResponse>(&route, "list run jobs").await else {
            return Vec::new();
        };

        let steps: Vec<RemoteStep> = jobs
            .jobs
            .into_iter()
            .flat_map(|job| {
                let job_id = job.id;
                job.steps.into_iter().map(move |step| step.in_job(job_id))
            })
            .collect();
        debug!(repo, run_id, steps = steps.len(), "Fetched run steps");
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use crate::error::GitHubError;
    use crate::types::{RunStatus, StepConclusion, StepStatus};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_dispatch_sends_ref_and_inputs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/repos/acme/lead-trail/actions/workflows/provision.yml/dispatches",
            ))
            .and(body_partial_json(json!({
                "ref": "main",
                "inputs": { "project_name": "lead-trail" }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server)
            .dispatch_workflow(
                "lead-trail",
                "provision.yml",
                "main",
                &json!({ "project_name": "lead-trail" }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_404_is_loud() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
            )
            .mount(&server)
            .await;

        let err = test_client(&server)
            .dispatch_workflow("lead-trail", "provision.yml", "main", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_latest_run() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/lead-trail/actions/workflows/provision.yml/runs"))
            .and(query_param("per_page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 1,
                "workflow_runs": [{
                    "id": 99,
                    "status": "in_progress",
                    "conclusion": null,
                    "html_url": "https://github.com/acme/lead-trail/actions/runs/99"
                }]
            })))
            .mount(&server)
            .await;

        let run = test_client(&server)
            .latest_workflow_run("lead-trail", "provision.yml")
            .await
            .unwrap();
        assert_eq!(run.id, 99);
        assert_eq!(run.status, RunStatus::InProgress);
    }

    #[tokio::test]
    async fn test_latest_run_none_when_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/lead-trail/actions/workflows/provision.yml/runs"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "total_count": 0, "workflow_runs": [] })),
            )
            .mount(&server)
            .await;

        assert!(test_client(&server)
            .latest_workflow_run("lead-trail", "provision.yml")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_run_steps_are_flattened_across_jobs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/lead-trail/actions/runs/99/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobs": [
                    { "id": 501, "steps": [
                        { "name": "Set up job", "status": "completed", "conclusion": "success", "number": 1 },
                        { "name": "Install Postman CLI", "status": "completed", "conclusion": "success", "number": 2 }
                    ]},
                    { "id": 502, "steps": [
                        { "name": "Create Postman Workspace", "status": "in_progress", "conclusion": null, "number": 1 }
                    ]}
                ]
            })))
            .mount(&server)
            .await;

        let steps = test_client(&server).list_run_steps("lead-trail", 99).await;
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].conclusion, Some(StepConclusion::Success));
        assert_eq!(steps[2].status, StepStatus::InProgress);
        assert_eq!(steps[2].number, 1);
        assert_eq!(
            steps.iter().map(|s| s.job_id).collect::<Vec<_>>(),
            vec![501, 501, 502]
        );
    }

    #[tokio::test]
    async fn test_run_steps_empty_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        assert!(test_client(&server)
            .list_run_steps("lead-trail", 99)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_get_run_missing_is_none() {
        let server = MockServer::start().await;
        assert!(test_client(&server)
            .get_workflow_run("lead-trail", 5)
            .await
            .is_none());
    }
}
