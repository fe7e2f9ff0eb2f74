//! Provisioning pipeline: stage the repository, dispatch the workflow, then
//! follow the run step by step.

use std::sync::Arc;

use events::{EventStream, ProgressEvent};
use github::{GitHubClient, WorkflowRun};
use lifecycle_core::naming::vars;
use lifecycle_core::ProvisionJob;
use postman::PostmanClient;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::error::{OrchestratorError, Result};
use crate::final_data::{build_final_data, count_var};
use crate::phases::Phase;
use crate::settings::{PipelineSettings, DEFAULT_BRANCH, WORKFLOW_FILE};
use crate::templates::scaffold_files;
use crate::tracker::{PollState, StepOutcome};

const GITHUB: &str = "github";

pub(crate) struct ProvisionPipeline {
    pub github: Arc<GitHubClient>,
    pub settings: Arc<PipelineSettings>,
    pub stream: Arc<EventStream>,
    pub job: ProvisionJob,
}

impl ProvisionPipeline {
    /// Drive the pipeline to a terminal event.
    ///
    /// Hard failures are reported on their own phase and end the run with
    /// `Ok`. An `Err` means something unexpected happened and is reported by
    /// the caller.
    pub(crate) async fn run(self) -> Result<()> {
        info!(project = %self.job.project, "Provisioning started");

        if !self.stage().await {
            return Ok(());
        }
        if !self.dispatch().await? {
            return Ok(());
        }
        let Some(run) = self.find_run().await else {
            return Ok(());
        };
        let Some(run) = self.follow_run(run).await else {
            return Ok(());
        };
        self.finish(run).await
    }

    fn emit(&self, event: ProgressEvent) {
        self.stream.send(event);
    }

    fn project(&self) -> &str {
        &self.job.project
    }

    /// Repository, scaffold commit, access, secrets and variables.
    /// Returns `false` when a hard failure was reported.
    async fn stage(&self) -> bool {
        let project = self.project();
        self.emit(ProgressEvent::running(
            GITHUB,
            format!("Creating repository {}/{}", self.github.org(), project),
        ));

        let description = format!("{} ({} API)", self.job.display_name, self.job.domain);
        let repo = match self.github.create_repo(project, &description).await {
            Ok(repo) => repo,
            Err(e) => {
                error!(project, error = %e, "Repository creation failed");
                self.emit(ProgressEvent::error(
                    GITHUB,
                    format!("Failed to create repository: {}", e),
                ));
                return false;
            }
        };
        self.emit(
            ProgressEvent::success(GITHUB, "Repository created")
                .with_data(json!({ "repo_url": repo.html_url })),
        );

        let files = scaffold_files(&self.job, &self.settings.aws_region);
        let file_count = files.len();
        let commit = match self
            .github
            .write_files(
                project,
                DEFAULT_BRANCH,
                &files,
                &format!("Scaffold {}", self.job.display_name),
            )
            .await
        {
            Ok(sha) => sha,
            Err(e) => {
                error!(project, error = %e, "Scaffold push failed");
                self.emit(ProgressEvent::error(
                    GITHUB,
                    format!("Failed to push project files: {}", e),
                ));
                return false;
            }
        };
        self.emit(
            ProgressEvent::success(GITHUB, format!("Pushed {} files", file_count))
                .with_data(json!({ "commit": commit })),
        );

        match self.github.find_user_by_email(&self.job.requester_email).await {
            Some(login) => {
                self.github.add_collaborator(project, &login).await;
            }
            None => debug!(
                email = %self.job.requester_email,
                "No GitHub user for requester, skipping collaborator grant"
            ),
        }

        let key = match self.github.get_public_key(project).await {
            Ok(key) => key,
            Err(e) => {
                error!(project, error = %e, "Public key fetch failed");
                self.emit(ProgressEvent::error(
                    GITHUB,
                    format!("Failed to fetch repository public key: {}", e),
                ));
                return false;
            }
        };
        for (name, value) in self.settings.injected_secrets() {
            if let Err(e) = self.github.put_secret(project, &key, name, value).await {
                warn!(project, secret = name, error = %e, "Failed to store secret");
            }
        }

        match serde_json::to_string(&self.job.environments) {
            Ok(environments) => {
                self.github
                    .set_variable(project, vars::ENVIRONMENTS, &environments)
                    .await;
            }
            Err(e) => warn!(project, error = %e, "Could not encode environments"),
        }

        true
    }

    fn dispatch_inputs(&self) -> Result<Value> {
        Ok(json!({
            "project_name": self.job.project,
            "domain": self.job.domain,
            "domain_code": self.job.domain_code,
            "requester_email": self.job.requester_email,
            "spec_url": self.job.spec_url,
            "environments": serde_json::to_string(&self.job.environments)?,
            "postman_team_id": self.job.postman_team_id.clone().unwrap_or_default(),
        }))
    }

    /// Trigger the workflow, retrying while the new workflow file is not yet
    /// indexed. Returns `false` when the budget ran out.
    async fn dispatch(&self) -> Result<bool> {
        let inputs = self.dispatch_inputs()?;
        let timings = &self.settings.timings;
        let attempts = timings.dispatch_attempts.max(1);

        self.emit(ProgressEvent::running(GITHUB, "Triggering provisioning workflow"));

        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match self
                .github
                .dispatch_workflow(self.project(), WORKFLOW_FILE, DEFAULT_BRANCH, &inputs)
                .await
            {
                Ok(()) => {
                    info!(project = %self.job.project, attempt, "Workflow dispatched");
                    self.emit(
                        ProgressEvent::complete(GITHUB, "Repository ready, workflow triggered")
                            .with_data(json!({ "repo_url": self.github.html_url(self.project()) })),
                    );
                    return Ok(true);
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < attempts {
                        warn!(
                            project = %self.job.project,
                            attempt,
                            max_attempts = attempts,
                            error = %e,
                            "Workflow dispatch failed, retrying"
                        );
                        tokio::time::sleep(timings.dispatch_retry_delay).await;
                    }
                }
            }
        }

        let err = OrchestratorError::DispatchExhausted {
            attempts,
            reason: last_error,
        };
        error!(project = %self.job.project, error = %err, "Giving up on workflow dispatch");
        self.emit(ProgressEvent::error(GITHUB, err.to_string()));
        Ok(false)
    }

    async fn find_run(&self) -> Option<WorkflowRun> {
        let timings = &self.settings.timings;
        tokio::time::sleep(timings.run_settle_delay).await;

        for attempt in 1..=timings.run_discovery_attempts {
            if let Some(run) = self
                .github
                .latest_workflow_run(self.project(), WORKFLOW_FILE)
                .await
            {
                info!(project = %self.job.project, run_id = run.id, attempt, "Found workflow run");
                return Some(run);
            }
            debug!(project = %self.job.project, attempt, "Workflow run not visible yet");
            if attempt < timings.run_discovery_attempts {
                tokio::time::sleep(timings.run_discovery_interval).await;
            }
        }

        let err = OrchestratorError::RunNotFound {
            attempts: timings.run_discovery_attempts,
        };
        error!(project = %self.job.project, error = %err, "Workflow run never appeared");
        self.emit(ProgressEvent::error(Phase::Complete.id(), err.to_string()));
        None
    }

    /// Poll the run until it completes, reporting step transitions on the
    /// way. Returns the finished run, or `None` once the run could not be
    /// read for `run_lookup_miss_attempts` polls in a row.
    async fn follow_run(&self, mut run: WorkflowRun) -> Option<WorkflowRun> {
        let timings = &self.settings.timings;
        let miss_budget = timings.run_lookup_miss_attempts.max(1);
        let mut state = PollState::new();
        let mut misses = 0;

        loop {
            let steps = self.github.list_run_steps(self.project(), run.id).await;
            for outcome in state.advance(&steps) {
                self.report(outcome).await;
            }

            if run.is_finished() {
                return Some(run);
            }

            tokio::time::sleep(timings.step_poll_interval).await;
            match self.github.get_workflow_run(self.project(), run.id).await {
                Some(latest) => {
                    misses = 0;
                    run = latest;
                }
                None => {
                    misses += 1;
                    debug!(run_id = run.id, misses, "Run lookup missed");
                    if misses >= miss_budget {
                        let err = OrchestratorError::RunLost {
                            run_id: run.id,
                            attempts: misses,
                        };
                        error!(project = %self.job.project, error = %err, "Lost track of workflow run");
                        self.emit(
                            ProgressEvent::error(Phase::Complete.id(), err.to_string())
                                .with_data(json!({ "run_url": run.html_url })),
                        );
                        return None;
                    }
                }
            }
        }
    }

    async fn report(&self, outcome: StepOutcome) {
        let event = match outcome {
            StepOutcome::Running(spec) => ProgressEvent::running(spec.phase.id(), spec.description),
            StepOutcome::Succeeded(spec) => ProgressEvent::success(spec.phase.id(), spec.name),
            StepOutcome::PhaseComplete(phase) => {
                let event =
                    ProgressEvent::complete(phase.id(), format!("{} complete", phase.label()));
                match self.phase_summary(phase).await {
                    Some(data) => event.with_data(data),
                    None => event,
                }
            }
            StepOutcome::Failed(spec) => {
                warn!(project = %self.job.project, step = spec.name, "Workflow step failed");
                ProgressEvent::error(spec.phase.id(), format!("{} failed", spec.name))
            }
        };
        self.emit(event);
    }

    /// Extra data for a phase's `complete` event. Lookup misses leave the
    /// event without data.
    async fn phase_summary(&self, phase: Phase) -> Option<Value> {
        let project = self.project();
        match phase {
            Phase::Postman => {
                let workspace_id = self
                    .github
                    .get_variable(project, vars::POSTMAN_WORKSPACE_ID)
                    .await
                    .filter(|id| !id.is_empty())?;
                Some(json!({
                    "workspace_url": PostmanClient::workspace_url(&workspace_id),
                    "workspace_id": workspace_id,
                }))
            }
            Phase::Spec => {
                let errors = count_var(&self.github, project, vars::LINT_ERRORS).await;
                let warnings = count_var(&self.github, project, vars::LINT_WARNINGS).await;
                Some(json!({ "lint_errors": errors, "lint_warnings": warnings }))
            }
            Phase::Aws => {
                let function_name = self
                    .github
                    .get_variable(project, vars::FUNCTION_NAME)
                    .await
                    .filter(|name| !name.is_empty())?;
                Some(json!({ "function_name": function_name }))
            }
            _ => None,
        }
    }

    async fn finish(&self, run: WorkflowRun) -> Result<()> {
        let top = Phase::Complete.id();

        if run.succeeded() {
            let data =
                build_final_data(&self.github, self.project(), &self.job.environments).await;
            info!(project = %self.job.project, run_id = run.id, "Provisioning complete");
            self.emit(
                ProgressEvent::complete(top, "Provisioning complete")
                    .with_data(serde_json::to_value(data)?),
            );
        } else {
            let conclusion = run.conclusion.clone().unwrap_or_else(|| "unknown".to_string());
            warn!(
                project = %self.job.project,
                run_id = run.id,
                conclusion = %conclusion,
                "Workflow run did not succeed"
            );
            self.emit(
                ProgressEvent::error(top, format!("Workflow run finished with {}", conclusion))
                    .with_data(json!({ "run_url": run.html_url, "conclusion": conclusion })),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::phases::STEP_TABLE;
    use crate::testing::{orchestrator, FakeCloud};
    use events::{EventStatus, ProgressEvent};
    use lifecycle_core::{ProvisionJob, ProvisionRequest};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REPO: &str = "/repos/acme/lead-trail";
    const PUBLIC_KEY: &str = "AQIDBAUGBwgJCgsMDQ4PEBESExQVFhcYGRobHB0eHyA=";

    fn job() -> ProvisionJob {
        ProvisionRequest {
            project_name: Some("Lead Trail".to_string()),
            domain: Some("Sales".to_string()),
            requester_email: Some("jdoe@example.com".to_string()),
            environments: Some(vec!["dev".to_string(), "prod".to_string()]),
            ..ProvisionRequest::default()
        }
        .validate()
        .unwrap()
    }

    async fn respond(server: &MockServer, verb: &str, route: String, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    /// Everything up to and including the secrets and variables.
    async fn mount_staging(server: &MockServer) {
        respond(
            server,
            "POST",
            "/orgs/acme/repos".to_string(),
            201,
            json!({
                "name": "lead-trail",
                "full_name": "acme/lead-trail",
                "html_url": "https://github.com/acme/lead-trail"
            }),
        )
        .await;
        respond(server, "POST", format!("{REPO}/git/blobs"), 201, json!({ "sha": "blob" })).await;
        respond(
            server,
            "GET",
            format!("{REPO}/git/ref/heads/main"),
            200,
            json!({ "object": { "sha": "init" } }),
        )
        .await;
        respond(
            server,
            "GET",
            format!("{REPO}/git/commits/init"),
            200,
            json!({ "sha": "init", "tree": { "sha": "init-tree" } }),
        )
        .await;
        respond(server, "POST", format!("{REPO}/git/trees"), 201, json!({ "sha": "tree" })).await;
        respond(server, "POST", format!("{REPO}/git/commits"), 201, json!({ "sha": "scaffold" }))
            .await;
        respond(
            server,
            "PATCH",
            format!("{REPO}/git/refs/heads/main"),
            200,
            json!({ "object": { "sha": "scaffold" } }),
        )
        .await;
        respond(
            server,
            "GET",
            "/search/users".to_string(),
            200,
            json!({ "items": [{ "login": "jdoe" }] }),
        )
        .await;
        respond(server, "PUT", format!("{REPO}/collaborators/jdoe"), 201, json!({})).await;
        respond(
            server,
            "GET",
            format!("{REPO}/actions/secrets/public-key"),
            200,
            json!({ "key_id": "key-1", "key": PUBLIC_KEY }),
        )
        .await;
        Mock::given(method("PUT"))
            .and(path(format!("{REPO}/actions/secrets/POSTMAN_API_KEY")))
            .and(body_partial_json(json!({ "key_id": "key-1" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{REPO}/actions/secrets/AWS_ACCESS_KEY_ID")))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("{REPO}/actions/variables/ENVIRONMENTS")))
            .and(body_partial_json(json!({ "value": r#"["dev","prod"]"# })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_dispatch(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(format!("{REPO}/actions/workflows/provision.yml/dispatches")))
            .and(body_partial_json(json!({
                "ref": "main",
                "inputs": {
                    "project_name": "lead-trail",
                    "domain": "sales",
                    "domain_code": "SAL",
                    "environments": r#"["dev","prod"]"#,
                    "postman_team_id": ""
                }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(server)
            .await;
    }

    fn run(status: &str, conclusion: Option<&str>) -> Value {
        json!({
            "id": 7,
            "status": status,
            "conclusion": conclusion,
            "html_url": "https://github.com/acme/lead-trail/actions/runs/7"
        })
    }

    async fn mount_run(server: &MockServer, finished: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{REPO}/actions/workflows/provision.yml/runs")))
            .and(query_param("per_page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "workflow_runs": [run("in_progress", None)] })),
            )
            .mount(server)
            .await;
        respond(server, "GET", format!("{REPO}/actions/runs/7"), 200, finished).await;
    }

    /// Every table step, numbered after the runner's own setup step, with
    /// the step called `failing` (if any) failed and everything after it
    /// skipped.
    fn steps(failing: Option<&str>) -> Value {
        let mut steps = vec![json!({
            "name": "Set up job", "status": "completed", "conclusion": "success", "number": 1
        })];
        let mut failed = false;
        for (i, spec) in STEP_TABLE.iter().enumerate() {
            let conclusion = if failed {
                "skipped"
            } else if Some(spec.name) == failing {
                failed = true;
                "failure"
            } else {
                "success"
            };
            steps.push(json!({
                "name": spec.name,
                "status": "completed",
                "conclusion": conclusion,
                "number": i + 2
            }));
        }
        json!({ "jobs": [{ "steps": steps }] })
    }

    async fn mount_var(server: &MockServer, name: &str, value: &str) {
        respond(
            server,
            "GET",
            format!("{REPO}/actions/variables/{name}"),
            200,
            json!({ "name": name, "value": value }),
        )
        .await;
    }

    fn terminal<'a>(events: &'a [ProgressEvent], phase: &str) -> Vec<&'a ProgressEvent> {
        events
            .iter()
            .filter(|e| e.phase == phase && e.status.is_terminal())
            .collect()
    }

    #[tokio::test]
    async fn test_successful_run_reports_every_phase() {
        let server = MockServer::start().await;
        mount_staging(&server).await;
        mount_dispatch(&server).await;
        mount_run(&server, run("completed", Some("success"))).await;
        respond(&server, "GET", format!("{REPO}/actions/runs/7/jobs"), 200, steps(None)).await;
        mount_var(&server, "POSTMAN_WORKSPACE_ID", "ws-1").await;
        mount_var(&server, "FUNCTION_NAME", "lead-trail").await;
        mount_var(&server, "LINT_ERRORS", "0").await;
        mount_var(&server, "LINT_WARNINGS", "4").await;
        mount_var(&server, "DEV_GW_URL", "https://dev.example.com").await;

        let events = orchestrator(&server, Arc::new(FakeCloud::default()))
            .start_provision(job())
            .collect()
            .await;

        for phase in ["github", "postman", "spec", "aws", "postman-env", "sync", "complete"] {
            let done = terminal(&events, phase);
            assert_eq!(done.len(), 1, "phase {phase}");
            assert_eq!(done[0].status, EventStatus::Complete, "phase {phase}");
        }

        let data = |phase: &str| terminal(&events, phase)[0].data.clone().unwrap();
        assert_eq!(data("github")["repo_url"], "https://github.com/acme/lead-trail");
        assert_eq!(data("postman")["workspace_url"], "https://go.postman.co/workspace/ws-1");
        assert_eq!(data("spec")["lint_warnings"], 4);
        assert_eq!(data("aws")["function_name"], "lead-trail");

        let summary = data("complete");
        assert_eq!(summary["project"], "lead-trail");
        assert_eq!(summary["postman"]["workspace_id"], "ws-1");
        assert_eq!(summary["aws"]["environments"][0]["url"], "https://dev.example.com");
        assert_eq!(summary["aws"]["environments"][1]["url"], "");

        let successes = events
            .iter()
            .filter(|e| e.status == EventStatus::Success && e.phase != "github")
            .count();
        assert_eq!(successes, STEP_TABLE.len());
        assert_eq!(events.last().unwrap().phase, "complete");
    }

    #[tokio::test]
    async fn test_failed_step_stops_progress_and_reports_run() {
        let server = MockServer::start().await;
        mount_staging(&server).await;
        mount_dispatch(&server).await;
        mount_run(&server, run("completed", Some("failure"))).await;
        respond(
            &server,
            "GET",
            format!("{REPO}/actions/runs/7/jobs"),
            200,
            steps(Some("Deploy Lambda Functions")),
        )
        .await;

        let events = orchestrator(&server, Arc::new(FakeCloud::default()))
            .start_provision(job())
            .collect()
            .await;

        assert_eq!(terminal(&events, "postman")[0].status, EventStatus::Complete);
        assert_eq!(terminal(&events, "spec")[0].status, EventStatus::Complete);

        let aws = terminal(&events, "aws");
        assert_eq!(aws.len(), 1);
        assert_eq!(aws[0].status, EventStatus::Error);
        assert_eq!(aws[0].message, "Deploy Lambda Functions failed");

        assert!(events.iter().all(|e| e.phase != "postman-env" && e.phase != "sync"));

        let done = terminal(&events, "complete");
        assert_eq!(done[0].status, EventStatus::Error);
        let data = done[0].data.as_ref().unwrap();
        assert_eq!(data["conclusion"], "failure");
        assert_eq!(data["run_url"], "https://github.com/acme/lead-trail/actions/runs/7");
    }

    #[tokio::test]
    async fn test_repository_creation_failure_stops_pipeline() {
        let server = MockServer::start().await;
        respond(
            &server,
            "POST",
            "/orgs/acme/repos".to_string(),
            422,
            json!({ "message": "name already exists on this account" }),
        )
        .await;
        Mock::given(method("POST"))
            .and(path(format!("{REPO}/git/blobs")))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let events = orchestrator(&server, Arc::new(FakeCloud::default()))
            .start_provision(job())
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, EventStatus::Running);
        assert_eq!(events[1].phase, "github");
        assert_eq!(events[1].status, EventStatus::Error);
        assert!(events[1].message.contains("already exists"));
    }

    #[tokio::test]
    async fn test_dispatch_gives_up_after_budget() {
        let server = MockServer::start().await;
        mount_staging(&server).await;
        Mock::given(method("POST"))
            .and(path(format!("{REPO}/actions/workflows/provision.yml/dispatches")))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let events = orchestrator(&server, Arc::new(FakeCloud::default()))
            .start_provision(job())
            .collect()
            .await;

        let github = terminal(&events, "github");
        assert_eq!(github.len(), 1);
        assert_eq!(github[0].status, EventStatus::Error);
        assert!(github[0].message.contains("after 2 attempts"));
        assert!(github[0].message.contains("404"));
        assert!(terminal(&events, "complete").is_empty());
    }

    #[tokio::test]
    async fn test_missing_run_is_reported_on_complete_phase() {
        let server = MockServer::start().await;
        mount_staging(&server).await;
        mount_dispatch(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO}/actions/workflows/provision.yml/runs")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "workflow_runs": [] })))
            .expect(3)
            .mount(&server)
            .await;

        let events = orchestrator(&server, Arc::new(FakeCloud::default()))
            .start_provision(job())
            .collect()
            .await;

        assert_eq!(terminal(&events, "github")[0].status, EventStatus::Complete);
        let done = terminal(&events, "complete");
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].status, EventStatus::Error);
        assert!(done[0].message.contains("after 3 attempts"));
    }

    #[tokio::test]
    async fn test_unreadable_run_ends_with_error_after_miss_budget() {
        let server = MockServer::start().await;
        mount_staging(&server).await;
        mount_dispatch(&server).await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO}/actions/workflows/provision.yml/runs")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "workflow_runs": [run("in_progress", None)] })),
            )
            .mount(&server)
            .await;
        respond(&server, "GET", format!("{REPO}/actions/runs/7/jobs"), 200, json!({ "jobs": [] }))
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO}/actions/runs/7")))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
            )
            .expect(3)
            .mount(&server)
            .await;

        let receiver = orchestrator(&server, Arc::new(FakeCloud::default())).start_provision(job());
        let events = tokio::time::timeout(std::time::Duration::from_secs(5), receiver.collect())
            .await
            .expect("stream should close once the lookup budget is spent");

        let done = terminal(&events, "complete");
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].status, EventStatus::Error);
        assert!(done[0].message.contains("after 3 attempts"));
        assert_eq!(
            done[0].data.as_ref().unwrap()["run_url"],
            "https://github.com/acme/lead-trail/actions/runs/7"
        );
        assert_eq!(events.last().unwrap().phase, "complete");
    }
}
