//! Provisioning and teardown pipelines.
//!
//! Each pipeline runs as its own tokio task and reports through an
//! [`EventStream`]. Callers get the [`EventReceiver`] back immediately; the
//! stream is closed exactly once when the pipeline ends, whatever happened
//! inside it.

pub mod cloud;
pub mod error;
pub mod final_data;
pub mod phases;
pub mod settings;
pub mod status;
pub mod templates;
pub mod tracker;
pub mod workflow;

mod provision;
mod teardown;

#[cfg(test)]
mod testing;

use std::future::Future;
use std::sync::Arc;

use events::{EventReceiver, EventStream, ProgressEvent};
use github::GitHubClient;
use lifecycle_core::{ProvisionJob, TeardownJob};
use postman::PostmanClient;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

pub use cloud::{AwsCloud, AwsCredentials, CloudError, CloudResources};
pub use error::{OrchestratorError, Result};
pub use final_data::FinalData;
pub use phases::{validate_table, Phase, ERROR_PHASE};
pub use settings::{PipelineSettings, PipelineTimings};
pub use status::{ResourceStatus, StatusReport};

use provision::ProvisionPipeline;
use teardown::TeardownPipeline;

/// Entry point for the HTTP layer. Cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    github: Arc<GitHubClient>,
    postman: Arc<PostmanClient>,
    cloud: Arc<dyn CloudResources>,
    settings: Arc<PipelineSettings>,
}

impl Orchestrator {
    pub fn new(
        github: Arc<GitHubClient>,
        postman: Arc<PostmanClient>,
        cloud: Arc<dyn CloudResources>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            github,
            postman,
            cloud,
            settings: Arc::new(settings),
        }
    }

    /// Start provisioning `job` in the background.
    pub fn start_provision(&self, job: ProvisionJob) -> EventReceiver {
        let project = job.project.clone();
        let github = self.github.clone();
        let settings = self.settings.clone();

        spawn_pipeline("provision", &project, move |stream| {
            ProvisionPipeline {
                github,
                settings,
                stream,
                job,
            }
            .run()
        })
    }

    /// Start tearing down everything provisioned for `job.project`, or only
    /// report what would be deleted when `job.dry_run` is set.
    pub fn start_teardown(&self, job: TeardownJob) -> EventReceiver {
        let github = self.github.clone();
        let postman = self.postman.clone();
        let cloud = self.cloud.clone();
        let kind = if job.dry_run { "teardown-preview" } else { "teardown" };
        let name = job.project.clone();

        spawn_pipeline(kind, &name, move |stream| {
            TeardownPipeline {
                github,
                postman,
                cloud,
                stream,
                project: job.project,
                dry_run: job.dry_run,
            }
            .run()
        })
    }

    /// Organization new repositories are created in.
    pub fn github_org(&self) -> &str {
        self.github.org()
    }

    pub fn aws_region(&self) -> &str {
        &self.settings.aws_region
    }

    pub async fn status(&self, project: &str) -> StatusReport {
        status::inspect(&self.github, project).await
    }
}

/// Run a pipeline on its own task and close its stream when it ends.
///
/// An `Err` or a panic inside the pipeline becomes a single event on
/// [`ERROR_PHASE`] before the stream closes.
fn spawn_pipeline<F, Fut>(kind: &'static str, project: &str, pipeline: F) -> EventReceiver
where
    F: FnOnce(Arc<EventStream>) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let (stream, receiver) = EventStream::channel();
    let stream = Arc::new(stream);
    let span = info_span!("pipeline", kind, run_id = %Uuid::new_v4(), project);

    let task = tokio::spawn(pipeline(stream.clone()).instrument(span.clone()));

    tokio::spawn(
        async move {
            let failure = match task.await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => {
                    error!(error = %e, "Pipeline failed");
                    Some(format!("Internal error: {}", e))
                }
                Err(e) if e.is_panic() => {
                    error!("Pipeline task panicked");
                    Some("Internal error: pipeline task panicked".to_string())
                }
                Err(e) => {
                    error!(error = %e, "Pipeline task was cancelled");
                    Some("Internal error: pipeline task was cancelled".to_string())
                }
            };

            if let Some(message) = failure {
                stream.send(ProgressEvent::error(ERROR_PHASE, message));
            }
            stream.close();
        }
        .instrument(span),
    );

    receiver
}
