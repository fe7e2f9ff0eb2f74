//! Shared fixtures for the crate's tests.

use std::sync::Arc;
use std::time::Duration;

use github::{GitHubClient, GitHubConfig};
use lifecycle_core::RetryPolicy;
use postman::PostmanClient;
use wiremock::MockServer;

pub(crate) use crate::cloud::testing::FakeCloud;
use crate::settings::{PipelineSettings, PipelineTimings};
use crate::Orchestrator;

pub(crate) fn github_client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(
        GitHubConfig::new("test-token", "acme")
            .with_api_url(server.uri())
            .with_blob_retry(RetryPolicy::new(1, Duration::from_millis(1))),
    )
    .unwrap()
}

pub(crate) fn postman_client(server: &MockServer) -> PostmanClient {
    PostmanClient::with_api_url("pmak-test", &format!("{}/postman", server.uri()))
        .unwrap()
        .with_delete_retry(RetryPolicy::new(1, Duration::from_millis(1)))
}

pub(crate) fn fast_timings() -> PipelineTimings {
    PipelineTimings {
        dispatch_attempts: 2,
        dispatch_retry_delay: Duration::from_millis(5),
        run_settle_delay: Duration::from_millis(1),
        run_discovery_attempts: 3,
        run_discovery_interval: Duration::from_millis(5),
        step_poll_interval: Duration::from_millis(5),
        run_lookup_miss_attempts: 3,
    }
}

pub(crate) fn orchestrator(server: &MockServer, cloud: Arc<FakeCloud>) -> Orchestrator {
    let settings = PipelineSettings::new(fast_timings())
        .with_secret("POSTMAN_API_KEY", "pmak-test")
        .with_secret("AWS_ACCESS_KEY_ID", "")
        .with_aws_region("us-east-1");

    Orchestrator::new(
        Arc::new(github_client(server)),
        Arc::new(postman_client(server)),
        cloud,
        settings,
    )
}
