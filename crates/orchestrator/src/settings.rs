use std::time::Duration;

/// Name of the workflow file pushed to every provisioned repository.
pub const WORKFLOW_FILE: &str = "provision.yml";
pub const DEFAULT_BRANCH: &str = "main";

/// Attempt budgets and intervals of the provisioning pipeline.
///
/// The pipeline has no wall-clock deadline; exhausting one of these budgets
/// is its only timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTimings {
    pub dispatch_attempts: u32,
    pub dispatch_retry_delay: Duration,
    /// Wait between a successful dispatch and the first run lookup.
    pub run_settle_delay: Duration,
    pub run_discovery_attempts: u32,
    pub run_discovery_interval: Duration,
    pub step_poll_interval: Duration,
    /// Consecutive failed run lookups tolerated while following a run.
    pub run_lookup_miss_attempts: u32,
}

impl Default for PipelineTimings {
    fn default() -> Self {
        Self {
            dispatch_attempts: 5,
            dispatch_retry_delay: Duration::from_secs(12),
            run_settle_delay: Duration::from_secs(5),
            run_discovery_attempts: 20,
            run_discovery_interval: Duration::from_secs(3),
            step_poll_interval: Duration::from_secs(3),
            run_lookup_miss_attempts: 20,
        }
    }
}

/// Everything a pipeline needs besides its clients.
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub timings: PipelineTimings,
    /// Actions secrets written into each new repository, as `(name, value)`.
    /// Empty values are skipped.
    pub secrets: Vec<(String, String)>,
    pub aws_region: String,
}

impl PipelineSettings {
    pub fn new(timings: PipelineTimings) -> Self {
        Self {
            timings,
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.push((name.into(), value.into()));
        self
    }

    pub fn with_aws_region(mut self, region: impl Into<String>) -> Self {
        self.aws_region = region.into();
        self
    }

    /// Secrets with a non-empty value.
    pub fn injected_secrets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.secrets
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}
