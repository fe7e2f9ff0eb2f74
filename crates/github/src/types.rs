use serde::{Deserialize, Serialize};

// =============================================================================
// Repositories & users
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserSearchResponse {
    #[serde(default)]
    pub items: Vec<UserSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserSummary {
    pub login: String,
}

// =============================================================================
// Secrets & variables
// =============================================================================

/// Repository public key used to seal Actions secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKey {
    pub key_id: String,
    /// Base64 encoded X25519 public key.
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Variable {
    pub value: String,
}

// =============================================================================
// Git data
// =============================================================================

/// A file to write in a bulk tree commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub content: String,
}

impl FileChange {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ShaRef {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitRef {
    pub object: ShaRef,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitCommit {
    pub tree: ShaRef,
}

// =============================================================================
// Actions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    #[serde(other)]
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

impl WorkflowRun {
    pub fn is_finished(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn succeeded(&self) -> bool {
        self.is_finished() && self.conclusion.as_deref() == Some("success")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Queued,
    InProgress,
    Completed,
    #[serde(other)]
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepConclusion {
    Success,
    Failure,
    /// skipped, cancelled, neutral and anything newer.
    #[serde(other)]
    Other,
}

/// One step of a workflow job, as reported by the Actions API.
///
/// Step numbers restart at 1 in every job, so a step is identified by
/// `(job_id, number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStep {
    pub name: String,
    pub status: StepStatus,
    #[serde(default)]
    pub conclusion: Option<StepConclusion>,
    pub number: u64,
    /// Filled in from the enclosing job when the run's jobs are listed.
    #[serde(default)]
    pub job_id: u64,
}

impl RemoteStep {
    pub fn new(
        name: impl Into<String>,
        status: StepStatus,
        conclusion: Option<StepConclusion>,
        number: u64,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            conclusion,
            number,
            job_id: 0,
        }
    }

    pub fn in_job(mut self, job_id: u64) -> Self {
        self.job_id = job_id;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RunsResponse {
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JobsResponse {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Job {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub steps: Vec<RemoteStep>,
}
