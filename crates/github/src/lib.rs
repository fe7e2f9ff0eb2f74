pub mod actions;
pub mod client;
pub mod error;
pub mod secrets;
pub mod tree;
pub mod types;
pub mod variables;

pub use client::{GitHubClient, GitHubConfig};
pub use error::{GitHubError, Result, TreeStep, TreeWriteError};
pub use secrets::seal_secret;
pub use types::{
    FileChange, PublicKey, RemoteStep, Repository, RunStatus, StepConclusion, StepStatus,
    WorkflowRun,
};
