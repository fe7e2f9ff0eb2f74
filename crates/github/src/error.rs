use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Secret encryption failed: {0}")]
    Encryption(String),
}

impl GitHubError {
    /// HTTP status GitHub answered with, when it answered with an error.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Status { status, .. } => Some(*status),
            GitHubError::Authentication(_) => Some(401),
            _ => None,
        }
    }
}

impl From<octocrab::Error> for GitHubError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => {
                let status = source.status_code.as_u16();
                if status == 401 {
                    GitHubError::Authentication(source.message.clone())
                } else {
                    GitHubError::Status {
                        status,
                        message: source.message.clone(),
                    }
                }
            }
            _ => GitHubError::Api(err.to_string()),
        }
    }
}

/// Stage of a bulk tree write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeStep {
    Blob { path: String },
    Tree,
    Commit,
    Ref,
}

impl std::fmt::Display for TreeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeStep::Blob { path } => write!(f, "blob creation for {}", path),
            TreeStep::Tree => write!(f, "tree creation"),
            TreeStep::Commit => write!(f, "commit creation"),
            TreeStep::Ref => write!(f, "ref update"),
        }
    }
}

/// A bulk tree write aborted at `step`. Earlier steps may have landed.
#[derive(Debug, Error)]
#[error("Tree write failed at {step}: {message}")]
pub struct TreeWriteError {
    pub step: TreeStep,
    pub message: String,
}

impl TreeWriteError {
    pub fn new(step: TreeStep, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
        }
    }

    pub fn blob(path: &str, message: impl Into<String>) -> Self {
        Self::new(
            TreeStep::Blob {
                path: path.to_string(),
            },
            message,
        )
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;
