use thiserror::Error;

/// Failures of the orchestration layer itself. Upstream errors are reported
/// on the event stream where they happen and only surface here as text.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Workflow dispatch failed after {attempts} attempts: {reason}")]
    DispatchExhausted { attempts: u32, reason: String },

    #[error("No workflow run found after {attempts} attempts")]
    RunNotFound { attempts: u32 },

    #[error("Workflow run {run_id} could not be read after {attempts} attempts")]
    RunLost { run_id: u64, attempts: u32 },

    #[error("Phase table is inconsistent: {0}")]
    PhaseTable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OrchestratorError {
    pub fn phase_table(reason: impl Into<String>) -> Self {
        Self::PhaseTable(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_exhausted_message() {
        let err = OrchestratorError::DispatchExhausted {
            attempts: 5,
            reason: "dispatch workflow failed with status 404".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("5 attempts"));
        assert!(message.contains("404"));
    }

    #[test]
    fn test_run_not_found_message() {
        let err = OrchestratorError::RunNotFound { attempts: 20 };
        assert_eq!(err.to_string(), "No workflow run found after 20 attempts");
    }

    #[test]
    fn test_run_lost_names_run() {
        let err = OrchestratorError::RunLost {
            run_id: 7,
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "Workflow run 7 could not be read after 3 attempts"
        );
    }
}
