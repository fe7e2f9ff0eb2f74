use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} is required and must contain letters or digits")]
    EmptySlug { field: &'static str },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failure of a call issued through [`crate::http::retrying_request`].
#[derive(Error, Debug, Clone)]
pub enum UpstreamError {
    #[error("{label} failed with status {status}: {body}")]
    Exhausted {
        label: String,
        status: u16,
        body: String,
    },

    #[error("{label} failed: {message}")]
    Transport { label: String, message: String },
}

impl UpstreamError {
    /// HTTP status of the last attempt, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Exhausted { status, .. } => Some(*status),
            UpstreamError::Transport { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_mentions_required() {
        let error = CoreError::MissingField("requester_email");
        assert_eq!(error.to_string(), "requester_email is required");
    }

    #[test]
    fn test_exhausted_embeds_label_status_and_body() {
        let error = UpstreamError::Exhausted {
            label: "create blob app.py".to_string(),
            status: 409,
            body: "Git Repository is empty.".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("create blob app.py"));
        assert!(message.contains("409"));
        assert!(message.contains("Git Repository is empty."));
        assert_eq!(error.status(), Some(409));
    }
}
