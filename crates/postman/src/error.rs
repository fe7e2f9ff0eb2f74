use lifecycle_core::UpstreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostmanError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid response from Postman: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

pub type Result<T> = std::result::Result<T, PostmanError>;
