//! Shared domain model for the API lifecycle provisioner.
//!
//! Holds the inbound request types and their validation, the naming rules
//! every component derives resource names from, and the retrying HTTP helper
//! used by the upstream clients.

pub mod domain;
pub mod error;
pub mod http;

pub use domain::naming;
pub use domain::request::{
    normalize_environments, ProvisionJob, ProvisionRequest, TeardownJob, TeardownRequest,
    DEFAULT_ENVIRONMENT,
};
pub use error::{CoreError, UpstreamError};
pub use http::{retrying_request, with_retry, RetryPolicy};
