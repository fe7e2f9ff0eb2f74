use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::naming::{domain_code, slugify};
use crate::error::CoreError;

pub const DEFAULT_ENVIRONMENT: &str = "prod";
const DEFAULT_DOMAIN: &str = "general";

/// Body of `POST /api/provision`.
///
/// Every field is optional at the wire level so that a missing mandatory
/// field is reported as a validation error rather than a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProvisionRequest {
    pub project_name: Option<String>,
    pub domain: Option<String>,
    pub requester_email: Option<String>,
    pub spec_url: Option<String>,
    pub environments: Option<Vec<String>>,
    pub postman_team_id: Option<String>,
}

/// A validated provisioning request with all names normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionJob {
    /// Slug used as the repository, workspace and function base name.
    pub project: String,
    pub display_name: String,
    pub domain: String,
    pub domain_code: String,
    pub requester_email: String,
    pub spec_url: String,
    pub environments: Vec<String>,
    pub postman_team_id: Option<String>,
}

impl ProvisionRequest {
    pub fn validate(self) -> Result<ProvisionJob, CoreError> {
        let display_name = required(self.project_name, "project_name")?;
        let requester_email = required(self.requester_email, "requester_email")?;

        let project = slugify(&display_name);
        if project.is_empty() {
            return Err(CoreError::EmptySlug {
                field: "project_name",
            });
        }

        let domain = self
            .domain
            .as_deref()
            .map(slugify)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());

        Ok(ProvisionJob {
            project,
            display_name,
            domain_code: domain_code(&domain),
            domain,
            requester_email,
            spec_url: self.spec_url.map(|s| s.trim().to_string()).unwrap_or_default(),
            environments: normalize_environments(self.environments.unwrap_or_default()),
            postman_team_id: self
                .postman_team_id
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        })
    }
}

/// Body of `POST /api/teardown`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TeardownRequest {
    pub project_name: Option<String>,
    /// Only report what would be deleted.
    pub dry_run: Option<bool>,
}

/// A validated teardown request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownJob {
    pub project: String,
    pub dry_run: bool,
}

impl TeardownRequest {
    pub fn validate(self) -> Result<TeardownJob, CoreError> {
        let name = required(self.project_name, "project_name")?;
        let project = slugify(&name);
        if project.is_empty() {
            return Err(CoreError::EmptySlug {
                field: "project_name",
            });
        }
        Ok(TeardownJob {
            project,
            dry_run: self.dry_run.unwrap_or(false),
        })
    }
}

/// Slug-normalizes environment names, dropping blanks and duplicates.
/// An empty result falls back to the single default environment.
pub fn normalize_environments<I, S>(environments: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for env in environments {
        let slug = slugify(env.as_ref());
        if !slug.is_empty() && !normalized.contains(&slug) {
            normalized.push(slug);
        }
    }

    if normalized.is_empty() {
        normalized.push(DEFAULT_ENVIRONMENT.to_string());
    }
    normalized
}

fn required(value: Option<String>, field: &'static str) -> Result<String, CoreError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(CoreError::MissingField(field))
}
