use lifecycle_core::RetryPolicy;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{GitHubError, Result};
use crate::types::{Repository, UserSearchResponse};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: String,
    pub org: String,
    /// Retry budget for blob creation on freshly created repositories.
    pub blob_retry: RetryPolicy,
}

impl GitHubConfig {
    pub fn new(token: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            org: org.into(),
            blob_retry: RetryPolicy::default(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_blob_retry(mut self, policy: RetryPolicy) -> Self {
        self.blob_retry = policy;
        self
    }
}

/// GitHub client scoped to one organization.
pub struct GitHubClient {
    pub(crate) octocrab: Octocrab,
    pub(crate) org: String,
    pub(crate) blob_retry: RetryPolicy,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self> {
        if config.org.trim().is_empty() {
            return Err(GitHubError::Config("GitHub organization not set".to_string()));
        }

        let octocrab = Octocrab::builder()
            .personal_token(config.token)
            .base_uri(config.api_url.trim_end_matches('/'))
            .map_err(|e| GitHubError::Config(e.to_string()))?
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self {
            octocrab,
            org: config.org,
            blob_retry: config.blob_retry,
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    /// Browser URL of a repository in the organization.
    pub fn html_url(&self, repo: &str) -> String {
        format!("https://github.com/{}/{}", self.org, repo)
    }

    /// API route below `/repos/{org}/{repo}`.
    pub(crate) fn repo_route(&self, repo: &str, rest: &str) -> String {
        format!("/repos/{}/{}{}", self.org, repo, rest)
    }

    /// GET that maps every failure to `None`.
    pub(crate) async fn lookup<T: DeserializeOwned + Send>(&self, route: &str, operation: &str) -> Option<T> {
        let found: octocrab::Result<T> = self.octocrab.get(route, None::<&()>).await;
        match found {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(operation, error = %e, "Lookup returned no result");
                None
            }
        }
    }
}

impl GitHubClient {
    pub async fn create_repo(&self, name: &str, description: &str) -> Result<Repository> {
        info!(org = %self.org, repo = name, "Creating repository");

        let repo = self
            .octocrab
            .post(
                format!("/orgs/{}/repos", self.org),
                Some(&json!({
                    "name": name,
                    "description": description,
                    "private": true,
                    "auto_init": true,
                })),
            )
            .await?;
        Ok(repo)
    }

    pub async fn get_repo(&self, name: &str) -> Option<Repository> {
        self.lookup(&self.repo_route(name, ""), "get repository").await
    }

    /// Deletes a repository. A repository that is already gone counts as deleted.
    pub async fn delete_repo(&self, name: &str) -> Result<()> {
        info!(org = %self.org, repo = name, "Deleting repository");

        match self.octocrab.repos(&self.org, name).delete().await {
            Ok(()) => Ok(()),
            Err(e) => match GitHubError::from(e) {
                GitHubError::Status { status: 404, .. } => {
                    info!(repo = name, "Repository already deleted");
                    Ok(())
                }
                other => Err(other),
            },
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<String> {
        let query = [("q", format!("{} in:email", email))];
        let found: octocrab::Result<UserSearchResponse> =
            self.octocrab.get("/search/users", Some(&query)).await;
        match found {
            Ok(found) => found.items.into_iter().next().map(|user| user.login),
            Err(e) => {
                debug!(error = %e, "User search returned no result");
                None
            }
        }
    }

    /// Grants `login` admin access. Failures are logged, never returned.
    pub async fn add_collaborator(&self, repo: &str, login: &str) -> bool {
        let route = self.repo_route(repo, &format!("/collaborators/{}", login));
        let body = json!({ "permission": "admin" });

        let result = match self.octocrab._put(route, Some(&body)).await {
            Ok(response) => octocrab::map_github_error(response).await.map(drop),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(repo, login, "Granted collaborator access");
                true
            }
            Err(e) => {
                warn!(repo, login, error = %e, "Failed to grant collaborator access");
                false
            }
        }
    }
}
