use std::time::Duration;

use lifecycle_core::{retrying_request, RetryPolicy, UpstreamError};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{PostmanError, Result};

pub const DEFAULT_API_URL: &str = "https://api.getpostman.com";
const WORKSPACE_LINK_BASE: &str = "https://go.postman.co/workspace";
const DELETE_RETRIES: u32 = 2;
const DELETE_BASE_DELAY_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct WorkspaceEnvelope {
    workspace: WorkspaceSummary,
}

#[derive(Debug, Deserialize)]
struct WorkspaceSummary {
    #[serde(default)]
    name: String,
}

/// Client for the Postman API.
#[derive(Clone)]
pub struct PostmanClient {
    client: Client,
    api_url: String,
    delete_retry: RetryPolicy,
}

impl PostmanClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_api_url(api_key, DEFAULT_API_URL)
    }

    pub fn with_api_url(api_key: &str, api_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| PostmanError::Config("Postman API key is not a valid header".to_string()))?;
        headers.insert("X-Api-Key", key);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PostmanError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            delete_retry: RetryPolicy::new(
                DELETE_RETRIES,
                Duration::from_millis(DELETE_BASE_DELAY_MS),
            ),
        })
    }

    pub fn with_delete_retry(mut self, policy: RetryPolicy) -> Self {
        self.delete_retry = policy;
        self
    }

    /// Browser link to a workspace.
    pub fn workspace_url(workspace_id: &str) -> String {
        format!("{}/{}", WORKSPACE_LINK_BASE, workspace_id)
    }

    /// Name of a workspace, or `None` when it does not exist. Read-only.
    pub async fn find_workspace(&self, workspace_id: &str) -> Result<Option<String>> {
        let url = format!("{}/workspaces/{}", self.api_url, workspace_id);

        let response = match retrying_request(
            || self.client.get(&url).send(),
            "get Postman workspace",
            RetryPolicy::no_retry(),
        )
        .await
        {
            Ok(response) => response,
            Err(UpstreamError::Exhausted { status: 404, .. }) => {
                debug!(workspace_id, "Postman workspace not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let found: WorkspaceEnvelope = response
            .json()
            .await
            .map_err(|e| PostmanError::InvalidResponse(e.to_string()))?;
        Ok(Some(found.workspace.name))
    }

    /// Delete a workspace. A workspace that no longer exists counts as deleted.
    pub async fn delete_workspace(&self, workspace_id: &str) -> Result<()> {
        let url = format!("{}/workspaces/{}", self.api_url, workspace_id);

        match retrying_request(
            || self.client.delete(&url).send(),
            "delete Postman workspace",
            self.delete_retry,
        )
        .await
        {
            Ok(_) => {
                info!(workspace_id, "Deleted Postman workspace");
                Ok(())
            }
            Err(UpstreamError::Exhausted { status: 404, .. }) => {
                info!(workspace_id, "Postman workspace already deleted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
