use serde_json::json;
use tracing::{debug, warn};

use crate::client::GitHubClient;
use crate::error::Result;
use crate::types::Variable;

impl GitHubClient {
    /// Create a repository variable. Fails if it cannot be created.
    pub async fn create_variable(&self, repo: &str, name: &str, value: &str) -> Result<()> {
        let body = json!({ "name": name, "value": value });
        let response = self
            .octocrab
            ._post(self.repo_route(repo, "/actions/variables"), Some(&body))
            .await?;
        octocrab::map_github_error(response).await?;

        debug!(repo, variable = name, "Created repository variable");
        Ok(())
    }

    async fn update_variable(&self, repo: &str, name: &str, value: &str) -> Result<()> {
        let body = json!({ "name": name, "value": value });
        let response = self
            .octocrab
            ._patch(
                self.repo_route(repo, &format!("/actions/variables/{}", name)),
                Some(&body),
            )
            .await?;
        octocrab::map_github_error(response).await?;
        Ok(())
    }

    /// Update a variable in place, creating it when the update is rejected.
    ///
    /// Never fails; returns whether either write landed.
    pub async fn set_variable(&self, repo: &str, name: &str, value: &str) -> bool {
        match self.update_variable(repo, name, value).await {
            Ok(()) => {
                debug!(repo, variable = name, "Updated repository variable");
                return true;
            }
            Err(e) => {
                debug!(repo, variable = name, error = %e, "Variable update rejected, creating instead");
            }
        }

        match self.create_variable(repo, name, value).await {
            Ok(()) => true,
            Err(e) => {
                warn!(repo, variable = name, error = %e, "Failed to set repository variable");
                false
            }
        }
    }

    pub async fn get_variable(&self, repo: &str, name: &str) -> Option<String> {
        self.lookup::<Variable>(
            &self.repo_route(repo, &format!("/actions/variables/{}", name)),
            "get variable",
        )
        .await
        .map(|variable| variable.value)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_set_variable_updates_in_place() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/lead-trail/actions/variables/ENVIRONMENTS"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/actions/variables"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        assert!(
            test_client(&server)
                .set_variable("lead-trail", "ENVIRONMENTS", r#"["prod"]"#)
                .await
        );
    }

    #[tokio::test]
    async fn test_set_variable_falls_back_to_create() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/lead-trail/actions/variables/ENVIRONMENTS"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/lead-trail/actions/variables"))
            .and(body_partial_json(json!({ "name": "ENVIRONMENTS" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        assert!(
            test_client(&server)
                .set_variable("lead-trail", "ENVIRONMENTS", r#"["dev"]"#)
                .await
        );
    }

    #[tokio::test]
    async fn test_set_variable_swallows_double_failure() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(!test_client(&server).set_variable("lead-trail", "X", "1").await);
    }

    #[tokio::test]
    async fn test_get_variable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/lead-trail/actions/variables/FUNCTION_NAME"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "FUNCTION_NAME",
                "value": "lead-trail",
                "created_at": "2026-01-10T10:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert_eq!(
            client.get_variable("lead-trail", "FUNCTION_NAME").await.as_deref(),
            Some("lead-trail")
        );
        assert!(client.get_variable("lead-trail", "MISSING").await.is_none());
    }
}
