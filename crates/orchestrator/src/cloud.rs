//! Deletion of the AWS resources a provisioning run deployed.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_lambda::config::Credentials;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("{operation} failed for {resource}: {message}")]
    Request {
        operation: &'static str,
        resource: String,
        message: String,
    },
}

impl CloudError {
    fn request(operation: &'static str, resource: &str, message: impl Into<String>) -> Self {
        Self::Request {
            operation,
            resource: resource.to_string(),
            message: message.into(),
        }
    }
}

pub type CloudResult<T> = std::result::Result<T, CloudError>;

/// Cloud-side teardown operations. A resource that does not exist counts as
/// deleted. The `*_exists` lookups never modify anything.
#[async_trait]
pub trait CloudResources: Send + Sync {
    async fn gateway_exists(&self, name: &str) -> CloudResult<bool>;

    async fn function_exists(&self, name: &str) -> CloudResult<bool>;

    async fn log_group_exists(&self, name: &str) -> CloudResult<bool>;

    async fn role_exists(&self, name: &str) -> CloudResult<bool>;

    /// Delete every HTTP API named `name`.
    async fn delete_gateway(&self, name: &str) -> CloudResult<()>;

    async fn delete_function(&self, name: &str) -> CloudResult<()>;

    async fn delete_log_group(&self, name: &str) -> CloudResult<()>;

    /// Detach the role's managed policies, then delete it.
    async fn delete_role(&self, name: &str) -> CloudResult<()>;
}

/// Static credentials for [`AwsCloud::connect`]. Without them the default
/// provider chain is used.
#[derive(Debug, Clone, Default)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// [`CloudResources`] backed by the AWS SDK.
pub struct AwsCloud {
    lambda: aws_sdk_lambda::Client,
    gateways: aws_sdk_apigatewayv2::Client,
    iam: aws_sdk_iam::Client,
    logs: aws_sdk_cloudwatchlogs::Client,
}

impl AwsCloud {
    pub async fn connect(region: &str, credentials: Option<AwsCredentials>) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(credentials) = credentials {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id,
                credentials.secret_access_key,
                None,
                None,
                "provisioner-config",
            ));
        }
        let config = loader.load().await;
        info!(region, "AWS clients configured");
        Self::from_config(&config)
    }

    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            lambda: aws_sdk_lambda::Client::new(config),
            gateways: aws_sdk_apigatewayv2::Client::new(config),
            iam: aws_sdk_iam::Client::new(config),
            logs: aws_sdk_cloudwatchlogs::Client::new(config),
        }
    }

    async fn gateway_ids(&self, name: &str) -> CloudResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .gateways
                .get_apis()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    CloudError::request(
                        "list API gateways",
                        name,
                        aws_sdk_apigatewayv2::error::DisplayErrorContext(&e).to_string(),
                    )
                })?;

            ids.extend(
                page.items()
                    .iter()
                    .filter(|api| api.name() == Some(name))
                    .filter_map(|api| api.api_id().map(str::to_string)),
            );

            match page.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(ids)
    }
}

#[async_trait]
impl CloudResources for AwsCloud {
    async fn gateway_exists(&self, name: &str) -> CloudResult<bool> {
        Ok(!self.gateway_ids(name).await?.is_empty())
    }

    async fn function_exists(&self, name: &str) -> CloudResult<bool> {
        match self.lambda.get_function().function_name(name).send().await {
            Ok(_) => Ok(true),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|s| s.is_resource_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(e) => Err(CloudError::request(
                "get Lambda function",
                name,
                aws_sdk_lambda::error::DisplayErrorContext(&e).to_string(),
            )),
        }
    }

    async fn log_group_exists(&self, name: &str) -> CloudResult<bool> {
        let groups = self
            .logs
            .describe_log_groups()
            .log_group_name_prefix(name)
            .send()
            .await
            .map_err(|e| {
                CloudError::request(
                    "describe log groups",
                    name,
                    aws_sdk_cloudwatchlogs::error::DisplayErrorContext(&e).to_string(),
                )
            })?;
        Ok(groups
            .log_groups()
            .iter()
            .any(|group| group.log_group_name() == Some(name)))
    }

    async fn role_exists(&self, name: &str) -> CloudResult<bool> {
        match self.iam.get_role().role_name(name).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|s| s.is_no_such_entity_exception()) => {
                Ok(false)
            }
            Err(e) => Err(CloudError::request(
                "get IAM role",
                name,
                aws_sdk_iam::error::DisplayErrorContext(&e).to_string(),
            )),
        }
    }

    async fn delete_gateway(&self, name: &str) -> CloudResult<()> {
        let ids = self.gateway_ids(name).await?;
        if ids.is_empty() {
            debug!(gateway = name, "API gateway already deleted");
        }

        for id in ids {
            match self.gateways.delete_api().api_id(&id).send().await {
                Ok(_) => info!(gateway = name, api_id = %id, "Deleted API gateway"),
                Err(e) if e.as_service_error().is_some_and(|s| s.is_not_found_exception()) => {
                    debug!(gateway = name, api_id = %id, "API gateway already deleted");
                }
                Err(e) => {
                    return Err(CloudError::request(
                        "delete API gateway",
                        name,
                        aws_sdk_apigatewayv2::error::DisplayErrorContext(&e).to_string(),
                    ))
                }
            }
        }
        Ok(())
    }

    async fn delete_function(&self, name: &str) -> CloudResult<()> {
        match self.lambda.delete_function().function_name(name).send().await {
            Ok(_) => {
                info!(function = name, "Deleted Lambda function");
                Ok(())
            }
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|s| s.is_resource_not_found_exception()) =>
            {
                debug!(function = name, "Lambda function already deleted");
                Ok(())
            }
            Err(e) => Err(CloudError::request(
                "delete Lambda function",
                name,
                aws_sdk_lambda::error::DisplayErrorContext(&e).to_string(),
            )),
        }
    }

    async fn delete_log_group(&self, name: &str) -> CloudResult<()> {
        match self.logs.delete_log_group().log_group_name(name).send().await {
            Ok(_) => {
                info!(log_group = name, "Deleted log group");
                Ok(())
            }
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|s| s.is_resource_not_found_exception()) =>
            {
                debug!(log_group = name, "Log group already deleted");
                Ok(())
            }
            Err(e) => Err(CloudError::request(
                "delete log group",
                name,
                aws_sdk_cloudwatchlogs::error::DisplayErrorContext(&e).to_string(),
            )),
        }
    }

    async fn delete_role(&self, name: &str) -> CloudResult<()> {
        let attached = match self
            .iam
            .list_attached_role_policies()
            .role_name(name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|s| s.is_no_such_entity_exception()) => {
                debug!(role = name, "IAM role already deleted");
                return Ok(());
            }
            Err(e) => {
                return Err(CloudError::request(
                    "list role policies",
                    name,
                    aws_sdk_iam::error::DisplayErrorContext(&e).to_string(),
                ))
            }
        };

        for policy_arn in attached
            .attached_policies()
            .iter()
            .filter_map(|policy| policy.policy_arn())
        {
            self.iam
                .detach_role_policy()
                .role_name(name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map_err(|e| {
                    CloudError::request(
                        "detach role policy",
                        name,
                        aws_sdk_iam::error::DisplayErrorContext(&e).to_string(),
                    )
                })?;
            debug!(role = name, policy_arn, "Detached role policy");
        }

        match self.iam.delete_role().role_name(name).send().await {
            Ok(_) => {
                info!(role = name, "Deleted IAM role");
                Ok(())
            }
            Err(e) if e.as_service_error().is_some_and(|s| s.is_no_such_entity_exception()) => {
                debug!(role = name, "IAM role already deleted");
                Ok(())
            }
            Err(e) => Err(CloudError::request(
                "delete IAM role",
                name,
                aws_sdk_iam::error::DisplayErrorContext(&e).to_string(),
            )),
        }
    }
}
