use std::path::{Path, PathBuf};
use std::time::Duration;

use github::GitHubConfig;
use lifecycle_core::RetryPolicy;
use orchestrator::{AwsCredentials, PipelineSettings, PipelineTimings};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_PATH_ENV: &str = "PROVISIONER_CONFIG";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Service configuration: TOML file first, then environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub github: GitHubSection,
    pub postman: PostmanSection,
    pub aws: AwsSection,
    pub timings: TimingsSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSection {
    pub token: String,
    pub org: String,
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostmanSection {
    pub api_key: String,
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSection {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Pipeline attempt budgets; every delay is in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingsSection {
    pub dispatch_attempts: u32,
    pub dispatch_retry_delay_ms: u64,
    pub run_settle_delay_ms: u64,
    pub run_discovery_attempts: u32,
    pub run_discovery_interval_ms: u64,
    pub step_poll_interval_ms: u64,
    pub run_lookup_miss_attempts: u32,
    /// Retries of a blob upload to a freshly created repository.
    pub blob_retries: u32,
    pub blob_retry_base_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            github: GitHubSection::default(),
            postman: PostmanSection::default(),
            aws: AwsSection::default(),
            timings: TimingsSection::default(),
        }
    }
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            token: String::new(),
            org: String::new(),
            api_url: github::client::DEFAULT_API_URL.to_string(),
        }
    }
}

impl Default for PostmanSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: postman::DEFAULT_API_URL.to_string(),
        }
    }
}

impl Default for AwsSection {
    fn default() -> Self {
        Self {
            region: DEFAULT_AWS_REGION.to_string(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
        }
    }
}

impl Default for TimingsSection {
    fn default() -> Self {
        let t = PipelineTimings::default();
        let blob = RetryPolicy::default();
        Self {
            dispatch_attempts: t.dispatch_attempts,
            dispatch_retry_delay_ms: millis(t.dispatch_retry_delay),
            run_settle_delay_ms: millis(t.run_settle_delay),
            run_discovery_attempts: t.run_discovery_attempts,
            run_discovery_interval_ms: millis(t.run_discovery_interval),
            step_poll_interval_ms: millis(t.step_poll_interval),
            run_lookup_miss_attempts: t.run_lookup_miss_attempts,
            blob_retries: blob.max_retries,
            blob_retry_base_delay_ms: millis(blob.base_delay),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ServiceConfig {
    /// Read the config file, falling back to defaults when it is missing,
    /// unreadable or not valid TOML.
    pub async fn read(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "Config file does not exist, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path).await {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %path.display(), "Config loaded successfully");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    /// File (explicit path, else `PROVISIONER_CONFIG`) plus the process
    /// environment.
    pub async fn load(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let config = match path {
            Some(path) => Self::read(&path).await,
            None => Self::default(),
        };
        config.with_env(|name| std::env::var(name).ok())
    }

    /// Override fields from environment variables. Empty values are ignored.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let overrides: [(&str, &mut String); 9] = [
            ("BIND_ADDR", &mut self.bind_addr),
            ("GITHUB_TOKEN", &mut self.github.token),
            ("GITHUB_ORG", &mut self.github.org),
            ("GITHUB_API_URL", &mut self.github.api_url),
            ("POSTMAN_API_KEY", &mut self.postman.api_key),
            ("POSTMAN_API_URL", &mut self.postman.api_url),
            ("AWS_REGION", &mut self.aws.region),
            ("AWS_ACCESS_KEY_ID", &mut self.aws.access_key_id),
            ("AWS_SECRET_ACCESS_KEY", &mut self.aws.secret_access_key),
        ];

        for (name, field) in overrides {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }
        self
    }

    pub fn github_config(&self) -> GitHubConfig {
        GitHubConfig::new(&self.github.token, &self.github.org)
            .with_api_url(&self.github.api_url)
            .with_blob_retry(RetryPolicy::new(
                self.timings.blob_retries,
                Duration::from_millis(self.timings.blob_retry_base_delay_ms),
            ))
    }

    /// Static AWS credentials, when both halves are configured.
    pub fn aws_credentials(&self) -> Option<AwsCredentials> {
        if self.aws.access_key_id.is_empty() || self.aws.secret_access_key.is_empty() {
            return None;
        }
        Some(AwsCredentials {
            access_key_id: self.aws.access_key_id.clone(),
            secret_access_key: self.aws.secret_access_key.clone(),
        })
    }

    pub fn pipeline_timings(&self) -> PipelineTimings {
        let t = &self.timings;
        PipelineTimings {
            dispatch_attempts: t.dispatch_attempts,
            dispatch_retry_delay: Duration::from_millis(t.dispatch_retry_delay_ms),
            run_settle_delay: Duration::from_millis(t.run_settle_delay_ms),
            run_discovery_attempts: t.run_discovery_attempts,
            run_discovery_interval: Duration::from_millis(t.run_discovery_interval_ms),
            step_poll_interval: Duration::from_millis(t.step_poll_interval_ms),
            run_lookup_miss_attempts: t.run_lookup_miss_attempts,
        }
    }

    /// Settings handed to every pipeline, including the Actions secrets
    /// written into each new repository.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings::new(self.pipeline_timings())
            .with_secret("POSTMAN_API_KEY", &self.postman.api_key)
            .with_secret("AWS_ACCESS_KEY_ID", &self.aws.access_key_id)
            .with_secret("AWS_SECRET_ACCESS_KEY", &self.aws.secret_access_key)
            .with_secret("GH_TOKEN", &self.github.token)
            .with_aws_region(&self.aws.region)
    }
}
