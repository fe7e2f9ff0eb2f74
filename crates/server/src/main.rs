use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use github::GitHubClient;
use orchestrator::{AwsCloud, Orchestrator};
use postman::PostmanClient;
use server::config::ServiceConfig;
use server::{create_router, state::AppState};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "provisioner")]
#[command(about = "Provision API projects across GitHub, Postman and AWS", long_about = None)]
#[command(version)]
struct Args {
    /// TOML config file (defaults to $PROVISIONER_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    orchestrator::validate_table().context("workflow step table is inconsistent")?;

    let mut config = ServiceConfig::load(args.config.as_deref()).await;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if config.github.token.is_empty() {
        warn!("GITHUB_TOKEN is not set; GitHub calls will be unauthenticated");
    }
    if config.postman.api_key.is_empty() {
        warn!("POSTMAN_API_KEY is not set; workspace deletion will fail");
    }

    let github = GitHubClient::new(config.github_config()).context("invalid GitHub settings")?;
    let postman = PostmanClient::with_api_url(&config.postman.api_key, &config.postman.api_url)
        .context("invalid Postman settings")?;
    let cloud = AwsCloud::connect(&config.aws.region, config.aws_credentials()).await;

    let orchestrator = Orchestrator::new(
        Arc::new(github),
        Arc::new(postman),
        Arc::new(cloud),
        config.pipeline_settings(),
    );
    let app = create_router(AppState::new(orchestrator));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(org = %config.github.org, "Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
