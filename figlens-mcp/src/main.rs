use anyhow::Context;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use figlens_core::{mask_secret, AppConfig};
use figlens_mcp::server_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Set up logging to stderr (stdio is for MCP protocol)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let (config, config_path) =
        AppConfig::load_discovered(None, &cwd).context("Failed to load configuration")?;
    let auth = config.resolve_auth(None, None, |key| std::env::var(key).ok());

    tracing::info!("Starting Figlens MCP server...");
    if let Some(path) = &config_path {
        tracing::info!("Config: {}", path.display());
    }
    tracing::info!(
        "Auth: {} ({})",
        if auth.uses_oauth() { "OAuth" } else { "API key" },
        mask_secret(
            auth.oauth_token
                .as_ref()
                .or(auth.api_key.as_ref())
                .map(|r| r.value.as_str())
        )
    );

    let server = server_from_config(&config, &auth)?;
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
