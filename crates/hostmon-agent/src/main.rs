use anyhow::Result;
use hostmon_agent::{app, config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hostmon=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/hostmon.toml".to_string());

    let config = config::Config::load(&config_path)?;
    tracing::info!(config = %config_path, "hostmon agent starting");

    let mut agent = app::Agent::from_config(config).await?;
    agent.run().await
}
