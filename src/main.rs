use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidya_relay::config::{Config, DEFAULT_CONFIG_PATH};

#[derive(Debug, Parser)]
#[command(name = "vidya-relay")]
#[command(about = "Relay images to Gemini and return step-by-step solutions")]
struct CliArgs {
    /// Path to the JSON config file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidya_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    info!("Starting vidya-relay (config: {})", args.config.display());

    let config = Config::load(&args.config).context("Failed to load config")?;

    vidya_relay::server::serve(config)
        .await
        .context("Server failed")?;

    info!("Shutdown complete");
    Ok(())
}
