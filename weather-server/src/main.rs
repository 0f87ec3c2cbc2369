//! Binary crate for the weather HTTP service.

use anyhow::Context;
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf};
use tokio::net::TcpListener;
use weather_core::{EnvSecrets, provider::provider_from_settings};
use weather_server::{AppState, ServerConfig, TokenIssuer, router};

#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "ZIP code weather HTTP API")]
struct Args {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on; overrides the config file.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_server=info,weather_core=info".into()),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    let provider = provider_from_settings(&config.provider_settings(), &EnvSecrets)?;
    let tokens = TokenIssuer::new(config.token_lifetime(), config.refresh_token_lifetime());
    let state = AppState::new(provider, tokens);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "weather server listening");

    axum::serve(listener, router(state))
        .await
        .context("Weather server stopped unexpectedly")?;

    Ok(())
}
