use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::net::IpAddr;
use std::time::Duration;
use switchboard_server::{AllowedOrigins, AppState, RelayConfig, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "WebRTC signaling relay: room membership and offer/answer/candidate routing")]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "SWITCHBOARD_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(short, long, env = "SWITCHBOARD_PORT", default_value_t = switchboard_server::DEFAULT_PORT)]
    port: u16,

    /// `*` or a comma separated list of origins allowed to open a socket.
    #[arg(long, env = "SWITCHBOARD_ALLOWED_ORIGIN", default_value = "*")]
    allowed_origin: AllowedOrigins,
}

impl From<Cli> for RelayConfig {
    fn from(cli: Cli) -> Self {
        RelayConfig {
            host: cli.host,
            port: cli.port,
            allowed_origins: cli.allowed_origin,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RelayConfig::from(Cli::parse());
    let addr = config.socket_addr();

    let state = AppState::new(config.allowed_origins.clone());
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!(
        "{} {}",
        "📡 Switchboard listening on".green().bold(),
        format!("ws://{}/ws", addr).cyan()
    );
    info!("Allowed origins: {:?}", config.allowed_origins);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .context("Server error")?;

    // Upgraded sockets outlive `serve`; wait for their disconnect cleanup.
    state.drain(Duration::from_secs(5)).await;

    info!("Switchboard stopped");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
    state.shutdown();
}
