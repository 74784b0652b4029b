use anyhow::{Context, Result};
use proctor_server::{RelayState, ServerConfig, relay_router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env().context("Failed to read relay configuration")?;
    let state = RelayState::from_config(&config);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(
        addr = %config.bind_addr,
        authenticated = config.shared_secret.is_some(),
        "Signaling relay listening"
    );

    axum::serve(listener, relay_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Relay server failed")?;

    Ok(())
}
