use std::net::SocketAddr;

use analytics_core::config::{load_dotenv, optional_env};
use analytics_core::logging::init_tracing;
use analytics_gateway::config::GatewayConfig;
use analytics_gateway::routing::build_app;
use anyhow::Context;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let log_level = optional_env("ANALYTICS_LOG_LEVEL").ok().flatten();
    if let Err(err) = init_tracing(log_level.as_deref()) {
        eprintln!("failed to initialise tracing: {err}");
    }

    let config = GatewayConfig::from_env().context("failed to load gateway configuration")?;
    config.warn_incomplete();
    let router = build_app(&config)?;

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read socket address")?;
    info!(%actual_addr, environment = ?config.environment, "starting analytics-gateway");

    if let Err(err) = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?err, "gateway server terminated with error");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
