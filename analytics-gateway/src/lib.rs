//! HTTP gateway for the verification analytics service.
//!
//! Serves the aggregation endpoints behind a shared bearer secret, the
//! provider webhook for on-chain verifications and a health check.

pub mod config;
pub mod health;
pub mod routing;
pub mod security;

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use config::GatewayConfig;
use routing::build_app;

/// Handle to a gateway started in the background.
pub struct GatewayHandle {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
}

impl GatewayHandle {
    pub fn shutdown(self) {
        let _ = self.shutdown.send(());
    }
}

/// Binds the configured address and serves until the handle is shut down.
pub async fn start_gateway(config: GatewayConfig) -> anyhow::Result<GatewayHandle> {
    let router = build_app(&config)?;

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("invalid gateway bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind gateway listener")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read socket address")?;
    info!(%actual_addr, "starting analytics-gateway");

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
            .ok();
    });

    Ok(GatewayHandle {
        addr: actual_addr,
        shutdown: tx,
    })
}
