//! Helpers for tests that need a real HTTP upstream.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Local HTTP service standing in for an upstream backend. Dropping it
/// stops the server.
pub struct HttpService {
    pub addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl HttpService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Serves `router` on an ephemeral loopback port.
pub async fn spawn_http_service(router: Router) -> std::io::Result<HttpService> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
            .ok();
    });

    Ok(HttpService {
        addr,
        _shutdown: tx,
    })
}
