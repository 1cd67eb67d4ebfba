use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::config::GatewayConfig;

#[derive(Clone, Serialize)]
struct SourceHealth {
    label: String,
    enabled: bool,
}

#[derive(Clone, Serialize)]
struct RelayHealth {
    signing_key_configured: bool,
    sink_configured: bool,
}

/// Static view of what this deployment can serve.
#[derive(Clone, Serialize)]
pub struct HealthState {
    status: &'static str,
    sources: Vec<SourceHealth>,
    relay: RelayHealth,
}

impl HealthState {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            status: "ok",
            sources: config
                .aggregator
                .sources
                .iter()
                .map(|source| SourceHealth {
                    label: source.label.clone(),
                    enabled: source.is_enabled(),
                })
                .collect(),
            relay: RelayHealth {
                signing_key_configured: config.relay.signing_key.is_some(),
                sink_configured: config.relay.project_key.is_some(),
            },
        }
    }
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz(State(state): State<HealthState>) -> impl IntoResponse {
    Json(state)
}
