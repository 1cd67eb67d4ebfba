use analytics_core::errors::AnalyticsError;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use tracing::field::Empty;
use tracing::{error, instrument, warn, Span};

use crate::relay::Relay;
use crate::signature::SIGNATURE_HEADER;

#[derive(Clone)]
pub struct RelayState {
    relay: Relay,
}

impl RelayState {
    pub fn new(relay: Relay) -> Self {
        Self { relay }
    }
}

/// Webhook routes. The body is taken raw so the signature covers the
/// exact bytes received.
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/api/v1/webhook", post(receive_webhook))
        .route("/api/webhook", post(receive_webhook))
        .with_state(state)
}

#[instrument(skip_all, fields(route = "webhook", emitted = Empty, failed = Empty))]
async fn receive_webhook(
    State(state): State<RelayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match state.relay.relay(&body, signature).await {
        Ok(report) => {
            let span = Span::current();
            span.record("emitted", report.emitted);
            span.record("failed", report.failed);
            StatusCode::NO_CONTENT
        }
        Err(err) => status_for(err),
    }
}

fn status_for(err: AnalyticsError) -> StatusCode {
    match err {
        AnalyticsError::Unauthorized => StatusCode::UNAUTHORIZED,
        AnalyticsError::MalformedPayload(reason) => {
            warn!(%reason, "rejected malformed webhook");
            StatusCode::BAD_REQUEST
        }
        other => {
            error!(error = %other, "webhook relay failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
