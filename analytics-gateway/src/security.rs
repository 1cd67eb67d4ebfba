use std::sync::Arc;

use analytics_aggregator::api::{map_error, CountRejection};
use analytics_core::errors::AnalyticsError;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::config::SecurityConfig;

/// Shared secret guarding the aggregation routes.
#[derive(Clone)]
pub struct SecurityState {
    api_secret: Option<Arc<str>>,
}

impl SecurityState {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            api_secret: config.api_secret.as_deref().map(Arc::from),
        }
    }

    /// Constant-time comparison against the configured secret. Without a
    /// secret nothing is authorized.
    pub fn authorize(&self, presented: Option<&str>) -> bool {
        match (self.api_secret.as_deref(), presented) {
            (Some(expected), Some(presented)) => {
                bool::from(expected.as_bytes().ct_eq(presented.as_bytes()))
            }
            _ => false,
        }
    }
}

pub async fn enforce_api_secret(
    State(state): State<SecurityState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, CountRejection> {
    let presented = extract_bearer(request.headers());
    if !state.authorize(presented) {
        warn!(path = %request.uri().path(), "rejected request with invalid credentials");
        return Err(map_error(AnalyticsError::Unauthorized));
    }

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}
