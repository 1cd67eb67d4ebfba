use analytics_core::errors::{AnalyticsError, Result};
use analytics_core::serde_utils::{from_json_bytes, null_as_false};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::field::Empty;
use tracing::{error, info, instrument, warn, Span};

use crate::aggregator::Aggregator;
use crate::filter::FilterFlags;
use crate::source::{EventSource, WORLD_APP_SOURCE, WORLD_ID_SOURCE};
use crate::window::TimeWindow;

pub const UNAUTHORIZED_MESSAGE: &str = "You do not have permission to access this resource.";
pub const SERVER_ERROR_MESSAGE: &str = "Server-side error occurred, please check the logs!";

/// Body of `POST /api/v1/verifications`.
#[derive(Debug, Default, Deserialize)]
pub struct VerificationsRequest {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(flatten)]
    pub flags: FilterFlags,
}

/// Body of `POST /api/verifications`, where the caller picks the events.
#[derive(Debug, Default, Deserialize)]
pub struct CallerEventsRequest {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub filter_tests: bool,
    #[serde(default)]
    pub app_events: Vec<String>,
    #[serde(default)]
    pub id_events: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CountResponse {
    pub fn ok(count: u64) -> Self {
        Self {
            success: true,
            count: Some(count),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            count: None,
            error: Some(message.into()),
        }
    }
}

pub type CountRejection = (StatusCode, Json<CountResponse>);

#[derive(Clone)]
pub struct AggregationState {
    aggregator: Aggregator,
}

impl AggregationState {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }
}

pub fn router(state: AggregationState) -> Router {
    Router::new()
        .route("/api/v1/verifications", post(count_verifications))
        .route("/api/verifications", post(count_caller_events))
        .with_state(state)
}

#[instrument(skip_all, fields(route = "/api/v1/verifications", count = Empty))]
async fn count_verifications(
    State(state): State<AggregationState>,
    body: Bytes,
) -> std::result::Result<Json<CountResponse>, CountRejection> {
    let request: VerificationsRequest = decode_body(&body).map_err(map_error)?;
    let window = TimeWindow::from_bounds(request.start.as_deref(), request.end.as_deref(), Utc::now())
        .map_err(map_error)?;

    let count = state
        .aggregator
        .count(&window, &request.flags)
        .await
        .map_err(map_error)?;

    Span::current().record("count", count);
    info!(count, "served verification count");
    Ok(Json(CountResponse::ok(count)))
}

#[instrument(skip_all, fields(route = "/api/verifications", count = Empty))]
async fn count_caller_events(
    State(state): State<AggregationState>,
    body: Bytes,
) -> std::result::Result<Json<CountResponse>, CountRejection> {
    let request: CallerEventsRequest = decode_body(&body).map_err(map_error)?;
    let window = TimeWindow::from_bounds(request.start.as_deref(), request.end.as_deref(), Utc::now())
        .map_err(map_error)?;
    let sources = caller_sources(state.aggregator.sources(), &request);

    let count = state
        .aggregator
        .count_events(&window, request.filter_tests, &sources)
        .await
        .map_err(map_error)?;

    Span::current().record("count", count);
    info!(count, "served caller event count");
    Ok(Json(CountResponse::ok(count)))
}

/// Replaces the configured events with the caller's lists, project by project.
fn caller_sources(configured: &[EventSource], request: &CallerEventsRequest) -> Vec<EventSource> {
    configured
        .iter()
        .map(|source| match source.label.as_str() {
            WORLD_APP_SOURCE => source.with_events(request.app_events.iter().cloned()),
            WORLD_ID_SOURCE => source.with_events(request.id_events.iter().cloned()),
            _ => source.with_events(Vec::<String>::new()),
        })
        .collect()
}

/// An empty body means "all defaults".
fn decode_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    from_json_bytes(body)
}

pub fn map_error(err: AnalyticsError) -> CountRejection {
    match err {
        AnalyticsError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(CountResponse::failure(UNAUTHORIZED_MESSAGE)),
        ),
        err if err.is_client_error() => {
            warn!(%err, "rejected aggregation request");
            (
                StatusCode::BAD_REQUEST,
                Json(CountResponse::failure(err.to_string())),
            )
        }
        other => {
            error!(error = %other, "aggregation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CountResponse::failure(SERVER_ERROR_MESSAGE)),
            )
        }
    }
}
