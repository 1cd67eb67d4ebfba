use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::event::VerificationEvent;

/// Destination accepting one analytics event per call.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn capture(&self, event: &VerificationEvent) -> Result<(), SinkError>;
}

/// Capture client for the World ID analytics project.
#[derive(Clone)]
pub struct CaptureClient {
    http: reqwest::Client,
    capture_url: Url,
    project_key: String,
}

impl CaptureClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        project_key: impl Into<String>,
    ) -> Result<Self, SinkError> {
        let invalid = |err| SinkError::InvalidUrl {
            url: base_url.to_string(),
            source: err,
        };
        let mut base = Url::parse(base_url).map_err(invalid)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let capture_url = base.join("capture/").map_err(invalid)?;

        Ok(Self {
            http,
            capture_url,
            project_key: project_key.into(),
        })
    }

    pub fn capture_url(&self) -> &Url {
        &self.capture_url
    }
}

#[async_trait]
impl EventSink for CaptureClient {
    async fn capture(&self, event: &VerificationEvent) -> Result<(), SinkError> {
        let payload = CapturePayload {
            api_key: &self.project_key,
            event: event.event_type(),
            distinct_id: event.distinct_id(),
            properties: event,
            timestamp: event.timestamp,
        };

        let response = self
            .http
            .post(self.capture_url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|err| SinkError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::UnexpectedStatus {
                status: response.status(),
            });
        }
        Ok(())
    }
}

/// Sink used when no capture project key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSink;

#[async_trait]
impl EventSink for DisabledSink {
    async fn capture(&self, _event: &VerificationEvent) -> Result<(), SinkError> {
        Err(SinkError::NotConfigured)
    }
}

#[derive(Debug, Serialize)]
struct CapturePayload<'a> {
    api_key: &'a str,
    event: &'a str,
    distinct_id: &'a str,
    properties: &'a VerificationEvent,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid capture url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("capture request failed: {0}")]
    Http(String),
    #[error("capture endpoint returned unexpected status {status}")]
    UnexpectedStatus { status: reqwest::StatusCode },
    #[error("capture project key is not configured")]
    NotConfigured,
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::TimeZone;
    use serde_json::Value;

    use super::*;
    use analytics_core::testing::spawn_http_service;

    type Captured = Arc<Mutex<Vec<Value>>>;

    fn capture_router(captured: Captured, status: StatusCode) -> Router {
        Router::new()
            .route(
                "/capture/",
                post(move |State(captured): State<Captured>, Json(body): Json<Value>| async move {
                    captured.lock().unwrap().push(body);
                    status
                }),
            )
            .with_state(captured)
    }

    fn event() -> VerificationEvent {
        VerificationEvent {
            timestamp: Utc.with_ymd_and_hms(2022, 3, 1, 12, 0, 0).unwrap(),
            contract: "burn",
            network: "ETH_MAINNET".into(),
            from_address: "0xabc".into(),
            to_address: "0x0".into(),
            transaction_hash: "0xdead".into(),
            block: "0x10".into(),
            notification_id: "whevt_1".into(),
            webhook_id: None,
        }
    }

    #[tokio::test]
    async fn posts_capture_payload() -> anyhow::Result<()> {
        let captured: Captured = Arc::default();
        let upstream = spawn_http_service(capture_router(captured.clone(), StatusCode::OK)).await?;

        let client = CaptureClient::new(
            reqwest::Client::new(),
            &upstream.url(""),
            "phc_project",
        )?;
        client.capture(&event()).await?;

        let bodies = captured.lock().unwrap().clone();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["api_key"], "phc_project");
        assert_eq!(bodies[0]["event"], "onchain verification");
        assert_eq!(bodies[0]["distinct_id"], "0xabc");
        assert_eq!(bodies[0]["properties"]["contract"], "burn");
        assert_eq!(bodies[0]["timestamp"], "2022-03-01T12:00:00Z");
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() -> anyhow::Result<()> {
        let upstream =
            spawn_http_service(capture_router(Arc::default(), StatusCode::BAD_GATEWAY)).await?;
        let client = CaptureClient::new(
            reqwest::Client::new(),
            &upstream.url("/"),
            "phc_project",
        )?;

        let err = client.capture(&event()).await.unwrap_err();
        assert!(matches!(err, SinkError::UnexpectedStatus { .. }));
        Ok(())
    }

    #[test]
    fn capture_path_is_appended_to_base() {
        let client =
            CaptureClient::new(reqwest::Client::new(), "https://app.posthog.com", "k").unwrap();
        assert_eq!(client.capture_url().as_str(), "https://app.posthog.com/capture/");
        assert!(CaptureClient::new(reqwest::Client::new(), "not a url", "k").is_err());
    }

    #[tokio::test]
    async fn disabled_sink_refuses_events() {
        let err = DisabledSink.capture(&event()).await.unwrap_err();
        assert!(matches!(err, SinkError::NotConfigured));
    }
}
