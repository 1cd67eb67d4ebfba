use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::window::TimeWindow;

/// Label used when attributing ledger failures.
pub const LEDGER_SOURCE: &str = "dev-portal";

const PRODUCTION_QUERY: &str = "query VerificationQuery($start: timestamptz, $end: timestamptz) {
  nullifier_aggregate(where: {created_at: {_gte: $start, _lt: $end}, action: {is_staging: {_eq: false}}}) {
    aggregate {
      count(columns: id, distinct: true)
    }
  }
}";

const ALL_ACTIONS_QUERY: &str = "query VerificationQuery($start: timestamptz, $end: timestamptz) {
  nullifier_aggregate(where: {created_at: {_gte: $start, _lt: $end}}) {
    aggregate {
      count(columns: id, distinct: true)
    }
  }
}";

/// Authoritative backend answering the distinct verification count.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    async fn distinct_count(&self, window: &TimeWindow) -> Result<u64, LedgerClientError>;
}

/// Typed GraphQL client for the developer portal ledger.
#[derive(Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    production_only: bool,
}

impl LedgerClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        api_key: impl Into<String>,
        production_only: bool,
    ) -> Result<Self, LedgerClientError> {
        let endpoint = Url::parse(endpoint).map_err(|err| LedgerClientError::InvalidUrl {
            url: endpoint.to_string(),
            source: err,
        })?;

        Ok(Self {
            http,
            endpoint,
            api_key: api_key.into(),
            production_only,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn query(&self) -> &'static str {
        if self.production_only {
            PRODUCTION_QUERY
        } else {
            ALL_ACTIONS_QUERY
        }
    }
}

#[async_trait]
impl LedgerSource for LedgerClient {
    async fn distinct_count(&self, window: &TimeWindow) -> Result<u64, LedgerClientError> {
        let request = GraphQlRequest {
            query: self.query(),
            variables: WindowVariables {
                start: window.start_param(),
                end: window.end_param(),
            },
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| LedgerClientError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(LedgerClientError::UnexpectedStatus {
                status: response.status(),
            });
        }

        let payload: GraphQlResponse = response
            .json()
            .await
            .map_err(|err| LedgerClientError::Decode(err.to_string()))?;

        if let Some(error) = payload.errors.first() {
            return Err(LedgerClientError::Query(error.message.clone()));
        }

        payload
            .data
            .map(|data| data.nullifier_aggregate.aggregate.count)
            .ok_or_else(|| LedgerClientError::Decode("response carried no data".into()))
    }
}

#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: &'static str,
    variables: WindowVariables,
}

#[derive(Debug, Serialize)]
struct WindowVariables {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<LedgerData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct LedgerData {
    nullifier_aggregate: NullifierAggregate,
}

#[derive(Debug, Deserialize)]
struct NullifierAggregate {
    aggregate: AggregateFields,
}

#[derive(Debug, Deserialize)]
struct AggregateFields {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Error)]
pub enum LedgerClientError {
    #[error("invalid ledger url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("ledger HTTP request failed: {0}")]
    Http(String),
    #[error("ledger returned unexpected status {status}")]
    UnexpectedStatus { status: reqwest::StatusCode },
    #[error("ledger query failed: {0}")]
    Query(String),
    #[error("failed to decode ledger response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use analytics_core::testing::spawn_http_service;

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    fn ledger_router(captured: Captured, reply: Value) -> Router {
        Router::new()
            .route(
                "/graphql",
                post(
                    move |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            let auth = headers
                                .get("authorization")
                                .and_then(|value| value.to_str().ok())
                                .map(str::to_string);
                            captured.lock().unwrap().push((auth, body));
                            Json(reply)
                        }
                    },
                ),
            )
            .with_state(captured)
    }

    fn window() -> TimeWindow {
        TimeWindow::from_bounds(Some("2022-01-01"), Some("2022-02-01"), chrono::Utc::now())
            .unwrap()
    }

    #[tokio::test]
    async fn posts_window_and_reads_nested_count() -> anyhow::Result<()> {
        let captured: Captured = Arc::default();
        let reply = json!({"data": {"nullifier_aggregate": {"aggregate": {"count": 42}}}});
        let upstream = spawn_http_service(ledger_router(captured.clone(), reply)).await?;

        let client = LedgerClient::new(
            reqwest::Client::new(),
            &upstream.url("/graphql"),
            "ledger-key",
            true,
        )?;
        assert_eq!(client.distinct_count(&window()).await?, 42);

        let requests = captured.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        let (auth, body) = &requests[0];
        assert_eq!(auth.as_deref(), Some("Bearer ledger-key"));
        assert_eq!(body["variables"]["start"], "2022-01-01T00:00:00.000Z");
        assert_eq!(body["variables"]["end"], "2022-02-01T00:00:00.000Z");
        assert!(body["query"].as_str().unwrap().contains("is_staging"));
        Ok(())
    }

    #[tokio::test]
    async fn omits_staging_scope_when_not_production_only() -> anyhow::Result<()> {
        let captured: Captured = Arc::default();
        let reply = json!({"data": {"nullifier_aggregate": {"aggregate": {"count": 0}}}});
        let upstream = spawn_http_service(ledger_router(captured.clone(), reply)).await?;

        let client = LedgerClient::new(
            reqwest::Client::new(),
            &upstream.url("/graphql"),
            "ledger-key",
            false,
        )?;
        assert_eq!(client.distinct_count(&window()).await?, 0);

        let requests = captured.lock().unwrap().clone();
        assert!(!requests[0].1["query"].as_str().unwrap().contains("is_staging"));
        Ok(())
    }

    #[tokio::test]
    async fn graphql_errors_fail_the_query() -> anyhow::Result<()> {
        let reply = json!({"errors": [{"message": "field not found"}]});
        let upstream = spawn_http_service(ledger_router(Arc::default(), reply)).await?;

        let client = LedgerClient::new(
            reqwest::Client::new(),
            &upstream.url("/graphql"),
            "ledger-key",
            true,
        )?;
        let err = client.distinct_count(&window()).await.unwrap_err();
        assert!(matches!(err, LedgerClientError::Query(message) if message == "field not found"));
        Ok(())
    }

    #[tokio::test]
    async fn negative_counts_are_decode_errors() -> anyhow::Result<()> {
        let reply = json!({"data": {"nullifier_aggregate": {"aggregate": {"count": -1}}}});
        let upstream = spawn_http_service(ledger_router(Arc::default(), reply)).await?;

        let client = LedgerClient::new(
            reqwest::Client::new(),
            &upstream.url("/graphql"),
            "ledger-key",
            true,
        )?;
        let err = client.distinct_count(&window()).await.unwrap_err();
        assert!(matches!(err, LedgerClientError::Decode(_)));
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_is_reported() -> anyhow::Result<()> {
        let router = Router::new().route(
            "/graphql",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let upstream = spawn_http_service(router).await?;

        let client = LedgerClient::new(
            reqwest::Client::new(),
            &upstream.url("/graphql"),
            "ledger-key",
            true,
        )?;
        let err = client.distinct_count(&window()).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerClientError::UnexpectedStatus { status } if status == reqwest::StatusCode::BAD_GATEWAY
        ));
        Ok(())
    }
}
