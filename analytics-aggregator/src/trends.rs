use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use thiserror::Error;
use url::Url;

use crate::reduce::EventCount;
use crate::window::TimeWindow;

/// One trend query against an analytics project.
#[derive(Debug, Clone, Copy)]
pub struct TrendQuery<'a> {
    pub source_id: &'a str,
    pub event_names: &'a [String],
    pub window: &'a TimeWindow,
    pub filter_test_accounts: bool,
}

/// Analytics backend answering per-event counts over a window.
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Returns one count per requested event, in request order.
    async fn trend(&self, query: &TrendQuery<'_>) -> Result<Vec<EventCount>, TrendClientError>;
}

/// Typed HTTP client for the analytics trend API.
#[derive(Clone)]
pub struct TrendClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl TrendClient {
    /// Creates a client for the projects API rooted at `base_url`.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self, TrendClientError> {
        let mut url = Url::parse(base_url).map_err(|err| TrendClientError::InvalidUrl {
            url: base_url.to_string(),
            source: err,
        })?;

        if !url.path().ends_with('/') {
            let mut path = url.path().trim_end_matches('/').to_string();
            path.push('/');
            url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url: url,
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn trend_url(&self, source_id: &str) -> Result<Url, TrendClientError> {
        let path = format!("{}/insights/trend", encode_path_segment(source_id));
        self.base_url
            .join(&path)
            .map_err(|err| TrendClientError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                source: err,
            })
    }
}

#[async_trait]
impl TrendSource for TrendClient {
    async fn trend(&self, query: &TrendQuery<'_>) -> Result<Vec<EventCount>, TrendClientError> {
        // Nothing left to count after filtering.
        if query.event_names.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.trend_url(query.source_id)?;
        let request = TrendRequest {
            events: query
                .event_names
                .iter()
                .map(|name| TrendEvent { id: name })
                .collect(),
            date_from: query.window.start_param(),
            date_to: query.window.end_param(),
            filter_test_accounts: query.filter_test_accounts,
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| TrendClientError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(TrendClientError::UnexpectedStatus {
                status: response.status(),
            });
        }

        let payload: TrendResponse = response
            .json()
            .await
            .map_err(|err| TrendClientError::Decode(err.to_string()))?;

        pair_counts(query.event_names, payload.result)
    }
}

/// Matches series to requested events by position.
fn pair_counts(
    requested: &[String],
    series: Vec<TrendSeries>,
) -> Result<Vec<EventCount>, TrendClientError> {
    if series.len() != requested.len() {
        return Err(TrendClientError::Decode(format!(
            "expected {} series, got {}",
            requested.len(),
            series.len()
        )));
    }

    requested
        .iter()
        .zip(series)
        .map(|(name, entry)| {
            whole_count(&entry.count)
                .map(|count| EventCount::new(name.clone(), count))
                .ok_or_else(|| {
                    TrendClientError::Decode(format!("invalid count {} for {name}", entry.count))
                })
        })
        .collect()
}

/// Accepts JSON integers and integral floats; rejects negatives and fractions.
fn whole_count(value: &Number) -> Option<u64> {
    if let Some(count) = value.as_u64() {
        return Some(count);
    }

    value
        .as_f64()
        .filter(|count| count.is_finite() && *count >= 0.0 && count.fract() == 0.0)
        .filter(|count| *count <= u64::MAX as f64)
        .map(|count| count as u64)
}

fn encode_path_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

#[derive(Debug, Serialize)]
struct TrendRequest<'a> {
    events: Vec<TrendEvent<'a>>,
    date_from: String,
    date_to: String,
    filter_test_accounts: bool,
}

#[derive(Debug, Serialize)]
struct TrendEvent<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TrendResponse {
    result: Vec<TrendSeries>,
}

#[derive(Debug, Deserialize)]
struct TrendSeries {
    count: Number,
}

#[derive(Debug, Error)]
pub enum TrendClientError {
    #[error("invalid trend url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("trend HTTP request failed: {0}")]
    Http(String),
    #[error("trend API returned unexpected status {status}")]
    UnexpectedStatus { status: reqwest::StatusCode },
    #[error("failed to decode trend response: {0}")]
    Decode(String),
}
