use std::sync::Arc;

use analytics_aggregator::api::{router as aggregation_router, AggregationState};
use analytics_aggregator::{Aggregator, LedgerClient, TrendClient};
use analytics_relay::{
    router as relay_router, CaptureClient, DisabledSink, EventSink, Relay, RelayState,
    SignatureVerifier,
};
use anyhow::Context;
use axum::middleware;
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::health::{router as health_router, HealthState};
use crate::security::{enforce_api_secret, SecurityState};

/// Assembles every route of the gateway from its configuration.
pub fn build_app(config: &GatewayConfig) -> anyhow::Result<Router> {
    let client = reqwest::Client::builder()
        .timeout(config.upstreams.request_timeout)
        .build()
        .context("failed to build upstream HTTP client")?;

    let aggregator = build_aggregator(client.clone(), config)?;
    let security = SecurityState::new(&config.security);
    let aggregation = aggregation_router(AggregationState::new(aggregator))
        .route_layer(middleware::from_fn_with_state(security, enforce_api_secret));

    let relay = build_relay(client, config)?;
    let webhook = relay_router(RelayState::new(relay));

    let health = health_router(HealthState::new(config));

    Ok(Router::new()
        .merge(aggregation)
        .merge(webhook)
        .merge(health)
        .layer(ConcurrencyLimitLayer::new(
            config.security.max_concurrent_requests,
        ))
        .layer(TraceLayer::new_for_http()))
}

fn build_aggregator(client: reqwest::Client, config: &GatewayConfig) -> anyhow::Result<Aggregator> {
    let upstreams = &config.upstreams;
    let ledger = LedgerClient::new(
        client.clone(),
        &upstreams.ledger_url,
        upstreams.ledger_key.clone().unwrap_or_default(),
        upstreams.ledger_production_only,
    )
    .context("invalid ledger endpoint")?;
    let trends = TrendClient::new(
        client,
        &upstreams.trends_url,
        upstreams.trends_key.clone().unwrap_or_default(),
    )
    .context("invalid trend endpoint")?;

    Ok(Aggregator::new(
        Arc::new(ledger),
        Arc::new(trends),
        config.aggregator.clone(),
    ))
}

fn build_relay(client: reqwest::Client, config: &GatewayConfig) -> anyhow::Result<Relay> {
    let verifier = match &config.relay.signing_key {
        Some(key) => SignatureVerifier::new(key.as_bytes()),
        None => SignatureVerifier::unconfigured(),
    };

    let sink: Arc<dyn EventSink> = match &config.relay.project_key {
        Some(key) => Arc::new(
            CaptureClient::new(client, &config.relay.capture_url, key.clone())
                .context("invalid capture endpoint")?,
        ),
        None => Arc::new(DisabledSink),
    };

    Ok(Relay::new(verifier, sink))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use analytics_aggregator::{default_sources, AggregatorConfig};
    use analytics_core::config::Environment;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{RelayConfig, SecurityConfig, UpstreamConfig};

    fn config(api_secret: Option<&str>) -> GatewayConfig {
        GatewayConfig {
            bind_address: "127.0.0.1:0".into(),
            environment: Environment::Development,
            aggregator: AggregatorConfig::new(default_sources(Some("1".into()), None)),
            upstreams: UpstreamConfig {
                ledger_url: "http://127.0.0.1:9/graphql".into(),
                ledger_key: None,
                ledger_production_only: true,
                trends_url: "http://127.0.0.1:9/api/projects".into(),
                trends_key: None,
                request_timeout: Duration::from_millis(200),
            },
            relay: RelayConfig {
                signing_key: Some("whsec".into()),
                capture_url: "http://127.0.0.1:9".into(),
                project_key: None,
            },
            security: SecurityConfig {
                api_secret: api_secret.map(str::to_string),
                max_concurrent_requests: 4,
            },
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public_and_reports_configuration() {
        let app = build_app(&config(Some("secret"))).unwrap();
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sources"][0]["enabled"], true);
        assert_eq!(body["sources"][1]["enabled"], false);
        assert_eq!(body["relay"]["signing_key_configured"], true);
        assert_eq!(body["relay"]["sink_configured"], false);
    }

    #[tokio::test]
    async fn aggregation_routes_require_the_secret() {
        for uri in ["/api/v1/verifications", "/api/verifications"] {
            let app = build_app(&config(Some("secret"))).unwrap();
            let response = app
                .oneshot(
                    Request::post(uri)
                        .header(header::AUTHORIZATION, "Bearer wrong")
                        .body(Body::from("{}"))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");

            let body = json_body(response).await;
            assert_eq!(body["success"], false);
            assert!(body.get("count").is_none());
        }
    }

    #[tokio::test]
    async fn unset_secret_rejects_every_aggregation_request() {
        let app = build_app(&config(None)).unwrap();
        let response = app
            .oneshot(
                Request::post("/api/v1/verifications")
                    .header(header::AUTHORIZATION, "Bearer ")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn webhook_route_is_not_behind_the_api_secret() {
        let app = build_app(&config(Some("secret"))).unwrap();
        let response = app
            .oneshot(
                Request::post("/api/v1/webhook")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        // Rejected by the signature check rather than the bearer secret.
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }
}
