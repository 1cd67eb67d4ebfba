use std::time::Duration;

use analytics_aggregator::{default_sources, AggregatorConfig};
use analytics_core::config::{
    optional_env, parse_env, parse_flag, read_http_url, required_env, Environment,
};
use analytics_core::errors::ConfigError;
use tracing::warn;

pub const DEFAULT_BIND: &str = "0.0.0.0:8070";
pub const DEFAULT_LEDGER_URL: &str = "https://developer.worldcoin.org/api/v1/graphql";
pub const DEFAULT_TRENDS_URL: &str = "https://app.posthog.com/api/projects";
pub const DEFAULT_CAPTURE_URL: &str = "https://app.posthog.com";

/// Gateway configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_address: String,
    pub environment: Environment,
    pub aggregator: AggregatorConfig,
    pub upstreams: UpstreamConfig,
    pub relay: RelayConfig,
    pub security: SecurityConfig,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_address =
            optional_env("ANALYTICS_BIND")?.unwrap_or_else(|| DEFAULT_BIND.to_string());

        let sources = default_sources(
            optional_env("WORLD_APP_POSTHOG_PROJECT_ID")?,
            optional_env("WORLD_ID_POSTHOG_PROJECT_ID")?,
        );
        let environment = Environment::from_env();
        let mut aggregator = AggregatorConfig::new(sources);
        aggregator.deadline =
            Duration::from_millis(parse_env::<u64>("AGGREGATION_TIMEOUT_MS", 15_000)?.max(100));

        Ok(Self {
            bind_address,
            environment,
            aggregator,
            upstreams: UpstreamConfig::from_env(environment)?,
            relay: RelayConfig::from_env(environment)?,
            security: SecurityConfig::from_env(environment)?,
        })
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    /// Logs settings that leave part of the service unable to answer.
    pub fn warn_incomplete(&self) {
        for source in self.aggregator.sources.iter().filter(|source| !source.is_enabled()) {
            warn!(source = %source.label, "analytics project id not set; source is skipped");
        }
        if self.upstreams.ledger_key.is_none() {
            warn!("DEV_PORTAL_ANALYTICS_KEY not set");
        }
        if self.upstreams.trends_key.is_none() {
            warn!("POSTHOG_PRIVATE_KEY not set");
        }
        if self.security.api_secret.is_none() {
            warn!("ANALYTICS_API_SECRET not set; aggregation requests will be rejected");
        }
        if self.relay.signing_key.is_none() {
            warn!("ALCHEMY_SIGNING_KEY not set; webhooks will be rejected");
        }
        if self.relay.project_key.is_none() {
            warn!("WORLD_ID_POSTHOG_PROJECT_KEY not set; webhook events will not be captured");
        }
    }
}

/// Backends queried by the aggregator.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub ledger_url: String,
    pub ledger_key: Option<String>,
    pub ledger_production_only: bool,
    pub trends_url: String,
    pub trends_key: Option<String>,
    pub request_timeout: Duration,
}

impl UpstreamConfig {
    pub fn from_env(environment: Environment) -> Result<Self, ConfigError> {
        Ok(Self {
            ledger_url: read_http_url("DEV_PORTAL_URL", DEFAULT_LEDGER_URL)?,
            ledger_key: credential("DEV_PORTAL_ANALYTICS_KEY", environment)?,
            ledger_production_only: parse_flag("LEDGER_PRODUCTION_ONLY", true)?,
            trends_url: read_http_url("POSTHOG_URL", DEFAULT_TRENDS_URL)?,
            trends_key: credential("POSTHOG_PRIVATE_KEY", environment)?,
            request_timeout: Duration::from_millis(
                parse_env::<u64>("UPSTREAM_TIMEOUT_MS", 10_000)?.max(100),
            ),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub signing_key: Option<String>,
    pub capture_url: String,
    pub project_key: Option<String>,
}

impl RelayConfig {
    pub fn from_env(environment: Environment) -> Result<Self, ConfigError> {
        Ok(Self {
            signing_key: credential("ALCHEMY_SIGNING_KEY", environment)?,
            capture_url: read_http_url("POSTHOG_CAPTURE_URL", DEFAULT_CAPTURE_URL)?,
            project_key: optional_env("WORLD_ID_POSTHOG_PROJECT_KEY")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub api_secret: Option<String>,
    pub max_concurrent_requests: usize,
}

impl SecurityConfig {
    pub fn from_env(environment: Environment) -> Result<Self, ConfigError> {
        Ok(Self {
            api_secret: credential("ANALYTICS_API_SECRET", environment)?,
            max_concurrent_requests: parse_env::<usize>("GATEWAY_MAX_CONCURRENCY", 128)?.max(1),
        })
    }
}

/// Credentials are mandatory in production; elsewhere a missing one only
/// disables the part of the service that needs it.
fn credential(key: &'static str, environment: Environment) -> Result<Option<String>, ConfigError> {
    if environment.is_production() {
        required_env(key).map(Some)
    } else {
        optional_env(key)
    }
}
