//! Verification analytics.
//!
//! Two services share this workspace:
//!
//! * [`aggregator`] counts verifications over a time window by combining an
//!   authoritative ledger count with per-event counts from analytics projects.
//! * [`relay`] authenticates on-chain activity webhooks and re-emits each
//!   record as an analytics event.
//!
//! [`gateway`] serves both over HTTP; [`common`] holds the shared error
//! taxonomy, configuration helpers and logging setup.

pub use analytics_aggregator as aggregator;
pub use analytics_core as common;
pub use analytics_gateway as gateway;
pub use analytics_relay as relay;

pub use analytics_aggregator::{Aggregator, AggregatorConfig, FilterFlags, TimeWindow};
pub use analytics_core::AnalyticsError;
pub use analytics_gateway::{start_gateway, GatewayHandle};
pub use analytics_relay::{Relay, SignatureVerifier};
