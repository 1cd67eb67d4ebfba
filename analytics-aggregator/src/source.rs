use std::collections::HashSet;

use analytics_core::errors::{AnalyticsError, Result};

pub const WLD_CLAIM_EVENT: &str = "WLD airdrop block claimed";
pub const AIRDROP_REWARD_EVENT: &str = "Airdrop level reward claimed";
pub const ONCHAIN_VERIFICATION_EVENT: &str = "onchain verification";

/// Verification events that may be requested from the analytics backend.
pub const ALLOWED_EVENTS: &[&str] = &[
    "World ID verification success",
    WLD_CLAIM_EVENT,
    AIRDROP_REWARD_EVENT,
    "wid verification success",
    ONCHAIN_VERIFICATION_EVENT,
];

pub const WORLD_APP_SOURCE: &str = "world-app";
pub const WORLD_ID_SOURCE: &str = "world-id";

/// One analytics project and the events counted in it.
///
/// A source without an id is disabled for the deployment and is skipped
/// by the aggregator without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSource {
    pub label: String,
    pub source_id: Option<String>,
    pub event_names: Vec<String>,
}

impl EventSource {
    /// Creates a source, dropping duplicate event names while keeping order.
    pub fn new<I, S>(label: impl Into<String>, source_id: Option<String>, event_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let event_names = event_names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| seen.insert(name.clone()))
            .collect();

        Self {
            label: label.into(),
            source_id,
            event_names,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.source_id.is_some()
    }

    pub fn contains(&self, event_name: &str) -> bool {
        self.event_names.iter().any(|name| name == event_name)
    }

    pub fn remove_event(&mut self, event_name: &str) {
        self.event_names.retain(|name| name != event_name);
    }

    /// Copy of this source counting `event_names` instead of the configured events.
    pub fn with_events<I, S>(&self, event_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(self.label.clone(), self.source_id.clone(), event_names)
    }
}

/// The two analytics projects the service counts by default.
pub fn default_sources(world_app_id: Option<String>, world_id_id: Option<String>) -> Vec<EventSource> {
    vec![
        EventSource::new(
            WORLD_APP_SOURCE,
            world_app_id,
            [WLD_CLAIM_EVENT, AIRDROP_REWARD_EVENT],
        ),
        EventSource::new(WORLD_ID_SOURCE, world_id_id, [ONCHAIN_VERIFICATION_EVENT]),
    ]
}

/// Set of event names the aggregator is willing to forward upstream.
#[derive(Debug, Clone)]
pub struct EventAllowList {
    names: HashSet<String>,
}

impl EventAllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, event_name: &str) -> bool {
        self.names.contains(event_name)
    }

    pub fn check(&self, event_name: &str) -> Result<()> {
        if self.contains(event_name) {
            Ok(())
        } else {
            Err(AnalyticsError::InvalidEventName(event_name.to_string()))
        }
    }

    /// Fails on the first event of `source` that is not allowed.
    pub fn check_source(&self, source: &EventSource) -> Result<()> {
        source
            .event_names
            .iter()
            .try_for_each(|name| self.check(name))
    }
}

impl Default for EventAllowList {
    fn default() -> Self {
        Self::new(ALLOWED_EVENTS.iter().copied())
    }
}
