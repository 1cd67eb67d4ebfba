use std::sync::Arc;
use std::time::Duration;

use analytics_core::errors::{AnalyticsError, Result};
use futures::future::try_join_all;
use tracing::{debug, info, instrument, warn};

use crate::filter::{filter_sources, FilterFlags};
use crate::ledger::{LedgerSource, LEDGER_SOURCE};
use crate::reduce::{aggregate_count, TrendQueryResult};
use crate::source::{EventAllowList, EventSource, ALLOWED_EVENTS};
use crate::trends::{TrendQuery, TrendSource};
use crate::window::TimeWindow;

/// Deadline applied to a whole fan-out when none is configured.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(15);

/// Static inputs of the aggregator, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub sources: Vec<EventSource>,
    pub allowed_events: Vec<String>,
    pub deadline: Duration,
}

impl AggregatorConfig {
    pub fn new(sources: Vec<EventSource>) -> Self {
        Self {
            sources,
            allowed_events: ALLOWED_EVENTS.iter().map(|name| name.to_string()).collect(),
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// Fans out one ledger query and one trend query per enabled source and
/// reduces the answers to a single count.
#[derive(Clone)]
pub struct Aggregator {
    ledger: Arc<dyn LedgerSource>,
    trends: Arc<dyn TrendSource>,
    sources: Arc<[EventSource]>,
    allow_list: Arc<EventAllowList>,
    deadline: Duration,
}

impl Aggregator {
    pub fn new(
        ledger: Arc<dyn LedgerSource>,
        trends: Arc<dyn TrendSource>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            ledger,
            trends,
            sources: config.sources.into(),
            allow_list: Arc::new(EventAllowList::new(config.allowed_events)),
            deadline: config.deadline,
        }
    }

    /// Configured sources, as loaded at startup.
    pub fn sources(&self) -> &[EventSource] {
        &self.sources
    }

    /// Counts verifications across the ledger and every configured source.
    #[instrument(skip_all, fields(start = %window.start_param(), end = %window.end_param()))]
    pub async fn count(&self, window: &TimeWindow, flags: &FilterFlags) -> Result<u64> {
        let sources = filter_sources(&self.sources, flags);
        self.fan_out(window, flags.filter_tests, flags.includes_ledger(), &sources)
            .await
    }

    /// Counts caller-chosen events over the given sources, without the ledger.
    #[instrument(skip_all, fields(start = %window.start_param(), end = %window.end_param()))]
    pub async fn count_events(
        &self,
        window: &TimeWindow,
        filter_tests: bool,
        sources: &[EventSource],
    ) -> Result<u64> {
        self.fan_out(window, filter_tests, false, sources).await
    }

    async fn fan_out(
        &self,
        window: &TimeWindow,
        filter_tests: bool,
        include_ledger: bool,
        sources: &[EventSource],
    ) -> Result<u64> {
        let mut enabled = Vec::with_capacity(sources.len());
        for source in sources {
            match source.source_id.as_deref() {
                Some(source_id) => {
                    self.allow_list.check_source(source)?;
                    enabled.push((source, source_id));
                }
                None => debug!(source = %source.label, "skipping disabled source"),
            }
        }

        let ledger = async {
            if !include_ledger {
                return Ok(0);
            }
            self.ledger.distinct_count(window).await.map_err(|err| {
                warn!(source = LEDGER_SOURCE, %err, "ledger query failed");
                AnalyticsError::source_unavailable(LEDGER_SOURCE, err)
            })
        };
        let trends = try_join_all(
            enabled
                .iter()
                .map(|(source, source_id)| self.query_source(source, source_id, window, filter_tests)),
        );

        let (authoritative, results) = tokio::time::timeout(self.deadline, async {
            futures::try_join!(ledger, trends)
        })
        .await
        .map_err(|_| {
            warn!(deadline = ?self.deadline, "aggregation deadline elapsed");
            AnalyticsError::source_unavailable(
                "aggregation",
                format!("deadline of {:?} elapsed", self.deadline),
            )
        })??;

        let total = aggregate_count(authoritative, &results);
        info!(authoritative, sources = results.len(), total, "aggregated verification count");
        Ok(total)
    }

    async fn query_source(
        &self,
        source: &EventSource,
        source_id: &str,
        window: &TimeWindow,
        filter_tests: bool,
    ) -> Result<TrendQueryResult> {
        let query = TrendQuery {
            source_id,
            event_names: &source.event_names,
            window,
            filter_test_accounts: filter_tests,
        };

        let counts = self.trends.trend(&query).await.map_err(|err| {
            warn!(source = %source.label, %err, "trend query failed");
            AnalyticsError::source_unavailable(&source.label, err)
        })?;

        let result = TrendQueryResult {
            source_label: source.label.clone(),
            counts,
        };
        if !result.matches_request(&source.event_names) {
            warn!(source = %source.label, "trend result does not match the requested events");
            return Err(AnalyticsError::source_unavailable(
                &source.label,
                "trend result does not match the requested events",
            ));
        }

        debug!(source = %source.label, subtotal = result.total(), "trend query answered");
        Ok(result)
    }
}
