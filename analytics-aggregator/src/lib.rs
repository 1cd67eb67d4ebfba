//! Verification count aggregation.
//!
//! Combines one authoritative distinct count from the ledger backend with
//! per-event trend counts from any number of analytics projects. Category
//! filters are applied to a per-call copy of the configured sources before
//! the queries fan out, and any failing query fails the whole count.

pub mod aggregator;
pub mod api;
pub mod filter;
pub mod ledger;
pub mod reduce;
pub mod source;
pub mod trends;
pub mod window;

pub use aggregator::{Aggregator, AggregatorConfig, DEFAULT_DEADLINE};
pub use api::{AggregationState, CountResponse};
pub use filter::{filter_sources, Category, FilterFlags};
pub use ledger::{LedgerClient, LedgerClientError, LedgerSource};
pub use reduce::{aggregate_count, EventCount, TrendQueryResult};
pub use source::{default_sources, EventAllowList, EventSource, ALLOWED_EVENTS};
pub use trends::{TrendClient, TrendClientError, TrendQuery, TrendSource};
pub use window::TimeWindow;
