use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;

use crate::errors::{AnalyticsError, Result};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Connection-level chatter from the HTTP stack, capped unless `RUST_LOG`
/// says otherwise.
const QUIET_TARGETS: [&str; 3] = ["hyper", "h2", "reqwest"];

/// Filter used when `RUST_LOG` is unset: `level` for our crates, `warn`
/// for the HTTP stack.
pub fn default_directives(level: Option<&str>) -> String {
    let level = level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL);

    QUIET_TARGETS
        .iter()
        .fold(level.to_string(), |directives, target| {
            format!("{directives},{target}=warn")
        })
}

/// Installs the global subscriber. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(level))
            .map_err(|err| AnalyticsError::Config(format!("invalid log level: {err}")))?,
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .try_init()
        .map_err(|err| AnalyticsError::General(err.to_string()))
}
