use analytics_core::errors::{AnalyticsError, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};

/// Start of the window used when the caller does not provide one.
pub const DEFAULT_WINDOW_START: &str = "2022-01-01";

/// Half-open interval `[start, end)` the counts are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(AnalyticsError::InvalidTimeWindow(format!(
                "start {} is after end {}",
                render(&start),
                render(&end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Builds a window from optional caller-supplied bounds. Blank or
    /// missing bounds fall back to [`DEFAULT_WINDOW_START`] and `now`.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>, now: DateTime<Utc>) -> Result<Self> {
        let start = match non_blank(start) {
            Some(raw) => parse_timestamp(raw)?,
            None => parse_timestamp(DEFAULT_WINDOW_START)?,
        };
        let end = match non_blank(end) {
            Some(raw) => parse_timestamp(raw)?,
            None => now,
        };
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Start bound as sent to the backends.
    pub fn start_param(&self) -> String {
        render(&self.start)
    }

    /// End bound as sent to the backends.
    pub fn end_param(&self) -> String {
        render(&self.end)
    }
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| AnalyticsError::InvalidTimeWindow(format!("unrecognised timestamp {raw:?}")))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|raw| !raw.trim().is_empty())
}

fn render(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
