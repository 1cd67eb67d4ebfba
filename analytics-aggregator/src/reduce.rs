/// Count reported for one requested event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCount {
    pub event_name: String,
    pub count: u64,
}

impl EventCount {
    pub fn new(event_name: impl Into<String>, count: u64) -> Self {
        Self {
            event_name: event_name.into(),
            count,
        }
    }
}

/// Per-event counts returned by one analytics source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendQueryResult {
    pub source_label: String,
    pub counts: Vec<EventCount>,
}

impl TrendQueryResult {
    /// Whether the result holds exactly one count per requested event.
    pub fn matches_request(&self, requested: &[String]) -> bool {
        self.counts.len() == requested.len()
            && requested
                .iter()
                .all(|name| self.counts.iter().any(|count| &count.event_name == name))
    }

    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, entry| acc.saturating_add(entry.count))
    }
}

/// Authoritative count plus the per-source subtotals.
pub fn aggregate_count(authoritative: u64, results: &[TrendQueryResult]) -> u64 {
    results
        .iter()
        .map(TrendQueryResult::total)
        .fold(authoritative, u64::saturating_add)
}
