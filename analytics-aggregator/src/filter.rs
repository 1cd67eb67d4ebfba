use analytics_core::serde_utils::null_as_false;
use serde::Deserialize;

use crate::source::{EventSource, AIRDROP_REWARD_EVENT, WLD_CLAIM_EVENT};

/// Event categories a caller may exclude from the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    WldClaims,
    Airdrops,
    Phones,
}

impl Category {
    /// Analytics event counted for this category, if any is configured.
    pub fn event_name(self) -> Option<&'static str> {
        match self {
            Category::WldClaims => Some(WLD_CLAIM_EVENT),
            Category::Airdrops => Some(AIRDROP_REWARD_EVENT),
            // No phone verification event is tracked yet.
            Category::Phones => None,
        }
    }
}

/// Caller-supplied switches; an absent or `null` flag means "include".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterFlags {
    #[serde(deserialize_with = "null_as_false")]
    pub filter_dev_portal: bool,
    #[serde(deserialize_with = "null_as_false")]
    pub filter_wld_claims: bool,
    #[serde(deserialize_with = "null_as_false")]
    pub filter_airdrops: bool,
    #[serde(deserialize_with = "null_as_false")]
    pub filter_phones: bool,
    #[serde(deserialize_with = "null_as_false")]
    pub filter_tests: bool,
}

impl FilterFlags {
    pub fn excluded_categories(&self) -> Vec<Category> {
        [
            (self.filter_wld_claims, Category::WldClaims),
            (self.filter_airdrops, Category::Airdrops),
            (self.filter_phones, Category::Phones),
        ]
        .into_iter()
        .filter_map(|(set, category)| set.then_some(category))
        .collect()
    }

    /// Whether the authoritative ledger count takes part in the total.
    pub fn includes_ledger(&self) -> bool {
        !self.filter_dev_portal
    }
}

/// Returns a per-call copy of `sources` with excluded categories removed.
///
/// The configured list is never touched. Sources left with no events are
/// kept; disabled sources are kept too and skipped later at dispatch.
pub fn filter_sources(sources: &[EventSource], flags: &FilterFlags) -> Vec<EventSource> {
    let excluded: Vec<&'static str> = flags
        .excluded_categories()
        .into_iter()
        .filter_map(Category::event_name)
        .collect();

    sources
        .iter()
        .map(|source| {
            let mut copy = source.clone();
            for event_name in &excluded {
                copy.remove_event(event_name);
            }
            copy
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::default_sources;

    fn configured() -> Vec<EventSource> {
        default_sources(Some("app".into()), Some("id".into()))
    }

    #[test]
    fn no_flags_keeps_every_event() {
        let sources = configured();
        assert_eq!(filter_sources(&sources, &FilterFlags::default()), sources);
    }

    #[test]
    fn removes_flagged_categories_without_touching_configuration() {
        let sources = configured();
        let flags = FilterFlags {
            filter_wld_claims: true,
            ..FilterFlags::default()
        };

        let filtered = filter_sources(&sources, &flags);

        assert_eq!(filtered[0].event_names, vec![AIRDROP_REWARD_EVENT]);
        assert_eq!(sources[0].event_names, vec![WLD_CLAIM_EVENT, AIRDROP_REWARD_EVENT]);
        assert_eq!(filtered[1], sources[1]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let flags = FilterFlags {
            filter_wld_claims: true,
            filter_airdrops: true,
            filter_phones: true,
            ..FilterFlags::default()
        };
        let once = filter_sources(&configured(), &flags);
        let twice = filter_sources(&once, &flags);
        assert_eq!(once, twice);
    }

    #[test]
    fn emptied_sources_are_kept() {
        let flags = FilterFlags {
            filter_wld_claims: true,
            filter_airdrops: true,
            ..FilterFlags::default()
        };
        let filtered = filter_sources(&configured(), &flags);
        assert_eq!(filtered.len(), 2);
        assert!(filtered[0].event_names.is_empty());
        assert!(filtered[0].is_enabled());
    }

    #[test]
    fn phone_flag_is_a_no_op() {
        let flags = FilterFlags {
            filter_phones: true,
            ..FilterFlags::default()
        };
        assert_eq!(filter_sources(&configured(), &flags), configured());
    }

    #[test]
    fn flags_deserialize_with_defaults() {
        let flags: FilterFlags =
            serde_json::from_str(r#"{"filter_airdrops": true}"#).expect("flags");
        assert!(flags.filter_airdrops);
        assert!(flags.includes_ledger());
        assert_eq!(flags.excluded_categories(), vec![Category::Airdrops]);
    }
}
