//! Cross-checks a lifetime counter against the retention-bounded daily stream.
//!
//! The classification is advisory. Nothing here corrects stored data; daily
//! records are write-once per day and never smoothed after the fact.

use chrono::{Duration, NaiveDate};
use devpulse_core::{counters, IncrementalRecord};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LikelyCause {
    /// Older activity fell outside the daily stream's retention window.
    RetentionTruncation,
    /// Recent activity has not reached the daily stream yet.
    SyncLag,
    /// The lifetime counter dropped below the sum of recorded increments,
    /// e.g. reactions removed after they were counted.
    ReducedSinceRecorded,
    Consistent,
}

impl std::fmt::Display for LikelyCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LikelyCause::RetentionTruncation => "retention_truncation",
            LikelyCause::SyncLag => "sync_lag",
            LikelyCause::ReducedSinceRecorded => "reduced_since_recorded",
            LikelyCause::Consistent => "consistent",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub lifetime_value: i64,
    pub windowed_sum: i64,
    pub gap: i64,
    pub likely_cause: LikelyCause,
}

/// Explain the difference between a lifetime value and the sum of its daily
/// increments.
///
/// A positive gap is attributed to retention truncation when the entity is
/// strictly older than the retention window, otherwise to sync lag. The age
/// boundary is a heuristic: with irregular collection an entity just past the
/// window may still be lagging.
#[must_use]
pub fn reconcile(
    lifetime_value: i64,
    windowed_sum: i64,
    entity_age: Duration,
    retention_window: Duration,
) -> Reconciliation {
    let gap = lifetime_value.saturating_sub(windowed_sum);
    let likely_cause = match gap {
        0 => LikelyCause::Consistent,
        g if g < 0 => LikelyCause::ReducedSinceRecorded,
        _ if entity_age > retention_window => LikelyCause::RetentionTruncation,
        _ => LikelyCause::SyncLag,
    };
    Reconciliation {
        lifetime_value,
        windowed_sum,
        gap,
        likely_cause,
    }
}

/// Sum the named daily counters over every record dated on or after `since`.
///
/// Activity before `since` (typically the publication date) is ignored.
#[must_use]
pub fn windowed_sum(records: &[IncrementalRecord], names: &[&str], since: Option<NaiveDate>) -> i64 {
    records
        .iter()
        .filter(|r| since.is_none_or(|d| r.date >= d))
        .flat_map(|r| names.iter().map(move |n| r.counter(n)))
        .fold(0i64, i64::saturating_add)
}

/// A lifetime counter and the daily counters that together measure the same quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterPair {
    pub lifetime: &'static str,
    pub incremental: &'static [&'static str],
}

impl CounterPair {
    pub const REACTIONS: CounterPair = CounterPair {
        lifetime: counters::REACTIONS,
        incremental: &[counters::REACTIONS_TOTAL],
    };

    pub const COMMENTS: CounterPair = CounterPair {
        lifetime: counters::COMMENTS,
        incremental: &[counters::COMMENTS_TOTAL],
    };

    pub const VIEWS: CounterPair = CounterPair {
        lifetime: counters::VIEWS,
        incremental: &[counters::PAGE_VIEWS],
    };

    pub const ALL: [CounterPair; 3] = [Self::REACTIONS, Self::COMMENTS, Self::VIEWS];

    /// Look a pair up by its lifetime counter name.
    #[must_use]
    pub fn by_name(name: &str) -> Option<CounterPair> {
        Self::ALL.into_iter().find(|p| p.lifetime == name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    const RETENTION_DAYS: i64 = 90;

    fn retention() -> Duration {
        Duration::days(RETENTION_DAYS)
    }

    fn record(day: u32, pairs: &[(&str, i64)]) -> IncrementalRecord {
        IncrementalRecord {
            entity_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            counters: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn old_entity_with_positive_gap_is_retention_truncation() {
        let r = reconcile(120, 95, Duration::days(200), retention());
        assert_eq!(r.gap, 25);
        assert_eq!(r.likely_cause, LikelyCause::RetentionTruncation);
    }

    #[test]
    fn young_entity_with_positive_gap_is_sync_lag() {
        let r = reconcile(120, 95, Duration::days(3), retention());
        assert_eq!(r.likely_cause, LikelyCause::SyncLag);
    }

    #[test]
    fn entity_exactly_at_retention_is_sync_lag() {
        let r = reconcile(10, 5, retention(), retention());
        assert_eq!(r.likely_cause, LikelyCause::SyncLag);
    }

    #[test]
    fn negative_gap_is_reduced_since_recorded() {
        let r = reconcile(40, 44, Duration::days(10), retention());
        assert_eq!(r.gap, -4);
        assert_eq!(r.likely_cause, LikelyCause::ReducedSinceRecorded);
    }

    #[test]
    fn windowed_sum_adds_all_named_counters_from_since() {
        let records = vec![
            record(1, &[(counters::REACTIONS_LIKE, 100)]),
            record(2, &[(counters::REACTIONS_LIKE, 3), (counters::REACTIONS_UNICORN, 1)]),
            record(
                3,
                &[
                    (counters::REACTIONS_READINGLIST, 2),
                    (counters::PAGE_VIEWS, 500),
                ],
            ),
        ];
        let names = [
            counters::REACTIONS_LIKE,
            counters::REACTIONS_READINGLIST,
            counters::REACTIONS_UNICORN,
        ];
        let since = NaiveDate::from_ymd_opt(2025, 3, 2);
        let sum = windowed_sum(&records, &names, since);
        assert_eq!(sum, 6);
        let all = windowed_sum(&records, &names, None);
        assert_eq!(all, 106);
    }

    #[test]
    fn reactions_pair_reads_the_daily_total_not_the_breakdown() {
        let records = vec![record(
            1,
            &[
                (counters::REACTIONS_TOTAL, 10),
                (counters::REACTIONS_LIKE, 7),
                (counters::REACTIONS_UNICORN, 1),
            ],
        )];
        assert_eq!(windowed_sum(&records, CounterPair::REACTIONS.incremental, None), 10);
    }

    #[test]
    fn counter_pair_lookup() {
        assert_eq!(CounterPair::by_name("views"), Some(CounterPair::VIEWS));
        assert_eq!(CounterPair::by_name("follows"), None);
    }

    #[test]
    fn likely_cause_displays_snake_case() {
        assert_eq!(
            LikelyCause::ReducedSinceRecorded.to_string(),
            "reduced_since_recorded"
        );
    }

    proptest! {
        #[test]
        fn equal_values_are_always_consistent(x in any::<i64>(), age_days in 0i64..10_000) {
            let r = reconcile(x, x, Duration::days(age_days), retention());
            prop_assert_eq!(r.gap, 0);
            prop_assert_eq!(r.likely_cause, LikelyCause::Consistent);
        }
    }
}
