use chrono::{DateTime, NaiveDate, Utc};
use devpulse_core::{EngineConfig, EntityId, IncrementalRecord};
use serde::Serialize;

use super::{cohort, Report};
use crate::error::EngineError;
use crate::reconcile::{reconcile, windowed_sum, CounterPair, Reconciliation};
use crate::semantics::{infer_semantics, CounterSemantics};
use crate::source::SnapshotSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationRow {
    pub entity_id: EntityId,
    pub title: String,
    pub counter: String,
    pub age_days: i64,
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
    /// `None` when the daily values could not be classified.
    pub semantics: Option<CounterSemantics>,
    pub needs_verification: bool,
}

/// Lifetime counters against the daily stream, one row per article and counter pair.
pub fn reconciliation_report<S>(
    source: &S,
    config: &EngineConfig,
    now: DateTime<Utc>,
    only: Option<EntityId>,
) -> Report<ReconciliationRow>
where
    S: SnapshotSource + ?Sized,
{
    let mut report = Report::default();
    for article in cohort(source, only) {
        let Some(published_at) = article.published_at else {
            continue;
        };
        let Some(snapshot) = source.latest_snapshot(article.id) else {
            report.skip(
                article.id,
                &EngineError::insufficient("no lifetime snapshot").for_entity(article.id),
            );
            continue;
        };
        let records = source.incremental_records(article.id);
        if records.is_empty() {
            report.skip(
                article.id,
                &EngineError::insufficient("no daily analytics").for_entity(article.id),
            );
            continue;
        }

        let since = published_at.date_naive();
        let age = now - published_at;

        for pair in CounterPair::ALL {
            let Some(lifetime) = snapshot.counter(pair.lifetime) else {
                report.skip(
                    article.id,
                    &EngineError::insufficient(format!("snapshot lacks {}", pair.lifetime))
                        .for_entity(article.id),
                );
                continue;
            };

            let sum = windowed_sum(&records, pair.incremental, Some(since));
            let daily = daily_totals(&records, pair, since);
            let semantics = match infer_semantics(
                &pair.incremental.join("+"),
                &daily,
                lifetime,
                config.semantics_tolerance(),
            ) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!(
                        article = article.id,
                        counter = pair.lifetime,
                        error = %e,
                        "counter semantics need manual verification"
                    );
                    None
                }
            };

            report.rows.push(ReconciliationRow {
                entity_id: article.id,
                title: article.title.clone(),
                counter: pair.lifetime.to_string(),
                age_days: age.num_days(),
                reconciliation: reconcile(lifetime, sum, age, config.retention_window()),
                semantics,
                needs_verification: semantics.is_none(),
            });
        }
    }
    report
}

/// Per-day sum of the pair's daily counters from `since`, oldest first.
fn daily_totals(
    records: &[IncrementalRecord],
    pair: CounterPair,
    since: NaiveDate,
) -> Vec<i64> {
    records
        .iter()
        .filter(|r| r.date >= since)
        .map(|r| {
            pair.incremental
                .iter()
                .map(|n| r.counter(n))
                .fold(0i64, i64::saturating_add)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use devpulse_core::counters;

    use super::*;
    use crate::reconcile::LikelyCause;
    use crate::report::fixtures::{at, Fixture};

    #[test]
    fn old_article_gap_is_retention_truncation() {
        let store = Fixture::new()
            .article(1, "Evergreen", -24 * 200)
            .snapshot(
                1,
                0,
                &[
                    (counters::REACTIONS, 120),
                    (counters::COMMENTS, 4),
                    (counters::VIEWS, 9_000),
                ],
            )
            .daily(1, -3, &[(counters::REACTIONS_TOTAL, 60), (counters::COMMENTS_TOTAL, 4)])
            .daily(1, -2, &[(counters::REACTIONS_TOTAL, 35), (counters::REACTIONS_LIKE, 20)])
            .daily(1, -1, &[(counters::PAGE_VIEWS, 800)])
            .build();

        let report = reconciliation_report(&store, &EngineConfig::default(), at(0), None);
        assert!(report.skipped.is_empty());
        assert_eq!(report.rows.len(), 3);

        let reactions = report.rows.iter().find(|r| r.counter == "reactions").unwrap();
        assert_eq!(reactions.reconciliation.gap, 25);
        assert_eq!(
            reactions.reconciliation.likely_cause,
            LikelyCause::RetentionTruncation
        );
        assert_eq!(reactions.age_days, 200);

        let comments = report.rows.iter().find(|r| r.counter == "comments").unwrap();
        assert_eq!(comments.reconciliation.likely_cause, LikelyCause::Consistent);
    }

    #[test]
    fn json_row_is_flat() {
        let store = Fixture::new()
            .article(1, "Post", -24 * 120)
            .snapshot(1, 0, &[(counters::COMMENTS, 5)])
            .daily(1, -1, &[(counters::COMMENTS_TOTAL, 2)])
            .build();
        let report = reconciliation_report(&store, &EngineConfig::default(), at(0), None);
        let json = serde_json::to_value(&report.rows[0]).unwrap();
        assert_eq!(json["counter"], "comments");
        assert_eq!(json["gap"], 3);
        assert_eq!(json["likely_cause"], "retention_truncation");
        assert_eq!(json["needs_verification"], true);
    }

    #[test]
    fn removed_reactions_show_as_reduced_since_recorded() {
        let store = Fixture::new()
            .article(1, "Fresh", -24 * 5)
            .snapshot(1, 0, &[(counters::REACTIONS, 8)])
            .daily(1, -4, &[(counters::REACTIONS_TOTAL, 6)])
            .daily(1, -3, &[(counters::REACTIONS_TOTAL, 4)])
            .build();
        let report = reconciliation_report(&store, &EngineConfig::default(), at(0), Some(1));
        let row = report.rows.iter().find(|r| r.counter == "reactions").unwrap();
        assert_eq!(row.reconciliation.gap, -2);
        assert_eq!(
            row.reconciliation.likely_cause,
            LikelyCause::ReducedSinceRecorded
        );
        assert_eq!(row.semantics, Some(CounterSemantics::Incremental));
    }

    #[test]
    fn reactions_reconcile_against_the_daily_total() {
        let store = Fixture::new()
            .article(1, "Liked", -24 * 10)
            .snapshot(1, 0, &[(counters::REACTIONS, 10)])
            .daily(
                1,
                -2,
                &[(counters::REACTIONS_TOTAL, 10), (counters::REACTIONS_LIKE, 7)],
            )
            .build();
        let report = reconciliation_report(&store, &EngineConfig::default(), at(0), Some(1));
        let row = report.rows.iter().find(|r| r.counter == "reactions").unwrap();
        assert_eq!(row.reconciliation.windowed_sum, 10);
        assert_eq!(row.reconciliation.gap, 0);
        assert_eq!(row.reconciliation.likely_cause, LikelyCause::Consistent);
    }

    #[test]
    fn draft_period_activity_is_excluded() {
        let store = Fixture::new()
            .article(1, "Was a draft", -24 * 2)
            .snapshot(1, 0, &[(counters::COMMENTS, 3)])
            .daily(1, -5, &[(counters::COMMENTS_TOTAL, 10)])
            .daily(1, -1, &[(counters::COMMENTS_TOTAL, 3)])
            .build();
        let report = reconciliation_report(&store, &EngineConfig::default(), at(0), None);
        let row = report.rows.iter().find(|r| r.counter == "comments").unwrap();
        assert_eq!(row.reconciliation.windowed_sum, 3);
        assert_eq!(row.reconciliation.likely_cause, LikelyCause::Consistent);
    }

    #[test]
    fn missing_inputs_are_skipped_per_article() {
        let store = Fixture::new()
            .article(1, "No snapshot", -100)
            .article(2, "No daily", -100)
            .snapshot(2, 0, &[(counters::VIEWS, 1)])
            .build();
        let report = reconciliation_report(&store, &EngineConfig::default(), at(0), None);
        assert!(report.rows.is_empty());
        let skipped: Vec<_> = report.skipped.iter().map(|s| s.entity_id).collect();
        assert_eq!(skipped, vec![1, 2]);
    }

    #[test]
    fn ambiguous_semantics_are_flagged_not_guessed() {
        let store = Fixture::new()
            .article(1, "One spike", -24 * 3)
            .snapshot(1, 0, &[(counters::VIEWS, 50)])
            .daily(1, -2, &[(counters::PAGE_VIEWS, 0)])
            .daily(1, -1, &[(counters::PAGE_VIEWS, 50)])
            .build();
        let report = reconciliation_report(&store, &EngineConfig::default(), at(0), None);
        let row = report.rows.iter().find(|r| r.counter == "views").unwrap();
        assert!(row.semantics.is_none());
        assert!(row.needs_verification);
        assert_eq!(row.reconciliation.likely_cause, LikelyCause::Consistent);
    }
}
