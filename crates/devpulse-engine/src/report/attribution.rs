use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use devpulse_core::{counters, EngineConfig, EntityId};
use serde::Serialize;

use super::{cohort, Report, SkippedEntity};
use crate::attribution::{attribute_window, AttributionResult};
use crate::delta::{compute_delta, compute_windowed_delta, WindowedDelta};
use crate::error::EngineError;
use crate::matcher::find_nearest;
use crate::series::TimeRange;
use crate::source::SnapshotSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowerAttributionReport {
    pub follower_delta: WindowedDelta,
    pub rows: Vec<AttributionResult>,
    pub skipped: Vec<SkippedEntity>,
}

/// Distribute the follower gain over `period` across articles by their view gain.
///
/// # Errors
///
/// Returns [`EngineError::InsufficientData`] when the follower count itself
/// cannot be matched at either end of the period. Per-article failures are
/// reported as skipped rows instead.
pub fn follower_attribution_report<S>(
    source: &S,
    config: &EngineConfig,
    period: TimeRange,
    only: Option<EntityId>,
) -> Result<FollowerAttributionReport, EngineError>
where
    S: SnapshotSource + ?Sized,
{
    let tolerance = config.match_tolerance();
    let search = TimeRange::around(period.start, tolerance, period.duration() + tolerance);

    let follower_delta = compute_windowed_delta(&source.follower_series(search), period, tolerance)?;
    if follower_delta.suspicious {
        tracing::warn!(
            start = %follower_delta.start_at,
            end = %follower_delta.end_at,
            "follower delta relies on samples outside the period"
        );
    }

    let mut skipped: Report<()> = Report::default();
    let mut deltas: BTreeMap<EntityId, i64> = BTreeMap::new();
    for article in cohort(source, only) {
        let series = source.counter_series(article.id, counters::VIEWS, search);
        match compute_windowed_delta(&series, period, tolerance) {
            Ok(delta) => {
                deltas.insert(article.id, delta.gain);
            }
            Err(e) => skipped.skip(article.id, &e.for_entity(article.id)),
        }
    }

    if follower_delta.gain <= 0 {
        tracing::info!(gain = follower_delta.gain, "no follower growth to attribute");
    }

    let rows = attribute_window(
        follower_delta.gain,
        &deltas,
        period,
        config.attribution_floor_negative,
    );

    Ok(FollowerAttributionReport {
        follower_delta,
        rows,
        skipped: skipped.skipped,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationGainRow {
    pub entity_id: EntityId,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub baseline_at: DateTime<Utc>,
    pub baseline_followers: i64,
    pub end_at: DateTime<Utc>,
    pub end_followers: i64,
    /// May be negative.
    pub gain: i64,
}

/// Follower change in the days following each publication.
///
/// The baseline is the follower sample closest to the publication time with
/// no tolerance, since the account may not have been sampled around an old
/// publication date. The end of the window must match within tolerance.
pub fn publication_gain_report<S>(
    source: &S,
    config: &EngineConfig,
    only: Option<EntityId>,
) -> Report<PublicationGainRow>
where
    S: SnapshotSource + ?Sized,
{
    let followers = source.follower_series(TimeRange::all());
    let tolerance = config.match_tolerance();
    let window = config.publication_gain_window();

    let mut report = Report::default();
    for article in cohort(source, only) {
        let Some(published_at) = article.published_at else {
            continue;
        };
        let end_target = TimeRange::around(published_at, Duration::zero(), window).end;

        let outcome = find_nearest(&followers, published_at, None)
            .ok_or_else(|| EngineError::insufficient("no follower samples"))
            .and_then(|baseline| {
                let end = find_nearest(&followers, end_target, Some(tolerance)).ok_or_else(|| {
                    EngineError::insufficient(format!(
                        "no follower sample within {}h of {}",
                        tolerance.num_hours(),
                        end_target.to_rfc3339()
                    ))
                })?;
                Ok(PublicationGainRow {
                    entity_id: article.id,
                    title: article.title.clone(),
                    published_at,
                    baseline_at: baseline.at,
                    baseline_followers: baseline.value,
                    end_at: end.at,
                    end_followers: end.value,
                    gain: compute_delta(baseline.value, end.value),
                })
            });
        report.push(article.id, outcome.map_err(|e| e.for_entity(article.id)));
    }

    report
        .rows
        .sort_by(|a, b| b.gain.cmp(&a.gain).then(a.entity_id.cmp(&b.entity_id)));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::{at, Fixture};

    fn week() -> TimeRange {
        TimeRange::new(at(0), at(24 * 7))
    }

    #[test]
    fn follower_gain_is_split_by_view_gain() {
        let store = Fixture::new()
            .article(1, "Big", -500)
            .article(2, "Small", -500)
            .article(3, "Fading", -500)
            .followers(&[(0, 1_000), (168, 1_030)])
            .views(1, &[(1, 0), (167, 300)])
            .views(2, &[(2, 50), (166, 150)])
            .views(3, &[(0, 90), (168, 40)])
            .build();

        let report =
            follower_attribution_report(&store, &EngineConfig::default(), week(), None).unwrap();
        assert_eq!(report.follower_delta.gain, 30);
        assert!(report.skipped.is_empty());
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].entity_id, 1);
        assert!((report.rows[0].attributed_amount - 22.5).abs() < 1e-9);
        assert!((report.rows[1].attributed_amount - 7.5).abs() < 1e-9);
    }

    #[test]
    fn unfloored_config_lists_losers_with_zero() {
        let store = Fixture::new()
            .article(1, "Up", -500)
            .article(2, "Down", -500)
            .followers(&[(0, 10), (168, 20)])
            .views(1, &[(0, 0), (168, 10)])
            .views(2, &[(0, 10), (168, 5)])
            .build();
        let config = EngineConfig {
            attribution_floor_negative: false,
            ..EngineConfig::default()
        };
        let report = follower_attribution_report(&store, &config, week(), None).unwrap();
        assert_eq!(report.rows.len(), 2);
        let down = report.rows.iter().find(|r| r.entity_id == 2).unwrap();
        assert_eq!(down.attributed_amount, 0.0);
        assert_eq!(down.entity_delta, -5);
    }

    #[test]
    fn article_without_matches_is_skipped() {
        let store = Fixture::new()
            .article(1, "Tracked", -500)
            .article(2, "Late", -500)
            .followers(&[(0, 10), (168, 20)])
            .views(1, &[(0, 0), (168, 10)])
            .views(2, &[(100, 5)])
            .build();
        let report =
            follower_attribution_report(&store, &EngineConfig::default(), week(), None).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].entity_id, 2);
    }

    #[test]
    fn missing_follower_endpoint_fails_the_report() {
        let store = Fixture::new()
            .article(1, "A", -500)
            .followers(&[(0, 10)])
            .build();
        let result = follower_attribution_report(&store, &EngineConfig::default(), week(), None);
        assert!(matches!(result, Err(EngineError::InsufficientData { .. })));
    }

    #[test]
    fn follower_loss_attributes_nothing() {
        let store = Fixture::new()
            .article(1, "A", -500)
            .followers(&[(0, 50), (168, 40)])
            .views(1, &[(0, 0), (168, 10)])
            .build();
        let report =
            follower_attribution_report(&store, &EngineConfig::default(), week(), None).unwrap();
        assert_eq!(report.follower_delta.gain, -10);
        assert!(report.rows.is_empty());
    }

    #[test]
    fn publication_gain_uses_unbounded_baseline() {
        // Published at hour 0, but the first follower sample is 40 hours earlier.
        let store = Fixture::new()
            .article(1, "Launch", 0)
            .followers(&[(-40, 100), (24 * 7 + 2, 125)])
            .build();
        let report = publication_gain_report(&store, &EngineConfig::default(), None);
        assert!(report.skipped.is_empty());
        let row = &report.rows[0];
        assert_eq!(row.baseline_followers, 100);
        assert_eq!(row.end_followers, 125);
        assert_eq!(row.gain, 25);
        assert_eq!(row.baseline_at, at(-40));
    }

    #[test]
    fn publication_gain_without_end_sample_is_skipped() {
        let store = Fixture::new()
            .article(1, "Launch", 0)
            .article(2, "Older", -24 * 30)
            .followers(&[(-24 * 30, 10), (-24 * 23, 14), (0, 100)])
            .build();
        let report = publication_gain_report(&store, &EngineConfig::default(), None);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].entity_id, 2);
        assert_eq!(report.rows[0].gain, 4);
        assert_eq!(report.skipped[0].entity_id, 1);
    }
}
