use devpulse_core::EntityId;
use serde::Serialize;

use super::{cohort, Report};
use crate::error::EngineError;
use crate::series::TimeRange;
use crate::source::SnapshotSource;
use crate::velocity::{
    average_velocity, period_velocity, sampling_cadence, velocity_profile, SamplingCadence,
    VelocityProfile,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocityRow {
    pub entity_id: EntityId,
    pub title: String,
    pub counter: String,
    pub samples: usize,
    pub average_velocity: f64,
    pub period_velocity: f64,
    pub profile: Option<VelocityProfile>,
    pub cadence: Option<SamplingCadence>,
}

/// Per-article velocity of `counter` over `range`.
///
/// Articles without a single sample in the range are skipped; one sample
/// yields a row with zero velocity.
pub fn velocity_report<S>(
    source: &S,
    counter: &str,
    range: TimeRange,
    only: Option<EntityId>,
) -> Report<VelocityRow>
where
    S: SnapshotSource + ?Sized,
{
    let mut report = Report::default();
    for article in cohort(source, only) {
        let series = source.counter_series(article.id, counter, range);
        let outcome = if series.is_empty() {
            Err(EngineError::insufficient(format!("no {counter} samples in range")))
        } else {
            Ok(VelocityRow {
                entity_id: article.id,
                title: article.title,
                counter: counter.to_string(),
                samples: series.len(),
                average_velocity: average_velocity(&series),
                period_velocity: period_velocity(&series),
                profile: velocity_profile(&series),
                cadence: sampling_cadence(&series),
            })
        };
        report.push(article.id, outcome.map_err(|e| e.for_entity(article.id)));
    }

    report.rows.sort_by(|a, b| {
        b.average_velocity
            .total_cmp(&a.average_velocity)
            .then(a.entity_id.cmp(&b.entity_id))
    });
    report
}

#[cfg(test)]
mod tests {
    use devpulse_core::counters;

    use super::*;
    use crate::report::fixtures::{at, Fixture};

    #[test]
    fn rows_are_sorted_by_average_velocity() {
        let store = Fixture::new()
            .article(1, "Slow", -200)
            .article(2, "Fast", -200)
            .views(1, &[(0, 0), (10, 10)])
            .views(2, &[(0, 0), (10, 100)])
            .build();
        let report = velocity_report(&store, counters::VIEWS, TimeRange::new(at(0), at(24)), None);
        assert!(report.skipped.is_empty());
        let ids: Vec<_> = report.rows.iter().map(|r| r.entity_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!((report.rows[0].average_velocity - 10.0).abs() < 1e-9);
    }

    #[test]
    fn article_without_samples_is_skipped_not_zeroed() {
        let store = Fixture::new()
            .article(1, "Tracked", -200)
            .article(2, "Silent", -200)
            .views(1, &[(0, 0), (10, 10)])
            .build();
        let report = velocity_report(&store, counters::VIEWS, TimeRange::new(at(0), at(24)), None);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].entity_id, 2);
        assert!(report.skipped[0].reason.contains("article 2"));
    }

    #[test]
    fn single_sample_yields_zero_velocity_row() {
        let store = Fixture::new()
            .article(1, "Once", -200)
            .views(1, &[(5, 40)])
            .build();
        let report = velocity_report(&store, counters::VIEWS, TimeRange::new(at(0), at(24)), Some(1));
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].average_velocity, 0.0);
        assert!(report.rows[0].profile.is_none());
    }
}
