use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use devpulse_core::{EngineConfig, EntityId, EventType, MilestoneEvent};
use serde::Serialize;

use crate::error::EngineError;
use crate::impact::{impact, summarize_by_event_type, ImpactResult, ImpactSummary};
use crate::series::{Series, TimeRange};
use crate::source::SnapshotSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactRow {
    pub entity_id: Option<EntityId>,
    pub event_type: EventType,
    pub description: String,
    /// Counter the velocities were measured on; account-wide events use followers.
    pub measured: String,
    #[serde(flatten)]
    pub result: ImpactResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEvent {
    pub entity_id: Option<EntityId>,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactReport {
    pub rows: Vec<ImpactRow>,
    pub skipped: Vec<SkippedEvent>,
    pub summary: BTreeMap<EventType, ImpactSummary>,
}

const FOLLOWERS: &str = "followers";

/// Velocity before and after every milestone, with a per-type summary.
///
/// Article milestones are measured on `counter`; account-wide milestones on
/// the follower count. A milestone with no samples on either side is
/// skipped rather than reported as zero impact.
pub fn impact_report<S>(
    source: &S,
    config: &EngineConfig,
    counter: &str,
    only: Option<EntityId>,
) -> ImpactReport
where
    S: SnapshotSource + ?Sized,
{
    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for event in source.milestones(only) {
        let window = TimeRange::around(
            event.occurred_at,
            config.impact_before(),
            config.impact_after(),
        );
        let (series, measured): (Series, &str) = match event.entity_id {
            Some(id) => (source.counter_series(id, counter, window), counter),
            None => (source.follower_series(window), FOLLOWERS),
        };

        match measure(&event, &series, config) {
            Ok(result) => rows.push(ImpactRow {
                entity_id: event.entity_id,
                event_type: event.event_type,
                description: event.description,
                measured: measured.to_string(),
                result,
            }),
            Err(e) => {
                tracing::debug!(
                    article = ?event.entity_id,
                    occurred_at = %event.occurred_at,
                    error = %e,
                    "skipping milestone"
                );
                skipped.push(SkippedEvent {
                    entity_id: event.entity_id,
                    occurred_at: event.occurred_at,
                    description: event.description,
                    reason: e.to_string(),
                });
            }
        }
    }

    let summary = summarize_by_event_type(rows.iter().map(|r| (r.event_type, r.result.impact_pct)));
    ImpactReport {
        rows,
        skipped,
        summary,
    }
}

fn measure(
    event: &MilestoneEvent,
    series: &Series,
    config: &EngineConfig,
) -> Result<ImpactResult, EngineError> {
    if series.is_empty() {
        let err = EngineError::insufficient(format!(
            "no samples within {}h before or {}h after the event",
            config.impact_before_hours, config.impact_after_hours
        ));
        return Err(match event.entity_id {
            Some(id) => err.for_entity(id),
            None => err,
        });
    }
    Ok(impact(
        event.occurred_at,
        config.impact_before(),
        config.impact_after(),
        series,
    ))
}

#[cfg(test)]
mod tests {
    use devpulse_core::counters;

    use super::*;
    use crate::impact::NEW_ACTIVITY_PCT;
    use crate::report::fixtures::{at, Fixture};

    #[test]
    fn article_and_account_events_are_measured_on_their_series() {
        let store = Fixture::new()
            .article(1, "Post", -500)
            .views(1, &[(-24, 0), (0, 24), (24, 96)])
            .followers(&[(-24, 100), (0, 100), (24, 124)])
            .milestone(Some(1), EventType::StaffCurated, "Featured", 0)
            .milestone(None, EventType::Manual, "Conference talk", 0)
            .build();

        let report = impact_report(&store, &EngineConfig::default(), counters::VIEWS, None);
        assert!(report.skipped.is_empty());
        assert_eq!(report.rows.len(), 2);

        let curated = report
            .rows
            .iter()
            .find(|r| r.event_type == EventType::StaffCurated)
            .unwrap();
        assert_eq!(curated.measured, "views");
        assert!((curated.result.impact_pct - 200.0).abs() < 1e-9);

        let talk = report
            .rows
            .iter()
            .find(|r| r.event_type == EventType::Manual)
            .unwrap();
        assert_eq!(talk.measured, "followers");
        assert_eq!(talk.result.impact_pct, NEW_ACTIVITY_PCT);

        assert_eq!(report.summary[&EventType::StaffCurated].count, 1);
        assert_eq!(report.summary[&EventType::Manual].count, 1);
    }

    #[test]
    fn event_without_nearby_samples_is_skipped() {
        let store = Fixture::new()
            .article(1, "Post", -500)
            .views(1, &[(-400, 0), (-300, 10)])
            .milestone(Some(1), EventType::TitleChange, "Renamed", 0)
            .build();
        let report = impact_report(&store, &EngineConfig::default(), counters::VIEWS, None);
        assert!(report.rows.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].entity_id, Some(1));
        assert!(report.summary.is_empty());
        assert_eq!(report.skipped[0].occurred_at, at(0));
    }
}
