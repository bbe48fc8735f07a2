use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use devpulse_core::{EntityId, EventType, MilestoneEvent};
use serde::Serialize;

use super::{cohort, SkippedEntity};
use crate::content::{detect_content_change, ContentChange};
use crate::source::{MilestoneSink, SnapshotSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MilestoneTimeline {
    pub rows: Vec<MilestoneEvent>,
    pub skipped: Vec<SkippedEntity>,
    pub counts: BTreeMap<EventType, usize>,
}

/// Every logged milestone in time order, with a count per type.
///
/// Milestones that point at an article the source does not know are skipped.
pub fn milestone_timeline<S>(source: &S, only: Option<EntityId>) -> MilestoneTimeline
where
    S: SnapshotSource + ?Sized,
{
    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    let mut counts = BTreeMap::new();

    for event in source.milestones(only) {
        if let Some(id) = event.entity_id {
            if source.article(id).is_none() {
                tracing::debug!(article = id, "milestone references unknown article");
                skipped.push(SkippedEntity {
                    entity_id: id,
                    reason: format!("unknown article: {}", event.description),
                });
                continue;
            }
        }
        *counts.entry(event.event_type).or_insert(0) += 1;
        rows.push(event);
    }

    MilestoneTimeline {
        rows,
        skipped,
        counts,
    }
}

/// Compare every live article with its last recorded version. Unchanged
/// articles are left out.
pub fn detect_content_changes<S>(
    source: &S,
    now: DateTime<Utc>,
    only: Option<EntityId>,
) -> Vec<ContentChange>
where
    S: SnapshotSource + ?Sized,
{
    cohort(source, only)
        .into_iter()
        .map(|article| {
            let last_known = source.latest_content_version(article.id);
            detect_content_change(
                article.id,
                &article.title,
                &article.tags,
                last_known.as_ref(),
                now,
            )
        })
        .filter(|change| *change != ContentChange::Unchanged)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetectionSummary {
    pub versions_recorded: usize,
    pub milestones_logged: usize,
    pub milestones_already_logged: usize,
}

/// Persist detected changes through `sink`.
pub fn apply_content_changes<K>(sink: &mut K, changes: Vec<ContentChange>) -> DetectionSummary
where
    K: MilestoneSink + ?Sized,
{
    let mut summary = DetectionSummary::default();
    for change in changes {
        let (version, milestone) = match change {
            ContentChange::Unchanged => continue,
            ContentChange::FirstSeen(v) | ContentChange::TagsChanged(v) => (v, None),
            ContentChange::TitleChanged { version, milestone } => (version, Some(milestone)),
        };
        sink.record_content_version(version);
        summary.versions_recorded += 1;
        if let Some(event) = milestone {
            tracing::info!(
                article = ?event.entity_id,
                description = %event.description,
                "title change detected"
            );
            if sink.record_milestone(event) {
                summary.milestones_logged += 1;
            } else {
                summary.milestones_already_logged += 1;
            }
        }
    }
    summary
}
