//! Cohort reports.
//!
//! Each report walks the live articles of a [`SnapshotSource`] and computes
//! one row per article. A failure for one article becomes a
//! [`SkippedEntity`] and never aborts the rest of the cohort.

mod attribution;
mod engagement;
mod impact;
mod quality;
mod reconciliation;
mod timeline;
mod timing;
mod velocity;

use devpulse_core::{ArticleInfo, EntityId};
use serde::Serialize;

use crate::error::EngineError;
use crate::source::SnapshotSource;

pub use attribution::{
    follower_attribution_report, publication_gain_report, FollowerAttributionReport,
    PublicationGainRow,
};
pub use engagement::{
    engagement_report, referrer_report, DomainShare, EngagementRow, ReferrerRow, DIRECT_TRAFFIC,
};
pub use impact::{impact_report, ImpactReport, ImpactRow, SkippedEvent};
pub use quality::{
    completion_pct, long_tail_report, quality_report, quality_score, read_time_report,
    LongTailRow, QualityRow, ReadTimeRow, DEFAULT_READING_MINUTES, ENGAGEMENT_CAP_PCT,
    LONG_TAIL_MIN_AGE_DAYS, LONG_TAIL_MIN_RECENT_VIEWS, MIN_SCORED_VIEWS,
};
pub use reconciliation::{reconciliation_report, ReconciliationRow};
pub use timeline::{
    apply_content_changes, detect_content_changes, milestone_timeline, DetectionSummary,
    MilestoneTimeline,
};
pub use timing::{publishing_times_report, PublishingSlot, PublishingTimesReport};
pub use velocity::{velocity_report, VelocityRow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntity {
    pub entity_id: EntityId,
    pub reason: String,
}

/// Rows for every article that could be computed, and why the others could not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report<T> {
    pub rows: Vec<T>,
    pub skipped: Vec<SkippedEntity>,
}

impl<T> Default for Report<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Report<T> {
    pub(crate) fn push(&mut self, entity_id: EntityId, outcome: Result<T, EngineError>) {
        match outcome {
            Ok(row) => self.rows.push(row),
            Err(e) => self.skip(entity_id, &e),
        }
    }

    pub(crate) fn skip(&mut self, entity_id: EntityId, error: &EngineError) {
        tracing::debug!(article = entity_id, error = %error, "skipping article");
        self.skipped.push(SkippedEntity {
            entity_id,
            reason: error.to_string(),
        });
    }
}

/// Published, non-deleted articles, optionally narrowed to one id.
#[must_use]
pub fn cohort<S>(source: &S, only: Option<EntityId>) -> Vec<ArticleInfo>
where
    S: SnapshotSource + ?Sized,
{
    source
        .articles()
        .into_iter()
        .filter(|a| a.is_live())
        .filter(|a| only.is_none_or(|id| a.id == id))
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures;
