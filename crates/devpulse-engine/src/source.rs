//! Read-only data access for the engine, plus the milestone append path.
//!
//! The engine never owns a connection. Callers materialize a source (usually
//! a [`MemoryStore`] loaded from Postgres) before any computation runs.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use devpulse_core::{
    ArticleInfo, CommentRecord, ContentVersion, EntityId, FollowerSnapshot, IncrementalRecord,
    MetricSnapshot, MilestoneEvent, ReferrerCount,
};

use crate::series::{Series, TimeRange};

/// Capability: given an entity and a time range, return ordered samples.
pub trait SnapshotSource {
    /// All known articles, ordered by id.
    fn articles(&self) -> Vec<ArticleInfo>;

    fn article(&self, id: EntityId) -> Option<ArticleInfo>;

    /// One lifetime counter of one article, restricted to `range`.
    fn counter_series(&self, entity_id: EntityId, counter: &str, range: TimeRange) -> Series;

    fn latest_snapshot(&self, entity_id: EntityId) -> Option<MetricSnapshot>;

    fn follower_series(&self, range: TimeRange) -> Series;

    /// Daily records of one article, oldest first.
    fn incremental_records(&self, entity_id: EntityId) -> Vec<IncrementalRecord>;

    fn referrers(&self, entity_id: EntityId) -> Vec<ReferrerCount>;

    fn comments(&self, entity_id: EntityId) -> Vec<CommentRecord>;

    /// Milestones of one article, or every milestone when `entity_id` is `None`.
    /// Ordered by `occurred_at`.
    fn milestones(&self, entity_id: Option<EntityId>) -> Vec<MilestoneEvent>;

    fn latest_content_version(&self, entity_id: EntityId) -> Option<ContentVersion>;
}

/// Write side used by milestone logging and content-change detection.
pub trait MilestoneSink {
    /// Append `event` unless the same occurrence is already logged.
    ///
    /// Returns `true` when the event was new.
    fn record_milestone(&mut self, event: MilestoneEvent) -> bool;

    fn record_content_version(&mut self, version: ContentVersion);
}

/// In-memory snapshot store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    articles: BTreeMap<EntityId, ArticleInfo>,
    metrics: BTreeMap<EntityId, Vec<MetricSnapshot>>,
    followers: Vec<FollowerSnapshot>,
    daily: BTreeMap<EntityId, BTreeMap<NaiveDate, IncrementalRecord>>,
    referrers: BTreeMap<EntityId, Vec<ReferrerCount>>,
    comments: BTreeMap<EntityId, Vec<CommentRecord>>,
    milestones: Vec<MilestoneEvent>,
    content_history: BTreeMap<EntityId, Vec<ContentVersion>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_article(&mut self, article: ArticleInfo) {
        self.articles.insert(article.id, article);
    }

    pub fn push_metric(&mut self, snapshot: MetricSnapshot) {
        self.metrics
            .entry(snapshot.entity_id)
            .or_default()
            .push(snapshot);
    }

    pub fn push_follower(&mut self, snapshot: FollowerSnapshot) {
        self.followers.push(snapshot);
    }

    /// Daily records replace any earlier record for the same day.
    pub fn upsert_daily(&mut self, record: IncrementalRecord) {
        self.daily
            .entry(record.entity_id)
            .or_default()
            .insert(record.date, record);
    }

    pub fn push_referrer(&mut self, referrer: ReferrerCount) {
        self.referrers
            .entry(referrer.entity_id)
            .or_default()
            .push(referrer);
    }

    pub fn push_comment(&mut self, comment: CommentRecord) {
        self.comments
            .entry(comment.entity_id)
            .or_default()
            .push(comment);
    }

    #[must_use]
    pub fn milestone_count(&self) -> usize {
        self.milestones.len()
    }
}

impl SnapshotSource for MemoryStore {
    fn articles(&self) -> Vec<ArticleInfo> {
        self.articles.values().cloned().collect()
    }

    fn article(&self, id: EntityId) -> Option<ArticleInfo> {
        self.articles.get(&id).cloned()
    }

    fn counter_series(&self, entity_id: EntityId, counter: &str, range: TimeRange) -> Series {
        self.metrics
            .get(&entity_id)
            .map(|snaps| {
                Series::from_metric_snapshots(
                    snaps.iter().filter(|s| range.contains(s.collected_at)),
                    counter,
                )
            })
            .unwrap_or_default()
    }

    fn latest_snapshot(&self, entity_id: EntityId) -> Option<MetricSnapshot> {
        // max_by_key keeps the last of equal maxima, i.e. the last collected.
        self.metrics
            .get(&entity_id)?
            .iter()
            .max_by_key(|s| s.collected_at)
            .cloned()
    }

    fn follower_series(&self, range: TimeRange) -> Series {
        Series::from_follower_snapshots(
            self.followers
                .iter()
                .filter(|s| range.contains(s.collected_at)),
        )
    }

    fn incremental_records(&self, entity_id: EntityId) -> Vec<IncrementalRecord> {
        self.daily
            .get(&entity_id)
            .map(|days| days.values().cloned().collect())
            .unwrap_or_default()
    }

    fn referrers(&self, entity_id: EntityId) -> Vec<ReferrerCount> {
        self.referrers.get(&entity_id).cloned().unwrap_or_default()
    }

    fn comments(&self, entity_id: EntityId) -> Vec<CommentRecord> {
        self.comments.get(&entity_id).cloned().unwrap_or_default()
    }

    fn milestones(&self, entity_id: Option<EntityId>) -> Vec<MilestoneEvent> {
        let mut events: Vec<MilestoneEvent> = self
            .milestones
            .iter()
            .filter(|m| entity_id.is_none() || m.entity_id == entity_id)
            .cloned()
            .collect();
        events.sort_by_key(|m| m.occurred_at);
        events
    }

    fn latest_content_version(&self, entity_id: EntityId) -> Option<ContentVersion> {
        self.content_history
            .get(&entity_id)?
            .iter()
            .max_by_key(|v| v.changed_at)
            .cloned()
    }
}

impl MilestoneSink for MemoryStore {
    fn record_milestone(&mut self, event: MilestoneEvent) -> bool {
        if self.milestones.iter().any(|m| m.same_occurrence(&event)) {
            return false;
        }
        self.milestones.push(event);
        true
    }

    fn record_content_version(&mut self, version: ContentVersion) {
        self.content_history
            .entry(version.entity_id)
            .or_default()
            .push(version);
    }
}
