//! Builder for small in-memory stores used by the report tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use devpulse_core::{
    counters, ArticleInfo, CommentRecord, EntityId, EventType, FollowerSnapshot,
    IncrementalRecord, MetricSnapshot, MilestoneEvent, ReferrerCount,
};

use crate::source::{MemoryStore, MilestoneSink};

/// Reference "now" for report tests; offsets are hours from here.
pub fn at(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
}

fn counter_map(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
}

#[derive(Default)]
pub struct Fixture {
    store: MemoryStore,
    next_comment: usize,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn article(self, id: EntityId, title: &str, published_h: i64) -> Self {
        self.article_with_tags(id, title, published_h, &[])
    }

    pub fn article_with_tags(
        mut self,
        id: EntityId,
        title: &str,
        published_h: i64,
        tags: &[&str],
    ) -> Self {
        self.store.upsert_article(ArticleInfo {
            id,
            title: title.to_string(),
            published_at: Some(at(published_h)),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            reading_time_minutes: 5,
            is_deleted: false,
        });
        self
    }

    pub fn views(mut self, id: EntityId, points: &[(i64, i64)]) -> Self {
        for &(h, v) in points {
            self.store.push_metric(MetricSnapshot {
                entity_id: id,
                collected_at: at(h),
                counters: counter_map(&[(counters::VIEWS, v)]),
            });
        }
        self
    }

    pub fn snapshot(mut self, id: EntityId, h: i64, pairs: &[(&str, i64)]) -> Self {
        self.store.push_metric(MetricSnapshot {
            entity_id: id,
            collected_at: at(h),
            counters: counter_map(pairs),
        });
        self
    }

    pub fn followers(mut self, points: &[(i64, i64)]) -> Self {
        for &(h, v) in points {
            self.store.push_follower(FollowerSnapshot {
                collected_at: at(h),
                follower_count: v,
            });
        }
        self
    }

    pub fn daily(mut self, id: EntityId, day_offset: i64, pairs: &[(&str, i64)]) -> Self {
        self.store.upsert_daily(IncrementalRecord {
            entity_id: id,
            date: (at(0) + Duration::days(day_offset)).date_naive(),
            counters: counter_map(pairs),
        });
        self
    }

    pub fn referrer(mut self, id: EntityId, h: i64, domain: Option<&str>, count: i64) -> Self {
        self.store.push_referrer(ReferrerCount {
            entity_id: id,
            domain: domain.map(str::to_string),
            count,
            collected_at: at(h),
        });
        self
    }

    pub fn comment(mut self, id: EntityId, author: &str, h: i64) -> Self {
        self.next_comment += 1;
        self.store.push_comment(CommentRecord {
            comment_id: format!("c{}", self.next_comment),
            entity_id: id,
            author_username: author.to_string(),
            created_at: Some(at(h)),
        });
        self
    }

    pub fn milestone(
        mut self,
        id: Option<EntityId>,
        event_type: EventType,
        description: &str,
        h: i64,
    ) -> Self {
        self.store.record_milestone(MilestoneEvent {
            entity_id: id,
            event_type,
            description: description.to_string(),
            occurred_at: at(h),
        });
        self
    }

    pub fn build(self) -> MemoryStore {
        self.store
    }
}
