//! Snapshot records as the store provides them.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Platform identifier of a tracked article.
pub type EntityId = i64;

/// Well-known counter keys.
///
/// Lifetime counters come from [`MetricSnapshot`]; the remaining keys are
/// day-bucketed values in [`IncrementalRecord`].
pub mod counters {
    pub const VIEWS: &str = "views";
    pub const REACTIONS: &str = "reactions";
    pub const COMMENTS: &str = "comments";

    pub const PAGE_VIEWS: &str = "page_views";
    pub const AVERAGE_READ_TIME_SECONDS: &str = "average_read_time_seconds";
    pub const TOTAL_READ_TIME_SECONDS: &str = "total_read_time_seconds";
    pub const REACTIONS_TOTAL: &str = "reactions_total";
    pub const REACTIONS_LIKE: &str = "reactions_like";
    pub const REACTIONS_READINGLIST: &str = "reactions_readinglist";
    pub const REACTIONS_UNICORN: &str = "reactions_unicorn";
    pub const COMMENTS_TOTAL: &str = "comments_total";
    pub const FOLLOWS_TOTAL: &str = "follows_total";
}

/// Descriptive metadata for a tracked article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleInfo {
    pub id: EntityId,
    pub title: String,
    /// `None` for drafts.
    pub published_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub reading_time_minutes: i32,
    pub is_deleted: bool,
}

impl ArticleInfo {
    /// Published and not soft-deleted.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.published_at.is_some() && !self.is_deleted
    }
}

/// One observation of an entity's lifetime counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub entity_id: EntityId,
    pub collected_at: DateTime<Utc>,
    pub counters: BTreeMap<String, i64>,
}

impl MetricSnapshot {
    #[must_use]
    pub fn counter(&self, name: &str) -> Option<i64> {
        self.counters.get(name).copied()
    }
}

/// New activity attributed to one calendar day, inside the retention window.
///
/// Values are non-negative and never corrected after the fact for removed
/// reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalRecord {
    pub entity_id: EntityId,
    pub date: NaiveDate,
    pub counters: BTreeMap<String, i64>,
}

impl IncrementalRecord {
    /// Missing counters read as zero activity.
    #[must_use]
    pub fn counter(&self, name: &str) -> i64 {
        self.counters.get(name).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerSnapshot {
    pub collected_at: DateTime<Utc>,
    pub follower_count: i64,
}

/// Traffic arriving at an article from one referring domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerCount {
    pub entity_id: EntityId,
    /// `None` is direct traffic.
    pub domain: Option<String>,
    pub count: i64,
    pub collected_at: DateTime<Utc>,
}

/// Comment metadata. Bodies are not needed by any computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment_id: String,
    pub entity_id: EntityId,
    pub author_username: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A recorded title/tags pair for an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentVersion {
    pub entity_id: EntityId,
    pub title: String,
    pub tags: Vec<String>,
    pub content_hash: String,
    pub changed_at: DateTime<Utc>,
}
