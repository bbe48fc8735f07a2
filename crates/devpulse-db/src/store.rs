//! Materializes the snapshot store for the engine and persists its writes.

use devpulse_core::MilestoneEvent;
use devpulse_engine::{ContentChange, MemoryStore, MilestoneSink};
use sqlx::PgPool;

use crate::articles::list_articles;
use crate::comments::list_comments;
use crate::content_history::{insert_content_version, list_content_versions};
use crate::daily_analytics::list_daily_analytics;
use crate::followers::list_follower_snapshots;
use crate::metrics::list_article_metrics;
use crate::milestones::{insert_milestone, list_milestones};
use crate::referrers::list_referrers;
use crate::DbError;

/// Load every snapshot table into a [`MemoryStore`].
///
/// The engine runs against the returned store and never holds a connection.
/// Milestone rows with an unrecognized event type are logged and left out.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any of the queries fail.
pub async fn load_snapshot_store(pool: &PgPool) -> Result<MemoryStore, DbError> {
    let (articles, metrics, followers, daily, referrers, comments, history, milestones) = futures::try_join!(
        list_articles(pool),
        list_article_metrics(pool),
        list_follower_snapshots(pool),
        list_daily_analytics(pool),
        list_referrers(pool),
        list_comments(pool),
        list_content_versions(pool, None),
        list_milestones(pool, None),
    )?;

    let mut store = MemoryStore::new();
    for row in articles {
        store.upsert_article(row.into());
    }
    for row in metrics {
        store.push_metric(row.into());
    }
    for row in followers {
        store.push_follower(row.into());
    }
    for row in daily {
        store.upsert_daily(row.into());
    }
    for row in referrers {
        store.push_referrer(row.into());
    }
    for row in comments {
        store.push_comment(row.into());
    }
    for row in history {
        store.record_content_version(row.into());
    }
    for row in milestones {
        match MilestoneEvent::try_from(row) {
            Ok(event) => {
                store.record_milestone(event);
            }
            Err(e) => tracing::warn!(error = %e, "skipping milestone row"),
        }
    }

    tracing::debug!(milestones = store.milestone_count(), "snapshot store loaded");
    Ok(store)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentChangeOutcome {
    pub version_recorded: bool,
    /// `Some(false)` when the milestone was already logged.
    pub milestone_logged: Option<bool>,
}

/// Write a detected content change.
///
/// The milestone goes in before the version: if the version insert fails,
/// the next run detects the same change again and the milestone insert is a
/// no-op.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either insert fails.
pub async fn persist_content_change(
    pool: &PgPool,
    change: &ContentChange,
) -> Result<ContentChangeOutcome, DbError> {
    let milestone_logged = match change.milestone() {
        Some(event) => Some(insert_milestone(pool, event).await?),
        None => None,
    };

    let version_recorded = match change.version() {
        Some(version) => {
            insert_content_version(pool, version).await?;
            true
        }
        None => false,
    };

    Ok(ContentChangeOutcome {
        version_recorded,
        milestone_logged,
    })
}
