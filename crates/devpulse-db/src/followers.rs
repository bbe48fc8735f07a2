//! Account-wide follower counts.

use chrono::{DateTime, Utc};
use devpulse_core::FollowerSnapshot;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowerSnapshotRow {
    pub id: i64,
    pub collected_at: DateTime<Utc>,
    pub follower_count: i64,
}

impl From<FollowerSnapshotRow> for FollowerSnapshot {
    fn from(row: FollowerSnapshotRow) -> Self {
        Self {
            collected_at: row.collected_at,
            follower_count: row.follower_count,
        }
    }
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_follower_snapshot(
    pool: &PgPool,
    snapshot: &FollowerSnapshot,
) -> Result<FollowerSnapshotRow, DbError> {
    let row = sqlx::query_as::<_, FollowerSnapshotRow>(
        "INSERT INTO follower_snapshots (collected_at, follower_count) \
         VALUES ($1, $2) \
         RETURNING id, collected_at, follower_count",
    )
    .bind(snapshot.collected_at)
    .bind(snapshot.follower_count)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_follower_snapshots(pool: &PgPool) -> Result<Vec<FollowerSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, FollowerSnapshotRow>(
        "SELECT id, collected_at, follower_count FROM follower_snapshots ORDER BY collected_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
