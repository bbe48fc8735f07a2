//! Milestone event log.
//!
//! The only engine write path. Inserts are idempotent on
//! `(article, event_type, description, occurred_at)` so detection can be
//! re-run without duplicating events.

use chrono::{DateTime, Utc};
use devpulse_core::{EntityId, EventType, MilestoneEvent};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MilestoneRow {
    pub id: i64,
    pub public_id: Uuid,
    pub article_id: Option<i64>,
    pub event_type: String,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MilestoneRow> for MilestoneEvent {
    type Error = DbError;

    fn try_from(row: MilestoneRow) -> Result<Self, Self::Error> {
        let event_type: EventType = row.event_type.parse().map_err(|e| DbError::InvalidRow {
            table: "milestone_events",
            reason: format!("{e} (id {})", row.id),
        })?;
        Ok(Self {
            entity_id: row.article_id,
            event_type,
            description: row.description,
            occurred_at: row.occurred_at,
        })
    }
}

/// Logs a milestone unless the same occurrence is already recorded.
///
/// Returns `true` when a new row was inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails (including an unknown article).
pub async fn insert_milestone(pool: &PgPool, event: &MilestoneEvent) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO milestone_events (article_id, event_type, description, occurred_at) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT DO NOTHING",
    )
    .bind(event.entity_id)
    .bind(event.event_type.as_str())
    .bind(&event.description)
    .bind(event.occurred_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Returns milestones in time order, for one article or for all.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_milestones(
    pool: &PgPool,
    article_id: Option<EntityId>,
) -> Result<Vec<MilestoneRow>, DbError> {
    let rows = sqlx::query_as::<_, MilestoneRow>(
        "SELECT id, public_id, article_id, event_type, description, occurred_at, created_at \
         FROM milestone_events \
         WHERE ($1::BIGINT IS NULL OR article_id = $1) \
         ORDER BY occurred_at, id",
    )
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
