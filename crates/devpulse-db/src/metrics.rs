//! Lifetime counter snapshots (`article_metrics`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use devpulse_core::{counters, MetricSnapshot};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `article_metrics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleMetricRow {
    pub id: i64,
    pub article_id: i64,
    pub collected_at: DateTime<Utc>,
    pub views: i64,
    pub reactions: i64,
    pub comments: i64,
}

impl From<ArticleMetricRow> for MetricSnapshot {
    fn from(row: ArticleMetricRow) -> Self {
        Self {
            entity_id: row.article_id,
            collected_at: row.collected_at,
            counters: BTreeMap::from([
                (counters::VIEWS.to_string(), row.views),
                (counters::REACTIONS.to_string(), row.reactions),
                (counters::COMMENTS.to_string(), row.comments),
            ]),
        }
    }
}

/// Appends one lifetime snapshot. Counters missing from the snapshot are stored as zero.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including an unknown article).
pub async fn insert_article_metric(
    pool: &PgPool,
    snapshot: &MetricSnapshot,
) -> Result<ArticleMetricRow, DbError> {
    let row = sqlx::query_as::<_, ArticleMetricRow>(
        "INSERT INTO article_metrics (article_id, collected_at, views, reactions, comments) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, article_id, collected_at, views, reactions, comments",
    )
    .bind(snapshot.entity_id)
    .bind(snapshot.collected_at)
    .bind(snapshot.counter(counters::VIEWS).unwrap_or(0))
    .bind(snapshot.counter(counters::REACTIONS).unwrap_or(0))
    .bind(snapshot.counter(counters::COMMENTS).unwrap_or(0))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns every lifetime snapshot, ordered by article then collection time.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_article_metrics(pool: &PgPool) -> Result<Vec<ArticleMetricRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleMetricRow>(
        "SELECT id, article_id, collected_at, views, reactions, comments \
         FROM article_metrics \
         ORDER BY article_id, collected_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
