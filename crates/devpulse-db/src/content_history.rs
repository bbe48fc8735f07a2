//! Recorded title/tags versions (`article_history`).

use chrono::{DateTime, Utc};
use devpulse_core::{ContentVersion, EntityId};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleHistoryRow {
    pub id: i64,
    pub article_id: i64,
    pub title: String,
    pub tags: Vec<String>,
    pub content_hash: String,
    pub changed_at: DateTime<Utc>,
}

impl From<ArticleHistoryRow> for ContentVersion {
    fn from(row: ArticleHistoryRow) -> Self {
        Self {
            entity_id: row.article_id,
            title: row.title,
            tags: row.tags,
            content_hash: row.content_hash,
            changed_at: row.changed_at,
        }
    }
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_content_version(
    pool: &PgPool,
    version: &ContentVersion,
) -> Result<ArticleHistoryRow, DbError> {
    let row = sqlx::query_as::<_, ArticleHistoryRow>(
        "INSERT INTO article_history (article_id, title, tags, content_hash, changed_at) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, article_id, title, tags, content_hash, changed_at",
    )
    .bind(version.entity_id)
    .bind(&version.title)
    .bind(&version.tags)
    .bind(&version.content_hash)
    .bind(version.changed_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns recorded versions, oldest first, for one article or for all.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_content_versions(
    pool: &PgPool,
    article_id: Option<EntityId>,
) -> Result<Vec<ArticleHistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleHistoryRow>(
        "SELECT id, article_id, title, tags, content_hash, changed_at \
         FROM article_history \
         WHERE ($1::BIGINT IS NULL OR article_id = $1) \
         ORDER BY article_id, changed_at, id",
    )
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
