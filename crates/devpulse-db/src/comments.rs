//! Comment metadata. Bodies are not stored.

use chrono::{DateTime, Utc};
use devpulse_core::CommentRecord;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub comment_id: String,
    pub article_id: i64,
    pub author_username: String,
    pub created_at: Option<DateTime<Utc>>,
    pub collected_at: DateTime<Utc>,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            comment_id: row.comment_id,
            entity_id: row.article_id,
            author_username: row.author_username,
            created_at: row.created_at,
        }
    }
}

/// Inserts a comment, or refreshes its author if the platform id already exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_comment(pool: &PgPool, comment: &CommentRecord) -> Result<CommentRow, DbError> {
    let row = sqlx::query_as::<_, CommentRow>(
        "INSERT INTO comments (comment_id, article_id, author_username, created_at) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (comment_id) DO UPDATE SET \
             author_username = EXCLUDED.author_username, \
             collected_at = NOW() \
         RETURNING comment_id, article_id, author_username, created_at, collected_at",
    )
    .bind(&comment.comment_id)
    .bind(comment.entity_id)
    .bind(&comment.author_username)
    .bind(comment.created_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_comments(pool: &PgPool) -> Result<Vec<CommentRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT comment_id, article_id, author_username, created_at, collected_at \
         FROM comments \
         ORDER BY article_id, created_at NULLS LAST, comment_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
