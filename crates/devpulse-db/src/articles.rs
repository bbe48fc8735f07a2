//! Database operations for the `articles` table.

use chrono::{DateTime, Utc};
use devpulse_core::{ArticleInfo, EntityId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `articles` table. `id` is the platform's article id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub public_id: Uuid,
    pub title: String,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub reading_time_minutes: i32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ArticleRow> for ArticleInfo {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            published_at: row.published_at,
            tags: row.tags,
            reading_time_minutes: row.reading_time_minutes,
            is_deleted: row.is_deleted,
        }
    }
}

const ARTICLE_COLUMNS: &str = "id, public_id, title, url, published_at, tags, \
     reading_time_minutes, is_deleted, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every article, deleted ones included, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles(pool: &PgPool) -> Result<Vec<ArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single article by platform id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_article(pool: &PgPool, id: EntityId) -> Result<Option<ArticleRow>, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts an article or refreshes its current title, tags and publication state.
///
/// The previous title is not kept here; `article_history` records versions.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_article(
    pool: &PgPool,
    article: &ArticleInfo,
    url: Option<&str>,
) -> Result<ArticleRow, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(&format!(
        "INSERT INTO articles (id, title, url, published_at, tags, reading_time_minutes, is_deleted) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (id) DO UPDATE SET \
             title = EXCLUDED.title, \
             url = COALESCE(EXCLUDED.url, articles.url), \
             published_at = EXCLUDED.published_at, \
             tags = EXCLUDED.tags, \
             reading_time_minutes = EXCLUDED.reading_time_minutes, \
             is_deleted = EXCLUDED.is_deleted, \
             updated_at = NOW() \
         RETURNING {ARTICLE_COLUMNS}"
    ))
    .bind(article.id)
    .bind(&article.title)
    .bind(url)
    .bind(article.published_at)
    .bind(&article.tags)
    .bind(article.reading_time_minutes)
    .bind(article.is_deleted)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Soft-deletes an article. History and milestones are kept.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no article has this id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn mark_article_deleted(pool: &PgPool, id: EntityId) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE articles SET is_deleted = true, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
