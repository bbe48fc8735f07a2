use chrono::{DateTime, Utc};
use devpulse_core::ReferrerCount;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `referrers` table. A `NULL` domain is direct traffic.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReferrerRow {
    pub id: i64,
    pub article_id: i64,
    pub domain: Option<String>,
    pub count: i64,
    pub collected_at: DateTime<Utc>,
}

impl From<ReferrerRow> for ReferrerCount {
    fn from(row: ReferrerRow) -> Self {
        Self {
            entity_id: row.article_id,
            domain: row.domain,
            count: row.count,
            collected_at: row.collected_at,
        }
    }
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_referrer(pool: &PgPool, referrer: &ReferrerCount) -> Result<ReferrerRow, DbError> {
    let row = sqlx::query_as::<_, ReferrerRow>(
        "INSERT INTO referrers (article_id, domain, count, collected_at) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, article_id, domain, count, collected_at",
    )
    .bind(referrer.entity_id)
    .bind(referrer.domain.as_deref())
    .bind(referrer.count)
    .bind(referrer.collected_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_referrers(pool: &PgPool) -> Result<Vec<ReferrerRow>, DbError> {
    let rows = sqlx::query_as::<_, ReferrerRow>(
        "SELECT id, article_id, domain, count, collected_at \
         FROM referrers \
         ORDER BY article_id, collected_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
