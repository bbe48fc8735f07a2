//! Day-bucketed incremental analytics (`daily_analytics`).
//!
//! The upstream API only serves a trailing retention window, so each
//! collection re-fetches those days and replaces the stored row per
//! `(article_id, date)`. Rows are never adjusted afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use devpulse_core::{counters, IncrementalRecord};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyAnalyticsRow {
    pub id: i64,
    pub article_id: i64,
    pub date: NaiveDate,
    pub page_views: i64,
    pub average_read_time_seconds: i64,
    pub total_read_time_seconds: i64,
    pub reactions_total: i64,
    pub reactions_like: i64,
    pub reactions_readinglist: i64,
    pub reactions_unicorn: i64,
    pub comments_total: i64,
    pub follows_total: i64,
    pub collected_at: DateTime<Utc>,
}

impl From<DailyAnalyticsRow> for IncrementalRecord {
    fn from(row: DailyAnalyticsRow) -> Self {
        let counters = BTreeMap::from([
            (counters::PAGE_VIEWS.to_string(), row.page_views),
            (
                counters::AVERAGE_READ_TIME_SECONDS.to_string(),
                row.average_read_time_seconds,
            ),
            (
                counters::TOTAL_READ_TIME_SECONDS.to_string(),
                row.total_read_time_seconds,
            ),
            (counters::REACTIONS_TOTAL.to_string(), row.reactions_total),
            (counters::REACTIONS_LIKE.to_string(), row.reactions_like),
            (
                counters::REACTIONS_READINGLIST.to_string(),
                row.reactions_readinglist,
            ),
            (counters::REACTIONS_UNICORN.to_string(), row.reactions_unicorn),
            (counters::COMMENTS_TOTAL.to_string(), row.comments_total),
            (counters::FOLLOWS_TOTAL.to_string(), row.follows_total),
        ]);
        Self {
            entity_id: row.article_id,
            date: row.date,
            counters,
        }
    }
}

const DAILY_COLUMNS: &str = "id, article_id, date, page_views, average_read_time_seconds, \
     total_read_time_seconds, reactions_total, reactions_like, reactions_readinglist, \
     reactions_unicorn, comments_total, follows_total, collected_at";

/// Inserts or replaces the record for `(article, date)`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRow`] if any counter is negative, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn upsert_daily_analytics(
    pool: &PgPool,
    record: &IncrementalRecord,
) -> Result<DailyAnalyticsRow, DbError> {
    if let Some((name, value)) = record.counters.iter().find(|(_, v)| **v < 0) {
        return Err(DbError::InvalidRow {
            table: "daily_analytics",
            reason: format!("{name} is negative ({value}) for {}", record.date),
        });
    }

    let row = sqlx::query_as::<_, DailyAnalyticsRow>(&format!(
        "INSERT INTO daily_analytics (article_id, date, page_views, average_read_time_seconds, \
             total_read_time_seconds, reactions_total, reactions_like, reactions_readinglist, \
             reactions_unicorn, comments_total, follows_total, collected_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW()) \
         ON CONFLICT (article_id, date) DO UPDATE SET \
             page_views = EXCLUDED.page_views, \
             average_read_time_seconds = EXCLUDED.average_read_time_seconds, \
             total_read_time_seconds = EXCLUDED.total_read_time_seconds, \
             reactions_total = EXCLUDED.reactions_total, \
             reactions_like = EXCLUDED.reactions_like, \
             reactions_readinglist = EXCLUDED.reactions_readinglist, \
             reactions_unicorn = EXCLUDED.reactions_unicorn, \
             comments_total = EXCLUDED.comments_total, \
             follows_total = EXCLUDED.follows_total, \
             collected_at = EXCLUDED.collected_at \
         RETURNING {DAILY_COLUMNS}"
    ))
    .bind(record.entity_id)
    .bind(record.date)
    .bind(record.counter(counters::PAGE_VIEWS))
    .bind(record.counter(counters::AVERAGE_READ_TIME_SECONDS))
    .bind(record.counter(counters::TOTAL_READ_TIME_SECONDS))
    .bind(record.counter(counters::REACTIONS_TOTAL))
    .bind(record.counter(counters::REACTIONS_LIKE))
    .bind(record.counter(counters::REACTIONS_READINGLIST))
    .bind(record.counter(counters::REACTIONS_UNICORN))
    .bind(record.counter(counters::COMMENTS_TOTAL))
    .bind(record.counter(counters::FOLLOWS_TOTAL))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns every daily record, ordered by article then date.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_daily_analytics(pool: &PgPool) -> Result<Vec<DailyAnalyticsRow>, DbError> {
    let rows = sqlx::query_as::<_, DailyAnalyticsRow>(&format!(
        "SELECT {DAILY_COLUMNS} FROM daily_analytics ORDER BY article_id, date"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
