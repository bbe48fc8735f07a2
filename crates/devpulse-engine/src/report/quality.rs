//! Reader-quality reports built on the daily analytics stream.
//!
//! Daily counters are per-day increments, so totals are sums over a window.
//! Read time is the exception: `average_read_time_seconds` is a per-day mean
//! and is averaged over the days that had traffic.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use devpulse_core::{counters, ArticleInfo, EngineConfig, EntityId, IncrementalRecord};
use serde::Serialize;

use super::{cohort, Report};
use crate::error::EngineError;
use crate::reconcile::windowed_sum;
use crate::source::SnapshotSource;

/// Articles with fewer daily page views than this are too thin to score.
pub const MIN_SCORED_VIEWS: i64 = 20;

/// Reading length assumed when an article reports none.
pub const DEFAULT_READING_MINUTES: i32 = 7;

/// Engagement above this percentage adds nothing further to the quality score.
pub const ENGAGEMENT_CAP_PCT: f64 = 20.0;

const COMPLETION_WEIGHT: f64 = 0.7;
const ENGAGEMENT_WEIGHT: f64 = 1.5;

/// Long-tail candidates must be at least this old.
pub const LONG_TAIL_MIN_AGE_DAYS: i64 = 30;

/// Minimum views in the recent window for a long-tail champion.
pub const LONG_TAIL_MIN_RECENT_VIEWS: i64 = 50;

fn pct(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

/// Share of the article read on average, capped at 100.
///
/// `0.0` when the article has no reading length.
#[must_use]
pub fn completion_pct(avg_read_seconds: f64, reading_time_minutes: i32) -> f64 {
    pct(avg_read_seconds, f64::from(reading_time_minutes) * 60.0).min(100.0)
}

/// Completion weighted against engagement, with engagement capped.
#[must_use]
pub fn quality_score(completion_pct: f64, engagement_pct: f64) -> f64 {
    completion_pct * COMPLETION_WEIGHT + engagement_pct.min(ENGAGEMENT_CAP_PCT) * ENGAGEMENT_WEIGHT
}

/// Mean of `average_read_time_seconds` over the records with page views.
#[allow(clippy::cast_precision_loss)]
fn mean_read_seconds<'a>(records: impl Iterator<Item = &'a IncrementalRecord>) -> (f64, usize) {
    let (total, days) = records
        .filter(|r| r.counter(counters::PAGE_VIEWS) > 0)
        .fold((0i64, 0usize), |(total, days), r| {
            (
                total.saturating_add(r.counter(counters::AVERAGE_READ_TIME_SECONDS)),
                days + 1,
            )
        });
    if days == 0 {
        return (0.0, 0);
    }
    (total as f64 / days as f64, days)
}

fn scored_records<S>(source: &S, article: &ArticleInfo) -> Result<Vec<IncrementalRecord>, EngineError>
where
    S: SnapshotSource + ?Sized,
{
    let records = source.incremental_records(article.id);
    if records.is_empty() {
        return Err(EngineError::insufficient("no daily analytics").for_entity(article.id));
    }
    Ok(records)
}

fn require_views(article: &ArticleInfo, views: i64) -> Result<(), EngineError> {
    if views < MIN_SCORED_VIEWS {
        return Err(EngineError::insufficient(format!(
            "{views} daily page views, need at least {MIN_SCORED_VIEWS}"
        ))
        .for_entity(article.id));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadTimeRow {
    pub entity_id: EntityId,
    pub title: String,
    pub reading_time_minutes: i32,
    pub days_with_views: usize,
    pub views: i64,
    pub avg_read_seconds: f64,
    /// `0.0` when the article reports no reading length.
    pub completion_pct: f64,
    pub total_read_hours: f64,
}

/// Average read time and completion per article, best readers first.
#[allow(clippy::cast_precision_loss)]
pub fn read_time_report<S>(source: &S, only: Option<EntityId>) -> Report<ReadTimeRow>
where
    S: SnapshotSource + ?Sized,
{
    let mut report = Report::default();
    for article in cohort(source, only) {
        let outcome = scored_records(source, &article).and_then(|records| {
            let views = windowed_sum(&records, &[counters::PAGE_VIEWS], None);
            require_views(&article, views)?;
            let (avg_read_seconds, days_with_views) = mean_read_seconds(records.iter());
            let total_read = windowed_sum(&records, &[counters::TOTAL_READ_TIME_SECONDS], None);
            Ok(ReadTimeRow {
                entity_id: article.id,
                title: article.title.clone(),
                reading_time_minutes: article.reading_time_minutes,
                days_with_views,
                views,
                avg_read_seconds,
                completion_pct: completion_pct(avg_read_seconds, article.reading_time_minutes),
                total_read_hours: total_read as f64 / 3_600.0,
            })
        });
        report.push(article.id, outcome);
    }

    report.rows.sort_by(|a, b| {
        b.avg_read_seconds
            .total_cmp(&a.avg_read_seconds)
            .then(a.entity_id.cmp(&b.entity_id))
    });
    report
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityRow {
    pub entity_id: EntityId,
    pub title: String,
    pub views: i64,
    pub avg_read_seconds: f64,
    pub completion_pct: f64,
    pub reactions: i64,
    pub comments: i64,
    pub follows: i64,
    /// Reactions and comments per hundred views; `0.0` without views.
    pub engagement_pct: f64,
    pub quality_score: f64,
}

/// Quality score per article over the retention window, highest first.
///
/// Articles without a reading length are scored against
/// [`DEFAULT_READING_MINUTES`].
#[allow(clippy::cast_precision_loss)]
pub fn quality_report<S>(
    source: &S,
    config: &EngineConfig,
    now: DateTime<Utc>,
    only: Option<EntityId>,
) -> Report<QualityRow>
where
    S: SnapshotSource + ?Sized,
{
    let since = (now - config.retention_window()).date_naive();
    let mut report = Report::default();
    for article in cohort(source, only) {
        let outcome = scored_records(source, &article).and_then(|records| {
            let sum = |name: &str| windowed_sum(&records, &[name], Some(since));
            let views = sum(counters::PAGE_VIEWS);
            require_views(&article, views)?;

            let (avg_read_seconds, _) =
                mean_read_seconds(records.iter().filter(|r| r.date >= since));
            let minutes = if article.reading_time_minutes > 0 {
                article.reading_time_minutes
            } else {
                DEFAULT_READING_MINUTES
            };
            let completion = completion_pct(avg_read_seconds, minutes);
            let reactions = sum(counters::REACTIONS_TOTAL);
            let comments = sum(counters::COMMENTS_TOTAL);
            let engagement = pct(reactions.saturating_add(comments) as f64, views as f64);

            Ok(QualityRow {
                entity_id: article.id,
                title: article.title.clone(),
                views,
                avg_read_seconds,
                completion_pct: completion,
                reactions,
                comments,
                follows: sum(counters::FOLLOWS_TOTAL),
                engagement_pct: engagement,
                quality_score: quality_score(completion, engagement),
            })
        });
        report.push(article.id, outcome);
    }

    report.rows.sort_by(|a, b| {
        b.quality_score
            .total_cmp(&a.quality_score)
            .then(a.entity_id.cmp(&b.entity_id))
    });
    report
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongTailRow {
    pub entity_id: EntityId,
    pub title: String,
    pub age_days: i64,
    /// Page views over the last [`LONG_TAIL_MIN_AGE_DAYS`] days.
    pub recent_views: i64,
    /// Page views over the rest of the retention window before that.
    pub previous_views: i64,
    /// Change from the previous window; `None` when it had no views.
    pub trend_pct: Option<f64>,
}

fn views_between(records: &[IncrementalRecord], from: NaiveDate, until: NaiveDate) -> i64 {
    records
        .iter()
        .filter(|r| r.date >= from && r.date < until)
        .map(|r| r.counter(counters::PAGE_VIEWS))
        .fold(0i64, i64::saturating_add)
}

/// Older articles that still draw steady traffic, most recent views first.
///
/// Articles younger than [`LONG_TAIL_MIN_AGE_DAYS`] or below
/// [`LONG_TAIL_MIN_RECENT_VIEWS`] are not champions and are left out
/// without being reported as skipped.
#[allow(clippy::cast_precision_loss)]
pub fn long_tail_report<S>(
    source: &S,
    config: &EngineConfig,
    now: DateTime<Utc>,
    only: Option<EntityId>,
) -> Report<LongTailRow>
where
    S: SnapshotSource + ?Sized,
{
    let recent_from = (now - Duration::days(LONG_TAIL_MIN_AGE_DAYS)).date_naive();
    let previous_from = (now - config.retention_window()).date_naive();
    let mut report = Report::default();

    for article in cohort(source, only) {
        let Some(published_at) = article.published_at else {
            continue;
        };
        let age = now - published_at;
        if age <= Duration::days(LONG_TAIL_MIN_AGE_DAYS) {
            continue;
        }
        let records = match scored_records(source, &article) {
            Ok(records) => records,
            Err(e) => {
                report.skip(article.id, &e);
                continue;
            }
        };

        let recent_views = views_between(&records, recent_from, NaiveDate::MAX);
        if recent_views <= LONG_TAIL_MIN_RECENT_VIEWS {
            continue;
        }
        let previous_views = views_between(&records, previous_from, recent_from);
        let trend_pct = (previous_views > 0).then(|| {
            recent_views.saturating_sub(previous_views) as f64 / previous_views as f64 * 100.0
        });

        report.rows.push(LongTailRow {
            entity_id: article.id,
            title: article.title,
            age_days: age.num_days(),
            recent_views,
            previous_views,
            trend_pct,
        });
    }

    report.rows.sort_by(|a, b| {
        b.recent_views
            .cmp(&a.recent_views)
            .then(a.entity_id.cmp(&b.entity_id))
    });
    report
}
