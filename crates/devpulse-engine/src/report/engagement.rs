use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use devpulse_core::{counters, ConfigError, EngineConfig, EntityId};
use serde::Serialize;

use super::{cohort, Report};
use crate::error::EngineError;
use crate::source::SnapshotSource;
use crate::velocity::retention_adjusted_weekly_rate;

/// Label for referrer rows without a domain.
pub const DIRECT_TRAFFIC: &str = "(direct)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementRow {
    pub entity_id: EntityId,
    pub title: String,
    pub reader_comments: usize,
    pub author_replies: usize,
    pub reply_rate_pct: f64,
    pub reactions: i64,
    pub views: i64,
    pub engagement_pct: f64,
}

fn pct(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

/// Reader comments, author replies and engagement rate per article.
///
/// The author is never inferred from comment statistics; it must be configured.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when no author username is configured.
#[allow(clippy::cast_precision_loss)]
pub fn engagement_report<S>(
    source: &S,
    config: &EngineConfig,
    only: Option<EntityId>,
) -> Result<Report<EngagementRow>, ConfigError>
where
    S: SnapshotSource + ?Sized,
{
    let author = config
        .author_username
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| {
            ConfigError::Validation(
                "engagement report requires author_username (or DEVPULSE_AUTHOR_USERNAME)"
                    .to_string(),
            )
        })?;

    let mut report = Report::default();
    for article in cohort(source, only) {
        let Some(snapshot) = source.latest_snapshot(article.id) else {
            report.skip(
                article.id,
                &EngineError::insufficient("no lifetime snapshot").for_entity(article.id),
            );
            continue;
        };

        let comments = source.comments(article.id);
        let author_replies = comments
            .iter()
            .filter(|c| c.author_username.eq_ignore_ascii_case(author))
            .count();
        let reader_comments = comments.len() - author_replies;

        let reactions = snapshot.counter(counters::REACTIONS).unwrap_or(0);
        let views = snapshot.counter(counters::VIEWS).unwrap_or(0);

        report.rows.push(EngagementRow {
            entity_id: article.id,
            title: article.title,
            reader_comments,
            author_replies,
            reply_rate_pct: pct(author_replies as f64, reader_comments as f64),
            reactions,
            views,
            engagement_pct: pct(
                reactions as f64 + reader_comments as f64,
                views as f64,
            ),
        });
    }

    report.rows.sort_by(|a, b| {
        b.engagement_pct
            .total_cmp(&a.engagement_pct)
            .then(a.entity_id.cmp(&b.entity_id))
    });
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainShare {
    pub domain: String,
    pub count: i64,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferrerRow {
    pub entity_id: EntityId,
    pub title: String,
    pub collected_at: DateTime<Utc>,
    pub total: i64,
    pub weekly_rate: f64,
    pub domains: Vec<DomainShare>,
}

/// Traffic sources from the most recent referrer collection of each article.
#[allow(clippy::cast_precision_loss)]
pub fn referrer_report<S>(
    source: &S,
    config: &EngineConfig,
    now: DateTime<Utc>,
    only: Option<EntityId>,
) -> Report<ReferrerRow>
where
    S: SnapshotSource + ?Sized,
{
    let mut report = Report::default();
    for article in cohort(source, only) {
        let referrers = source.referrers(article.id);
        let Some(latest) = referrers.iter().map(|r| r.collected_at).max() else {
            report.skip(
                article.id,
                &EngineError::insufficient("no referrer data").for_entity(article.id),
            );
            continue;
        };

        let mut by_domain: BTreeMap<String, i64> = BTreeMap::new();
        for r in referrers.iter().filter(|r| r.collected_at == latest) {
            let label = r.domain.clone().unwrap_or_else(|| DIRECT_TRAFFIC.to_string());
            *by_domain.entry(label).or_default() += r.count;
        }
        let total: i64 = by_domain.values().sum();

        let mut domains: Vec<DomainShare> = by_domain
            .into_iter()
            .map(|(domain, count)| DomainShare {
                domain,
                count,
                share_pct: pct(count as f64, total as f64),
            })
            .collect();
        domains.sort_by(|a, b| b.count.cmp(&a.count).then(a.domain.cmp(&b.domain)));

        let age = article.published_at.map_or(chrono::Duration::zero(), |p| now - p);
        report.rows.push(ReferrerRow {
            entity_id: article.id,
            title: article.title,
            collected_at: latest,
            total,
            weekly_rate: retention_adjusted_weekly_rate(total, age, config.retention_window()),
            domains,
        });
    }

    report
        .rows
        .sort_by(|a, b| b.total.cmp(&a.total).then(a.entity_id.cmp(&b.entity_id)));
    report
}
