use std::collections::BTreeMap;

use chrono::{Datelike, Timelike, Weekday};
use devpulse_core::{counters, EntityId};
use serde::Serialize;

use super::{cohort, Report, SkippedEntity};
use crate::error::EngineError;
use crate::source::SnapshotSource;

/// Mean lifetime counters of the articles published in one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishingSlot {
    /// `Mon`..`Sun` for weekdays, `00:00`..`23:00` (UTC) for hours.
    pub label: String,
    pub articles: usize,
    pub avg_views: f64,
    pub avg_reactions: f64,
    pub avg_comments: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishingTimesReport {
    /// Monday first; weekdays without publications are omitted.
    pub by_weekday: Vec<PublishingSlot>,
    /// Hour of day in UTC; hours without publications are omitted.
    pub by_hour: Vec<PublishingSlot>,
    pub skipped: Vec<SkippedEntity>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    articles: usize,
    views: i64,
    reactions: i64,
    comments: i64,
}

impl Totals {
    fn add(&mut self, views: i64, reactions: i64, comments: i64) {
        self.articles += 1;
        self.views = self.views.saturating_add(views);
        self.reactions = self.reactions.saturating_add(reactions);
        self.comments = self.comments.saturating_add(comments);
    }

    #[allow(clippy::cast_precision_loss)]
    fn into_slot(self, label: String) -> PublishingSlot {
        let n = self.articles as f64;
        PublishingSlot {
            label,
            articles: self.articles,
            avg_views: self.views as f64 / n,
            avg_reactions: self.reactions as f64 / n,
            avg_comments: self.comments as f64 / n,
        }
    }
}

/// Average reach of articles grouped by the weekday and hour they were published.
///
/// Uses each article's latest lifetime snapshot; articles without one are skipped.
pub fn publishing_times_report<S>(source: &S, only: Option<EntityId>) -> PublishingTimesReport
where
    S: SnapshotSource + ?Sized,
{
    let mut by_weekday: BTreeMap<u32, (Weekday, Totals)> = BTreeMap::new();
    let mut by_hour: BTreeMap<u32, Totals> = BTreeMap::new();
    let mut skipped: Report<()> = Report::default();

    for article in cohort(source, only) {
        let Some(published_at) = article.published_at else {
            continue;
        };
        let Some(snapshot) = source.latest_snapshot(article.id) else {
            skipped.skip(
                article.id,
                &EngineError::insufficient("no lifetime snapshot").for_entity(article.id),
            );
            continue;
        };
        let views = snapshot.counter(counters::VIEWS).unwrap_or(0);
        let reactions = snapshot.counter(counters::REACTIONS).unwrap_or(0);
        let comments = snapshot.counter(counters::COMMENTS).unwrap_or(0);

        let weekday = published_at.weekday();
        by_weekday
            .entry(weekday.num_days_from_monday())
            .or_insert((weekday, Totals::default()))
            .1
            .add(views, reactions, comments);
        by_hour
            .entry(published_at.hour())
            .or_default()
            .add(views, reactions, comments);
    }

    PublishingTimesReport {
        by_weekday: by_weekday
            .into_values()
            .map(|(day, totals)| totals.into_slot(day.to_string()))
            .collect(),
        by_hour: by_hour
            .into_iter()
            .map(|(hour, totals)| totals.into_slot(format!("{hour:02}:00")))
            .collect(),
        skipped: skipped.skipped,
    }
}
