//! Plain-text tables for the report commands.

use devpulse_engine::report::{
    EngagementRow, FollowerAttributionReport, ImpactReport, LongTailRow, PublicationGainRow,
    PublishingSlot, PublishingTimesReport, QualityRow, ReadTimeRow, ReconciliationRow,
    ReferrerRow, VelocityRow,
};
use devpulse_engine::{CounterSemantics, Report, SkippedEntity};

const TITLE_WIDTH: usize = 40;

fn title(text: &str) -> String {
    if text.chars().count() <= TITLE_WIDTH {
        return text.to_string();
    }
    let cut: String = text.chars().take(TITLE_WIDTH - 1).collect();
    format!("{cut}…")
}

fn skipped(entries: &[SkippedEntity]) {
    if entries.is_empty() {
        return;
    }
    println!();
    println!("skipped {} article(s):", entries.len());
    for entry in entries {
        println!("  {:<8}{}", entry.entity_id, entry.reason);
    }
}

pub(super) fn velocity(report: &Report<VelocityRow>) {
    if report.rows.is_empty() {
        println!("no articles with samples in the period");
    } else {
        println!(
            "{:<8}{:<42}{:>8}{:>12}{:>12}{:>12}",
            "ID", "TITLE", "SAMPLES", "AVG/H", "PERIOD/H", "PEAK/H"
        );
        for row in &report.rows {
            let peak = row.profile.map_or(0.0, |p| p.peak);
            println!(
                "{:<8}{:<42}{:>8}{:>12.2}{:>12.2}{:>12.2}",
                row.entity_id,
                title(&row.title),
                row.samples,
                row.average_velocity,
                row.period_velocity,
                peak
            );
        }
    }
    skipped(&report.skipped);
}

pub(super) fn followers(report: &FollowerAttributionReport) {
    let delta = &report.follower_delta;
    println!(
        "followers {} → {} ({:+}) between {} and {}{}",
        delta.start_value,
        delta.end_value,
        delta.gain,
        delta.start_at.format("%Y-%m-%d %H:%M"),
        delta.end_at.format("%Y-%m-%d %H:%M"),
        if delta.suspicious { " [suspicious]" } else { "" }
    );

    if report.rows.is_empty() {
        println!("nothing to attribute");
    } else {
        println!();
        println!("{:<8}{:>12}{:>10}{:>12}", "ID", "VIEW GAIN", "SHARE", "FOLLOWERS");
        for row in &report.rows {
            println!(
                "{:<8}{:>12}{:>9.1}%{:>12.2}",
                row.entity_id,
                row.entity_delta,
                row.share_of_aggregate * 100.0,
                row.attributed_amount
            );
        }
    }
    skipped(&report.skipped);
}

pub(super) fn publication_gain(report: &Report<PublicationGainRow>) {
    if report.rows.is_empty() {
        println!("no published articles with follower data");
    } else {
        println!(
            "{:<8}{:<42}{:<18}{:>10}{:>10}{:>8}",
            "ID", "TITLE", "PUBLISHED", "BEFORE", "AFTER", "GAIN"
        );
        for row in &report.rows {
            println!(
                "{:<8}{:<42}{:<18}{:>10}{:>10}{:>+8}",
                row.entity_id,
                title(&row.title),
                row.published_at.format("%Y-%m-%d %H:%M"),
                row.baseline_followers,
                row.end_followers,
                row.gain
            );
        }
    }
    skipped(&report.skipped);
}

fn semantics_label(semantics: Option<CounterSemantics>) -> &'static str {
    match semantics {
        Some(CounterSemantics::Cumulative) => "cumulative",
        Some(CounterSemantics::Incremental) => "incremental",
        None => "verify",
    }
}

pub(super) fn reconciliation(report: &Report<ReconciliationRow>) {
    if report.rows.is_empty() {
        println!("no articles with both lifetime and daily data");
    } else {
        println!(
            "{:<8}{:<12}{:>6}{:>10}{:>10}{:>8}  {:<24}SEMANTICS",
            "ID", "COUNTER", "AGE", "LIFETIME", "DAILY", "GAP", "CAUSE"
        );
        for row in &report.rows {
            let r = &row.reconciliation;
            println!(
                "{:<8}{:<12}{:>6}{:>10}{:>10}{:>8}  {:<24}{}",
                row.entity_id,
                row.counter,
                row.age_days,
                r.lifetime_value,
                r.windowed_sum,
                r.gap,
                r.likely_cause.to_string(),
                semantics_label(row.semantics)
            );
        }
    }
    skipped(&report.skipped);
}

pub(super) fn impact(report: &ImpactReport) {
    if report.rows.is_empty() {
        println!("no milestones with measurable activity");
    } else {
        println!(
            "{:<18}{:<8}{:<16}{:>10}{:>10}{:>10}  DESCRIPTION",
            "WHEN", "ID", "TYPE", "BEFORE/H", "AFTER/H", "IMPACT"
        );
        for row in &report.rows {
            let id = row
                .entity_id
                .map_or_else(|| "-".to_string(), |id| id.to_string());
            println!(
                "{:<18}{:<8}{:<16}{:>10.2}{:>10.2}{:>+9.1}%  {}",
                row.result.event_time.format("%Y-%m-%d %H:%M"),
                id,
                row.event_type.as_str(),
                row.result.before_velocity,
                row.result.after_velocity,
                row.result.impact_pct,
                row.description
            );
        }
    }

    if !report.summary.is_empty() {
        println!();
        println!("{:<16}{:>6}{:>10}{:>10}{:>10}", "TYPE", "COUNT", "MEAN", "MIN", "MAX");
        for (event_type, s) in &report.summary {
            println!(
                "{:<16}{:>6}{:>+9.1}%{:>+9.1}%{:>+9.1}%",
                event_type.as_str(),
                s.count,
                s.mean,
                s.min,
                s.max
            );
        }
    }

    if !report.skipped.is_empty() {
        println!();
        println!("skipped {} milestone(s):", report.skipped.len());
        for event in &report.skipped {
            println!(
                "  {:<18}{}: {}",
                event.occurred_at.format("%Y-%m-%d %H:%M"),
                event.description,
                event.reason
            );
        }
    }
}

pub(super) fn engagement(report: &Report<EngagementRow>) {
    if report.rows.is_empty() {
        println!("no articles with engagement data");
    } else {
        println!(
            "{:<8}{:<42}{:>9}{:>9}{:>8}{:>11}{:>10}",
            "ID", "TITLE", "COMMENTS", "REPLIES", "REPLY%", "REACTIONS", "ENGAGE%"
        );
        for row in &report.rows {
            println!(
                "{:<8}{:<42}{:>9}{:>9}{:>7.1}%{:>11}{:>9.2}%",
                row.entity_id,
                title(&row.title),
                row.reader_comments,
                row.author_replies,
                row.reply_rate_pct,
                row.reactions,
                row.engagement_pct
            );
        }
    }
    skipped(&report.skipped);
}

pub(super) fn referrers(report: &Report<ReferrerRow>) {
    if report.rows.is_empty() {
        println!("no referrer data collected");
    }
    for row in &report.rows {
        println!(
            "{} {} ({} visits, {:.1}/week, collected {})",
            row.entity_id,
            title(&row.title),
            row.total,
            row.weekly_rate,
            row.collected_at.format("%Y-%m-%d %H:%M")
        );
        for domain in &row.domains {
            println!(
                "  {:<36}{:>8}{:>8.1}%",
                domain.domain, domain.count, domain.share_pct
            );
        }
    }
    skipped(&report.skipped);
}

pub(super) fn read_time(report: &Report<ReadTimeRow>) {
    if report.rows.is_empty() {
        println!("no articles with enough daily views");
    } else {
        println!(
            "{:<8}{:<42}{:>8}{:>10}{:>8}{:>12}{:>10}",
            "ID", "TITLE", "VIEWS", "AVG READ", "LENGTH", "COMPLETION", "HOURS"
        );
        for row in &report.rows {
            println!(
                "{:<8}{:<42}{:>8}{:>9.0}s{:>6}m{:>11.1}%{:>10.1}",
                row.entity_id,
                title(&row.title),
                row.views,
                row.avg_read_seconds,
                row.reading_time_minutes,
                row.completion_pct,
                row.total_read_hours
            );
        }
    }
    skipped(&report.skipped);
}

pub(super) fn quality(report: &Report<QualityRow>) {
    if report.rows.is_empty() {
        println!("no articles with enough daily views");
    } else {
        println!(
            "{:<8}{:<42}{:>8}{:>12}{:>10}{:>9}{:>8}",
            "ID", "TITLE", "VIEWS", "COMPLETION", "ENGAGE%", "FOLLOWS", "SCORE"
        );
        for row in &report.rows {
            println!(
                "{:<8}{:<42}{:>8}{:>11.1}%{:>9.2}%{:>9}{:>8.1}",
                row.entity_id,
                title(&row.title),
                row.views,
                row.completion_pct,
                row.engagement_pct,
                row.follows,
                row.quality_score
            );
        }
    }
    skipped(&report.skipped);
}

fn trend_label(trend_pct: Option<f64>) -> String {
    trend_pct.map_or_else(|| "NEW".to_string(), |t| format!("{t:+.0}%"))
}

pub(super) fn long_tail(report: &Report<LongTailRow>) {
    if report.rows.is_empty() {
        println!("no long-tail articles");
    } else {
        println!(
            "{:<8}{:<42}{:>6}{:>10}{:>10}{:>8}",
            "ID", "TITLE", "AGE", "RECENT", "PREVIOUS", "TREND"
        );
        for row in &report.rows {
            println!(
                "{:<8}{:<42}{:>6}{:>10}{:>10}{:>8}",
                row.entity_id,
                title(&row.title),
                row.age_days,
                row.recent_views,
                row.previous_views,
                trend_label(row.trend_pct)
            );
        }
    }
    skipped(&report.skipped);
}

fn slots(heading: &str, rows: &[PublishingSlot]) {
    println!(
        "{heading:<8}{:>10}{:>12}{:>12}{:>12}",
        "ARTICLES", "AVG VIEWS", "AVG REACT", "AVG COMM"
    );
    for slot in rows {
        println!(
            "{:<8}{:>10}{:>12.0}{:>12.1}{:>12.1}",
            slot.label, slot.articles, slot.avg_views, slot.avg_reactions, slot.avg_comments
        );
    }
}

pub(super) fn publishing_times(report: &PublishingTimesReport) {
    if report.by_weekday.is_empty() {
        println!("no published articles with lifetime data");
    } else {
        slots("DAY", &report.by_weekday);
        println!();
        slots("HOUR", &report.by_hour);
    }
    skipped(&report.skipped);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_are_kept() {
        assert_eq!(title("Rust tips"), "Rust tips");
    }

    #[test]
    fn long_titles_are_cut_to_width() {
        let long = "x".repeat(80);
        let cut = title(&long);
        assert_eq!(cut.chars().count(), TITLE_WIDTH);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn unresolved_semantics_ask_for_verification() {
        assert_eq!(semantics_label(None), "verify");
        assert_eq!(
            semantics_label(Some(CounterSemantics::Cumulative)),
            "cumulative"
        );
    }

    #[test]
    fn trend_without_previous_views_is_new() {
        assert_eq!(trend_label(None), "NEW");
        assert_eq!(trend_label(Some(50.0)), "+50%");
        assert_eq!(trend_label(Some(-12.4)), "-12%");
    }
}
