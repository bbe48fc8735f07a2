//! Report command handlers for the CLI.
//!
//! Every report loads the snapshot store once, runs one engine computation
//! over it, and prints either a table or the result as JSON.

mod render;

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand};
use devpulse_core::{counters, EngineConfig, EntityId};
use devpulse_engine::report as reports;
use devpulse_engine::TimeRange;
use serde::Serialize;

/// Sub-commands available under `report`.
#[derive(Debug, Subcommand)]
pub enum ReportCommands {
    /// Per-article velocity of one lifetime counter
    Velocity {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        period: PeriodArgs,

        /// Lifetime counter to measure
        #[arg(long, default_value = counters::VIEWS)]
        counter: String,
    },
    /// Split the follower gain over a period across articles by view gain
    Followers {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Follower gain in the days after each publication
    PublicationGain {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Compare lifetime counters against the daily analytics stream
    Reconcile {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Velocity before and after every milestone
    Impact {
        #[command(flatten)]
        common: CommonArgs,

        /// Lifetime counter measured around article milestones
        #[arg(long, default_value = counters::VIEWS)]
        counter: String,
    },
    /// Author reply rate and reaction share per article
    Engagement {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Traffic sources from the latest referrer collection
    Referrers {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Average read time and completion per article
    ReadTime {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Completion and engagement combined into one score
    Quality {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Older articles that still draw steady traffic
    LongTail {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Average reach by publication weekday and hour (UTC)
    PublishingTimes {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Restrict the report to one article (by id)
    #[arg(long)]
    pub article: Option<EntityId>,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PeriodArgs {
    /// Length of the period in days, ending at --until
    #[arg(long, default_value_t = 7)]
    pub days: u32,

    /// Start of the period (RFC 3339); overrides --days
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// End of the period (RFC 3339); defaults to now
    #[arg(long)]
    pub until: Option<DateTime<Utc>>,
}

impl PeriodArgs {
    /// Resolve the arguments against `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the period is empty or inverted, or if `--days`
    /// reaches before the earliest representable timestamp.
    pub fn resolve(&self, now: DateTime<Utc>) -> anyhow::Result<TimeRange> {
        let end = self.until.unwrap_or(now);
        let start = match self.since {
            Some(since) => since,
            None => end
                .checked_sub_signed(Duration::days(i64::from(self.days)))
                .ok_or_else(|| {
                    anyhow::anyhow!("--days {} reaches before the earliest supported date", self.days)
                })?,
        };
        if start >= end {
            anyhow::bail!("period start {start} must be before its end {end}");
        }
        Ok(TimeRange::new(start, end))
    }
}

/// Run one report.
///
/// # Errors
///
/// Returns an error if the store cannot be loaded, the period is invalid,
/// or the report itself cannot be computed (for example the follower count
/// has no sample near the period boundaries).
pub(crate) async fn run_report(
    pool: &sqlx::PgPool,
    config: &EngineConfig,
    command: ReportCommands,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let store = devpulse_db::load_snapshot_store(pool).await?;

    match command {
        ReportCommands::Velocity {
            common,
            period,
            counter,
        } => {
            let range = period.resolve(now)?;
            let report = reports::velocity_report(&store, &counter, range, common.article);
            emit(common.json, &report, render::velocity)?;
        }
        ReportCommands::Followers { common, period } => {
            let range = period.resolve(now)?;
            let report =
                reports::follower_attribution_report(&store, config, range, common.article)?;
            emit(common.json, &report, render::followers)?;
        }
        ReportCommands::PublicationGain { common } => {
            let report = reports::publication_gain_report(&store, config, common.article);
            emit(common.json, &report, render::publication_gain)?;
        }
        ReportCommands::Reconcile { common } => {
            let report = reports::reconciliation_report(&store, config, now, common.article);
            emit(common.json, &report, render::reconciliation)?;
        }
        ReportCommands::Impact { common, counter } => {
            let report = reports::impact_report(&store, config, &counter, common.article);
            emit(common.json, &report, render::impact)?;
        }
        ReportCommands::Engagement { common } => {
            let report = reports::engagement_report(&store, config, common.article)?;
            emit(common.json, &report, render::engagement)?;
        }
        ReportCommands::Referrers { common } => {
            let report = reports::referrer_report(&store, config, now, common.article);
            emit(common.json, &report, render::referrers)?;
        }
        ReportCommands::ReadTime { common } => {
            let report = reports::read_time_report(&store, common.article);
            emit(common.json, &report, render::read_time)?;
        }
        ReportCommands::Quality { common } => {
            let report = reports::quality_report(&store, config, now, common.article);
            emit(common.json, &report, render::quality)?;
        }
        ReportCommands::LongTail { common } => {
            let report = reports::long_tail_report(&store, config, now, common.article);
            emit(common.json, &report, render::long_tail)?;
        }
        ReportCommands::PublishingTimes { common } => {
            let report = reports::publishing_times_report(&store, common.article);
            emit(common.json, &report, render::publishing_times)?;
        }
    }

    Ok(())
}

fn emit<T: Serialize>(json: bool, value: &T, table: fn(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        table(value);
    }
    Ok(())
}
