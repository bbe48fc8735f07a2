//! Milestone command handlers for the CLI.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use devpulse_core::{EntityId, EventType, MilestoneEvent};
use devpulse_engine::report::{detect_content_changes, milestone_timeline};
use devpulse_engine::ContentChange;

/// Sub-commands available under `milestones`.
#[derive(Debug, Subcommand)]
pub enum MilestoneCommands {
    /// Show logged milestones in time order
    List {
        /// Filter to one article (by id)
        #[arg(long)]
        article: Option<EntityId>,

        /// Print the timeline as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Log a milestone by hand
    Add {
        /// Article the milestone belongs to; omit for an account-wide event
        #[arg(long)]
        article: Option<EntityId>,

        /// Event type, e.g. `staff_curated` or `manual`
        #[arg(long = "type")]
        event_type: EventType,

        /// Free-form description
        #[arg(long)]
        description: String,

        /// When it happened (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Compare current titles and tags with their last recorded version
    Detect {
        /// Restrict detection to one article (by id)
        #[arg(long)]
        article: Option<EntityId>,
    },
}

pub(crate) async fn run_milestones(
    pool: &sqlx::PgPool,
    command: MilestoneCommands,
) -> anyhow::Result<()> {
    match command {
        MilestoneCommands::List { article, json } => run_list(pool, article, json).await,
        MilestoneCommands::Add {
            article,
            event_type,
            description,
            at,
        } => {
            let event = MilestoneEvent {
                entity_id: article,
                event_type,
                description,
                occurred_at: at.unwrap_or_else(Utc::now),
            };
            run_add(pool, event).await
        }
        MilestoneCommands::Detect { article } => run_detect(pool, article).await,
    }
}

async fn run_list(
    pool: &sqlx::PgPool,
    article: Option<EntityId>,
    json: bool,
) -> anyhow::Result<()> {
    let store = devpulse_db::load_snapshot_store(pool).await?;
    let timeline = milestone_timeline(&store, article);

    if json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
        return Ok(());
    }

    if timeline.rows.is_empty() {
        println!("no milestones logged");
        return Ok(());
    }

    println!("{:<18}{:<8}{:<16}DESCRIPTION", "WHEN", "ID", "TYPE");
    for event in &timeline.rows {
        let id = event
            .entity_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        println!(
            "{:<18}{:<8}{:<16}{}",
            event.occurred_at.format("%Y-%m-%d %H:%M"),
            id,
            event.event_type.as_str(),
            event.description
        );
    }

    println!();
    for (event_type, count) in &timeline.counts {
        println!("{:<16}{count}", event_type.as_str());
    }
    for entry in &timeline.skipped {
        tracing::warn!(article = entry.entity_id, reason = %entry.reason, "milestone not shown");
    }
    Ok(())
}

/// Log one milestone.
///
/// # Errors
///
/// Returns an error if the article is unknown or the insert fails.
async fn run_add(pool: &sqlx::PgPool, event: MilestoneEvent) -> anyhow::Result<()> {
    if event.description.trim().is_empty() {
        anyhow::bail!("milestone description must not be empty");
    }
    if let Some(id) = event.entity_id {
        devpulse_db::get_article(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("article {id} not found"))?;
    }

    if devpulse_db::insert_milestone(pool, &event).await? {
        println!(
            "logged {} at {}",
            event.event_type,
            event.occurred_at.format("%Y-%m-%d %H:%M")
        );
    } else {
        println!("milestone already logged; nothing to do");
    }
    Ok(())
}

/// Detect title and tag changes and persist them.
///
/// A failed write is logged and the remaining articles are still processed.
async fn run_detect(pool: &sqlx::PgPool, article: Option<EntityId>) -> anyhow::Result<()> {
    let store = devpulse_db::load_snapshot_store(pool).await?;
    let changes = detect_content_changes(&store, Utc::now(), article);

    let mut versions = 0usize;
    let mut logged = 0usize;
    let mut failed = 0usize;
    for change in &changes {
        let entity = change.version().map(|v| v.entity_id);
        match devpulse_db::persist_content_change(pool, change).await {
            Ok(outcome) => {
                versions += usize::from(outcome.version_recorded);
                if outcome.milestone_logged == Some(true) {
                    logged += 1;
                }
                if let ContentChange::TitleChanged { milestone, .. } = change {
                    println!("{}", milestone.description);
                }
            }
            Err(e) => {
                failed += 1;
                tracing::error!(article = ?entity, error = %e, "failed to persist content change");
            }
        }
    }

    println!(
        "{} change(s): {versions} version(s) recorded, {logged} milestone(s) logged",
        changes.len()
    );
    if failed > 0 {
        anyhow::bail!("{failed} content change(s) could not be persisted");
    }
    Ok(())
}
