mod milestones;
mod report;

use clap::{Parser, Subcommand};
use devpulse_core::{AppConfig, EngineConfig};
use tracing_subscriber::EnvFilter;

use crate::milestones::MilestoneCommands;
use crate::report::ReportCommands;

#[derive(Debug, Parser)]
#[command(name = "devpulse")]
#[command(about = "Article analytics over collected snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database operations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run an analytics report over the stored snapshots
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Inspect and log milestone events
    Milestones {
        #[command(subcommand)]
        command: MilestoneCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("devpulse: no command given, see --help");
        return Ok(());
    };

    let config = devpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = devpulse_db::connect_pool_from_config(&config).await?;

    match command {
        Commands::Db { command } => run_db(&pool, command).await?,
        Commands::Report { command } => {
            let engine = load_engine(&config)?;
            report::run_report(&pool, &engine, command).await?;
        }
        Commands::Milestones { command } => milestones::run_milestones(&pool, command).await?,
    }

    Ok(())
}

async fn run_db(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            devpulse_db::health_check(pool).await?;
            println!("database reachable");
        }
        DbCommands::Migrate => {
            let applied = devpulse_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

/// Engine windows come from the YAML file when one is configured, otherwise
/// from the built-in defaults. The author from the environment wins over the file.
fn load_engine(config: &AppConfig) -> anyhow::Result<EngineConfig> {
    let engine = match &config.engine_config_path {
        Some(path) => devpulse_core::load_engine_config(path)?,
        None => EngineConfig::default(),
    };
    let engine = engine.with_author_override(config.author_username.clone());
    engine.validate()?;
    tracing::debug!(?engine, "engine config loaded");
    Ok(engine)
}
