use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_maintenance::{
    catalog::SeaOrmFeedCatalog,
    config::Config,
    database::Database,
    job_scheduling::ImportJobOutbox,
    maintenance::{ExtensionEngine, FeedVersionScheduler},
    models::ExtendOutcome,
    utils::dates::parse_date,
};

#[derive(Parser)]
#[command(name = "feed-maintenance")]
#[command(version)]
#[command(about = "Schedules feed version imports and extends expiring schedule data")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (defaults to $CONFIG_FILE, then config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply database migrations and exit
    Migrate,

    /// Queue an import of the next version of every feed
    EnqueueNext {
        /// Reference date for candidate selection (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        date: NaiveDate,

        /// Import level for every dispatched job
        #[arg(long)]
        import_level: Option<i32>,

        /// Maximum number of jobs to dispatch (overrides config file)
        #[arg(long)]
        max_imports: Option<usize>,
    },

    /// Extend every active feed version whose coverage is about to end
    ExtendExpired {
        /// Extend versions ending on or before this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        expired_on: Option<NaiveDate>,
    },

    /// Extend a single feed version
    ExtendVersion {
        /// SHA1 of the feed version
        #[arg(long)]
        sha1: String,

        /// Records ending on or after this date are extended (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        from: Option<NaiveDate>,

        /// New end date for extended records (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,
    },
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("feed_maintenance={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting feed maintenance v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load_from_file(path)?;
            info!("Configuration loaded from: {}", path);
            config
        }
        None => Config::load()?,
    };

    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database connection established and migrations applied");

    let catalog = Arc::new(SeaOrmFeedCatalog::new(&database));

    match cli.command {
        Command::Migrate => {}
        Command::EnqueueNext {
            date,
            import_level,
            max_imports,
        } => {
            let outbox = Arc::new(ImportJobOutbox::new(database.connection()));
            let scheduler =
                FeedVersionScheduler::new(catalog, outbox, config.maintenance.clone());
            let report = scheduler
                .enqueue_next_feed_versions(date, import_level, max_imports)
                .await?;
            info!(
                "Queued {} imports ({} discovered, {} failed)",
                report.dispatched.len(),
                report.discovered,
                report.failed.len()
            );
        }
        Command::ExtendExpired { expired_on } => {
            let engine = ExtensionEngine::new(catalog, config.maintenance.clone());
            engine.extend_expired_feed_versions(expired_on).await?;
        }
        Command::ExtendVersion { sha1, from, to } => {
            let version = catalog
                .feed_versions()
                .find_by_sha1(&sha1)
                .await?
                .with_context(|| format!("No feed version with sha1 {sha1}"))?;
            let engine = ExtensionEngine::new(catalog, config.maintenance.clone());
            match engine.extend_feed_version(&version, from, to).await? {
                ExtendOutcome::Extended { records_updated } => {
                    info!("Extended {} schedule stop pairs", records_updated)
                }
                ExtendOutcome::AlreadyExtended { .. } => {
                    info!("Feed version {} was already extended", sha1)
                }
            }
        }
    }

    Ok(())
}
