//! maildrip - Mailing dispatch service entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use maildrip_common::config::Config;
use maildrip_core::{DispatchEngine, DispatchScheduler, SmtpMailer};
use maildrip_storage::db::DatabasePool;
use maildrip_storage::repository::{
    DbClientRepository, DbLogRepository, DbMailingRepository, DbMessageRepository,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "maildrip", about = "Mailing campaign dispatch service")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the dispatch scheduler until interrupted (default)
    Serve,
    /// Run exactly one dispatch pass and exit (for external cron scheduling)
    Dispatch,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Dispatch => dispatch_once(config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting maildrip dispatch service...");

    let engine = build_engine(&config).await?;
    let scheduler = DispatchScheduler::new(
        engine,
        Duration::from_secs(config.dispatch.interval_secs),
    );
    scheduler.start();

    info!("maildrip started successfully");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    scheduler.shutdown().await;
    info!("maildrip shutdown complete");

    Ok(())
}

async fn dispatch_once(config: Config) -> Result<()> {
    let engine = build_engine(&config).await?;
    let summary = engine.run_pass().await?;

    info!(
        scanned = summary.scanned,
        completed = summary.completed,
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        "Dispatch pass complete"
    );

    Ok(())
}

async fn build_engine(config: &Config) -> Result<Arc<DispatchEngine>> {
    let db_pool = DatabasePool::new(&config.database).await?;
    db_pool.migrate().await?;

    let transport = Arc::new(SmtpMailer::new(config.smtp.clone()));

    Ok(Arc::new(DispatchEngine::new(
        Arc::new(DbMailingRepository::new(db_pool.clone())),
        Arc::new(DbClientRepository::new(db_pool.clone())),
        Arc::new(DbMessageRepository::new(db_pool.clone())),
        Arc::new(DbLogRepository::new(db_pool)),
        transport,
        config.smtp.from_address.clone(),
        config.dispatch.tz()?,
    )))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,maildrip=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .init();
}
