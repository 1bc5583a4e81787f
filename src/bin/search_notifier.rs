//! # Saved-search Notification Run
//!
//! Performs one notification run and exits. Scheduling is left to the caller
//! (cron or any job scheduler): exit code 0 when every due search was
//! evaluated, 1 when the run stopped early.

use anyhow::Context;
use clap::Parser;
use search_notifier::config::ConfigManager;
use search_notifier::directory::PgBeneficiaryDirectory;
use search_notifier::gateway::HttpOfferSearchGateway;
use search_notifier::logging::init_structured_logging;
use search_notifier::notification::PushNotificationDispatcher;
use search_notifier::orchestration::BatchCoordinator;
use search_notifier::store::PgSearchStateStore;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "search-notifier")]
#[command(about = "Notify beneficiaries of new offers matching their saved searches")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration directory (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Environment overlay to load (default: detected from SEARCH_NOTIFIER_ENV / APP_ENV)
    #[arg(short, long)]
    environment: Option<String>,

    /// Print the effective configuration with credentials masked, then exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_structured_logging();

    match run(cli).await {
        Ok(()) => {}
        Err(e) => {
            error!(error = format!("{e:#}"), "Saved-search notification run failed");
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let environment = cli
        .environment
        .unwrap_or_else(ConfigManager::detect_environment);
    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir, &environment)
        .context("failed to load configuration")?;
    let config = manager.config();

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&manager.debug_config())?);
        return Ok(());
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_seconds))
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    let coordinator = BatchCoordinator::from_config(
        config,
        Arc::new(PgSearchStateStore::new(pool.clone())),
        Arc::new(HttpOfferSearchGateway::new(&config.offer_api)?),
        Arc::new(PgBeneficiaryDirectory::new(pool.clone())),
        Arc::new(PushNotificationDispatcher::new(&config.push)?),
    );

    let outcome = coordinator.run().await;
    pool.close().await;

    let stats = outcome?;
    info!(
        notifications_sent = stats.notifications_sent,
        searches_total = stats.searches_total,
        "✅ Saved-search notification run completed"
    );
    Ok(())
}
