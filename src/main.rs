//! Drive Reconciler Agent
//!
//! Runs on every storage node. Keeps the node's ManagedDrive records cached
//! through list/watch and periodically logs the node's drive inventory.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use drive_reconciler::{
    DriveIndexer, DriveSelector, ErrorAction, IndexerConfig, KubeDriveSource, Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Drive Reconciler - node-local drive cache and device validation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Name of the node this agent runs on
    #[arg(long, env = "NODE_NAME")]
    node_name: String,

    /// Full re-list interval in seconds (0 disables periodic re-lists)
    #[arg(long, env = "RESYNC_INTERVAL", default_value = "300")]
    resync_interval_secs: u64,

    /// Server-side watch timeout in seconds
    #[arg(long, env = "WATCH_TIMEOUT", default_value = "290")]
    watch_timeout_secs: u32,

    /// Drive inventory summary interval in seconds
    #[arg(long, env = "SUMMARY_INTERVAL", default_value = "60")]
    summary_interval_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting Drive Reconciler");
    info!("  Version: {}", drive_reconciler::VERSION);
    info!("  Node: {}", args.node_name);
    info!("  Resync interval: {}s", args.resync_interval_secs);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
        shutdown.cancel();
    });

    let client = kube::Client::try_default().await?;
    let source = Arc::new(KubeDriveSource::new(client).with_watch_timeout(args.watch_timeout_secs));

    let config = IndexerConfig {
        resync_interval: Duration::from_secs(args.resync_interval_secs),
        ..Default::default()
    };
    config.validate()?;

    let indexer = DriveIndexer::open(args.node_name.clone(), config, source, cancel.clone()).await;
    if !indexer.is_synced() {
        info!("Agent shutdown before the drive cache synced");
        return Ok(());
    }

    let selector = DriveSelector::new(args.node_name.clone(), indexer.reader());
    let mut ticker = tokio::time::interval(Duration::from_secs(args.summary_interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => break,
        }

        match selector.list_drives() {
            Ok(drives) => info!(
                node = %selector.node_id(),
                managed = drives.managed.len(),
                non_managed = drives.non_managed.len(),
                version = %indexer.last_sync_version(),
                "drive inventory"
            ),
            Err(e) if e.action() == ErrorAction::NoRequeue => {
                error!("Drive cache holds an invalid record: {}", e);
                cancel.cancel();
                return Err(e);
            }
            Err(e) => warn!("Failed to summarize drives: {}", e),
        }
    }

    info!("Agent shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("kube=info".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
