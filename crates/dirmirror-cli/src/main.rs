//! dirmirror - One-way mirror of a flat directory
//!
//! Runs a startup reconciliation of TARGET against SOURCE, then watches
//! SOURCE and applies every change to TARGET until interrupted.
//!
//! Exit status is 0 on a graceful stop (signal, source removed) and 255
//! when the mirror cannot be started.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dirmirror_core::config::{Config, LoggingConfig};
use dirmirror_core::ports::{ILocalFileSystem, IMirrorReporter};
use dirmirror_sync::filesystem::LocalFileSystemAdapter;
use dirmirror_sync::reporter::TracingReporter;
use dirmirror_sync::{
    prepare_roots, FileWatcher, Reconciler, WatchExit, WatchLoop, WatchOptions,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Exit status for any failure that prevents mirroring from starting
const EXIT_STARTUP_FAILURE: u8 = 255;

#[derive(Debug, Parser)]
#[command(
    name = "dirmirror",
    version,
    about = "Mirror the regular files of one directory into another"
)]
struct Cli {
    /// Directory to mirror from
    source: PathBuf,

    /// Directory to mirror into (created if missing)
    target: PathBuf,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,

    /// Reconcile once and exit without watching
    #[arg(long)]
    once: bool,
}

// ============================================================================
// Configuration & logging
// ============================================================================

/// Loads the config file named on the command line, or the default one
fn load_config(cli: &Cli) -> Result<Config> {
    resolve_config(cli.config.as_deref(), &Config::default_path())
}

/// An explicit file must exist and parse. Only a missing default file
/// falls back to built-in defaults; a broken one is an error.
fn resolve_config(explicit: Option<&Path>, default_path: &Path) -> Result<Config> {
    let config = match explicit {
        Some(path) => Config::load(path)?,
        None => Config::load_if_exists(default_path)?,
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration: {}", details.join("; "));
    }
    Ok(config)
}

/// Default filter directive: `-v` wins over the configured level
fn log_filter(verbose: u8, logging: &LoggingConfig) -> String {
    match verbose {
        0 => logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(cli: &Cli, logging: &LoggingConfig) {
    let filter = log_filter(cli.verbose, logging);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.json || logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }
}

// ============================================================================
// Shutdown
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

async fn run(cli: Cli, config: Config) -> Result<()> {
    let roots = prepare_roots(&cli.source, &cli.target).await?;

    let reporter: Arc<dyn IMirrorReporter> = Arc::new(TracingReporter::new());
    reporter.roots_resolved(&roots);

    let fs: Arc<dyn ILocalFileSystem> = Arc::new(LocalFileSystemAdapter::new());
    let reconciler = Reconciler::new(Arc::clone(&fs), Arc::clone(&reporter), roots.clone());

    reconciler
        .reconcile()
        .await
        .context("Startup reconciliation failed")?;

    if cli.once {
        return Ok(());
    }

    let (watcher, rx) = FileWatcher::new(&roots.source, config.mirror.event_buffer)?;

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let watch_loop = WatchLoop::new(
        fs,
        reporter,
        reconciler,
        WatchOptions::from(&config.mirror),
    );
    let exit = watch_loop.run(rx, shutdown_token).await?;

    match exit {
        WatchExit::Cancelled => info!("dirmirror shut down gracefully"),
        WatchExit::SourceInvalidated => info!(source = %roots.source, "Source removed; stopping"),
        WatchExit::WatcherClosed => info!("Watcher closed; stopping"),
    }

    if let Err(e) = watcher.unwatch() {
        debug!(error = %format!("{e:#}"), "Watch already released");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(EXIT_STARTUP_FAILURE);
        }
    };

    init_tracing(&cli, &config.logging);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "dirmirror exiting with error");
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_STARTUP_FAILURE)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
