//! Album-Ripper main entry point
//!
//! Command-line interface for the Album-Ripper gallery downloader.

use album_ripper::config::{load_config_with_hash, Config};
use album_ripper::progress::LiveManager;
use album_ripper::{run, ProgressReporter, RipperError};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Album-Ripper: a patient gallery album downloader
///
/// Reads album URLs from the configured URL list and downloads every image
/// of every album, one album at a time, with retries and rate-limit
/// cooldowns. Image URLs that could not be fetched end up in the session log.
#[derive(Parser, Debug)]
#[command(name = "album-ripper")]
#[command(version = "1.0.0")]
#[command(about = "A patient gallery album downloader", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_ref())?;

    let reporter: Arc<dyn ProgressReporter> = if cli.quiet {
        Arc::new(LiveManager::hidden())
    } else {
        Arc::new(LiveManager::new())
    };

    tokio::select! {
        result = run(config, Arc::clone(&reporter)) => {
            let summary = result.inspect_err(|e| tracing::error!("Run failed: {}", e))?;
            if !summary.failed.is_empty() {
                tracing::warn!(
                    "{} image(s) could not be downloaded, see the session log",
                    summary.failed.len()
                );
            }
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            reporter.stop();
            tracing::error!("Interrupted by user");
            Err(RipperError::Interrupted.into())
        }
    }
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("album_ripper=info,warn"),
            1 => EnvFilter::new("album_ripper=debug,info"),
            2 => EnvFilter::new("album_ripper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Same stream as the progress bars
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
