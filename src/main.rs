//! Binary entry point for engram-bridge.
//!
//! Speaks newline-delimited JSON on stdin/stdout with a parent editor. All
//! diagnostics go to stderr or the configured log file.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for startup failures before logging exists
#![allow(clippy::print_stderr)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::Parser;
use engram_bridge::bridge::install_signal_handler;
use engram_bridge::{Bridge, BridgeConfig, EventProcessor, SessionStore, observability};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

/// Engram bridge - turns editor events into risk-screened memories.
#[derive(Parser)]
#[command(name = "engram-bridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Session identifier used to load and save memories.
    #[arg(long, env = "ENGRAM_BRIDGE_SESSION_ID")]
    session_id: Option<String>,

    /// Directory holding session files.
    #[arg(long, env = "ENGRAM_BRIDGE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "engram-bridge exited with an error");
            eprintln!("engram-bridge: {e:#}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = BridgeConfig::load(cli.config.as_deref())?;
    if let Some(session_id) = cli.session_id {
        config = config.with_session_id(session_id);
    }
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }

    observability::init_from_settings(&config.logging, cli.verbose)
        .context("failed to initialize logging")?;
    config.log_skipped_files();

    tracing::info!(
        data_dir = %config.data_dir.display(),
        version = env!("CARGO_PKG_VERSION"),
        "Starting engram-bridge"
    );

    let store = SessionStore::from_config(&config);
    tracing::info!(
        session_id = store.session_id(),
        path = %store.session_file().display(),
        memories = store.len(),
        "Session opened"
    );
    let mut bridge = Bridge::new(EventProcessor::new(), store);
    install_signal_handler(bridge.shutdown_signal())
        .context("failed to install signal handler")?;

    // Stdin moves to the reader thread, so it cannot be locked here
    bridge.run(BufReader::new(io::stdin()), io::stdout().lock())?;
    tracing::info!("engram-bridge stopped");
    Ok(())
}
