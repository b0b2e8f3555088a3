//! CinderKV server binary.
//!
//! Loads a YAML or JSON configuration, opens the storage engine, starts the
//! configured background workers, and serves the HTTP API until SIGTERM or
//! ctrl-c, then closes the engine cleanly (sync + checkpoint marker).

use cinderkv_core::LogStore;
use cinderkv_server::{AppState, ServerOptions};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CinderKV - a persistent typed key/value store over HTTP.
#[derive(Parser)]
#[command(name = "cinderkv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a YAML or JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging regardless of the config file
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut options = match &cli.config {
        Some(path) => ServerOptions::load(path)?,
        None => ServerOptions::default(),
    };
    options.debug |= cli.debug;

    init_logging(&options)?;
    options.validate()?;

    let store = Arc::new(LogStore::open(&options.path, options.store_options())?);

    if options.region.enable {
        store.start_region_compactor(
            &options.region.cron,
            usize::from(options.region.threshold),
        )?;
        info!(cron = %options.region.cron, threshold = options.region.threshold, "region compactor armed");
    }
    if options.checkpoint.enable {
        store.start_checkpointer(options.checkpoint.interval);
        info!(interval = options.checkpoint.interval, "checkpoint worker armed");
    }

    if let Err(e) = options.saved() {
        warn!(error = %e, "could not save effective config into the data directory");
    }

    let listener = cinderkv_server::bind(options.port).await?;
    let state = AppState::new(Arc::clone(&store), Arc::new(options));

    cinderkv_server::serve(listener, state, shutdown_signal()).await?;

    store.close()?;
    info!("bye");
    Ok(())
}

fn init_logging(options: &ServerOptions) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if options.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    if options.logpath.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&options.logpath)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .init();
    }
    Ok(())
}

/// Resolves on SIGTERM or ctrl-c.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
