//! Audio Player (tuneport-ap) - Main entry point
//!
//! Starts the playback actor on the headless engine, indexes the local
//! library, and serves the HTTP/SSE control interface until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tuneport_ap::api::{self, AppContext};
use tuneport_ap::config::{Config, ConfigOverrides};
use tuneport_ap::engine::HeadlessEngine;
use tuneport_ap::playback::{AutoAdvance, PlaybackActor};
use tuneport_ap::providers::{LibraryCompleter, LocalLibrary, Registry};

/// Command-line arguments for tuneport-ap
#[derive(Parser, Debug)]
#[command(name = "tuneport-ap")]
#[command(about = "Audio player service for tuneport")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "TUNEPORT_AP_PORT")]
    port: Option<u16>,

    /// Root folder containing music files
    #[arg(short, long, env = "TUNEPORT_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not advance to the next track when one ends
    #[arg(long)]
    no_autoplay: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(
        args.config.as_deref(),
        ConfigOverrides {
            port: args.port,
            root_folder: args.root_folder,
            no_autoplay: args.no_autoplay,
        },
    )
    .context("Failed to load configuration")?;

    // Initialize tracing
    let default_filter = config
        .log_level
        .clone()
        .unwrap_or_else(|| "tuneport_ap=debug,tower_http=debug".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tuneport audio player on port {}", config.port);
    info!("Root folder: {}", config.root_folder.display());

    // Index the library off the async workers
    let root = config.root_folder.clone();
    let scanned = tokio::task::spawn_blocking(move || LocalLibrary::scan(&root))
        .await
        .context("Library scan task failed")?;
    let library = Arc::new(match scanned {
        Ok(library) => {
            info!(
                "Indexed {} tracks under {}",
                library.len(),
                library.root().display()
            );
            library
        }
        Err(e) => {
            warn!("Local library unavailable: {}", e);
            LocalLibrary::empty(config.root_folder.clone())
        }
    });

    let mut registry = Registry::new();
    registry
        .register_provider(library.clone())
        .context("Failed to register local library")?;
    registry
        .register_completer(Arc::new(LibraryCompleter::new(Arc::clone(&library))))
        .context("Failed to register title completion")?;
    let registry = Arc::new(registry);

    let player = PlaybackActor::spawn(config.player.clone(), || Ok(HeadlessEngine::new()))
        .context("Failed to start playback actor")?;
    info!("Playback actor ready");

    let autoplay = config
        .autoplay
        .then(|| AutoAdvance::spawn(player.clone(), Arc::clone(&registry)));

    let ctx = AppContext {
        player: player.clone(),
        registry,
        updates_capacity: config.updates_capacity,
    };

    // Open SSE streams hold graceful shutdown until the player is released
    let shutdown_player = player.clone();
    let shutdown = async move {
        shutdown_signal().await;
        if let Err(e) = shutdown_player.release().await {
            error!("Failed to release player: {}", e);
        }
    };

    let served = api::run(config.port, ctx, shutdown).await;

    // No-op after a signal; covers the server failing on its own
    if let Err(e) = player.release().await {
        error!("Failed to release player: {}", e);
    }
    if let Some(task) = autoplay {
        if let Err(e) = task.await {
            warn!("Auto-advance task ended abnormally: {}", e);
        }
    }

    served.context("HTTP server failed")?;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
