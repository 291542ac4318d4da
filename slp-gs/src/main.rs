//! Gesture Session service (slp-gs) - Main entry point
//!
//! Hosts stability-gated gesture sessions over HTTP and streams their
//! activity over SSE.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use slp_common::config::ConfigResolver;
use slp_gs::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for slp-gs
#[derive(Parser, Debug)]
#[command(name = "slp-gs")]
#[command(about = "Gesture Session service for SignLink")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "SLP_GS_PORT")]
    port: Option<u16>,

    /// Config file path
    #[arg(short, long, env = "SLP_CONFIG")]
    config: Option<PathBuf>,

    /// Fixed RNG seed for the gesture simulator
    #[arg(long, env = "SLP_SEED")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config.clone());
    let mut config = resolver.load().context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }

    // RUST_LOG wins over the configured level
    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("slp_gs={level},slp_common={level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting SignLink Gesture Session service v{}",
        env!("CARGO_PKG_VERSION")
    );
    match resolver.explicit_path() {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: platform default or compiled defaults"),
    }
    info!(
        refractory_secs = config.detector.refractory_secs,
        acceptance_threshold = config.detector.acceptance_threshold,
        decay_step = config.detector.decay_step,
        tick_interval_ms = config.simulation.tick_interval_ms,
        seed = ?config.simulation.seed,
        "Detector settings"
    );

    let bind = format!("{}:{}", config.bind_address, config.port);
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address {bind}"))?;

    let state = AppState::simulated(config).context("Failed to initialize gesture sources")?;
    let sessions = state.sessions.clone();
    let app = build_router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sessions.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
