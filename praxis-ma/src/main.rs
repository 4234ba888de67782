//! Module Access engine (praxis-ma) - Main entry point
//!
//! Server-authoritative gating service for the Praxis academy platform.
//! Route guards and portal UIs are convenience consumers; every access
//! decision is made here.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use praxis_ma::{build_router, AppState};

/// Command-line arguments for praxis-ma
#[derive(Parser, Debug)]
#[command(name = "praxis-ma")]
#[command(about = "Module Access engine for Praxis")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "PRAXIS_MA_PORT")]
    port: u16,

    /// Data directory containing praxis.db
    #[arg(short, long, env = "PRAXIS_DATA_DIR")]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "praxis_ma=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!(
        "Starting Praxis Module Access engine v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        args.port
    );

    let data_dir =
        praxis_common::config::resolve_data_dir(args.data_dir.as_deref(), "PRAXIS_DATA_DIR")
            .context("Failed to resolve data directory")?;
    let db_path = praxis_common::config::database_path(&data_dir);
    info!("Database path: {}", db_path.display());

    let pool = praxis_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(pool);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

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
