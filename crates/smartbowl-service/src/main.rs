//! SmartBowl Service - HTTP API for bowl telemetry.
//!
//! Run with: `cargo run -p smartbowl-service`

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use smartbowl_service::{AppState, Config, api};
use smartbowl_store::TimeSeriesStore;

/// SmartBowl Service - HTTP API for bowl telemetry.
#[derive(Parser, Debug)]
#[command(name = "smartbowl-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long)]
    bind: Option<String>,

    /// Maximum samples kept per device (overrides config).
    #[arg(short, long)]
    max_entries: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("smartbowl_service=info".parse()?)
                .add_directive("smartbowl_store=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default().unwrap_or_default(),
    };

    // Override config with CLI args
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(max_entries) = args.max_entries {
        config.storage.max_entries = max_entries;
    }
    config.validate()?;

    info!(
        "Keeping up to {} samples per device",
        config.storage.max_entries
    );
    let store = TimeSeriesStore::with_capacity(config.storage.max_entries)?;

    let state = AppState::new(store, &config);
    info!("Registered {} configured devices", state.devices.len());

    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
