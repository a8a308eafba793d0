//! Query server for neighborhood lookups.
//!
//! Serves the geofence endpoint over HTTP, resolving coordinates against the
//! neighborhood boundary dataset loaded at startup.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use nabe::api::{router, AppState};
use nabe::config::Config;
use nabe::pip::{BoundaryStore, PointResolver};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Neighborhood lookup server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// GeoJSON boundary dataset (overrides config)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Fallback label when a request has no city (overrides config)
    #[arg(long)]
    default_label: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(dataset) = args.dataset {
        config.dataset = dataset;
    }
    if let Some(label) = args.default_label {
        config.default_label = label;
    }

    info!("Nabe Query Server");
    info!("Boundary dataset: {}", config.dataset.display());

    let store = Arc::new(BoundaryStore::from_path(&config.dataset));

    // Warm the store so the first request doesn't pay for the read. A failure
    // here is not fatal: requests report it until the dataset becomes readable.
    match store.load() {
        Ok(regions) => info!("Loaded {} neighborhoods", regions.len()),
        Err(e) => warn!("Boundary dataset not loaded: {}", e),
    }

    let state = Arc::new(AppState {
        resolver: PointResolver::new(store),
        default_label: config.default_label.clone(),
    });

    // Build router
    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Starting server on {}", config.listen);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
