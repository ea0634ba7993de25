//! Heatmap API Server
//!
//! Serves the upload page and renders heatmaps for uploaded sensor CSVs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use heatmap_api::config::ServiceConfig;
use heatmap_api::pipeline::PipelineError;
use heatmap_api::state::AppState;
use ingestion::ObservationTable;

/// Heatmap API Server
#[derive(Parser, Debug)]
#[command(name = "heatmap-api")]
#[command(about = "Turns geotagged sensor CSVs into heatmap images")]
struct Args {
    /// Listen address (overrides server.listen)
    #[arg(short, long, env = "HEATMAP_LISTEN_ADDR")]
    listen: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "HEATMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Render a local CSV once, print the results as JSON and exit
    #[arg(long)]
    render_file: Option<PathBuf>,

    /// Number of worker threads
    #[arg(long, env = "HEATMAP_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }
    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async move {
        init_tracing(&args.log_level);

        let mut config = ServiceConfig::load(args.config.as_deref())?;
        if let Some(listen) = &args.listen {
            config.server.listen = listen.clone();
        }

        match &args.render_file {
            Some(path) => render_file(config, path).await,
            None => run_server(config).await,
        }
    })
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();
}

async fn run_server(config: ServiceConfig) -> Result<()> {
    let prometheus = heatmap_api::metrics::install_recorder()?;

    info!(
        artifact_dir = %config.store.artifact_dir.display(),
        rasterizer = ?config.raster.backend,
        "Starting heatmap API server"
    );

    let listen = config.server.listen.clone();
    let state = match AppState::new(config, Some(prometheus)).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize application state: {:#}", e);
            return Err(e);
        }
    };

    let app = heatmap_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!(address = %listen, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// One-shot render of a local CSV.
async fn render_file(config: ServiceConfig, path: &std::path::Path) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table = ObservationTable::from_bytes(&bytes)?.validate()?;

    let state = AppState::new(config, None).await?;
    let output = match state.pipeline.run(&table).await {
        Ok(results) => serde_json::json!({ "success": true, "results": results }),
        Err(PipelineError::AllFailed(details)) => {
            serde_json::json!({ "error": "Failed to create any heatmaps", "details": details })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
