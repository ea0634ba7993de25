//! Application state and shared resources.

use std::sync::Arc;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use storage::ArtifactStore;
use tokio::sync::Mutex;

use crate::config::ServiceConfig;
use crate::pipeline::Pipeline;
use crate::rasterize::{build_rasterizer, Rasterizer};

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,
    pub store: ArtifactStore,
    pub pipeline: Pipeline,
    /// Held for the whole of an upload or a clear; the store directory is
    /// shared by every request in the process
    pub render_lock: Mutex<()>,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Open the artifact store and build the configured rasterizer.
    pub async fn new(config: ServiceConfig, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        let rasterizer = build_rasterizer(&config.raster);
        Self::with_rasterizer(config, rasterizer, prometheus).await
    }

    /// Same as [`AppState::new`] with an explicit rasterizer.
    pub async fn with_rasterizer(
        config: ServiceConfig,
        rasterizer: Arc<dyn Rasterizer>,
        prometheus: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let store = ArtifactStore::open(&config.store.artifact_dir).await?;
        let pipeline = Pipeline::new(
            store.clone(),
            config.render.clone(),
            config.raster.clone(),
            rasterizer,
        );

        Ok(Self {
            config,
            store,
            pipeline,
            render_lock: Mutex::new(()),
            prometheus,
        })
    }
}
