//! Document to image rasterization.
//!
//! Backends implement [`Rasterizer`]; callers go through
//! [`rasterize_with_timeout`] and then [`wait_for_artifact`] before trusting
//! that the image exists.

mod chrome;
mod native;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::{RasterBackend, RasterConfig};

pub use chrome::ChromeRasterizer;
pub use native::NativeRasterizer;

#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("Error generating PNG: rasterization timed out after {0:?}")]
    Timeout(Duration),

    #[error("Error generating PNG: failed to start {binary}: {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error generating PNG: browser exited with {status}: {stderr}")]
    Browser { status: String, stderr: String },

    #[error("Error generating PNG: {0}")]
    Render(#[from] renderer::RenderError),

    #[error("Error generating PNG: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error generating PNG: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Error generating PNG: render task failed: {0}")]
    Task(String),
}

/// Turns a map document into a PNG of fixed size.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn rasterize(&self, document: &Path, image: &Path) -> Result<(), RasterizeError>;
}

/// Backend selected by `config`.
pub fn build_rasterizer(config: &RasterConfig) -> Arc<dyn Rasterizer> {
    match config.backend {
        RasterBackend::Native => Arc::new(NativeRasterizer::new(config.width, config.height)),
        RasterBackend::Chrome => Arc::new(ChromeRasterizer::new(
            config.chrome_binary.clone(),
            config.width,
            config.height,
            config.settle_delay(),
        )),
    }
}

/// Run one rasterization, bounded by `timeout`.
pub async fn rasterize_with_timeout(
    rasterizer: &dyn Rasterizer,
    document: &Path,
    image: &Path,
    timeout: Duration,
) -> Result<(), RasterizeError> {
    let started = Instant::now();
    let result = tokio::time::timeout(timeout, rasterizer.rasterize(document, image))
        .await
        .map_err(|_| RasterizeError::Timeout(timeout))
        .and_then(|inner| inner);

    crate::metrics::record_rasterize(rasterizer.name(), started.elapsed());
    debug!(
        backend = rasterizer.name(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = result.is_ok(),
        "Rasterization finished"
    );
    result
}

/// Poll until `path` exists and is non-empty.
///
/// Checks immediately, then up to `attempts - 1` more times `interval`
/// apart.
pub async fn wait_for_artifact(path: &Path, attempts: u32, interval: Duration) -> bool {
    for attempt in 0..attempts {
        if storage::ArtifactStore::is_ready(path).await {
            debug!(path = %path.display(), attempt, "Artifact present");
            return true;
        }
        if attempt + 1 < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    false
}
