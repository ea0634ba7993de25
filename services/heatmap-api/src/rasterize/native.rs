//! Software rasterizer reading the document's embedded map description.

use std::path::Path;

use async_trait::async_trait;
use renderer::{extract_description, render_png};
use tracing::debug;

use super::{RasterizeError, Rasterizer};

#[derive(Debug, Clone)]
pub struct NativeRasterizer {
    width: u32,
    height: u32,
}

impl NativeRasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[async_trait]
impl Rasterizer for NativeRasterizer {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn rasterize(&self, document: &Path, image: &Path) -> Result<(), RasterizeError> {
        let html = tokio::fs::read_to_string(document).await?;
        let (width, height) = (self.width, self.height);

        let png = tokio::task::spawn_blocking(move || {
            let description = extract_description(&html)?;
            render_png(&description, width, height)
        })
        .await
        .map_err(|e| RasterizeError::Task(e.to_string()))??;

        tokio::fs::write(image, &png).await?;
        debug!(path = %image.display(), bytes = png.len(), "Wrote PNG");
        Ok(())
    }
}
