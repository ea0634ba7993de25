//! Per-column heatmap pipeline.
//!
//! Each measurement column runs, in order:
//!
//! gate -> normalize -> bounds -> map document -> save -> rasterize -> verify
//!
//! A failure at any step becomes that column's [`ColumnResult::Failed`]; the
//! remaining columns still run. Only when every column fails does the run
//! itself fail.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heatmap_common::{BoundingRegion, BoundsError, RenderConfig};
use ingestion::{GateError, ValidatedTable};
use renderer::{HeatPoint, MapBuilder, NormalizeError, NormalizedColumn, RenderError, RenderStage};
use serde::Serialize;
use storage::{ArtifactKind, ArtifactStore, StoreError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::RasterConfig;
use crate::metrics::{record_column, ColumnOutcome};
use crate::rasterize::{rasterize_with_timeout, wait_for_artifact, RasterizeError, Rasterizer};

/// Why one column produced no heatmap.
#[derive(Debug, Error)]
pub enum ColumnError {
    #[error("No valid data for {column}")]
    NoValidData { column: String },

    #[error("{field} contains non-numeric values")]
    NonNumeric { field: String },

    #[error("Normalization failed for {column}: {source}")]
    Normalization {
        column: String,
        #[source]
        source: NormalizeError,
    },

    #[error("Bounds calculation failed: {0}")]
    Bounds(BoundsError),

    #[error("All points have identical coordinates")]
    DegenerateBounds,

    #[error("{}", render_message(.column, .stage, .message))]
    Render {
        column: String,
        stage: RenderStage,
        message: String,
    },

    #[error("Failed to save HTML: {0}")]
    Save(String),

    #[error("PNG generation failed for {column}: {source}")]
    Rasterize {
        column: String,
        #[source]
        source: RasterizeError,
    },

    #[error("PNG file {path} was not created")]
    ArtifactNotFound { path: String },
}

/// `<stage> failed for <column>: <cause>`
fn render_message(column: &str, stage: &RenderStage, message: &str) -> String {
    let stage = match stage {
        RenderStage::MapConstruction => "Map construction",
        RenderStage::FitBounds => "Fit bounds",
        RenderStage::HeatLayer => "Heatmap creation",
    };
    format!("{} failed for {}: {}", stage, column, message)
}

impl ColumnError {
    /// Pipeline step the column stopped at.
    pub fn stage(&self) -> &'static str {
        match self {
            ColumnError::NoValidData { .. } | ColumnError::NonNumeric { .. } => "gate",
            ColumnError::Normalization { .. } => "normalize",
            ColumnError::Bounds(_) | ColumnError::DegenerateBounds => "bounds",
            ColumnError::Render { .. } => "render",
            ColumnError::Save(_) => "save",
            ColumnError::Rasterize { .. } => "rasterize",
            ColumnError::ArtifactNotFound { .. } => "verify",
        }
    }

    fn from_gate(error: GateError) -> Self {
        match error {
            GateError::NoValidData { column } => ColumnError::NoValidData { column },
            GateError::NonNumeric { field } => ColumnError::NonNumeric { field },
            GateError::UnknownColumn(column) => ColumnError::NoValidData { column },
        }
    }

    fn from_bounds(error: BoundsError) -> Self {
        match error {
            BoundsError::Degenerate => ColumnError::DegenerateBounds,
            other => ColumnError::Bounds(other),
        }
    }

    fn from_render(column: &str, error: RenderError) -> Self {
        ColumnError::Render {
            column: column.to_string(),
            stage: error.render_stage().unwrap_or(RenderStage::HeatLayer),
            message: error.to_string(),
        }
    }
}


/// Outcome for one measurement column, serialized as
/// `{column, map_path}` or `{column, error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnResult {
    Rendered { column: String, map_path: String },
    Failed { column: String, error: String },
}

impl ColumnResult {
    pub fn column(&self) -> &str {
        match self {
            ColumnResult::Rendered { column, .. } | ColumnResult::Failed { column, .. } => column,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, ColumnResult::Rendered { .. })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to create any heatmaps")]
    AllFailed(Vec<ColumnResult>),
}

/// Renders every measurement column of a validated table into the store.
pub struct Pipeline {
    store: ArtifactStore,
    render: RenderConfig,
    raster: RasterConfig,
    rasterizer: Arc<dyn Rasterizer>,
}

impl Pipeline {
    pub fn new(
        store: ArtifactStore,
        render: RenderConfig,
        raster: RasterConfig,
        rasterizer: Arc<dyn Rasterizer>,
    ) -> Self {
        Self {
            store,
            render,
            raster,
            rasterizer,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run every measurement column in table order.
    pub async fn run(&self, table: &ValidatedTable) -> Result<Vec<ColumnResult>, PipelineError> {
        let mut results = Vec::with_capacity(table.measurement_columns().len());

        for column in table.measurement_columns() {
            debug!(column = %column, "Processing column");
            let result = match self.render_column(table, column).await {
                Ok(map_path) => {
                    record_column(ColumnOutcome::Rendered);
                    ColumnResult::Rendered {
                        column: column.clone(),
                        map_path,
                    }
                }
                Err(e) => {
                    record_column(ColumnOutcome::Failed);
                    if matches!(e, ColumnError::NoValidData { .. }) {
                        warn!(column = %column, stage = e.stage(), error = %e, "Skipping column");
                    } else {
                        error!(column = %column, stage = e.stage(), error = %e, "Failed to create heatmap");
                    }
                    ColumnResult::Failed {
                        column: column.clone(),
                        error: e.to_string(),
                    }
                }
            };
            results.push(result);
        }

        if !results.iter().any(ColumnResult::is_rendered) {
            error!(columns = results.len(), "No heatmaps created successfully");
            return Err(PipelineError::AllFailed(results));
        }

        let rendered: Vec<&str> = results
            .iter()
            .filter_map(|r| match r {
                ColumnResult::Rendered { map_path, .. } => Some(map_path.as_str()),
                _ => None,
            })
            .collect();
        info!(?rendered, "Heatmaps generated");
        Ok(results)
    }

    /// Render one column; returns the image's public path.
    pub async fn render_column(
        &self,
        table: &ValidatedTable,
        column: &str,
    ) -> Result<String, ColumnError> {
        let measurement = table.measurement(column).map_err(ColumnError::from_gate)?;

        let normalized = NormalizedColumn::new(
            column,
            measurement.latitudes,
            measurement.longitudes,
            measurement.values,
        )
        .map_err(|source| ColumnError::Normalization {
            column: column.to_string(),
            source,
        })?;

        let region = BoundingRegion::from_coordinates(&normalized.latitudes, &normalized.longitudes)
            .map_err(ColumnError::from_bounds)?;

        let points: Vec<HeatPoint> = normalized
            .heat_points()
            .into_iter()
            .map(HeatPoint::from)
            .collect();

        let document = MapBuilder::new(column, region.center(), &self.render.map)
            .and_then(|map| map.fit_bounds(&region))
            .and_then(|map| map.heat_layer(&points, &self.render.heat))
            .and_then(|doc| doc.to_html())
            .map_err(|e| ColumnError::from_render(column, e))?;

        let html_path = self
            .store
            .write(column, ArtifactKind::Document, document)
            .await
            .map_err(|e| ColumnError::Save(e.to_string()))?;
        debug!(column = %column, path = %html_path.display(), "Saved HTML");

        let png_path = self
            .prepare_image(column)
            .await
            .map_err(|e| ColumnError::Rasterize {
                column: column.to_string(),
                source: RasterizeError::from(e),
            })?;

        self.rasterize(column, &html_path, &png_path).await?;

        ArtifactStore::public_path(column, ArtifactKind::Image)
            .map_err(|e| ColumnError::Save(e.to_string()))
    }

    /// Image path for `column`, with any leftover image from an earlier
    /// upload removed so it cannot satisfy the existence check.
    async fn prepare_image(&self, column: &str) -> Result<PathBuf, StoreError> {
        let png_path = self.store.path_for(column, ArtifactKind::Image)?;
        self.store.remove(column, ArtifactKind::Image).await?;
        Ok(png_path)
    }

    async fn rasterize(&self, column: &str, html: &Path, png: &Path) -> Result<(), ColumnError> {
        rasterize_with_timeout(self.rasterizer.as_ref(), html, png, self.raster.timeout())
            .await
            .map_err(|source| ColumnError::Rasterize {
                column: column.to_string(),
                source,
            })?;

        if !wait_for_artifact(png, self.raster.poll_attempts, self.raster.poll_interval()).await {
            return Err(ColumnError::ArtifactNotFound {
                path: png.display().to_string(),
            });
        }
        debug!(column = %column, path = %png.display(), "Confirmed PNG exists");
        Ok(())
    }
}
