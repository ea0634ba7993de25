//! Render error types.

use std::fmt;

use heatmap_common::StyleError;
use projection::ViewportError;
use thiserror::Error;

use crate::png::PngError;

/// Step of map document construction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    MapConstruction,
    FitBounds,
    HeatLayer,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderStage::MapConstruction => "map construction",
            RenderStage::FitBounds => "fit bounds",
            RenderStage::HeatLayer => "heat layer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{message}")]
    Stage { stage: RenderStage, message: String },

    #[error("document has no embedded map description")]
    MissingDescription,

    #[error("invalid map description: {0}")]
    InvalidDescription(String),

    #[error("viewport error: {0}")]
    Viewport(#[from] ViewportError),

    #[error("style error: {0}")]
    Style(#[from] StyleError),

    #[error(transparent)]
    Encode(#[from] PngError),
}

impl RenderError {
    pub(crate) fn stage(stage: RenderStage, message: impl Into<String>) -> Self {
        RenderError::Stage {
            stage,
            message: message.into(),
        }
    }

    /// Document construction stage this error came from, if any.
    pub fn render_stage(&self) -> Option<RenderStage> {
        match self {
            RenderError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
