//! Heatmap rendering for geotagged sensor readings.
//!
//! - [`normalize`]: min-max scaling of a measurement column to intensities
//! - [`document`]: the self-contained Leaflet map document and its embedded
//!   render description
//! - [`heat`]: density layer compositor (grid clustering, blurred stamps,
//!   gradient colorization)
//! - [`basemap`]: neutral background with a graticule
//! - [`compose`]: full static render of a map description
//! - [`png`]: PNG encoding

pub mod basemap;
pub mod compose;
pub mod document;
pub mod error;
pub mod heat;
pub mod normalize;
pub mod png;

pub use compose::{fitted_viewport, render_png, render_static};
pub use document::{extract_description, HeatPoint, MapBuilder, MapDescription, MapDocument};
pub use error::{RenderError, RenderStage, Result};
pub use normalize::{normalize, NormalizeError, NormalizedColumn};
