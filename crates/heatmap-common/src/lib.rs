//! Common types shared across the sensor heatmap crates.

pub mod bbox;
pub mod style;

pub use bbox::{BoundingRegion, BoundsError, GeoPoint};
pub use style::{
    default_gradient, Color, Gradient, GradientStop, HeatLayerConfig, MapConfig, RenderConfig,
    StyleError, TileSource,
};
