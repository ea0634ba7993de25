//! Web map projection and viewport fitting.
//!
//! Implements the spherical Web Mercator pixel space used by slippy-map
//! clients, and the bounds-fitting rules they apply, so a static render
//! lands on the same view an interactive map would show.

pub mod mercator;
pub mod viewport;

pub use mercator::{PixelPoint, WebMercator};
pub use viewport::{Viewport, ViewportError};
