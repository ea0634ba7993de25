//! Shared test utilities for the sensor-heatmaps workspace.
//!
//! - CSV upload fixtures covering the accepted and rejected shapes
//! - Synthetic reading generators
//! - Scratch artifact directories
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! ```ignore
//! use test_utils::{fixtures, scratch_dir};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use generators::*;
pub use paths::*;

/// Assert two numbers differ by at most `epsilon`.
///
/// ```ignore
/// assert_approx_eq!(intensities[1], 0.25, 1e-12);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (actual, expected, tolerance) = ($left as f64, $right as f64, $epsilon as f64);
        let delta = (actual - expected).abs();
        assert!(
            delta <= tolerance,
            "assertion failed: {} is not within {} of {} (off by {})",
            actual,
            tolerance,
            expected,
            delta
        );
    }};
}

/// [`assert_approx_eq!`] on both axes of a pixel or coordinate pair.
#[macro_export]
macro_rules! assert_point_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}
