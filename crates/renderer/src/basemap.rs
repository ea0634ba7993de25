//! Neutral basemap: a light background with a lat/lon graticule.
//!
//! Stands in for Positron raster tiles when rendering without a browser or
//! network access.

use heatmap_common::GeoPoint;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use projection::Viewport;

/// Positron land color.
pub const BACKGROUND: Rgba<u8> = Rgba([250, 250, 248, 255]);

/// Graticule line color.
pub const GRATICULE: Rgba<u8> = Rgba([222, 222, 222, 255]);

/// Target upper bound on graticule lines per axis.
const MAX_LINES: f64 = 8.0;

const STEPS: &[f64] = &[
    0.0001, 0.0002, 0.0005, 0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0,
    10.0, 15.0, 30.0, 45.0, 90.0,
];

/// Smallest round graticule spacing, in degrees, that keeps `span` under
/// [`MAX_LINES`] lines.
pub fn graticule_step(span: f64) -> f64 {
    let span = span.abs();
    STEPS
        .iter()
        .copied()
        .find(|step| span / step <= MAX_LINES)
        .unwrap_or(90.0)
}

/// Multiples of `step` within `[min, max]`.
fn multiples(min: f64, max: f64, step: f64) -> impl Iterator<Item = f64> {
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(move |i| i as f64 * step)
}

/// Paint the basemap for `viewport`.
pub fn draw_basemap(viewport: &Viewport) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(viewport.width, viewport.height, BACKGROUND);
    let (north_west, south_east) = viewport.visible_extent();
    let width = viewport.width as f32;
    let height = viewport.height as f32;

    let lon_step = graticule_step(south_east.lon - north_west.lon);
    for lon in multiples(north_west.lon, south_east.lon, lon_step) {
        let x = viewport.to_container(GeoPoint::new(viewport.center.lat, lon)).x as f32;
        draw_line_segment_mut(&mut image, (x, 0.0), (x, height), GRATICULE);
    }

    let lat_step = graticule_step(north_west.lat - south_east.lat);
    for lat in multiples(south_east.lat, north_west.lat, lat_step) {
        let y = viewport.to_container(GeoPoint::new(lat, viewport.center.lon)).y as f32;
        draw_line_segment_mut(&mut image, (0.0, y), (width, y), GRATICULE);
    }

    image
}
