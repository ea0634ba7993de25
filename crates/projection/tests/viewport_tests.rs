//! Tests for bounds fitting against a fixed-size viewport.

use heatmap_common::GeoPoint;
use projection::{Viewport, ViewportError};
use test_utils::assert_point_approx_eq;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const PADDING: [u32; 2] = [50, 50];

fn fit(sw: (f64, f64), ne: (f64, f64)) -> Viewport {
    Viewport::fit_bounds(
        GeoPoint::new(sw.0, sw.1),
        GeoPoint::new(ne.0, ne.1),
        WIDTH,
        HEIGHT,
        PADDING,
        0,
        18,
    )
    .unwrap()
}

// ============================================================================
// Zoom selection
// ============================================================================

#[test]
fn test_city_scale_zoom() {
    // ~5km of Lower Manhattan; the vertical extent is the limiting axis
    let viewport = fit((40.70, -74.02), (40.75, -73.98));
    assert_eq!(viewport.zoom, 13.0);
}

#[test]
fn test_continental_scale_zoom() {
    let viewport = fit((-80.0, -179.0), (80.0, 179.0));
    assert_eq!(viewport.zoom, 1.0);
}

#[test]
fn test_zoom_is_whole_number() {
    let viewport = fit((12.3, 45.6), (13.9, 47.1));
    assert_eq!(viewport.zoom, viewport.zoom.floor());
}

#[test]
fn test_tiny_bounds_clamped_to_max_zoom() {
    let viewport = fit((10.0, 10.0), (10.000_000_1, 10.000_000_1));
    assert_eq!(viewport.zoom, 18.0);
}

// ============================================================================
// Placement
// ============================================================================

#[test]
fn test_bounds_inside_padding() {
    let sw = GeoPoint::new(40.70, -74.02);
    let ne = GeoPoint::new(40.75, -73.98);
    let viewport = fit((sw.lat, sw.lon), (ne.lat, ne.lon));

    for corner in [sw, ne] {
        let p = viewport.to_container(corner);
        assert!(p.x >= 49.0 && p.x <= (WIDTH - 49) as f64, "x = {}", p.x);
        assert!(p.y >= 49.0 && p.y <= (HEIGHT - 49) as f64, "y = {}", p.y);
    }
}

#[test]
fn test_bounds_centered() {
    let sw = GeoPoint::new(-10.0, 100.0);
    let ne = GeoPoint::new(10.0, 120.0);
    let viewport = fit((sw.lat, sw.lon), (ne.lat, ne.lon));

    let a = viewport.to_container(sw);
    let b = viewport.to_container(ne);
    let mid_x = (a.x + b.x) / 2.0;
    let mid_y = (a.y + b.y) / 2.0;
    assert_point_approx_eq!(
        (mid_x, mid_y),
        (WIDTH as f64 / 2.0, HEIGHT as f64 / 2.0),
        1.0
    );
}

#[test]
fn test_north_is_up() {
    let viewport = fit((0.0, 0.0), (5.0, 5.0));
    let north = viewport.to_container(GeoPoint::new(5.0, 2.5));
    let south = viewport.to_container(GeoPoint::new(0.0, 2.5));
    assert!(north.y < south.y);
}

#[test]
fn test_visible_extent_covers_bounds() {
    let viewport = fit((20.0, -10.0), (30.0, 5.0));
    let (nw, se) = viewport.visible_extent();
    assert!(nw.lat > 30.0 && se.lat < 20.0);
    assert!(nw.lon < -10.0 && se.lon > 5.0);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_zero_size_rejected() {
    let result = Viewport::fit_bounds(
        GeoPoint::new(0.0, 0.0),
        GeoPoint::new(1.0, 1.0),
        0,
        HEIGHT,
        PADDING,
        0,
        18,
    );
    assert!(matches!(result, Err(ViewportError::EmptySize { .. })));
}

#[test]
fn test_non_finite_rejected() {
    let result = Viewport::fit_bounds(
        GeoPoint::new(f64::NAN, 0.0),
        GeoPoint::new(1.0, 1.0),
        WIDTH,
        HEIGHT,
        PADDING,
        0,
        18,
    );
    assert_eq!(result, Err(ViewportError::NonFiniteBounds));
}
