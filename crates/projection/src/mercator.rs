//! Spherical Web Mercator (EPSG:3857) in tile pixel space.
//!
//! At zoom `z` the whole world is a square of `256 * 2^z` pixels with the
//! origin at the north-west corner (180°W, ~85.05°N).

use std::f64::consts::PI;

use heatmap_common::GeoPoint;

/// Latitude limit where the projection becomes square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Tile edge length in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// A point in world pixel space at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn round(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }
}

/// Web Mercator projection between geographic and pixel coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// World edge length in pixels at a (possibly fractional) zoom.
    pub fn world_size(zoom: f64) -> f64 {
        TILE_SIZE * 2f64.powf(zoom)
    }

    /// Project a geographic point to world pixels.
    ///
    /// Latitudes beyond [`MAX_LATITUDE`] are clamped.
    pub fn project(point: GeoPoint, zoom: f64) -> PixelPoint {
        let size = Self::world_size(zoom);
        let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

        let x = (point.lon + 180.0) / 360.0;
        let y = 0.5 - ((PI / 4.0 + lat / 2.0).tan()).ln() / (2.0 * PI);

        PixelPoint::new(x * size, y * size)
    }

    /// Inverse of [`WebMercator::project`].
    pub fn unproject(pixel: PixelPoint, zoom: f64) -> GeoPoint {
        let size = Self::world_size(zoom);
        let x = pixel.x / size;
        let y = pixel.y / size;

        let lon = x * 360.0 - 180.0;
        let lat = (2.0 * ((0.5 - y) * 2.0 * PI).exp().atan() - PI / 2.0).to_degrees();

        GeoPoint::new(lat, lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_world_center() {
        let p = WebMercator::project(GeoPoint::new(0.0, 0.0), 0.0);
        assert!((p.x - 128.0).abs() < 1e-9);
        assert!((p.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_corners() {
        let nw = WebMercator::project(GeoPoint::new(MAX_LATITUDE, -180.0), 1.0);
        assert!(nw.x.abs() < 1e-9);
        assert!(nw.y.abs() < 1e-6);

        let se = WebMercator::project(GeoPoint::new(-MAX_LATITUDE, 180.0), 1.0);
        assert!((se.x - 512.0).abs() < 1e-9);
        assert!((se.y - 512.0).abs() < 1e-6);
    }

    #[test]
    fn test_latitude_clamped() {
        let pole = WebMercator::project(GeoPoint::new(90.0, 0.0), 0.0);
        let limit = WebMercator::project(GeoPoint::new(MAX_LATITUDE, 0.0), 0.0);
        assert_eq!(pole, limit);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let original = GeoPoint::new(51.5074, -0.1278);
        let pixel = WebMercator::project(original, 12.0);
        let back = WebMercator::unproject(pixel, 12.0);
        assert!((back.lat - original.lat).abs() < 1e-9);
        assert!((back.lon - original.lon).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_doubles_scale() {
        let point = GeoPoint::new(40.0, -74.0);
        let z3 = WebMercator::project(point, 3.0);
        let z4 = WebMercator::project(point, 4.0);
        assert!((z4.x - 2.0 * z3.x).abs() < 1e-9);
        assert!((z4.y - 2.0 * z3.y).abs() < 1e-9);
    }
}
