//! Fixed-size map viewports and bounds fitting.

use heatmap_common::GeoPoint;
use thiserror::Error;

use crate::mercator::{PixelPoint, WebMercator};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ViewportError {
    #[error("viewport size must be non-zero, got {width}x{height}")]
    EmptySize { width: u32, height: u32 },

    #[error("padding {padding:?} leaves no room in a {width}x{height} viewport")]
    PaddingTooLarge {
        padding: [u32; 2],
        width: u32,
        height: u32,
    },

    #[error("bounds contain non-finite coordinates")]
    NonFiniteBounds,
}

/// A map view of `width x height` pixels at an integer zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub zoom: f64,
    pub center: GeoPoint,
    /// World pixel at the top-left corner of the viewport (rounded)
    origin: PixelPoint,
}

impl Viewport {
    pub fn new(center: GeoPoint, zoom: f64, width: u32, height: u32) -> Self {
        let projected = WebMercator::project(center, zoom);
        let origin = PixelPoint::new(
            projected.x - width as f64 / 2.0,
            projected.y - height as f64 / 2.0,
        )
        .round();

        Self {
            width,
            height,
            zoom,
            center,
            origin,
        }
    }

    /// Largest whole zoom at which `sw`..`ne` fits inside the viewport minus
    /// `padding` on every side, centered on the padded bounds.
    ///
    /// Mirrors slippy-map `fitBounds`: the fractional zoom is snapped to
    /// hundredths before flooring, then clamped to `[min_zoom, max_zoom]`.
    pub fn fit_bounds(
        sw: GeoPoint,
        ne: GeoPoint,
        width: u32,
        height: u32,
        padding: [u32; 2],
        min_zoom: u8,
        max_zoom: u8,
    ) -> Result<Self, ViewportError> {
        if width == 0 || height == 0 {
            return Err(ViewportError::EmptySize { width, height });
        }
        if [sw.lat, sw.lon, ne.lat, ne.lon].iter().any(|v| !v.is_finite()) {
            return Err(ViewportError::NonFiniteBounds);
        }

        let avail_x = width as f64 - 2.0 * padding[0] as f64;
        let avail_y = height as f64 - 2.0 * padding[1] as f64;
        if avail_x <= 0.0 || avail_y <= 0.0 {
            return Err(ViewportError::PaddingTooLarge {
                padding,
                width,
                height,
            });
        }

        let nw = WebMercator::project(GeoPoint::new(ne.lat, sw.lon), 0.0);
        let se = WebMercator::project(GeoPoint::new(sw.lat, ne.lon), 0.0);
        let span_x = (se.x - nw.x).abs();
        let span_y = (se.y - nw.y).abs();

        let scale = (avail_x / span_x).min(avail_y / span_y);
        let mut zoom = scale.log2();
        if zoom.is_finite() {
            // Don't jump down a level when within 1% of a whole zoom
            zoom = ((zoom * 100.0).round() / 100.0).floor();
        }
        let zoom = zoom.clamp(min_zoom as f64, max_zoom as f64);

        let sw_px = WebMercator::project(sw, zoom);
        let ne_px = WebMercator::project(ne, zoom);
        let mid = PixelPoint::new((sw_px.x + ne_px.x) / 2.0, (sw_px.y + ne_px.y) / 2.0);
        let center = WebMercator::unproject(mid, zoom);

        Ok(Self::new(center, zoom, width, height))
    }

    /// Position of a geographic point relative to the viewport's top-left.
    pub fn to_container(&self, point: GeoPoint) -> PixelPoint {
        let projected = WebMercator::project(point, self.zoom);
        PixelPoint::new(projected.x - self.origin.x, projected.y - self.origin.y)
    }

    /// Geographic point under a viewport pixel.
    pub fn to_geo(&self, pixel: PixelPoint) -> GeoPoint {
        WebMercator::unproject(
            PixelPoint::new(pixel.x + self.origin.x, pixel.y + self.origin.y),
            self.zoom,
        )
    }

    /// Geographic extent visible in the viewport as (north-west, south-east).
    pub fn visible_extent(&self) -> (GeoPoint, GeoPoint) {
        (
            self.to_geo(PixelPoint::new(0.0, 0.0)),
            self.to_geo(PixelPoint::new(self.width as f64, self.height as f64)),
        )
    }
}
