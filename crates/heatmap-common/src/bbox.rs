//! Geographic bounding regions derived from observation coordinates.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Leaflet ordering: `[lat, lon]`.
    pub fn to_array(self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

/// Extremes and centroid of a set of observation coordinates.
///
/// The center is the arithmetic mean of each axis, not the midpoint of the
/// extremes, so clustered data pulls the initial map view towards the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub center_lat: f64,
    pub center_lon: f64,
}

impl BoundingRegion {
    /// Compute the region covering every coordinate pair.
    ///
    /// Fails with [`BoundsError::Degenerate`] when either axis has zero extent,
    /// since a viewport cannot be fitted to a point or a line.
    pub fn from_coordinates(lats: &[f64], lons: &[f64]) -> Result<Self, BoundsError> {
        if lats.len() != lons.len() {
            return Err(BoundsError::LengthMismatch {
                lats: lats.len(),
                lons: lons.len(),
            });
        }
        if lats.is_empty() {
            return Err(BoundsError::Empty);
        }

        let (min_lat, max_lat, sum_lat) = axis_stats("latitude", lats)?;
        let (min_lon, max_lon, sum_lon) = axis_stats("longitude", lons)?;

        if min_lat == max_lat || min_lon == max_lon {
            return Err(BoundsError::Degenerate);
        }

        let count = lats.len() as f64;
        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            center_lat: sum_lat / count,
            center_lon: sum_lon / count,
        })
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.center_lat, self.center_lon)
    }

    /// South-west corner.
    pub fn south_west(&self) -> GeoPoint {
        GeoPoint::new(self.min_lat, self.min_lon)
    }

    /// North-east corner.
    pub fn north_east(&self) -> GeoPoint {
        GeoPoint::new(self.max_lat, self.max_lon)
    }

    /// Corners in the `[[south, west], [north, east]]` form Leaflet's
    /// `fitBounds` expects.
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [self.south_west().to_array(), self.north_east().to_array()]
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Check if a point lies inside the region (edges included).
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }
}

/// Returns (min, max, sum) for one axis.
fn axis_stats(axis: &'static str, values: &[f64]) -> Result<(f64, f64, f64), BoundsError> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;

    for &value in values {
        if !value.is_finite() {
            return Err(BoundsError::NonFinite { axis, value });
        }
        min = min.min(value);
        max = max.max(value);
        sum += value;
    }

    Ok((min, max, sum))
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    #[error("no coordinates to bound")]
    Empty,

    #[error("coordinate count mismatch: {lats} latitudes vs {lons} longitudes")]
    LengthMismatch { lats: usize, lons: usize },

    #[error("non-finite {axis} value: {value}")]
    NonFinite { axis: &'static str, value: f64 },

    #[error("All points have identical coordinates")]
    Degenerate,
}
