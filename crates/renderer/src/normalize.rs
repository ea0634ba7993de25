//! Min-max scaling of measurement values to heat intensities.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("Found array with 0 sample(s)")]
    Empty,

    #[error("Input contains non-finite value {value} at row {index}")]
    NonFinite { index: usize, value: f64 },

    #[error("Value range overflows: min {min}, max {max}")]
    RangeOverflow { min: f64, max: f64 },

    #[error("Series lengths differ: {latitudes} latitudes, {longitudes} longitudes, {values} values")]
    LengthMismatch {
        latitudes: usize,
        longitudes: usize,
        values: usize,
    },
}

/// Scale `values` linearly so the minimum maps to 0.0 and the maximum to 1.0.
///
/// A column where every value is equal maps to all 0.0.
pub fn normalize(values: &[f64]) -> Result<Vec<f64>, NormalizeError> {
    if values.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(NormalizeError::NonFinite { index, value });
        }
        min = min.min(value);
        max = max.max(value);
    }

    let range = max - min;
    if !range.is_finite() {
        return Err(NormalizeError::RangeOverflow { min, max });
    }
    if range == 0.0 {
        return Ok(vec![0.0; values.len()]);
    }

    Ok(values
        .iter()
        .map(|&v| {
            if v == max {
                1.0
            } else {
                ((v - min) / range).clamp(0.0, 1.0)
            }
        })
        .collect())
}

/// A measurement column with per-row intensities attached.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedColumn {
    pub name: String,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub values: Vec<f64>,
    pub intensities: Vec<f64>,
}

impl NormalizedColumn {
    pub fn new(
        name: impl Into<String>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self, NormalizeError> {
        if latitudes.len() != values.len() || longitudes.len() != values.len() {
            return Err(NormalizeError::LengthMismatch {
                latitudes: latitudes.len(),
                longitudes: longitudes.len(),
                values: values.len(),
            });
        }
        let intensities = normalize(&values)?;

        Ok(Self {
            name: name.into(),
            latitudes,
            longitudes,
            values,
            intensities,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `[lat, lon, intensity]` triples in row order.
    pub fn heat_points(&self) -> Vec<[f64; 3]> {
        self.latitudes
            .iter()
            .zip(&self.longitudes)
            .zip(&self.intensities)
            .map(|((&lat, &lon), &intensity)| [lat, lon, intensity])
            .collect()
    }
}
