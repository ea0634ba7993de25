//! Observation tables and the validation gates applied to them.

use std::collections::HashMap;
use std::io::Read;

use tracing::debug;

use crate::config::{required_columns, LATITUDE_COLUMN, LONGITUDE_COLUMN, MEASUREMENT_OFFSET, NA_VALUES};
use crate::error::{GateError, Result, TableError};

/// One parsed CSV cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Classify raw cell text.
    ///
    /// Blank cells and NA spellings are missing. Anything `f64` parses is a
    /// number (including `inf`); a parsed NaN counts as missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NA_VALUES.contains(&trimmed) {
            return Cell::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_nan() => Cell::Missing,
            Ok(value) => Cell::Number(value),
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// Rows of untyped cells under a header, in upload order.
///
/// Every row holds exactly one cell per header; short rows are padded with
/// [`Cell::Missing`].
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ObservationTable {
    /// Parse a CSV stream with a header row.
    ///
    /// Blank header names become `Unnamed: <index>` and repeated names get a
    /// `.1`, `.2`, ... suffix so every column stays addressable by name.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let raw_headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if raw_headers.is_empty() || raw_headers.iter().all(|h| h.trim().is_empty()) {
            return Err(TableError::Csv("No columns to parse from file".to_string()));
        }
        let headers = dedupe_headers(raw_headers);
        let width = headers.len();

        let mut rows = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() > width {
                return Err(TableError::Csv(format!(
                    "Expected {} fields in line {}, saw {}",
                    width,
                    line + 2,
                    record.len()
                )));
            }

            let mut row: Vec<Cell> = record.iter().map(Cell::parse).collect();
            row.resize(width, Cell::Missing);
            rows.push(row);
        }

        debug!(columns = ?headers, rows = rows.len(), "Parsed CSV upload");
        Ok(Self { headers, rows })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(bytes)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Apply the upload-level checks.
    ///
    /// 1. `Latitude` and `Longitude` must be present
    /// 2. rows missing either coordinate are dropped; at least one must remain
    /// 3. columns from the third position onward are the measurements
    pub fn validate(self) -> Result<ValidatedTable> {
        let missing: Vec<String> = required_columns()
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TableError::Schema { missing });
        }

        let lat_idx = self.column_index(LATITUDE_COLUMN).ok_or(TableError::Schema {
            missing: vec![LATITUDE_COLUMN.to_string()],
        })?;
        let lon_idx = self.column_index(LONGITUDE_COLUMN).ok_or(TableError::Schema {
            missing: vec![LONGITUDE_COLUMN.to_string()],
        })?;

        let total = self.rows.len();
        let rows: Vec<Vec<Cell>> = self
            .rows
            .into_iter()
            .filter(|row| !row[lat_idx].is_missing() && !row[lon_idx].is_missing())
            .collect();
        if rows.is_empty() {
            return Err(TableError::EmptyData);
        }
        debug!(
            kept = rows.len(),
            dropped = total - rows.len(),
            "Dropped rows with missing coordinates"
        );

        let measurements: Vec<String> = self
            .headers
            .iter()
            .skip(MEASUREMENT_OFFSET)
            .cloned()
            .collect();
        if measurements.is_empty() {
            return Err(TableError::NoMeasurementColumns);
        }

        Ok(ValidatedTable {
            headers: self.headers,
            rows,
            lat_idx,
            lon_idx,
            measurements,
        })
    }
}

fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (index, header) in raw.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", index)
        } else {
            header
        };

        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone(), 0);
        if name != base {
            seen.entry(base).or_insert(0);
        }
        headers.push(name);
    }

    headers
}

/// A table that passed the upload-level checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    lat_idx: usize,
    lon_idx: usize,
    measurements: Vec<String>,
}

impl ValidatedTable {
    /// Candidate measurement columns in header order.
    pub fn measurement_columns(&self) -> &[String] {
        &self.measurements
    }

    /// Rows with both coordinates present.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Project one measurement column for rendering.
    ///
    /// Rows with a missing value in this column are excluded from this
    /// column only. Any remaining non-numeric latitude, longitude or value
    /// fails the column, checked in that order.
    pub fn measurement(&self, column: &str) -> std::result::Result<MeasurementColumn, GateError> {
        let idx = self
            .headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| GateError::UnknownColumn(column.to_string()))?;

        let retained: Vec<&Vec<Cell>> = self.rows.iter().filter(|row| !row[idx].is_missing()).collect();
        if retained.is_empty() {
            return Err(GateError::NoValidData {
                column: column.to_string(),
            });
        }

        let latitudes = numeric_field(&retained, self.lat_idx, LATITUDE_COLUMN)?;
        let longitudes = numeric_field(&retained, self.lon_idx, LONGITUDE_COLUMN)?;
        let values = numeric_field(&retained, idx, column)?;

        Ok(MeasurementColumn {
            name: column.to_string(),
            latitudes,
            longitudes,
            values,
        })
    }
}

fn numeric_field(
    rows: &[&Vec<Cell>],
    idx: usize,
    field: &str,
) -> std::result::Result<Vec<f64>, GateError> {
    rows.iter()
        .map(|row| {
            row[idx].as_number().ok_or_else(|| GateError::NonNumeric {
                field: field.to_string(),
            })
        })
        .collect()
}

/// Coordinates and values of one measurement column, all numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementColumn {
    pub name: String,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub values: Vec<f64>,
}

impl MeasurementColumn {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
