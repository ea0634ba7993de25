//! Sensor reading ingestion.
//!
//! Turns an uploaded CSV into an [`ObservationTable`], validates the
//! coordinate schema, and projects each measurement column into the
//! numeric series the renderer consumes.
//!
//! # Pipeline
//!
//! - [`ObservationTable::from_reader`] parses cells (missing / number / text)
//! - [`ObservationTable::validate`] enforces `Latitude`/`Longitude`, drops
//!   rows missing either, and picks measurement columns by position
//! - [`ValidatedTable::measurement`] applies the per-column gate

pub mod config;
pub mod error;
pub mod metadata;
mod table;

pub use config::{LATITUDE_COLUMN, LONGITUDE_COLUMN, MEASUREMENT_OFFSET, NA_VALUES};
pub use error::{GateError, Result, TableError};
pub use metadata::{detect_file_type, FileType};
pub use table::{Cell, MeasurementColumn, ObservationTable, ValidatedTable};
