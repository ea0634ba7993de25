//! Fixed schema of an upload.

/// Header of the latitude column (exact, case-sensitive).
pub const LATITUDE_COLUMN: &str = "Latitude";

/// Header of the longitude column (exact, case-sensitive).
pub const LONGITUDE_COLUMN: &str = "Longitude";

/// Measurement columns are every column from this position onward,
/// regardless of where the coordinate columns actually sit.
pub const MEASUREMENT_OFFSET: usize = 2;

/// Cell spellings read as missing, in addition to empty cells.
pub const NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Required coordinate headers, in reporting order.
pub fn required_columns() -> [&'static str; 2] {
    [LATITUDE_COLUMN, LONGITUDE_COLUMN]
}
