//! Tests for CSV parsing and the validation gates.

use ingestion::{GateError, ObservationTable, TableError};
use test_utils::fixtures::*;

fn validated(csv: &str) -> ingestion::ValidatedTable {
    ObservationTable::from_bytes(csv.as_bytes())
        .expect("parse")
        .validate()
        .expect("validate")
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_valid_upload() {
    let table = ObservationTable::from_bytes(VALID_CSV.as_bytes()).unwrap();
    assert_eq!(
        table.headers(),
        &["Latitude", "Longitude", "PM25", "Temperature"]
    );
    assert_eq!(table.len(), 5);
}

#[test]
fn test_empty_file_is_csv_error() {
    let err = ObservationTable::from_bytes(EMPTY_CSV.as_bytes()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error reading CSV file: No columns to parse from file"
    );
}

#[test]
fn test_short_rows_padded() {
    let csv = "Latitude,Longitude,A,B\n1,2,3\n";
    let table = ObservationTable::from_bytes(csv.as_bytes()).unwrap();
    assert_eq!(table.rows()[0].len(), 4);
    assert!(table.rows()[0][3].is_missing());
}

#[test]
fn test_long_rows_rejected() {
    let csv = "Latitude,Longitude,A\n1,2,3,4\n";
    let err = ObservationTable::from_bytes(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, TableError::Csv(_)));
    assert!(err.to_string().starts_with("Error reading CSV file: "));
}

#[test]
fn test_duplicate_headers_renamed() {
    let csv = "Latitude,Longitude,A,A,\n1,2,3,4,5\n";
    let table = ObservationTable::from_bytes(csv.as_bytes()).unwrap();
    assert_eq!(
        table.headers(),
        &["Latitude", "Longitude", "A", "A.1", "Unnamed: 4"]
    );
}

// ============================================================================
// Upload-level validation
// ============================================================================

#[test]
fn test_missing_longitude() {
    let err = ObservationTable::from_bytes(MISSING_LONGITUDE_CSV.as_bytes())
        .unwrap()
        .validate()
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing required columns: Longitude");
}

#[test]
fn test_missing_both_coordinates_in_order() {
    let err = ObservationTable::from_bytes(MISSING_BOTH_COORDINATES_CSV.as_bytes())
        .unwrap()
        .validate()
        .unwrap_err();
    assert_eq!(
        err,
        TableError::Schema {
            missing: vec!["Latitude".to_string(), "Longitude".to_string()]
        }
    );
    assert_eq!(
        err.to_string(),
        "Missing required columns: Latitude, Longitude"
    );
}

#[test]
fn test_lowercase_headers_not_accepted() {
    let csv = "latitude,longitude,A\n1,2,3\n";
    let err = ObservationTable::from_bytes(csv.as_bytes())
        .unwrap()
        .validate()
        .unwrap_err();
    assert!(matches!(err, TableError::Schema { .. }));
}

#[test]
fn test_no_gps_rows() {
    let err = ObservationTable::from_bytes(NO_GPS_CSV.as_bytes())
        .unwrap()
        .validate()
        .unwrap_err();
    assert_eq!(err, TableError::EmptyData);
    assert_eq!(
        err.to_string(),
        "No valid data after removing missing GPS values"
    );
}

#[test]
fn test_coordinates_only() {
    let err = ObservationTable::from_bytes(COORDINATES_ONLY_CSV.as_bytes())
        .unwrap()
        .validate()
        .unwrap_err();
    assert_eq!(err, TableError::NoMeasurementColumns);
}

#[test]
fn test_rows_missing_coordinates_dropped() {
    let csv = "Latitude,Longitude,A\n1,2,3\n,2,4\n1,,5\n4,5,6\n";
    let table = validated(csv);
    assert_eq!(table.row_count(), 2);
}

#[test]
fn test_measurement_columns_are_positional() {
    let table = validated(SHUFFLED_COLUMNS_CSV);
    assert_eq!(table.measurement_columns(), &["Longitude", "Humidity"]);
}

// ============================================================================
// Per-column gate
// ============================================================================

#[test]
fn test_measurement_projection() {
    let table = validated(VALID_CSV);
    let column = table.measurement("PM25").unwrap();
    assert_eq!(column.name, "PM25");
    assert_eq!(column.len(), 5);
    assert_eq!(column.latitudes[0], 40.7128);
    assert_eq!(column.longitudes[0], -74.0060);
    assert_eq!(column.values, vec![12.5, 35.1, 8.2, 55.0, 20.3]);
}

#[test]
fn test_missing_values_excluded_per_column() {
    let csv = "Latitude,Longitude,A,B\n1,2,10,\n3,4,,20\n5,6,30,40\n";
    let table = validated(csv);

    let a = table.measurement("A").unwrap();
    assert_eq!(a.values, vec![10.0, 30.0]);
    assert_eq!(a.latitudes, vec![1.0, 5.0]);

    let b = table.measurement("B").unwrap();
    assert_eq!(b.values, vec![20.0, 40.0]);
    assert_eq!(b.latitudes, vec![3.0, 5.0]);
}

#[test]
fn test_partial_failure_gates() {
    let table = validated(PARTIAL_FAILURE_CSV);
    assert_eq!(table.measurement_columns(), &["A", "B", "C"]);

    assert!(table.measurement("A").is_ok());
    assert_eq!(
        table.measurement("B").unwrap_err().to_string(),
        "No valid data for B"
    );
    assert_eq!(
        table.measurement("C").unwrap_err().to_string(),
        "C contains non-numeric values"
    );
}

#[test]
fn test_text_latitude_reported_first() {
    let table = validated(TEXT_LATITUDE_CSV);
    assert_eq!(
        table.measurement("PM25").unwrap_err(),
        GateError::NonNumeric {
            field: "Latitude".to_string()
        }
    );
}

#[test]
fn test_text_longitude_reported() {
    let csv = "Latitude,Longitude,A\n40.7,-74.0,1\n40.8,east,2\n";
    let table = validated(csv);
    assert_eq!(
        table.measurement("A").unwrap_err().to_string(),
        "Longitude contains non-numeric values"
    );
}

#[test]
fn test_text_latitude_ignored_when_value_missing() {
    // The bad row is excluded for a column where it has no value
    let csv = "Latitude,Longitude,A,B\n40.7,-74.0,1,2\nnorth,-73.9,,3\n";
    let table = validated(csv);
    assert!(table.measurement("A").is_ok());
    assert!(table.measurement("B").is_err());
}

#[test]
fn test_unknown_column() {
    let table = validated(VALID_CSV);
    assert!(matches!(
        table.measurement("Nope"),
        Err(GateError::UnknownColumn(_))
    ));
}

#[test]
fn test_spaced_column_name() {
    let table = validated(SPACED_COLUMN_CSV);
    assert_eq!(table.measurement_columns(), &["PM 2.5"]);
    assert_eq!(table.measurement("PM 2.5").unwrap().len(), 3);
}
