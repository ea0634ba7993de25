//! CSV uploads covering the shapes the pipeline accepts and rejects.

/// Five readings around lower Manhattan with two measurement columns.
pub const VALID_CSV: &str = "\
Latitude,Longitude,PM25,Temperature
40.7128,-74.0060,12.5,21.0
40.7306,-73.9866,35.1,22.4
40.7061,-74.0087,8.2,20.1
40.7484,-73.9857,55.0,23.9
40.7411,-74.0018,20.3,22.0
";

/// `A` renders, `B` has no values, `C` holds text.
pub const PARTIAL_FAILURE_CSV: &str = "\
Latitude,Longitude,A,B,C
10.0,20.0,1,,x
11.0,21.0,2,,y
12.0,22.0,3,,z
";

/// Every column fails its gate.
pub const ALL_FAILING_CSV: &str = "\
Latitude,Longitude,A,B
10.0,20.0,,high
11.0,21.0,,low
";

/// Every reading at one spot.
pub const DEGENERATE_CSV: &str = "\
Latitude,Longitude,PM25
48.8566,2.3522,10
48.8566,2.3522,20
48.8566,2.3522,30
";

pub const MISSING_LONGITUDE_CSV: &str = "\
Latitude,PM25
40.7,10
40.8,20
";

pub const MISSING_BOTH_COORDINATES_CSV: &str = "\
Lat,Lon,PM25
40.7,-74.0,10
";

/// Header present, every row lacks a coordinate.
pub const NO_GPS_CSV: &str = "\
Latitude,Longitude,PM25
,-74.0,10
40.7,,20
NA,NA,30
";

pub const COORDINATES_ONLY_CSV: &str = "\
Latitude,Longitude
40.7,-74.0
40.8,-73.9
";

/// Measurement column whose name contains spaces.
pub const SPACED_COLUMN_CSV: &str = "\
Latitude,Longitude,PM 2.5
40.7128,-74.0060,12.5
40.7306,-73.9866,35.1
40.7061,-74.0087,8.2
";

/// Coordinates not in the first two positions; measurement columns are
/// still picked from the third header onward.
pub const SHUFFLED_COLUMNS_CSV: &str = "\
PM25,Latitude,Longitude,Humidity
12.5,40.7128,-74.0060,60
35.1,40.7306,-73.9866,65
8.2,40.7061,-74.0087,70
";

/// One non-numeric latitude among valid rows.
pub const TEXT_LATITUDE_CSV: &str = "\
Latitude,Longitude,PM25
40.7128,-74.0060,12.5
north,-73.9866,35.1
";

/// A measurement that is constant across all readings.
pub const CONSTANT_VALUES_CSV: &str = "\
Latitude,Longitude,PM25
40.7128,-74.0060,7
40.7306,-73.9866,7
40.7061,-74.0087,7
";

pub const EMPTY_CSV: &str = "";
