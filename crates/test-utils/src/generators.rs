//! Synthetic sensor readings.
//!
//! Values are deterministic so renders of the same generated input can be
//! compared byte for byte.

/// Builds a CSV with a `Latitude,Longitude` header followed by `columns`.
pub fn csv_from_rows(columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::from("Latitude,Longitude");
    for column in columns {
        out.push(',');
        out.push_str(column);
    }
    out.push('\n');

    for row in rows {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// A `rows x cols` lattice of readings spanning `lat_range` by `lon_range`.
///
/// Each reading's value is `row * cols + col`, so the minimum sits at the
/// south-west corner and the maximum at the north-east.
pub fn lattice_csv(
    rows: usize,
    cols: usize,
    lat_range: (f64, f64),
    lon_range: (f64, f64),
) -> String {
    let lat_step = step(lat_range, rows);
    let lon_step = step(lon_range, cols);

    let mut records = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let lat = lat_range.0 + row as f64 * lat_step;
            let lon = lon_range.0 + col as f64 * lon_step;
            records.push(vec![
                format!("{:.6}", lat),
                format!("{:.6}", lon),
                format!("{}", row * cols + col),
            ]);
        }
    }

    csv_from_rows(&["Reading"], &records)
}

/// `count` readings on a ring of `radius_deg` around a center.
///
/// Values rise with the angle around the ring.
pub fn ring_csv(center: (f64, f64), radius_deg: f64, count: usize) -> String {
    let records: Vec<Vec<String>> = (0..count)
        .map(|i| {
            let angle = i as f64 / count.max(1) as f64 * std::f64::consts::TAU;
            vec![
                format!("{:.6}", center.0 + radius_deg * angle.sin()),
                format!("{:.6}", center.1 + radius_deg * angle.cos()),
                format!("{:.3}", i as f64 * 1.5),
            ]
        })
        .collect();

    csv_from_rows(&["Level"], &records)
}

fn step(range: (f64, f64), n: usize) -> f64 {
    if n > 1 {
        (range.1 - range.0) / (n - 1) as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_from_rows_header() {
        let csv = csv_from_rows(&["A", "B"], &[vec!["1".into(), "2".into(), "3".into(), "4".into()]]);
        assert_eq!(csv, "Latitude,Longitude,A,B\n1,2,3,4\n");
    }

    #[test]
    fn test_lattice_size_and_values() {
        let csv = lattice_csv(3, 4, (10.0, 12.0), (20.0, 23.0));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1 + 12);
        assert_eq!(lines[1], "10.000000,20.000000,0");
        assert_eq!(lines[12], "12.000000,23.000000,11");
    }

    #[test]
    fn test_ring_count() {
        let csv = ring_csv((0.0, 0.0), 1.0, 8);
        assert_eq!(csv.lines().count(), 9);
    }
}
