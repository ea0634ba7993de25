//! Upload file name inspection.

/// Detected upload type based on the file name extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Unknown,
}

/// Detect the upload type from its client-supplied file name.
///
/// Only the text after the last dot counts, case-insensitively, so
/// `data.CSV` and a bare `.csv` are accepted and `data.csv.gz` is not.
pub fn detect_file_type(file_name: &str) -> FileType {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if ext.eq_ignore_ascii_case("csv") => FileType::Csv,
        _ => FileType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_csv() {
        assert_eq!(detect_file_type("readings.csv"), FileType::Csv);
        assert_eq!(detect_file_type("READINGS.CSV"), FileType::Csv);
        assert_eq!(detect_file_type("archive.2024.csv"), FileType::Csv);
        assert_eq!(detect_file_type(".csv"), FileType::Csv);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_file_type("readings.xlsx"), FileType::Unknown);
        assert_eq!(detect_file_type("readings.csv.gz"), FileType::Unknown);
        assert_eq!(detect_file_type("csv"), FileType::Unknown);
        assert_eq!(detect_file_type(""), FileType::Unknown);
        assert_eq!(detect_file_type("readings."), FileType::Unknown);
    }
}
