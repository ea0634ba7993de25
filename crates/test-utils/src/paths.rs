//! Scratch directories and artifact listings for tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// A fresh, empty directory removed when the guard drops.
pub fn scratch_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("heatmap-test-")
        .tempdir()
        .expect("failed to create scratch directory")
}

/// Sorted names of the files in `dir` ending in `.{ext}`.
pub fn files_with_extension(dir: &Path, ext: &str) -> Vec<String> {
    let suffix = format!(".{}", ext);
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|name| name.ends_with(&suffix))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Write `contents` to `dir/name`, returning the full path.
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}
