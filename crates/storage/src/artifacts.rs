//! Flat artifact directory.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// Every managed artifact's file name starts with this.
pub const ARTIFACT_PREFIX: &str = "heatmap_";

/// Public URL prefix the store directory is served under.
const PUBLIC_PREFIX: &str = "/static";

/// The two files produced per measurement column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Document,
    Image,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Document => "html",
            ArtifactKind::Image => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Document => "text/html; charset=utf-8",
            ArtifactKind::Image => "image/png",
        }
    }

    fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" => Some(ArtifactKind::Document),
            "png" => Some(ArtifactKind::Image),
            _ => None,
        }
    }
}

/// Content type for a file served from the store, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    ArtifactKind::from_file_name(name)
        .map(|kind| kind.content_type())
        .unwrap_or("application/octet-stream")
}

/// Order in which [`ArtifactStore::clear`] removes files.
const CLEAR_ORDER: [ArtifactKind; 2] = [ArtifactKind::Image, ArtifactKind::Document];

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: root.clone(),
                source,
            })?;

        info!(path = %root.display(), "Artifact store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `heatmap_<column with spaces replaced by underscores>.<ext>`
    pub fn artifact_name(column: &str, kind: ArtifactKind) -> StoreResult<String> {
        let stem = column.replace(' ', "_");
        let name = format!("{}{}.{}", ARTIFACT_PREFIX, stem, kind.extension());
        if !is_plain_file_name(&name) {
            return Err(StoreError::InvalidName(column.to_string()));
        }
        Ok(name)
    }

    /// Path of a column's artifact inside the store.
    pub fn path_for(&self, column: &str, kind: ArtifactKind) -> StoreResult<PathBuf> {
        Ok(self.root.join(Self::artifact_name(column, kind)?))
    }

    /// URL path a client fetches a column's artifact from.
    pub fn public_path(column: &str, kind: ArtifactKind) -> StoreResult<String> {
        Ok(format!("{}/{}", PUBLIC_PREFIX, Self::artifact_name(column, kind)?))
    }

    /// Write a column's artifact, replacing any previous version.
    pub async fn write(
        &self,
        column: &str,
        kind: ArtifactKind,
        contents: impl Into<Bytes>,
    ) -> StoreResult<PathBuf> {
        let path = self.path_for(column, kind)?;
        let contents = contents.into();

        tokio::fs::write(&path, &contents)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), bytes = contents.len(), "Wrote artifact");
        Ok(path)
    }

    /// Delete a column's artifact if present.
    pub async fn remove(&self, column: &str, kind: ArtifactKind) -> StoreResult<bool> {
        let path = self.path_for(column, kind)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed stale artifact");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Whether `path` exists and is non-empty.
    pub async fn is_ready(path: &Path) -> bool {
        matches!(tokio::fs::metadata(path).await, Ok(meta) if meta.is_file() && meta.len() > 0)
    }

    /// Map a requested download name to a file in the store.
    ///
    /// Only plain file names resolve; anything with a separator or a parent
    /// component is treated as absent.
    pub async fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        if !is_plain_file_name(file_name) {
            warn!(file = %file_name, "Rejected download name");
            return None;
        }

        let path = self.root.join(file_name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    /// Managed artifacts of `kind`, sorted by name.
    pub async fn list(&self, kind: ArtifactKind) -> StoreResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let suffix = format!(".{}", kind.extension());
        let mut names = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })?;
            let Some(entry) = entry else { break };

            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.starts_with(ARTIFACT_PREFIX) || !name.ends_with(&suffix) {
                continue;
            }
            if matches!(entry.file_type().await, Ok(t) if t.is_file()) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Delete every managed image, then every managed document.
    ///
    /// Returns the deleted paths as `<store dir>/<file>`. A file that cannot
    /// be removed is logged and skipped.
    pub async fn clear(&self) -> StoreResult<Vec<String>> {
        let mut deleted = Vec::new();

        for kind in CLEAR_ORDER {
            for name in self.list(kind).await? {
                let path = self.root.join(&name);
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => deleted.push(path.display().to_string()),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to delete artifact");
                    }
                }
            }
        }

        info!(count = deleted.len(), "Cleared artifacts");
        Ok(deleted)
    }
}

/// A single normal path component, no separators.
fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains('\0') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
