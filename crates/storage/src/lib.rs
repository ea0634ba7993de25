//! Artifact storage for the heatmap service.
//!
//! Rendered documents and images live in one flat directory, named after
//! the measurement column they show. The store writes them, resolves
//! download requests to files inside the directory, and clears them in bulk.

pub mod artifacts;
pub mod error;

pub use artifacts::{content_type_for, ArtifactKind, ArtifactStore, ARTIFACT_PREFIX};
pub use error::{StoreError, StoreResult};
