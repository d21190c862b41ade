//! Catalog errors

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failures of the persisted catalog. All of them leave the store as it
/// was before the failing call.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("Catalog entry for schema '{schema}' is corrupted: {reason}")]
    Corrupted { schema: String, reason: String },

    #[error("Checksum mismatch in catalog entry '{schema}': expected {expected:#010x}, found {actual:#010x}")]
    ChecksumMismatch {
        schema: String,
        expected: u32,
        actual: u32,
    },

    #[error("Failed to serialize catalog entry: {0}")]
    Serialization(String),

    #[error("Catalog write rejected: {0}")]
    WriteRejected(String),
}

impl CatalogError {
    pub fn io(path: &Path, err: io::Error) -> Self {
        CatalogError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Io { .. } => "SCHEMAMAP_CATALOG_IO",
            CatalogError::Corrupted { .. } => "SCHEMAMAP_CATALOG_CORRUPTED",
            CatalogError::ChecksumMismatch { .. } => "SCHEMAMAP_CATALOG_CHECKSUM",
            CatalogError::Serialization(_) => "SCHEMAMAP_CATALOG_SERIALIZATION",
            CatalogError::WriteRejected(_) => "SCHEMAMAP_CATALOG_WRITE_REJECTED",
        }
    }

    /// Corruption means the persisted catalog can no longer be trusted.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            CatalogError::Corrupted { .. } | CatalogError::ChecksumMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Serialization(e.to_string())
    }
}
