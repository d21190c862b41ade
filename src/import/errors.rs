//! Import error taxonomy
//!
//! Every failure aborts the import as a whole and leaves the catalog as
//! it was. None of them is retried automatically.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::document::ParseError;
use crate::mapping::MappingConflict;
use crate::validator::RejectedChanges;

/// Result type for imports
pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug, Error)]
pub enum ImportError {
    /// Illegal version transition, or a Major-gated change under a policy
    /// that disallows Major upgrades.
    #[error("Version error: {0}")]
    Version(String),

    /// One or more changes violate the evolution rules.
    #[error("Structural change rejected: {0}")]
    StructuralChangeRejected(RejectedChanges),

    #[error("{0}")]
    MappingConflict(#[from] MappingConflict),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Catalog error: {0}")]
    Io(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ImportError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::Version(_) => "SCHEMAMAP_VERSION",
            ImportError::StructuralChangeRejected(_) => "SCHEMAMAP_CHANGE_REJECTED",
            ImportError::MappingConflict(_) => "SCHEMAMAP_MAPPING_CONFLICT",
            ImportError::Parse(_) => "SCHEMAMAP_PARSE",
            ImportError::Io(e) => e.code(),
            ImportError::Config(_) => "SCHEMAMAP_CONFIG",
        }
    }

    /// Fatal errors mean the catalog itself can no longer be trusted.
    /// Everything else is a rejection of the submitted revision.
    pub fn is_fatal(&self) -> bool {
        match self {
            ImportError::Io(e) => e.is_corruption(),
            _ => false,
        }
    }

    /// Rejected changes, when the error carries them.
    pub fn rejected_changes(&self) -> Option<&RejectedChanges> {
        match self {
            ImportError::StructuralChangeRejected(rejected) => Some(rejected),
            _ => None,
        }
    }
}
