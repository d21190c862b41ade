//! CLI-specific error types
//!
//! Every CLI error ends the process with a JSON error response and a
//! non-zero exit status.

use serde_json::Value;
use std::io;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::document::ParseError;
use crate::import::ImportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (files, stdout)
    IoError,
    /// Schema, class, property or table not in the catalog
    NotFound,
    /// Import pipeline failure; carries the import error code
    Import(&'static str),
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SCHEMAMAP_CLI_CONFIG_ERROR",
            Self::IoError => "SCHEMAMAP_CLI_IO_ERROR",
            Self::NotFound => "SCHEMAMAP_CLI_NOT_FOUND",
            Self::Import(code) => *code,
        }
    }
}

#[derive(Debug, Error)]
#[error("{}: {}", .code.code(), .message)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    /// Structured detail for the error response (rejected changes)
    details: Option<Value>,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(CliErrorCode::NotFound, format!("{} not found", what.into()))
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }
}

impl From<ImportError> for CliError {
    fn from(e: ImportError) -> Self {
        let code = match &e {
            ImportError::Config(_) => CliErrorCode::ConfigError,
            other => CliErrorCode::Import(other.code()),
        };
        let details = e
            .rejected_changes()
            .and_then(|rejected| serde_json::to_value(&rejected.violations).ok());
        Self {
            code,
            message: e.to_string(),
            details,
        }
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        ImportError::from(e).into()
    }
}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        ImportError::from(e).into()
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{RejectedChanges, RuleGate, RuleViolation};

    #[test]
    fn test_import_error_keeps_its_code() {
        let err = CliError::from(ImportError::Version("not incremented".into()));
        assert_eq!(err.code_str(), "SCHEMAMAP_VERSION");
        assert!(err.to_string().starts_with("SCHEMAMAP_VERSION: "));
    }

    #[test]
    fn test_rejected_changes_become_details() {
        let err = CliError::from(ImportError::StructuralChangeRejected(RejectedChanges {
            violations: vec![RuleViolation {
                path: "Pump".into(),
                rule: "class-deleted",
                gate: RuleGate::MajorUpgrade,
                detail: "class deleted".into(),
            }],
        }));
        let details = err.details().unwrap();
        assert_eq!(details[0]["rule"], "class-deleted");
    }
}
