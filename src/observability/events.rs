//! Observable import lifecycle events
//!
//! Events are explicit and typed; their string forms are the `event`
//! field of every structured log line the crate emits.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    ConfigLoaded,

    // Import pipeline
    /// Import of one schema revision begins
    ImportBegin,
    /// Import finished and the catalog reflects the new revision
    ImportComplete,
    /// Revision equals the persisted schema; nothing written
    ImportNoop,
    /// Import aborted; the catalog is untouched
    ImportFailed,

    // Stages
    SchemaParsed,
    CatalogLoaded,
    VersionChecked,
    DiffComputed,
    ValidationPassed,
    /// Validation rejected the revision (structural or version rule)
    ValidationRejected,
    LayoutAllocated,
    /// Allocation could not derive a consistent mapping
    MappingConflict,

    // Catalog
    CatalogCommit,
    /// Staged changes discarded without reaching the store
    CatalogRollback,
    /// Checksum or envelope verification failed (FATAL)
    CatalogCorruption,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::ImportBegin => "IMPORT_BEGIN",
            Event::ImportComplete => "IMPORT_COMPLETE",
            Event::ImportNoop => "IMPORT_NOOP",
            Event::ImportFailed => "IMPORT_FAILED",

            Event::SchemaParsed => "SCHEMA_PARSED",
            Event::CatalogLoaded => "CATALOG_LOADED",
            Event::VersionChecked => "VERSION_CHECKED",
            Event::DiffComputed => "DIFF_COMPUTED",
            Event::ValidationPassed => "VALIDATION_PASSED",
            Event::ValidationRejected => "VALIDATION_REJECTED",
            Event::LayoutAllocated => "LAYOUT_ALLOCATED",
            Event::MappingConflict => "MAPPING_CONFLICT",

            Event::CatalogCommit => "CATALOG_COMMIT",
            Event::CatalogRollback => "CATALOG_ROLLBACK",
            Event::CatalogCorruption => "CATALOG_CORRUPTION",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::CatalogCorruption)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::ImportBegin,
            Event::ImportComplete,
            Event::ImportNoop,
            Event::ImportFailed,
            Event::SchemaParsed,
            Event::CatalogLoaded,
            Event::VersionChecked,
            Event::DiffComputed,
            Event::ValidationPassed,
            Event::ValidationRejected,
            Event::LayoutAllocated,
            Event::MappingConflict,
            Event::CatalogCommit,
            Event::CatalogRollback,
            Event::CatalogCorruption,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::CatalogCorruption.is_fatal());
        assert!(!Event::ValidationRejected.is_fatal());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(Event::DiffComputed.to_string(), "DIFF_COMPUTED");
    }
}
