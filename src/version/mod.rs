//! Version compatibility
//!
//! A revision is a legal successor when:
//! - the schema name is unchanged
//! - the document dialect did not decrease
//! - the version triple did not decrease (lexicographic order)
//!
//! An unchanged triple is reported as `VersionBump::Unchanged`; the import
//! pipeline only lets it through for an empty or label-only diff.

mod checker;

pub use checker::{VersionBump, VersionCompatibilityChecker, VersionDelta, VersionOutcome};
