//! Version triple and dialect law

use serde::Serialize;
use std::fmt;

use crate::graph::{DialectVersion, SchemaGraph, SchemaVersion};

/// Highest-order component that increased between two revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum VersionBump {
    Unchanged,
    Minor,
    Write,
    Major,
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VersionBump::Unchanged => "unchanged",
            VersionBump::Minor => "minor",
            VersionBump::Write => "write",
            VersionBump::Major => "major",
        };
        f.write_str(s)
    }
}

/// An accepted version transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionDelta {
    pub old: SchemaVersion,
    pub new: SchemaVersion,
    pub bump: VersionBump,
    pub old_dialect: DialectVersion,
    pub new_dialect: DialectVersion,
}

impl VersionDelta {
    /// Delta of a first import: nothing to compare against.
    pub fn initial(graph: &SchemaGraph) -> Self {
        Self {
            old: graph.version,
            new: graph.version,
            bump: VersionBump::Major,
            old_dialect: graph.dialect,
            new_dialect: graph.dialect,
        }
    }

    pub fn major_upgraded(&self) -> bool {
        self.bump == VersionBump::Major
    }

    pub fn is_unchanged(&self) -> bool {
        self.bump == VersionBump::Unchanged
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionOutcome {
    Accepted(VersionDelta),
    Rejected { reason: String },
}

impl VersionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VersionOutcome::Accepted(_))
    }

    pub fn into_result(self) -> Result<VersionDelta, String> {
        match self {
            VersionOutcome::Accepted(delta) => Ok(delta),
            VersionOutcome::Rejected { reason } => Err(reason),
        }
    }
}

/// Decides whether the version header of a revision is a legal
/// successor of the persisted one.
///
/// Only header fields are looked at. Whether the content of the revision
/// fits the bump (e.g. an unchanged triple with a structural diff) is
/// decided later against the diff.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionCompatibilityChecker;

impl VersionCompatibilityChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, old: &SchemaGraph, new: &SchemaGraph) -> VersionOutcome {
        if old.name != new.name {
            return VersionOutcome::Rejected {
                reason: format!("schema name changed from '{}' to '{}'", old.name, new.name),
            };
        }

        if new.dialect < old.dialect {
            return VersionOutcome::Rejected {
                reason: format!(
                    "document dialect decreased from {} to {}",
                    old.dialect, new.dialect
                ),
            };
        }

        match compare_triples(old.version, new.version) {
            Ok(bump) => VersionOutcome::Accepted(VersionDelta {
                old: old.version,
                new: new.version,
                bump,
                old_dialect: old.dialect,
                new_dialect: new.dialect,
            }),
            Err(component) => VersionOutcome::Rejected {
                reason: format!(
                    "{} version decreased from {} to {}",
                    component, old.version, new.version
                ),
            },
        }
    }
}

/// Lexicographic comparison; the first differing component decides.
fn compare_triples(old: SchemaVersion, new: SchemaVersion) -> Result<VersionBump, &'static str> {
    let steps = [
        (old.read, new.read, VersionBump::Major, "major"),
        (old.write, new.write, VersionBump::Write, "write"),
        (old.minor, new.minor, VersionBump::Minor, "minor"),
    ];
    for (o, n, bump, name) in steps {
        if n > o {
            return Ok(bump);
        }
        if n < o {
            return Err(name);
        }
    }
    Ok(VersionBump::Unchanged)
}
