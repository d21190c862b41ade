//! Version compatibility law
//!
//! A revision's triple is accepted iff it is lexicographically not lower
//! than the persisted one, and its dialect never decreases. The reported
//! bump names the highest component that increased.

use proptest::prelude::*;
use schemamap::graph::{DialectVersion, SchemaGraph, SchemaVersion};
use schemamap::version::{VersionBump, VersionCompatibilityChecker, VersionOutcome};

fn graph(version: SchemaVersion, dialect: DialectVersion) -> SchemaGraph {
    let mut graph = SchemaGraph::new("Plant", "pl", version);
    graph.dialect = dialect;
    graph
}

fn triple() -> impl Strategy<Value = SchemaVersion> {
    (0u32..4, 0u32..4, 0u32..4).prop_map(|(r, w, m)| SchemaVersion::new(r, w, m))
}

fn dialect() -> impl Strategy<Value = DialectVersion> {
    (3u32..5, 0u32..4).prop_map(|(major, minor)| DialectVersion::new(major, minor))
}

fn expected_bump(old: SchemaVersion, new: SchemaVersion) -> VersionBump {
    if new.read != old.read {
        VersionBump::Major
    } else if new.write != old.write {
        VersionBump::Write
    } else if new.minor != old.minor {
        VersionBump::Minor
    } else {
        VersionBump::Unchanged
    }
}

proptest! {
    #[test]
    fn prop_triple_accepted_iff_not_lower(old in triple(), new in triple(), d in dialect()) {
        let outcome = VersionCompatibilityChecker.check(&graph(old, d), &graph(new, d));
        prop_assert_eq!(outcome.is_accepted(), new >= old);
        if let VersionOutcome::Accepted(delta) = outcome {
            prop_assert_eq!(delta.bump, expected_bump(old, new));
            prop_assert_eq!(delta.major_upgraded(), new.read > old.read);
        }
    }

    #[test]
    fn prop_dialect_never_decreases(v in triple(), old in dialect(), new in dialect()) {
        let bumped = SchemaVersion::new(v.read + 1, 0, 0);
        let outcome = VersionCompatibilityChecker.check(&graph(v, old), &graph(bumped, new));
        prop_assert_eq!(outcome.is_accepted(), new >= old);
    }
}

#[test]
fn test_lower_component_cannot_compensate() {
    let old = graph(SchemaVersion::new(1, 2, 0), DialectVersion::default());
    let new = graph(SchemaVersion::new(1, 1, 9), DialectVersion::default());
    let outcome = VersionCompatibilityChecker.check(&old, &new);
    assert!(matches!(outcome, VersionOutcome::Rejected { ref reason } if reason.contains("write")));
}

#[test]
fn test_renamed_schema_is_not_a_successor() {
    let old = graph(SchemaVersion::new(1, 0, 0), DialectVersion::default());
    let mut new = graph(SchemaVersion::new(2, 0, 0), DialectVersion::default());
    new.name = "Grid".into();
    assert!(!VersionCompatibilityChecker.check(&old, &new).is_accepted());
}

#[test]
fn test_short_form_parses_with_zero_write_digit() {
    let version: SchemaVersion = "2.5".parse().unwrap();
    assert_eq!(version, SchemaVersion::new(2, 0, 5));
    assert_eq!(version.to_string(), "02.00.05");
}
