//! Import pipeline invariants
//!
//! End-to-end checks of `SchemaImporter` against an in-memory catalog:
//! - re-importing an identical document writes nothing
//! - a failed catalog write leaves the persisted revision untouched
//! - the evolution scenarios around shared column pools, modifiers,
//!   property deletion and enumerator renames
//! - a column freed by a revision is not handed to a property added in
//!   that same revision, and is reported for clearing
//! - struct members added later get columns; members stored in fixed
//!   columns cannot be deleted

use schemamap::catalog::MemoryCatalog;
use schemamap::import::{ImportError, ImportOptions, ImportOutcome, SchemaImporter};
use schemamap::mapping::ColumnKind;
use schemamap::validator::rules;
use serde_json::{json, Value};

// =============================================================================
// Helpers
// =============================================================================

fn importer() -> SchemaImporter<MemoryCatalog> {
    SchemaImporter::new(MemoryCatalog::new())
}

fn import(
    importer: &mut SchemaImporter<MemoryCatalog>,
    doc: &Value,
) -> Result<schemamap::import::ImportReport, ImportError> {
    importer.import_document(&doc.to_string(), &ImportOptions::default())
}

fn column(importer: &SchemaImporter<MemoryCatalog>, class: &str, path: &str) -> (String, String) {
    let layout = importer.layout("Plant").unwrap().unwrap();
    let resolved = layout.resolve_column(class, path).unwrap();
    (resolved.table.name.clone(), resolved.column.name.clone())
}

fn rejected_rules(err: &ImportError) -> Vec<&'static str> {
    err.rejected_changes()
        .map(|r| r.rules())
        .unwrap_or_default()
}

fn plant(version: &str, classes: Value) -> Value {
    json!({ "name": "Plant", "alias": "pl", "version": version, "classes": classes })
}

// =============================================================================
// Idempotence and atomicity
// =============================================================================

#[test]
fn test_reimport_of_identical_document_is_noop() {
    let mut importer = importer();
    let doc = plant(
        "1.0.0",
        json!([{ "name": "Pump", "properties": [ { "name": "Flow", "type": "double" } ] }]),
    );

    let first = import(&mut importer, &doc).unwrap();
    assert_eq!(first.outcome, ImportOutcome::Created);
    assert!(first.wrote_catalog());
    let writes = importer.store().write_count();

    let second = import(&mut importer, &doc).unwrap();
    assert_eq!(second.outcome, ImportOutcome::Unchanged);
    assert!(!second.wrote_catalog());
    assert_eq!(second.columns_issued, 0);
    assert_eq!(importer.store().write_count(), writes);
}

#[test]
fn test_failed_write_leaves_persisted_revision_untouched() {
    let mut importer = importer();
    let v1 = plant(
        "1.0.0",
        json!([{ "name": "Pump", "properties": [ { "name": "Flow", "type": "double" } ] }]),
    );
    import(&mut importer, &v1).unwrap();
    let layout_before = importer.layout("Plant").unwrap().unwrap();

    let v2 = plant(
        "1.0.1",
        json!([{ "name": "Pump", "properties": [
            { "name": "Flow", "type": "double" },
            { "name": "Head", "type": "double" } ] }]),
    );
    importer.store_mut().fail_writes("disk full");
    let err = import(&mut importer, &v2).unwrap_err();
    assert!(matches!(err, ImportError::Io(_)));

    let graph = importer.graph("Plant").unwrap().unwrap();
    assert_eq!(graph.version.to_string(), "01.00.00");
    assert_eq!(importer.layout("Plant").unwrap().unwrap(), layout_before);

    importer.store_mut().clear_write_failure();
    let report = import(&mut importer, &v2).unwrap();
    assert_eq!(report.outcome, ImportOutcome::Upgraded);
    assert_eq!(column(&importer, "Pump", "Head").1, "Head");
}

#[test]
fn test_structural_change_without_version_bump_is_version_error() {
    let mut importer = importer();
    import(
        &mut importer,
        &plant("1.0.0", json!([{ "name": "Pump" }])),
    )
    .unwrap();

    let err = import(
        &mut importer,
        &plant(
            "1.0.0",
            json!([{ "name": "Pump", "properties": [ { "name": "Flow", "type": "double" } ] }]),
        ),
    )
    .unwrap_err();
    assert_eq!(err.code(), "SCHEMAMAP_VERSION");
    assert!(err.to_string().contains(rules::VERSION_NOT_INCREMENTED));
}

#[test]
fn test_version_decrease_is_rejected_before_diffing() {
    let mut importer = importer();
    import(&mut importer, &plant("2.0.0", json!([{ "name": "Pump" }]))).unwrap();

    let err = import(&mut importer, &plant("1.9.9", json!([{ "name": "Pump" }]))).unwrap_err();
    assert!(matches!(err, ImportError::Version(_)));
}

#[test]
fn test_alias_shared_with_other_schema_is_rejected() {
    let mut importer = importer();
    import(&mut importer, &plant("1.0.0", json!([{ "name": "Pump" }]))).unwrap();

    let other = json!({ "name": "Grid", "alias": "PL", "version": "1.0.0",
                        "classes": [ { "name": "Line" } ] });
    let err = import(&mut importer, &other).unwrap_err();
    assert_eq!(rejected_rules(&err), vec![rules::ALIAS_IN_USE]);
    assert!(importer.graph("Grid").unwrap().is_none());
}

// =============================================================================
// Scenario: overflow threshold change needs a permitted major upgrade
// =============================================================================

fn threshold_schema(version: &str, threshold: &str) -> Value {
    plant(
        version,
        json!([
            { "name": "Foo", "modifier": "abstract",
              "customAttributes": [
                { "class": "ClassMap", "properties": { "MapStrategy": "TablePerHierarchy" } },
                { "class": "ShareColumns", "properties": {
                    "MaxSharedColumnsBeforeOverflow": threshold } }
              ],
              "properties": [ { "name": "Code", "type": "string" } ] }
        ]),
    )
}

#[test]
fn test_threshold_change_rejected_when_major_upgrade_disallowed() {
    let mut importer = importer();
    import(&mut importer, &threshold_schema("1.0.0", "5")).unwrap();

    let err = importer
        .import_document(
            &threshold_schema("2.0.0", "7").to_string(),
            &ImportOptions::disallowing_major_upgrade(),
        )
        .unwrap_err();
    assert!(matches!(err, ImportError::Version(_)));
    assert!(err.to_string().contains(rules::OVERFLOW_THRESHOLD_CHANGED));

    let layout = importer.layout("Plant").unwrap().unwrap();
    let flags = &layout.class_map("Foo").unwrap().flags;
    assert_eq!(flags.max_shared_columns_before_overflow, Some(5));
}

#[test]
fn test_threshold_change_accepted_on_major_upgrade() {
    let mut importer = importer();
    import(&mut importer, &threshold_schema("1.0.0", "5")).unwrap();

    let report = import(&mut importer, &threshold_schema("2.0.0", "7")).unwrap();
    assert_eq!(report.outcome, ImportOutcome::Upgraded);
    assert!(report.version.major_upgraded());

    let layout = importer.layout("Plant").unwrap().unwrap();
    let flags = &layout.class_map("Foo").unwrap().flags;
    assert_eq!(flags.max_shared_columns_before_overflow, Some(7));
}

#[test]
fn test_threshold_change_on_minor_bump_is_rejected() {
    let mut importer = importer();
    import(&mut importer, &threshold_schema("1.0.0", "5")).unwrap();

    let err = import(&mut importer, &threshold_schema("1.0.1", "7")).unwrap_err();
    assert_eq!(rejected_rules(&err), vec![rules::OVERFLOW_THRESHOLD_CHANGED]);
}

// =============================================================================
// Scenario: Sealed subclass may not become Abstract
// =============================================================================

fn koo_schema(version: &str, foo_modifier: &str) -> Value {
    plant(
        version,
        json!([
            { "name": "Koo", "modifier": "abstract",
              "customAttributes": [
                { "class": "ClassMap", "properties": { "MapStrategy": "TablePerHierarchy" } },
                { "class": "ShareColumns", "properties": {} }
              ],
              "properties": [ { "name": "Tag", "type": "string" } ] },
            { "name": "Foo", "modifier": foo_modifier, "baseClasses": ["Koo"],
              "properties": [ { "name": "Size", "type": "int" } ] }
        ]),
    )
}

#[test]
fn test_sealed_subclass_cannot_become_abstract() {
    let mut importer = importer();
    import(&mut importer, &koo_schema("1.0.0", "sealed")).unwrap();

    for version in ["1.0.1", "2.0.0"] {
        let err = import(&mut importer, &koo_schema(version, "abstract")).unwrap_err();
        assert_eq!(rejected_rules(&err), vec![rules::MODIFIER_TO_ABSTRACT]);
    }
    let graph = importer.graph("Plant").unwrap().unwrap();
    assert_eq!(graph.version.to_string(), "01.00.00");
}

// =============================================================================
// Scenario: property deleted from a deep TablePerHierarchy tree
// =============================================================================

fn deep_schema(version: &str, s_props: Value) -> Value {
    plant(
        version,
        json!([
            { "name": "Base", "modifier": "abstract",
              "customAttributes": [
                { "class": "ClassMap", "properties": { "MapStrategy": "TablePerHierarchy" } },
                { "class": "ShareColumns", "properties": { "ApplyToSubclassesOnly": "true" } }
              ],
              "properties": [ { "name": "Code", "type": "string" } ] },
            { "name": "S", "baseClasses": ["Base"], "properties": s_props },
            { "name": "L1", "baseClasses": ["S"], "properties": [ { "name": "P1", "type": "int" } ] },
            { "name": "L2", "baseClasses": ["L1"], "properties": [ { "name": "P2", "type": "int" } ] },
            { "name": "L3", "baseClasses": ["L2"], "properties": [ { "name": "P3", "type": "int" } ] },
            { "name": "L4", "baseClasses": ["L3"], "properties": [ { "name": "P4", "type": "int" } ] }
        ]),
    )
}

#[test]
fn test_property_deleted_from_deep_hierarchy() {
    let mut importer = importer();
    import(
        &mut importer,
        &deep_schema(
            "1.0.0",
            json!([ { "name": "S1", "type": "int" }, { "name": "S2", "type": "string" } ]),
        ),
    )
    .unwrap();
    let p4_before = column(&importer, "L4", "P4");
    let s2_before = column(&importer, "L4", "S2");
    assert!(importer
        .layout("Plant")
        .unwrap()
        .unwrap()
        .resolve_column("L4", "S2")
        .is_some());

    let report = import(
        &mut importer,
        &deep_schema(
            "1.0.1",
            json!([ { "name": "S1", "type": "int" }, { "name": "D2", "type": "double" } ]),
        ),
    )
    .unwrap();
    assert_eq!(report.outcome, ImportOutcome::Upgraded);

    let layout = importer.layout("Plant").unwrap().unwrap();
    for class in ["S", "L1", "L2", "L3", "L4"] {
        assert!(layout.property_map(class, "S2").is_none(), "{} still maps S2", class);
        assert!(layout.resolve_column(class, "S2").is_none());
    }

    let d2 = layout.resolve_column("L4", "D2").unwrap();
    assert!(d2.column.nullable);
    assert_eq!(d2.kind(), ColumnKind::SharedData);
    assert_eq!(column(&importer, "L4", "P4"), p4_before);

    // Existing rows still hold S2 values in its old column.
    assert_ne!(column(&importer, "L4", "D2"), s2_before);
    let freed: Vec<&str> = report
        .freed_columns
        .iter()
        .filter(|f| f.access_path == "S2" && (f.table.clone(), f.column.clone()) == s2_before)
        .map(|f| f.class.as_str())
        .collect();
    assert_eq!(freed, vec!["L1", "L2", "L3", "L4", "S"]);
    assert_eq!(report.freed_columns.len(), 5);
}

#[test]
fn test_column_freed_earlier_is_reused_by_later_revision() {
    let mut importer = importer();
    let s_props = |names: &[&str]| {
        Value::Array(names.iter().map(|n| json!({ "name": n, "type": "int" })).collect())
    };
    import(&mut importer, &deep_schema("1.0.0", s_props(&["S1", "S2"]))).unwrap();
    let s2_before = column(&importer, "S", "S2");

    let report = import(&mut importer, &deep_schema("1.0.1", s_props(&["S1"]))).unwrap();
    assert_eq!(report.freed_columns.len(), 5);

    let report = import(&mut importer, &deep_schema("1.0.2", s_props(&["S1", "S3"]))).unwrap();
    assert!(report.freed_columns.is_empty());
    assert_eq!(column(&importer, "L4", "S3"), s2_before);
}

// =============================================================================
// Scenario: pool exhaustion spills later properties into overflow
// =============================================================================

fn pool_schema(version: &str, sub_props: Value) -> Value {
    plant(
        version,
        json!([
            { "name": "Element", "modifier": "abstract",
              "customAttributes": [
                { "class": "ClassMap", "properties": { "MapStrategy": "TablePerHierarchy" } },
                { "class": "ShareColumns", "properties": {
                    "MaxSharedColumnsBeforeOverflow": "4", "ApplyToSubclassesOnly": "true" } }
              ],
              "properties": [ { "name": "Code", "type": "string" } ] },
            { "name": "Pump", "baseClasses": ["Element"], "properties": sub_props }
        ]),
    )
}

fn int_props(names: &[&str]) -> Value {
    Value::Array(
        names
            .iter()
            .map(|n| json!({ "name": n, "type": "int" }))
            .collect(),
    )
}

#[test]
fn test_pool_exhaustion_moves_later_property_to_overflow() {
    let mut importer = importer();
    import(&mut importer, &pool_schema("1.0.0", int_props(&["A", "B", "C"]))).unwrap();
    let a = column(&importer, "Pump", "A");
    let c = column(&importer, "Pump", "C");

    import(&mut importer, &pool_schema("1.0.1", int_props(&["A", "B", "C", "D"]))).unwrap();
    assert_eq!(column(&importer, "Pump", "D"), ("pl_Element".into(), "ps4".into()));

    let report =
        import(&mut importer, &pool_schema("1.0.2", int_props(&["A", "B", "C", "D", "E"]))).unwrap();
    assert_eq!(
        column(&importer, "Pump", "E"),
        ("pl_Element_Overflow".into(), "os1".into())
    );
    assert!(report
        .tables_created
        .contains(&"pl_Element_Overflow".to_string()));

    assert_eq!(column(&importer, "Pump", "A"), a);
    assert_eq!(column(&importer, "Pump", "C"), c);
    assert_eq!(column(&importer, "Pump", "D"), ("pl_Element".into(), "ps4".into()));
}

// =============================================================================
// Scenario: one-time enumerator rename across the dialect upgrade
// =============================================================================

fn colors(version: &str, dialect: &str, first: Option<&str>) -> Value {
    let red = match first {
        Some(name) => json!({ "name": name, "value": 1 }),
        None => json!({ "value": 1 }),
    };
    json!({
        "name": "Plant", "alias": "pl", "version": version, "dialect": dialect,
        "enumerations": [ { "name": "Color", "type": "int", "enumerators": [ red ] } ],
        "classes": [ { "name": "Car", "properties": [ { "name": "Paint", "type": "Color" } ] } ]
    })
}

#[test]
fn test_enumerator_rename_allowed_once_when_leaving_legacy_dialect() {
    let mut importer = importer();
    import(&mut importer, &colors("1.0.0", "3.1", None)).unwrap();
    let graph = importer.graph("Plant").unwrap().unwrap();
    assert_eq!(graph.enumerations[0].enumerators[0].name, "Color1");

    import(&mut importer, &colors("1.0.1", "3.2", Some("Red"))).unwrap();
    let graph = importer.graph("Plant").unwrap().unwrap();
    assert_eq!(graph.enumerations[0].enumerators[0].name, "Red");

    let err = import(&mut importer, &colors("1.0.2", "3.2", Some("Crimson"))).unwrap_err();
    assert_eq!(rejected_rules(&err), vec![rules::ENUMERATOR_RENAMED]);

    let err = import(&mut importer, &colors("1.0.2", "3.2", Some("Color1"))).unwrap_err();
    assert_eq!(rejected_rules(&err), vec![rules::ENUMERATOR_RENAMED]);

    // Even a major upgrade does not reopen the window.
    let err = import(&mut importer, &colors("2.0.0", "3.2", Some("Crimson"))).unwrap_err();
    assert_eq!(rejected_rules(&err), vec![rules::ENUMERATOR_RENAMED]);
}

#[test]
fn test_enumerator_rename_within_current_dialect_is_rejected() {
    let mut importer = importer();
    import(&mut importer, &colors("1.0.0", "3.2", Some("Red"))).unwrap();

    let err = import(&mut importer, &colors("1.0.1", "3.2", Some("Scarlet"))).unwrap_err();
    assert!(err
        .rejected_changes()
        .unwrap()
        .contains(rules::ENUMERATOR_RENAMED));
}

// =============================================================================
// Scenario: struct members evolve under mapped properties
// =============================================================================

fn valve_schema(version: &str, members: Value) -> Value {
    plant(
        version,
        json!([
            { "name": "Location", "kind": "struct", "properties": members },
            { "name": "Valve", "properties": [
                { "name": "Size", "type": "double" },
                { "name": "Where", "kind": "struct", "type": "Location" } ] }
        ]),
    )
}

fn pooled_valve_schema(version: &str, members: Value) -> Value {
    plant(
        version,
        json!([
            { "name": "Location", "kind": "struct", "properties": members },
            { "name": "Element", "modifier": "abstract",
              "customAttributes": [
                { "class": "ClassMap", "properties": { "MapStrategy": "TablePerHierarchy" } },
                { "class": "ShareColumns", "properties": { "ApplyToSubclassesOnly": "true" } }
              ] },
            { "name": "Valve", "baseClasses": ["Element"], "properties": [
                { "name": "Where", "kind": "struct", "type": "Location" } ] },
            { "name": "GateValve", "baseClasses": ["Valve"] }
        ]),
    )
}

fn strings(names: &[&str]) -> Value {
    Value::Array(
        names
            .iter()
            .map(|n| json!({ "name": n, "type": "string" }))
            .collect(),
    )
}

#[test]
fn test_struct_member_added_to_own_table_user() {
    let mut importer = importer();
    import(&mut importer, &valve_schema("1.0.0", strings(&["Site"]))).unwrap();
    let site = column(&importer, "Valve", "Where.Site");

    let report = import(&mut importer, &valve_schema("1.0.1", strings(&["Site", "Zip"]))).unwrap();
    assert_eq!(report.columns_issued, 1);
    assert_eq!(column(&importer, "Valve", "Where.Site"), site);
    assert_eq!(
        column(&importer, "Valve", "Where.Zip"),
        ("pl_Valve".to_string(), "Where_Zip".to_string())
    );
}

#[test]
fn test_struct_member_added_to_pooled_user_is_shared_down_the_hierarchy() {
    let mut importer = importer();
    import(&mut importer, &pooled_valve_schema("1.0.0", strings(&["Site"]))).unwrap();

    import(&mut importer, &pooled_valve_schema("1.0.1", strings(&["Site", "Zip"]))).unwrap();
    let zip = column(&importer, "Valve", "Where.Zip");
    assert_eq!(zip, ("pl_Element".to_string(), "ps2".to_string()));
    assert_eq!(column(&importer, "GateValve", "Where.Zip"), zip);
}

#[test]
fn test_struct_member_in_own_column_cannot_be_deleted() {
    let mut importer = importer();
    import(&mut importer, &valve_schema("1.0.0", strings(&["Site", "Zip"]))).unwrap();

    let err = import(&mut importer, &valve_schema("2.0.0", strings(&["Site"]))).unwrap_err();
    assert!(err.rejected_changes().unwrap().contains_at(rules::PROPERTY_COLUMN_DROP, "Location.Zip"));
    assert!(importer
        .layout("Plant")
        .unwrap()
        .unwrap()
        .resolve_column("Valve", "Where.Zip")
        .is_some());
}

#[test]
fn test_struct_member_nested_in_another_struct_cannot_be_deleted() {
    let nested = |version: &str, members: Value| {
        plant(
            version,
            json!([
                { "name": "Location", "kind": "struct", "properties": members },
                { "name": "Placement", "kind": "struct", "properties": [
                    { "name": "Loc", "kind": "struct", "type": "Location" } ] },
                { "name": "Valve", "properties": [
                    { "name": "At", "kind": "struct", "type": "Placement" } ] }
            ]),
        )
    };
    let mut importer = importer();
    import(&mut importer, &nested("1.0.0", strings(&["Site", "Zip"]))).unwrap();
    assert!(importer
        .layout("Plant")
        .unwrap()
        .unwrap()
        .resolve_column("Valve", "At.Loc.Zip")
        .is_some());

    let err = import(&mut importer, &nested("2.0.0", strings(&["Site"]))).unwrap_err();
    assert_eq!(rejected_rules(&err), vec![rules::PROPERTY_COLUMN_DROP]);
}

#[test]
fn test_struct_member_in_pool_is_deleted_and_freed() {
    let mut importer = importer();
    import(&mut importer, &pooled_valve_schema("1.0.0", strings(&["Site", "Zip"]))).unwrap();
    let zip = column(&importer, "Valve", "Where.Zip");

    let report = import(&mut importer, &pooled_valve_schema("1.0.1", strings(&["Site"]))).unwrap();
    let layout = importer.layout("Plant").unwrap().unwrap();
    assert!(layout.resolve_column("Valve", "Where.Zip").is_none());
    assert!(layout.resolve_column("GateValve", "Where.Zip").is_none());
    assert!(layout.resolve_column("Valve", "Where.Site").is_some());

    let classes: Vec<&str> = report
        .freed_columns
        .iter()
        .filter(|f| f.access_path == "Where.Zip" && (f.table.clone(), f.column.clone()) == zip)
        .map(|f| f.class.as_str())
        .collect();
    assert_eq!(classes, vec!["GateValve", "Valve"]);
}

// =============================================================================
// Scenario: navigation onto a relationship persisted as a link table
// =============================================================================

fn motor_schema(version: &str, pump_props: Value) -> Value {
    plant(
        version,
        json!([
            { "name": "Pump", "properties": pump_props },
            { "name": "Motor" },
            { "name": "PumpHasMotor", "kind": "relationship",
              "relationship": { "strength": "referencing",
                "source": { "multiplicity": "(0..*)", "classes": ["Pump"] },
                "target": { "multiplicity": "(0..1)", "classes": ["Motor"] } } }
        ]),
    )
}

#[test]
fn test_navigation_added_to_link_table_relationship_is_conflict() {
    let mut importer = importer();
    import(&mut importer, &motor_schema("1.0.0", json!([]))).unwrap();
    let before = importer.layout("Plant").unwrap().unwrap();

    let err = import(
        &mut importer,
        &motor_schema(
            "1.0.1",
            json!([{ "name": "Motor", "kind": "navigation", "relationship": "PumpHasMotor" }]),
        ),
    )
    .unwrap_err();
    assert!(matches!(&err, ImportError::MappingConflict(c) if c.class == "Pump"));
    assert_eq!(err.code(), "SCHEMAMAP_MAPPING_CONFLICT");
    assert_eq!(importer.layout("Plant").unwrap().unwrap(), before);
}
