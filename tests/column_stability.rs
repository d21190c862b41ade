//! Column stability across revisions
//!
//! Invariants:
//! - an issued `(class, access path) → (table, column)` pair is never
//!   reassigned while its property exists
//! - two live properties of one class never share a column
//! - the shared pool of a table never exceeds its overflow threshold

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use proptest::sample::Index;
use schemamap::catalog::MemoryCatalog;
use schemamap::import::{ImportOptions, SchemaImporter};
use schemamap::mapping::{ColumnKind, PhysicalLayout};
use serde_json::{json, Value};

const THRESHOLD: usize = 3;

// =============================================================================
// Helpers
// =============================================================================

#[derive(Debug, Clone, Default)]
struct Revision {
    minor: u32,
    pump: Vec<String>,
    fan: Vec<String>,
}

impl Revision {
    fn document(&self) -> Value {
        let props = |names: &[String]| -> Value {
            Value::Array(
                names
                    .iter()
                    .map(|n| json!({ "name": n, "type": "int" }))
                    .collect(),
            )
        };
        json!({
            "name": "Plant", "alias": "pl", "version": format!("1.0.{}", self.minor),
            "classes": [
                { "name": "Element", "modifier": "abstract",
                  "customAttributes": [
                    { "class": "ClassMap", "properties": { "MapStrategy": "TablePerHierarchy" } },
                    { "class": "ShareColumns", "properties": {
                        "MaxSharedColumnsBeforeOverflow": THRESHOLD.to_string(),
                        "ApplyToSubclassesOnly": "true" } }
                  ],
                  "properties": [ { "name": "Code", "type": "string" } ] },
                { "name": "Pump", "baseClasses": ["Element"], "properties": props(&self.pump) },
                { "name": "Fan", "baseClasses": ["Element"], "properties": props(&self.fan) }
            ]
        })
    }

    fn live(&self) -> BTreeSet<(String, String)> {
        let pump = self.pump.iter().map(|p| ("Pump".to_string(), p.clone()));
        let fan = self.fan.iter().map(|p| ("Fan".to_string(), p.clone()));
        pump.chain(fan).collect()
    }
}

type Issued = BTreeMap<(String, String), (String, String)>;

fn issued(layout: &PhysicalLayout) -> Issued {
    layout
        .issued_columns()
        .into_iter()
        .map(|(class, mc)| ((class, mc.access_path), (mc.table, mc.column)))
        .collect()
}

fn import(importer: &mut SchemaImporter<MemoryCatalog>, revision: &Revision) -> PhysicalLayout {
    importer
        .import_document(&revision.document().to_string(), &ImportOptions::default())
        .unwrap();
    importer.layout("Plant").unwrap().unwrap()
}

fn assert_stable(before: &Issued, after: &Issued, live: &BTreeSet<(String, String)>) {
    for (key, slot) in before {
        if live.contains(key) {
            assert_eq!(after.get(key), Some(slot), "{:?} was reassigned", key);
        }
    }
}

fn assert_no_shared_slots(layout: &PhysicalLayout) {
    for class in ["Pump", "Fan"] {
        let mut seen = BTreeSet::new();
        for map in layout.property_maps_of(class) {
            for mc in &map.columns {
                assert!(
                    seen.insert((mc.table.clone(), mc.column.clone())),
                    "{}.{} shares {}.{}",
                    class,
                    mc.access_path,
                    mc.table,
                    mc.column
                );
            }
        }
    }
}

fn assert_pool_bounded(layout: &PhysicalLayout) {
    let table = layout.table("pl_Element").unwrap();
    assert!(table.pool(ColumnKind::SharedData).count() <= THRESHOLD);
}

// =============================================================================
// Fixed sequence
// =============================================================================

#[test]
fn test_pairs_survive_a_sequence_of_revisions() {
    let mut importer = SchemaImporter::new(MemoryCatalog::new());
    let mut revision = Revision {
        minor: 0,
        pump: vec!["A".into(), "B".into()],
        fan: vec!["X".into()],
    };
    let mut layout = import(&mut importer, &revision);

    let steps: Vec<Box<dyn Fn(&mut Revision)>> = vec![
        Box::new(|r: &mut Revision| r.pump.push("C".into())),
        Box::new(|r: &mut Revision| r.fan.push("Y".into())),
        Box::new(|r: &mut Revision| r.pump.retain(|p| p != "A")),
        Box::new(|r: &mut Revision| r.pump.push("D".into())),
        Box::new(|r: &mut Revision| r.fan.insert(0, "W".into())),
        Box::new(|r: &mut Revision| r.pump.push("E".into())),
    ];
    for step in steps {
        let before = issued(&layout);
        step(&mut revision);
        revision.minor += 1;
        layout = import(&mut importer, &revision);

        assert_stable(&before, &issued(&layout), &revision.live());
        assert_no_shared_slots(&layout);
        assert_pool_bounded(&layout);
    }

    // A deleted property frees its slot for the next addition.
    let a_slot = ("pl_Element".to_string(), "ps1".to_string());
    assert_eq!(
        issued(&layout).get(&("Pump".to_string(), "D".to_string())),
        Some(&a_slot)
    );
    let e = issued(&layout)[&("Pump".to_string(), "E".to_string())].clone();
    assert_eq!(e.0, "pl_Element_Overflow");
}

// =============================================================================
// Random sequences
// =============================================================================

#[derive(Debug, Clone)]
enum Step {
    AddPump,
    AddFan,
    Delete(Index),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::AddPump),
        Just(Step::AddFan),
        any::<Index>().prop_map(Step::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_issued_pairs_are_carried_forward(steps in prop::collection::vec(step(), 1..10)) {
        let mut importer = SchemaImporter::new(MemoryCatalog::new());
        let mut revision = Revision::default();
        let mut layout = import(&mut importer, &revision);
        let mut counter = 0;

        for step in steps {
            let before = issued(&layout);
            match step {
                Step::AddPump => {
                    counter += 1;
                    revision.pump.push(format!("P{}", counter));
                }
                Step::AddFan => {
                    counter += 1;
                    revision.fan.push(format!("F{}", counter));
                }
                Step::Delete(index) => {
                    let total = revision.pump.len() + revision.fan.len();
                    if total == 0 {
                        continue;
                    }
                    let i = index.index(total);
                    if i < revision.pump.len() {
                        revision.pump.remove(i);
                    } else {
                        revision.fan.remove(i - revision.pump.len());
                    }
                }
            }
            revision.minor += 1;
            layout = import(&mut importer, &revision);

            assert_stable(&before, &issued(&layout), &revision.live());
            assert_no_shared_slots(&layout);
            assert_pool_bounded(&layout);
            for key in revision.live() {
                prop_assert!(layout.resolve_column(&key.0, &key.1).is_some());
            }
        }
    }
}
