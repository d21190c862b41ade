//! SchemaDiffEngine: old graph + new graph → change tree
//!
//! Elements are matched by name within their container. Output order is
//! deterministic: old declaration order for deleted and modified
//! elements, followed by added elements in new declaration order.

use std::collections::BTreeSet;

use super::changes::*;
use crate::graph::{
    ClassDef, ClassKind, CustomAttribute, Enumeration, Enumerator, PropertyDef, PropertyKind,
    RelationshipConstraint, SchemaGraph,
};

/// Computes structural differences between two revisions of a schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaDiffEngine;

impl SchemaDiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Diffs two revisions. Total: any pair of graphs yields a tree.
    pub fn diff(&self, old: &SchemaGraph, new: &SchemaGraph) -> SchemaChange {
        let ctx = Graphs { old, new };
        SchemaChange {
            name: new.name.clone(),
            alias: ValueChange::between(&old.alias, &new.alias),
            labels: labels(
                (&old.display_label, &old.description),
                (&new.display_label, &new.description),
            ),
            version: ValueChange::between(&old.version, &new.version),
            dialect: ValueChange::between(&old.dialect, &new.dialect),
            references: diff_named(&old.references, &new.references, |r| &r.name, |o, n| {
                ReferenceDelta {
                    version: ValueChange::between(&o.version, &n.version),
                }
            }),
            custom_attributes: diff_attributes(&old.custom_attributes, &new.custom_attributes),
            classes: diff_named(
                &ordered_classes(old),
                &ordered_classes(new),
                |c| &c.name,
                |o, n| ctx.class_delta(o, n),
            ),
            enumerations: diff_named(&old.enumerations, &new.enumerations, |e| &e.name, |o, n| {
                enumeration_delta(o, n)
            }),
            kinds_of_quantity: diff_named(
                &old.kinds_of_quantity,
                &new.kinds_of_quantity,
                |k| &k.name,
                |o, n| KindOfQuantityDelta {
                    labels: labels((&o.display_label, &o.description), (&n.display_label, &n.description)),
                    persistence_unit: ValueChange::between(&o.persistence_unit, &n.persistence_unit),
                    relative_error: ValueChange::between(&o.relative_error, &n.relative_error),
                    presentation_formats: ValueChange::between(
                        &o.presentation_formats,
                        &n.presentation_formats,
                    ),
                },
            ),
            units: diff_named(&old.units, &new.units, |u| &u.name, |o, n| UnitDelta {
                labels: labels((&o.display_label, &o.description), (&n.display_label, &n.description)),
                phenomenon: ValueChange::between(&o.phenomenon, &n.phenomenon),
                unit_system: ValueChange::between(&o.unit_system, &n.unit_system),
                definition: ValueChange::between(&o.definition, &n.definition),
                numerator: ValueChange::between(&o.numerator, &n.numerator),
                denominator: ValueChange::between(&o.denominator, &n.denominator),
                offset: ValueChange::between(&o.offset, &n.offset),
            }),
            phenomena: diff_named(&old.phenomena, &new.phenomena, |p| &p.name, |o, n| {
                PhenomenonDelta {
                    labels: labels((&o.display_label, &o.description), (&n.display_label, &n.description)),
                    definition: ValueChange::between(&o.definition, &n.definition),
                }
            }),
            unit_systems: diff_named(&old.unit_systems, &new.unit_systems, |u| &u.name, |o, n| {
                labels((&o.display_label, &o.description), (&n.display_label, &n.description))
            }),
            formats: diff_named(&old.formats, &new.formats, |f| &f.name, |o, n| FormatDelta {
                labels: labels((&o.display_label, &o.description), (&n.display_label, &n.description)),
                format_type: ValueChange::between(&o.format_type, &n.format_type),
                precision: ValueChange::between(&o.precision, &n.precision),
            }),
            categories: diff_named(&old.categories, &new.categories, |c| &c.name, |o, n| {
                CategoryDelta {
                    labels: labels((&o.display_label, &o.description), (&n.display_label, &n.description)),
                    priority: ValueChange::between(&o.priority, &n.priority),
                }
            }),
        }
    }
}

impl SchemaChange {
    /// Change tree of a first import: every element is `Added`.
    pub fn created(new: &SchemaGraph) -> SchemaChange {
        let mut empty = SchemaGraph::new(new.name.clone(), new.alias.clone(), new.version);
        empty.dialect = new.dialect;
        empty.display_label = new.display_label.clone();
        empty.description = new.description.clone();
        SchemaDiffEngine.diff(&empty, new)
    }
}

fn ordered_classes(graph: &SchemaGraph) -> Vec<&ClassDef> {
    graph.classes().map(|(_, c)| c).collect()
}

/// Generic by-name matcher used for every element container.
fn diff_named<T, D, N, F>(old: &[T], new: &[T], name: N, delta: F) -> Vec<ElementChange<D>>
where
    D: Delta,
    N: Fn(&T) -> &String,
    F: Fn(&T, &T) -> D,
{
    let mut out = Vec::new();
    for o in old {
        match new.iter().find(|n| name(*n) == name(o)) {
            Some(n) => {
                let d = delta(o, n);
                if !d.is_empty() {
                    out.push(ElementChange {
                        name: name(o).clone(),
                        state: ChangeState::Modified,
                        delta: d,
                    });
                }
            }
            None => out.push(ElementChange::deleted(name(o).clone())),
        }
    }
    for n in new {
        if !old.iter().any(|o| name(o) == name(n)) {
            out.push(ElementChange::added(name(n).clone()));
        }
    }
    out
}

fn labels(
    old: (&Option<String>, &Option<String>),
    new: (&Option<String>, &Option<String>),
) -> LabelDelta {
    LabelDelta {
        display_label: ValueChange::between(old.0, new.0),
        description: ValueChange::between(old.1, new.1),
    }
}

fn diff_attributes(
    old: &[CustomAttribute],
    new: &[CustomAttribute],
) -> Vec<ElementChange<AttributeDelta>> {
    diff_named(old, new, |ca| &ca.class_name, |o, n| {
        let keys: BTreeSet<&String> = o.properties.keys().chain(n.properties.keys()).collect();
        let properties = keys
            .into_iter()
            .filter_map(|key| {
                ValueChange::between(&o.properties.get(key).cloned(), &n.properties.get(key).cloned())
                    .map(|change| (key.clone(), change))
            })
            .collect();
        AttributeDelta { properties }
    })
}

/// Both graphs, needed to turn class ids into comparable names.
struct Graphs<'a> {
    old: &'a SchemaGraph,
    new: &'a SchemaGraph,
}

impl Graphs<'_> {
    fn class_delta(&self, o: &ClassDef, n: &ClassDef) -> ClassDelta {
        let relationship = match (&o.kind, &n.kind) {
            (ClassKind::Relationship(old_rel), ClassKind::Relationship(new_rel)) => {
                let delta = RelationshipDelta {
                    strength: ValueChange::between(&old_rel.strength, &new_rel.strength),
                    direction: ValueChange::between(&old_rel.direction, &new_rel.direction),
                    source: self.constraint_delta(&old_rel.source, &new_rel.source),
                    target: self.constraint_delta(&old_rel.target, &new_rel.target),
                };
                Some(delta).filter(|d| !d.is_empty())
            }
            _ => None,
        };

        ClassDelta {
            labels: labels((&o.display_label, &o.description), (&n.display_label, &n.description)),
            kind: ValueChange::between(&o.kind.tag(), &n.kind.tag()),
            modifier: ValueChange::between(&o.modifier, &n.modifier),
            base_classes: diff_base_classes(
                &self.old.class_names(&o.base_classes),
                &self.new.class_names(&n.base_classes),
            ),
            relationship,
            properties: diff_named(&o.properties, &n.properties, |p| &p.name, |op, np| {
                self.property_delta(op, np)
            }),
            custom_attributes: diff_attributes(&o.custom_attributes, &n.custom_attributes),
        }
    }

    fn constraint_delta(&self, o: &RelationshipConstraint, n: &RelationshipConstraint) -> ConstraintDelta {
        ConstraintDelta {
            multiplicity: ValueChange::between(&o.multiplicity, &n.multiplicity),
            polymorphic: ValueChange::between(&o.polymorphic, &n.polymorphic),
            role_label: ValueChange::between(&o.role_label, &n.role_label),
            classes: ValueChange::between(
                &self.old.class_names(&o.classes),
                &self.new.class_names(&n.classes),
            ),
        }
    }

    fn property_delta(&self, o: &PropertyDef, n: &PropertyDef) -> PropertyDelta {
        let struct_name = |graph: &SchemaGraph, p: &PropertyDef| {
            p.kind.struct_class().map(|id| graph.class_name(id).to_string())
        };
        let navigation = |graph: &SchemaGraph, p: &PropertyDef| match p.kind {
            PropertyKind::Navigation {
                relationship,
                direction,
            } => Some(NavigationTarget {
                relationship: graph.class_name(relationship).to_string(),
                direction,
            }),
            _ => None,
        };

        PropertyDelta {
            labels: labels((&o.display_label, &o.description), (&n.display_label, &n.description)),
            kind: ValueChange::between(&o.kind.tag(), &n.kind.tag()),
            primitive_type: ValueChange::between(&o.kind.primitive(), &n.kind.primitive()),
            enumeration: ValueChange::between(
                &o.kind.enumeration().map(str::to_string),
                &n.kind.enumeration().map(str::to_string),
            ),
            struct_class: ValueChange::between(&struct_name(self.old, o), &struct_name(self.new, n)),
            bounds: ValueChange::between(&o.kind.bounds(), &n.kind.bounds()),
            navigation: ValueChange::between(&navigation(self.old, o), &navigation(self.new, n)),
            extended_type: ValueChange::between(&o.extended_type, &n.extended_type),
            read_only: ValueChange::between(&o.read_only, &n.read_only),
            priority: ValueChange::between(&o.priority, &n.priority),
            category: ValueChange::between(&o.category, &n.category),
            kind_of_quantity: ValueChange::between(&o.kind_of_quantity, &n.kind_of_quantity),
            min_value: ValueChange::between(&o.min_value, &n.min_value),
            max_value: ValueChange::between(&o.max_value, &n.max_value),
            min_length: ValueChange::between(&o.min_length, &n.min_length),
            max_length: ValueChange::between(&o.max_length, &n.max_length),
            custom_attributes: diff_attributes(&o.custom_attributes, &n.custom_attributes),
        }
    }
}

/// Ordered base class diff. A base present on both sides at a different
/// index relative to the other surviving bases is reported as `Moved`.
fn diff_base_classes(old: &[String], new: &[String]) -> Vec<BaseClassChange> {
    let mut out = Vec::new();
    for (pos, name) in old.iter().enumerate() {
        if !new.contains(name) {
            out.push(BaseClassChange {
                name: name.clone(),
                state: BaseClassState::Deleted,
                old_position: Some(pos),
                new_position: None,
            });
        }
    }

    let kept_old: Vec<&String> = old.iter().filter(|n| new.contains(n)).collect();
    let kept_new: Vec<&String> = new.iter().filter(|n| old.contains(n)).collect();
    for (rank, name) in kept_new.iter().enumerate() {
        if kept_old[rank] != *name {
            out.push(BaseClassChange {
                name: (*name).clone(),
                state: BaseClassState::Moved,
                old_position: old.iter().position(|n| n == *name),
                new_position: new.iter().position(|n| n == *name),
            });
        }
    }

    for (pos, name) in new.iter().enumerate() {
        if !old.contains(name) {
            out.push(BaseClassChange {
                name: name.clone(),
                state: BaseClassState::Added,
                old_position: None,
                new_position: Some(pos),
            });
        }
    }
    out
}

fn enumeration_delta(o: &Enumeration, n: &Enumeration) -> EnumerationDelta {
    EnumerationDelta {
        labels: labels((&o.display_label, &o.description), (&n.display_label, &n.description)),
        backing: ValueChange::between(&o.backing, &n.backing),
        strict: ValueChange::between(&o.strict, &n.strict),
        enumerators: diff_enumerators(&o.enumerators, &n.enumerators),
    }
}

/// Matches enumerators by name first, then pairs leftovers by value so a
/// rename surfaces as a modification.
fn diff_enumerators(old: &[Enumerator], new: &[Enumerator]) -> Vec<ElementChange<EnumeratorDelta>> {
    let mut matched_new = vec![false; new.len()];
    let mut pairs: Vec<(usize, Option<usize>)> = Vec::with_capacity(old.len());

    for (i, o) in old.iter().enumerate() {
        let hit = new.iter().position(|n| n.name == o.name);
        if let Some(j) = hit {
            matched_new[j] = true;
        }
        pairs.push((i, hit));
    }
    for pair in pairs.iter_mut().filter(|(_, hit)| hit.is_none()) {
        let value = &old[pair.0].value;
        if let Some(j) = (0..new.len()).find(|j| !matched_new[*j] && new[*j].value == *value) {
            matched_new[j] = true;
            pair.1 = Some(j);
        }
    }

    let mut out = Vec::new();
    for (i, hit) in pairs {
        let o = &old[i];
        match hit {
            Some(j) => {
                let n = &new[j];
                let delta = EnumeratorDelta {
                    name: ValueChange::between(&o.name, &n.name),
                    value: ValueChange::between(&o.value, &n.value),
                    display_label: ValueChange::between(&o.display_label, &n.display_label),
                };
                if !delta.is_empty() {
                    out.push(ElementChange {
                        name: o.name.clone(),
                        state: ChangeState::Modified,
                        delta,
                    });
                }
            }
            None => out.push(ElementChange::deleted(o.name.clone())),
        }
    }
    for (j, n) in new.iter().enumerate() {
        if !matched_new[j] {
            out.push(ElementChange::added(n.name.clone()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        attributes, ClassId, ClassModifier, EnumBacking, EnumValue, PrimitiveType, SchemaVersion,
    };

    fn base_graph() -> SchemaGraph {
        let mut graph = SchemaGraph::new("Plant", "pl", SchemaVersion::new(1, 0, 0));
        let mut pump = ClassDef::new("Pump", ClassKind::Entity);
        pump.properties.push(PropertyDef::primitive("Flow", PrimitiveType::Double));
        graph.add_class(pump);
        graph.enumerations.push(Enumeration {
            name: "Color".into(),
            display_label: None,
            description: None,
            backing: EnumBacking::Int,
            strict: true,
            enumerators: vec![
                Enumerator {
                    name: "Red".into(),
                    value: EnumValue::Int(1),
                    display_label: None,
                },
                Enumerator {
                    name: "Blue".into(),
                    value: EnumValue::Int(2),
                    display_label: None,
                },
            ],
        });
        graph
    }

    #[test]
    fn test_identical_graphs_produce_empty_diff() {
        let graph = base_graph();
        let diff = SchemaDiffEngine.diff(&graph, &graph.clone());
        assert!(diff.is_empty());
        assert!(diff.is_label_only());
    }

    #[test]
    fn test_label_change_is_label_only() {
        let old = base_graph();
        let mut new = old.clone();
        new.class_mut(ClassId(0)).display_label = Some("Centrifugal pump".into());
        let diff = SchemaDiffEngine.diff(&old, &new);
        assert!(!diff.is_empty());
        assert!(diff.is_label_only());
    }

    #[test]
    fn test_property_added_and_type_changed() {
        let old = base_graph();
        let mut new = old.clone();
        new.version = SchemaVersion::new(1, 0, 1);
        let pump = new.class_mut(ClassId(0));
        pump.properties[0] = PropertyDef::primitive("Flow", PrimitiveType::Int);
        pump.properties.push(PropertyDef::primitive("Head", PrimitiveType::Double));

        let diff = SchemaDiffEngine.diff(&old, &new);
        let class = diff.class("Pump").unwrap();
        assert_eq!(class.state, ChangeState::Modified);
        let flow = class.delta.property("Flow").unwrap();
        assert_eq!(
            flow.delta.primitive_type,
            Some(ValueChange {
                old: Some(PrimitiveType::Double),
                new: Some(PrimitiveType::Int)
            })
        );
        assert_eq!(class.delta.property("Head").unwrap().state, ChangeState::Added);
        assert!(!diff.is_label_only());
    }

    #[test]
    fn test_enumerator_rename_matched_by_value() {
        let old = base_graph();
        let mut new = old.clone();
        new.enumerations[0].enumerators[0].name = "Crimson".into();

        let diff = SchemaDiffEngine.diff(&old, &new);
        let enumerators = &diff.enumerations[0].delta.enumerators;
        assert_eq!(enumerators.len(), 1);
        assert_eq!(enumerators[0].name, "Red");
        assert_eq!(enumerators[0].state, ChangeState::Modified);
        assert_eq!(
            enumerators[0].delta.name,
            Some(ValueChange {
                old: "Red".to_string(),
                new: "Crimson".to_string()
            })
        );
    }

    #[test]
    fn test_base_class_reorder_reported_as_moved() {
        let moves = diff_base_classes(
            &["A".to_string(), "B".to_string()],
            &["B".to_string(), "A".to_string()],
        );
        assert!(moves.iter().all(|m| m.state == BaseClassState::Moved));
        assert_eq!(moves.len(), 2);

        let appended = diff_base_classes(&["A".to_string()], &["A".to_string(), "M".to_string()]);
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].state, BaseClassState::Added);
        assert_eq!(appended[0].new_position, Some(1));
    }

    #[test]
    fn test_attribute_property_change() {
        let mut old = base_graph();
        old.class_mut(ClassId(0)).custom_attributes.push(
            CustomAttribute::new(attributes::CLASS_MAP).with(attributes::MAP_STRATEGY, "OwnTable"),
        );
        let mut new = old.clone();
        new.class_mut(ClassId(0)).custom_attributes[0] = CustomAttribute::new(attributes::CLASS_MAP)
            .with(attributes::MAP_STRATEGY, "TablePerHierarchy");

        let diff = SchemaDiffEngine.diff(&old, &new);
        let attrs = &diff.class("Pump").unwrap().delta.custom_attributes;
        assert_eq!(attrs[0].name, attributes::CLASS_MAP);
        let change = attrs[0].delta.property(attributes::MAP_STRATEGY).unwrap();
        assert_eq!(change.new.as_deref(), Some("TablePerHierarchy"));
    }

    #[test]
    fn test_created_marks_everything_added() {
        let graph = base_graph();
        let created = SchemaChange::created(&graph);
        assert!(created.classes.iter().all(|c| c.state == ChangeState::Added));
        assert_eq!(created.summary().added, 2);
        assert!(created.version.is_none());
    }

    #[test]
    fn test_diff_is_deterministic() {
        let old = base_graph();
        let mut new = old.clone();
        new.class_mut(ClassId(0)).modifier = ClassModifier::Sealed;
        new.add_class(ClassDef::new("Valve", ClassKind::Entity));
        let a = serde_json::to_string(&SchemaDiffEngine.diff(&old, &new)).unwrap();
        let b = serde_json::to_string(&SchemaDiffEngine.diff(&old, &new)).unwrap();
        assert_eq!(a, b);
    }
}
