//! Document parser: `SchemaDocument` → `SchemaGraph`
//!
//! Resolves every by-name class reference to an arena id, checks that
//! referenced elements exist and generates enumerator names for legacy
//! dialect documents.

use std::collections::{BTreeSet, HashMap};

use super::errors::{ParseError, ParseResult};
use super::format::{
    ClassDocument, ClassKindDocument, ConstraintDocument, EnumerationDocument, PropertyDocument,
    PropertyKindDocument, SchemaDocument,
};
use crate::graph::{
    attributes, ArrayBounds, ClassDef, ClassId, ClassKind, ClassModifier, CustomAttribute,
    DialectVersion, EnumBacking, EnumValue, Enumeration, Enumerator, Multiplicity, PrimitiveType,
    PropertyDef, PropertyKind, RelationshipConstraint, RelationshipSpec, SchemaGraph,
};

/// Turns schema text into a graph.
pub trait DocumentParser {
    fn parse(&self, text: &str) -> ParseResult<SchemaGraph>;
}

/// Parser for the JSON document format.
#[derive(Debug, Clone)]
pub struct JsonDocumentParser {
    /// Documents older than this dialect carry no enumerator names.
    named_enumerators_since: DialectVersion,
}

impl Default for JsonDocumentParser {
    fn default() -> Self {
        Self::new(DialectVersion::NAMED_ENUMERATORS)
    }
}

impl DocumentParser for JsonDocumentParser {
    fn parse(&self, text: &str) -> ParseResult<SchemaGraph> {
        let document: SchemaDocument = serde_json::from_str(text)?;
        self.build(document)
    }
}

impl JsonDocumentParser {
    pub fn new(named_enumerators_since: DialectVersion) -> Self {
        Self {
            named_enumerators_since,
        }
    }

    /// Parses an already deserialized JSON value.
    pub fn parse_value(&self, value: serde_json::Value) -> ParseResult<SchemaGraph> {
        let document: SchemaDocument = serde_json::from_value(value)?;
        self.build(document)
    }

    /// Builds a graph from a deserialized document.
    pub fn build(&self, doc: SchemaDocument) -> ParseResult<SchemaGraph> {
        ensure_unique("class", doc.classes.iter().map(|c| c.name.as_str()))?;
        ensure_unique("enumeration", doc.enumerations.iter().map(|e| e.name.as_str()))?;
        ensure_unique("kind of quantity", doc.kinds_of_quantity.iter().map(|k| k.name.as_str()))?;
        ensure_unique("unit", doc.units.iter().map(|u| u.name.as_str()))?;
        ensure_unique("phenomenon", doc.phenomena.iter().map(|p| p.name.as_str()))?;
        ensure_unique("unit system", doc.unit_systems.iter().map(|u| u.name.as_str()))?;
        ensure_unique("format", doc.formats.iter().map(|f| f.name.as_str()))?;
        ensure_unique("category", doc.categories.iter().map(|c| c.name.as_str()))?;

        let mut graph = SchemaGraph::new(doc.name.clone(), doc.alias.clone(), doc.version);
        graph.dialect = doc.dialect;
        graph.display_label = doc.label.clone();
        graph.description = doc.description.clone();
        graph.references = doc.references.clone();
        graph.custom_attributes = doc.custom_attributes.clone();

        let legacy = doc.dialect < self.named_enumerators_since;
        for enumeration in &doc.enumerations {
            graph.enumerations.push(build_enumeration(enumeration, legacy)?);
        }
        graph.kinds_of_quantity = doc.kinds_of_quantity.clone();
        graph.units = doc.units.clone();
        graph.phenomena = doc.phenomena.clone();
        graph.unit_systems = doc.unit_systems.clone();
        graph.formats = doc.formats.clone();
        graph.categories = doc.categories.clone();

        let resolver = Resolver::new(&doc);
        for class_doc in &doc.classes {
            let class = resolver.build_class(class_doc)?;
            graph.add_class(class);
        }

        check_inheritance(&graph)?;
        Ok(graph)
    }
}

struct Resolver<'a> {
    doc: &'a SchemaDocument,
    ids: HashMap<&'a str, ClassId>,
}

impl<'a> Resolver<'a> {
    fn new(doc: &'a SchemaDocument) -> Self {
        let ids = doc
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.as_str(), ClassId(i as u32)))
            .collect();
        Self { doc, ids }
    }

    fn class_id(&self, name: &str, referenced_from: impl FnOnce() -> String) -> ParseResult<ClassId> {
        self.ids.get(name).copied().ok_or_else(|| ParseError::UnknownClass {
            name: name.to_string(),
            referenced_from: referenced_from(),
        })
    }

    fn kind_of(&self, id: ClassId) -> ClassKindDocument {
        self.doc.classes[id.index()].kind
    }

    fn build_class(&self, class_doc: &ClassDocument) -> ParseResult<ClassDef> {
        let kind = match (class_doc.kind, &class_doc.relationship) {
            (ClassKindDocument::Entity, None) => ClassKind::Entity,
            (ClassKindDocument::Struct, None) => ClassKind::Struct,
            (ClassKindDocument::CustomAttribute, None) => ClassKind::CustomAttribute,
            (ClassKindDocument::Relationship, Some(rel)) => ClassKind::Relationship(RelationshipSpec {
                strength: rel.strength,
                direction: rel.direction,
                source: self.build_constraint(&class_doc.name, "source", &rel.source)?,
                target: self.build_constraint(&class_doc.name, "target", &rel.target)?,
            }),
            (ClassKindDocument::Relationship, None) => {
                return Err(ParseError::InvalidClass {
                    class: class_doc.name.clone(),
                    reason: "relationship class without source/target constraints".into(),
                })
            }
            (_, Some(_)) => {
                return Err(ParseError::InvalidClass {
                    class: class_doc.name.clone(),
                    reason: "only relationship classes may declare constraints".into(),
                })
            }
        };

        let mut class = ClassDef::new(class_doc.name.clone(), kind);
        class.modifier = class_doc.modifier;
        class.display_label = class_doc.label.clone();
        class.description = class_doc.description.clone();
        class.custom_attributes = class_doc.custom_attributes.clone();

        if class_doc.mixin {
            if class_doc.kind != ClassKindDocument::Entity {
                return Err(ParseError::InvalidClass {
                    class: class_doc.name.clone(),
                    reason: "only entity classes can be mixins".into(),
                });
            }
            class.modifier = ClassModifier::Abstract;
            if class.attribute(attributes::IS_MIXIN).is_none() {
                class
                    .custom_attributes
                    .push(CustomAttribute::new(attributes::IS_MIXIN));
            }
        }

        for base in &class_doc.base_classes {
            let id = self.class_id(base, || format!("{} base classes", class_doc.name))?;
            if class.base_classes.contains(&id) {
                return Err(ParseError::InvalidClass {
                    class: class_doc.name.clone(),
                    reason: format!("base class '{}' listed twice", base),
                });
            }
            class.base_classes.push(id);
        }

        for prop_doc in &class_doc.properties {
            if class.property(&prop_doc.name).is_some() {
                return Err(ParseError::DuplicateName {
                    kind: "property",
                    name: format!("{}.{}", class_doc.name, prop_doc.name),
                });
            }
            class.properties.push(self.build_property(&class_doc.name, prop_doc)?);
        }

        Ok(class)
    }

    fn build_constraint(
        &self,
        class: &str,
        end: &str,
        doc: &ConstraintDocument,
    ) -> ParseResult<RelationshipConstraint> {
        let mut classes = Vec::with_capacity(doc.classes.len());
        for name in &doc.classes {
            classes.push(self.class_id(name, || format!("{} {} constraint", class, end))?);
        }
        Ok(RelationshipConstraint {
            multiplicity: parse_multiplicity(&doc.multiplicity)?,
            polymorphic: doc.polymorphic,
            role_label: doc.role_label.clone(),
            classes,
        })
    }

    fn build_property(&self, class: &str, doc: &PropertyDocument) -> ParseResult<PropertyDef> {
        let path = format!("{}.{}", class, doc.name);
        let bounds = ArrayBounds {
            min: doc.min_occurs.unwrap_or(0),
            max: doc.max_occurs,
        };

        let kind = match doc.kind {
            PropertyKindDocument::Primitive => {
                let (primitive, enumeration) = self.resolve_primitive(&path, doc)?;
                PropertyKind::Primitive {
                    primitive,
                    enumeration,
                }
            }
            PropertyKindDocument::PrimitiveArray => {
                let (primitive, enumeration) = self.resolve_primitive(&path, doc)?;
                PropertyKind::PrimitiveArray {
                    primitive,
                    enumeration,
                    bounds,
                }
            }
            PropertyKindDocument::Struct => PropertyKind::Struct {
                struct_class: self.resolve_struct(&path, doc)?,
            },
            PropertyKindDocument::StructArray => PropertyKind::StructArray {
                struct_class: self.resolve_struct(&path, doc)?,
                bounds,
            },
            PropertyKindDocument::Navigation => {
                let name = doc.relationship.as_deref().ok_or_else(|| ParseError::InvalidProperty {
                    property: path.clone(),
                    reason: "navigation property without relationship".into(),
                })?;
                let relationship = self.class_id(name, || path.clone())?;
                if self.kind_of(relationship) != ClassKindDocument::Relationship {
                    return Err(ParseError::InvalidProperty {
                        property: path,
                        reason: format!("'{}' is not a relationship class", name),
                    });
                }
                PropertyKind::Navigation {
                    relationship,
                    direction: doc.direction.unwrap_or_default(),
                }
            }
        };

        let mut prop = PropertyDef::new(doc.name.clone(), kind);
        prop.display_label = doc.label.clone();
        prop.description = doc.description.clone();
        prop.extended_type = doc.extended_type.clone();
        prop.read_only = doc.read_only;
        prop.priority = doc.priority;
        prop.category = doc.category.clone();
        prop.kind_of_quantity = doc.kind_of_quantity.clone();
        prop.min_value = doc.min_value;
        prop.max_value = doc.max_value;
        prop.min_length = doc.min_length;
        prop.max_length = doc.max_length;
        prop.custom_attributes = doc.custom_attributes.clone();
        Ok(prop)
    }

    fn resolve_primitive(
        &self,
        path: &str,
        doc: &PropertyDocument,
    ) -> ParseResult<(PrimitiveType, Option<String>)> {
        let type_name = doc.type_name.as_deref().unwrap_or("string");
        if let Some(enumeration) = self.doc.enumerations.iter().find(|e| e.name == type_name) {
            return Ok((enumeration.backing.primitive(), Some(enumeration.name.clone())));
        }
        PrimitiveType::parse(type_name)
            .map(|p| (p, None))
            .ok_or_else(|| ParseError::UnknownType {
                property: path.to_string(),
                type_name: type_name.to_string(),
            })
    }

    fn resolve_struct(&self, path: &str, doc: &PropertyDocument) -> ParseResult<ClassId> {
        let type_name = doc.type_name.as_deref().ok_or_else(|| ParseError::InvalidProperty {
            property: path.to_string(),
            reason: "struct property without type".into(),
        })?;
        let id = self.class_id(type_name, || path.to_string())?;
        if self.kind_of(id) != ClassKindDocument::Struct {
            return Err(ParseError::InvalidProperty {
                property: path.to_string(),
                reason: format!("'{}' is not a struct class", type_name),
            });
        }
        Ok(id)
    }
}

fn build_enumeration(doc: &EnumerationDocument, legacy: bool) -> ParseResult<Enumeration> {
    let invalid = |reason: String| ParseError::InvalidEnumeration {
        enumeration: doc.name.clone(),
        reason,
    };

    let mut names = BTreeSet::new();
    let mut values = BTreeSet::new();
    let mut enumerators = Vec::with_capacity(doc.enumerators.len());
    for e in &doc.enumerators {
        let matches_backing = matches!(
            (&e.value, doc.backing),
            (EnumValue::Int(_), EnumBacking::Int) | (EnumValue::Str(_), EnumBacking::String)
        );
        if !matches_backing {
            return Err(invalid(format!("value '{}' does not match the backing type", e.value)));
        }

        let name = if legacy {
            Enumerator::legacy_name(&doc.name, &e.value)
        } else {
            e.name
                .clone()
                .ok_or_else(|| invalid(format!("enumerator '{}' has no name", e.value)))?
        };

        if !names.insert(name.clone()) {
            return Err(invalid(format!("duplicate enumerator name '{}'", name)));
        }
        if !values.insert(e.value.to_string()) {
            return Err(invalid(format!("duplicate enumerator value '{}'", e.value)));
        }
        enumerators.push(Enumerator {
            name,
            value: e.value.clone(),
            display_label: e.label.clone(),
        });
    }

    Ok(Enumeration {
        name: doc.name.clone(),
        display_label: doc.label.clone(),
        description: doc.description.clone(),
        backing: doc.backing,
        strict: doc.strict,
        enumerators,
    })
}

/// Parses `(0..1)`, `(1..*)`, `0..N`.
pub fn parse_multiplicity(text: &str) -> ParseResult<Multiplicity> {
    let trimmed = text.trim().trim_start_matches('(').trim_end_matches(')');
    let (lower, upper) = trimmed
        .split_once("..")
        .ok_or_else(|| ParseError::InvalidMultiplicity(text.to_string()))?;
    let lower = lower
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidMultiplicity(text.to_string()))?;
    let upper = match upper.trim() {
        "*" | "N" | "n" => None,
        digits => Some(
            digits
                .parse::<u32>()
                .map_err(|_| ParseError::InvalidMultiplicity(text.to_string()))?,
        ),
    };
    if matches!(upper, Some(u) if u < lower || u == 0) {
        return Err(ParseError::InvalidMultiplicity(text.to_string()));
    }
    Ok(Multiplicity { lower, upper })
}

fn ensure_unique<'a>(kind: &'static str, names: impl Iterator<Item = &'a str>) -> ParseResult<()> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ParseError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn check_inheritance(graph: &SchemaGraph) -> ParseResult<()> {
    for (id, class) in graph.classes() {
        let mut stack: Vec<ClassId> = class.base_classes.clone();
        let mut seen = BTreeSet::new();
        while let Some(next) = stack.pop() {
            if next == id {
                return Err(ParseError::InheritanceCycle(class.name.clone()));
            }
            if seen.insert(next) {
                stack.extend(graph.class(next).base_classes.iter().copied());
            }
        }
        for base in &class.base_classes {
            if graph.class(*base).kind.tag() != class.kind.tag() {
                return Err(ParseError::InvalidClass {
                    class: class.name.clone(),
                    reason: format!(
                        "base class '{}' is a {} class",
                        graph.class_name(*base),
                        graph.class(*base).kind.tag()
                    ),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ParseResult<SchemaGraph> {
        JsonDocumentParser::default().parse_value(value)
    }

    #[test]
    fn test_parse_minimal_document() {
        let graph = parse(json!({
            "name": "Plant", "alias": "pl", "version": "1.0.0",
            "classes": [
                { "name": "Pump", "modifier": "sealed",
                  "properties": [ { "name": "Flow", "type": "double" } ] }
            ]
        }))
        .unwrap();
        let pump = graph.class_by_name("Pump").unwrap();
        assert_eq!(pump.modifier, ClassModifier::Sealed);
        assert_eq!(pump.properties[0].kind.primitive(), Some(PrimitiveType::Double));
    }

    #[test]
    fn test_enumeration_typed_property_resolves_backing_type() {
        let graph = parse(json!({
            "name": "S", "alias": "s", "version": "1.0.0",
            "enumerations": [ { "name": "Color", "type": "int",
                "enumerators": [ { "name": "Red", "value": 1 } ] } ],
            "classes": [ { "name": "Car", "properties": [ { "name": "Paint", "type": "Color" } ] } ]
        }))
        .unwrap();
        let prop = &graph.class_by_name("Car").unwrap().properties[0];
        assert_eq!(prop.kind.primitive(), Some(PrimitiveType::Int));
        assert_eq!(prop.kind.enumeration(), Some("Color"));
    }

    #[test]
    fn test_legacy_dialect_generates_enumerator_names() {
        let graph = parse(json!({
            "name": "S", "alias": "s", "version": "1.0.0", "dialect": "3.1",
            "enumerations": [ { "name": "Color", "type": "int",
                "enumerators": [ { "value": 1 }, { "name": "Ignored", "value": 2 } ] } ]
        }))
        .unwrap();
        let names: Vec<_> = graph.enumerations[0]
            .enumerators
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Color1", "Color2"]);
    }

    #[test]
    fn test_current_dialect_requires_enumerator_names() {
        let err = parse(json!({
            "name": "S", "alias": "s", "version": "1.0.0", "dialect": "3.2",
            "enumerations": [ { "name": "Color", "type": "int", "enumerators": [ { "value": 1 } ] } ]
        }))
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidEnumeration { .. }));
    }

    #[test]
    fn test_unknown_base_class_rejected() {
        let err = parse(json!({
            "name": "S", "alias": "s", "version": "1.0.0",
            "classes": [ { "name": "A", "baseClasses": ["Missing"] } ]
        }))
        .unwrap_err();
        assert!(matches!(err, ParseError::UnknownClass { .. }));
    }

    #[test]
    fn test_inheritance_cycle_rejected() {
        let err = parse(json!({
            "name": "S", "alias": "s", "version": "1.0.0",
            "classes": [
                { "name": "A", "baseClasses": ["B"] },
                { "name": "B", "baseClasses": ["A"] }
            ]
        }))
        .unwrap_err();
        assert!(matches!(err, ParseError::InheritanceCycle(_)));
    }

    #[test]
    fn test_relationship_and_navigation() {
        let graph = parse(json!({
            "name": "S", "alias": "s", "version": "1.0.0",
            "classes": [
                { "name": "Parent" },
                { "name": "Child", "properties": [
                    { "name": "Owner", "kind": "navigation", "relationship": "ParentOwnsChild",
                      "direction": "backward" } ] },
                { "name": "ParentOwnsChild", "kind": "relationship", "modifier": "sealed",
                  "relationship": { "strength": "embedding",
                    "source": { "multiplicity": "(0..1)", "classes": ["Parent"] },
                    "target": { "multiplicity": "(0..*)", "classes": ["Child"] } } }
            ]
        }))
        .unwrap();
        let rel_id = graph.class_id("ParentOwnsChild").unwrap();
        assert_eq!(graph.navigation_usages(rel_id), vec!["Child.Owner".to_string()]);
        let rel = graph.class(rel_id).relationship().unwrap();
        assert!(rel.source.multiplicity.is_at_most_one());
        assert_eq!(rel.target.multiplicity, Multiplicity::ZERO_MANY);
    }

    #[test]
    fn test_parse_multiplicity_forms() {
        assert_eq!(parse_multiplicity("(0..1)").unwrap(), Multiplicity::ZERO_ONE);
        assert_eq!(parse_multiplicity("1..N").unwrap(), Multiplicity { lower: 1, upper: None });
        assert!(parse_multiplicity("(2..1)").is_err());
        assert!(parse_multiplicity("many").is_err());
    }

    #[test]
    fn test_mixin_shorthand_adds_marker() {
        let graph = parse(json!({
            "name": "S", "alias": "s", "version": "1.0.0",
            "classes": [ { "name": "IMarker", "mixin": true } ]
        }))
        .unwrap();
        assert!(graph.class_by_name("IMarker").unwrap().is_mixin());
    }
}
