//! In-memory schema graph
//!
//! Classes live in an arena addressed by `ClassId`. Base class and
//! constraint class lists store ids, never back-pointers; derived-class
//! queries are answered by scanning the arena.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::types::{
    attributes, find_attribute, ClassDef, ClassId, ClassKind, CustomAttribute, Enumeration,
    Format, KindOfQuantity, Phenomenon, PrimitiveType, PropertyCategory, PropertyDef, PropertyKind,
    SchemaReference, Unit, UnitSystem,
};
use super::version::{DialectVersion, SchemaVersion};

/// A complete schema: header plus every element it declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaGraph {
    pub name: String,
    pub alias: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub version: SchemaVersion,
    pub dialect: DialectVersion,
    pub references: Vec<SchemaReference>,
    pub custom_attributes: Vec<CustomAttribute>,
    classes: Vec<ClassDef>,
    pub enumerations: Vec<Enumeration>,
    pub kinds_of_quantity: Vec<KindOfQuantity>,
    pub units: Vec<Unit>,
    pub phenomena: Vec<Phenomenon>,
    pub unit_systems: Vec<UnitSystem>,
    pub formats: Vec<Format>,
    pub categories: Vec<PropertyCategory>,
}

/// A leaf primitive member of a struct-typed property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLeaf {
    /// Member names below the property, outermost first.
    pub path: Vec<String>,
    /// `None` for array members, which are stored as one opaque value.
    pub primitive: Option<PrimitiveType>,
}

impl SchemaGraph {
    pub fn new(name: impl Into<String>, alias: impl Into<String>, version: SchemaVersion) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            display_label: None,
            description: None,
            version,
            dialect: DialectVersion::default(),
            references: Vec::new(),
            custom_attributes: Vec::new(),
            classes: Vec::new(),
            enumerations: Vec::new(),
            kinds_of_quantity: Vec::new(),
            units: Vec::new(),
            phenomena: Vec::new(),
            unit_systems: Vec::new(),
            formats: Vec::new(),
            categories: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Arena access
    // ---------------------------------------------------------------------

    /// Appends a class and returns its id.
    pub fn add_class(&mut self, class: ClassDef) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(class);
        id
    }

    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.index()]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Iterates classes in declaration order.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDef)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId(i as u32), c))
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .position(|c| c.name == name)
            .map(|i| ClassId(i as u32))
    }

    pub fn class_by_name(&self, name: &str) -> Option<&ClassDef> {
        self.class_id(name).map(|id| self.class(id))
    }

    pub fn class_name(&self, id: ClassId) -> &str {
        &self.class(id).name
    }

    pub fn class_names(&self, ids: &[ClassId]) -> Vec<String> {
        ids.iter().map(|id| self.class_name(*id).to_string()).collect()
    }

    pub fn enumeration(&self, name: &str) -> Option<&Enumeration> {
        self.enumerations.iter().find(|e| e.name == name)
    }

    pub fn kind_of_quantity(&self, name: &str) -> Option<&KindOfQuantity> {
        self.kinds_of_quantity.iter().find(|k| k.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&CustomAttribute> {
        find_attribute(&self.custom_attributes, name)
    }

    /// Prefix used for table names: `SchemaMap.TablePrefix`, else alias,
    /// else schema name.
    pub fn table_prefix(&self) -> &str {
        if let Some(prefix) = self
            .attribute(attributes::SCHEMA_MAP)
            .and_then(|ca| ca.get(attributes::TABLE_PREFIX))
            .filter(|p| !p.is_empty())
        {
            return prefix;
        }
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }

    // ---------------------------------------------------------------------
    // Hierarchy queries
    // ---------------------------------------------------------------------

    /// First base class that is not a mixin; it owns the mapping lineage.
    pub fn primary_base(&self, id: ClassId) -> Option<ClassId> {
        self.class(id)
            .base_classes
            .iter()
            .copied()
            .find(|b| !self.class(*b).is_mixin())
    }

    /// Direct subclasses in declaration order.
    pub fn derived_classes(&self, id: ClassId) -> Vec<ClassId> {
        self.classes()
            .filter(|(_, c)| c.base_classes.contains(&id))
            .map(|(cid, _)| cid)
            .collect()
    }

    /// All transitive subclasses, each listed once.
    pub fn descendants(&self, id: ClassId) -> Vec<ClassId> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        let mut stack = self.derived_classes(id);
        while let Some(next) = stack.pop() {
            if seen.insert(next) {
                out.push(next);
                stack.extend(self.derived_classes(next));
            }
        }
        out
    }

    /// All transitive base classes, base-most first.
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        self.collect_ancestors(id, &mut seen, &mut out);
        out
    }

    fn collect_ancestors(&self, id: ClassId, seen: &mut BTreeSet<ClassId>, out: &mut Vec<ClassId>) {
        for base in &self.class(id).base_classes {
            if seen.insert(*base) {
                self.collect_ancestors(*base, seen, out);
                out.push(*base);
            }
        }
    }

    pub fn is_subclass_of(&self, id: ClassId, base: ClassId) -> bool {
        self.ancestors(id).contains(&base)
    }

    /// Classes ordered so that every base class precedes its subclasses.
    pub fn topological_order(&self) -> Vec<ClassId> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(self.classes.len());
        for (id, _) in self.classes() {
            for ancestor in self.ancestors(id) {
                if seen.insert(ancestor) {
                    out.push(ancestor);
                }
            }
            if seen.insert(id) {
                out.push(id);
            }
        }
        out
    }

    /// Properties visible on a class: inherited ones first (base-most
    /// first), then the class's own. A re-declared property keeps the
    /// inherited position but resolves to the most derived declaration.
    pub fn all_properties(&self, id: ClassId) -> Vec<(ClassId, &PropertyDef)> {
        let mut out: Vec<(ClassId, &PropertyDef)> = Vec::new();
        let mut lineage = self.ancestors(id);
        lineage.push(id);
        for owner in lineage {
            for prop in &self.class(owner).properties {
                match out.iter_mut().find(|(_, p)| p.name == prop.name) {
                    Some(slot) => *slot = (owner, prop),
                    None => out.push((owner, prop)),
                }
            }
        }
        out
    }

    /// Finds a visible property with the class that declares it.
    pub fn find_property(&self, id: ClassId, name: &str) -> Option<(ClassId, &PropertyDef)> {
        self.all_properties(id).into_iter().find(|(_, p)| p.name == name)
    }

    /// True when a base class of `id` also declares `name`.
    pub fn is_override(&self, id: ClassId, name: &str) -> bool {
        self.ancestors(id)
            .into_iter()
            .any(|a| self.class(a).property(name).is_some())
    }

    // ---------------------------------------------------------------------
    // Usage queries
    // ---------------------------------------------------------------------

    /// Properties (as `Class.Property`) whose type is the given struct.
    pub fn struct_usages(&self, struct_class: ClassId) -> Vec<String> {
        let mut out = Vec::new();
        for (_, class) in self.classes() {
            for prop in &class.properties {
                if prop.kind.struct_class() == Some(struct_class) {
                    out.push(format!("{}.{}", class.name, prop.name));
                }
            }
        }
        out
    }

    /// Relationships naming the class in a source or target constraint.
    pub fn constraint_usages(&self, class: ClassId) -> Vec<ClassId> {
        self.classes()
            .filter(|(_, c)| {
                c.relationship().map_or(false, |rel| {
                    rel.source.classes.contains(&class) || rel.target.classes.contains(&class)
                })
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// True when any container in the schema carries an instance of the
    /// named attribute class.
    pub fn attribute_in_use(&self, attribute_class: &str) -> bool {
        if self.attribute(attribute_class).is_some() {
            return true;
        }
        self.classes.iter().any(|c| {
            c.attribute(attribute_class).is_some()
                || c.properties.iter().any(|p| p.attribute(attribute_class).is_some())
        })
    }

    /// Navigation properties (as `Class.Property`) backed by a relationship.
    pub fn navigation_usages(&self, relationship: ClassId) -> Vec<String> {
        let mut out = Vec::new();
        for (_, class) in self.classes() {
            for prop in &class.properties {
                if let PropertyKind::Navigation { relationship: rel, .. } = prop.kind {
                    if rel == relationship {
                        out.push(format!("{}.{}", class.name, prop.name));
                    }
                }
            }
        }
        out
    }

    /// Expands a struct class into its primitive leaves.
    pub fn struct_leaves(&self, struct_class: ClassId) -> Vec<StructLeaf> {
        let mut out = Vec::new();
        let mut visiting = BTreeSet::new();
        self.collect_leaves(struct_class, &mut Vec::new(), &mut visiting, &mut out);
        out
    }

    fn collect_leaves(
        &self,
        struct_class: ClassId,
        prefix: &mut Vec<String>,
        visiting: &mut BTreeSet<ClassId>,
        out: &mut Vec<StructLeaf>,
    ) {
        if !visiting.insert(struct_class) {
            return;
        }
        for (_, member) in self.all_properties(struct_class) {
            prefix.push(member.name.clone());
            match &member.kind {
                PropertyKind::Primitive { primitive, .. } => out.push(StructLeaf {
                    path: prefix.clone(),
                    primitive: Some(*primitive),
                }),
                PropertyKind::Struct { struct_class: nested } => {
                    self.collect_leaves(*nested, prefix, visiting, out)
                }
                PropertyKind::PrimitiveArray { .. }
                | PropertyKind::StructArray { .. }
                | PropertyKind::Navigation { .. } => out.push(StructLeaf {
                    path: prefix.clone(),
                    primitive: None,
                }),
            }
            prefix.pop();
        }
        visiting.remove(&struct_class);
    }

    /// True when the class is an entity (mapped to rows).
    pub fn is_entity(&self, id: ClassId) -> bool {
        matches!(self.class(id).kind, ClassKind::Entity)
    }
}
