//! ChangeValidator: the rule table
//!
//! Every node of the change tree is visited and every violation is
//! collected. Acceptance is conjunctive:
//! - any `Never` violation rejects the revision
//! - `MajorUpgrade` violations reject it unless the major version
//!   increased, and under `disallow_major_schema_upgrade` they turn into
//!   a version error even then

use std::collections::BTreeSet;
use tracing::debug;

use super::context::{NoInstances, ValidatedChange, ValidationContext};
use super::rules::{self, RejectedChanges, RuleGate, RuleViolation};
use crate::diff::{
    AttributeDelta, BaseClassState, ChangeState, ClassDelta, Delta, ElementChange,
    EnumerationDelta, PropertyDelta, SchemaChange,
};
use crate::graph::{attributes, ClassId, ClassKind, ClassModifier, SchemaGraph};
use crate::import::{ImportError, ImportResult};
use crate::mapping::{ColumnConstraints, MapStrategy, PhysicalLayout};
use crate::version::VersionDelta;

/// Validates change trees against the persisted state.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeValidator;

impl ChangeValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates a revision and wraps it for allocation.
    ///
    /// # Errors
    ///
    /// - `ImportError::Version` when the triple is unchanged for a
    ///   structural diff, or Major-gated changes meet the disallow policy
    /// - `ImportError::StructuralChangeRejected` with every blocking
    ///   violation otherwise
    pub fn validate(
        &self,
        diff: SchemaChange,
        ctx: &ValidationContext<'_>,
    ) -> ImportResult<ValidatedChange> {
        if ctx.version.is_unchanged() && !diff.is_label_only() {
            return Err(ImportError::Version(format!(
                "{}: schema '{}' changed structurally but version {} was not incremented",
                rules::VERSION_NOT_INCREMENTED,
                diff.name,
                ctx.version.new
            )));
        }

        let violations = self.collect(&diff, ctx);
        let major = ctx.version.major_upgraded();
        let blocking: Vec<RuleViolation> = violations
            .iter()
            .filter(|v| v.gate == RuleGate::Never || !major)
            .cloned()
            .collect();
        if !blocking.is_empty() {
            return Err(ImportError::StructuralChangeRejected(RejectedChanges {
                violations: blocking,
            }));
        }

        if !violations.is_empty() && ctx.options.disallow_major_schema_upgrade {
            return Err(ImportError::Version(format!(
                "major schema upgrade disallowed: {}",
                RejectedChanges { violations }
            )));
        }

        Ok(ValidatedChange::new(diff, ctx.version))
    }

    /// Validates the first import of a schema: everything is new, so only
    /// catalog-wide rules apply.
    pub fn validate_initial(
        &self,
        graph: &SchemaGraph,
        foreign_aliases: Vec<String>,
    ) -> ImportResult<ValidatedChange> {
        let mut empty = SchemaGraph::new(graph.name.clone(), graph.alias.clone(), graph.version);
        empty.dialect = graph.dialect;
        let layout = PhysicalLayout::new();
        let ctx = ValidationContext::new(
            &empty,
            graph,
            &layout,
            VersionDelta::initial(graph),
            &NoInstances,
        )
        .with_foreign_aliases(foreign_aliases);
        self.validate(SchemaChange::created(graph), &ctx)
    }

    /// Runs every rule and returns all violations, gated ones included.
    pub fn collect(&self, diff: &SchemaChange, ctx: &ValidationContext<'_>) -> Vec<RuleViolation> {
        let mut walk = Walk {
            ctx,
            out: Vec::new(),
        };
        walk.schema(diff);
        for class in &diff.classes {
            walk.class(class);
        }
        for enumeration in &diff.enumerations {
            walk.enumeration(enumeration);
        }
        walk.units(diff);

        for v in &walk.out {
            debug!(rule = v.rule, path = %v.path, gate = ?v.gate, "rule violated");
        }
        walk.out
    }
}

struct Walk<'c, 'a> {
    ctx: &'c ValidationContext<'a>,
    out: Vec<RuleViolation>,
}

impl Walk<'_, '_> {
    fn never(&mut self, path: impl Into<String>, rule: &'static str, detail: impl Into<String>) {
        self.push(path.into(), rule, RuleGate::Never, detail.into());
    }

    fn gated(&mut self, path: impl Into<String>, rule: &'static str, detail: impl Into<String>) {
        self.push(path.into(), rule, RuleGate::MajorUpgrade, detail.into());
    }

    fn push(&mut self, path: String, rule: &'static str, gate: RuleGate, detail: String) {
        self.out.push(RuleViolation {
            path,
            rule,
            gate,
            detail,
        });
    }

    // =========================================================================
    // Schema
    // =========================================================================

    fn schema(&mut self, diff: &SchemaChange) {
        if let Some(alias) = &diff.alias {
            if !alias.old.is_empty() {
                self.never(
                    &diff.name,
                    rules::ALIAS_CHANGED,
                    format!("alias changed from '{}' to '{}'", alias.old, alias.new),
                );
            }
        }

        let ctx = self.ctx;
        let alias = &ctx.new.alias;
        if !alias.is_empty() && ctx.foreign_aliases.iter().any(|a| a.eq_ignore_ascii_case(alias)) {
            self.never(
                &diff.name,
                rules::ALIAS_IN_USE,
                format!("alias '{}' is used by another schema", alias),
            );
        }

        for reference in &diff.references {
            if let Some(version) = &reference.delta.version {
                if version.new < version.old {
                    self.never(
                        format!("{}->{}", diff.name, reference.name),
                        rules::REFERENCE_DOWNGRADED,
                        format!("reference downgraded from {} to {}", version.old, version.new),
                    );
                }
            }
        }

        if !self.ctx.layout.class_maps.is_empty() {
            self.mapping_attributes(&diff.name, &diff.custom_attributes);
        }
    }

    /// Mapping-defining attributes are fixed once the container is mapped.
    fn mapping_attributes(&mut self, owner: &str, changes: &[ElementChange<AttributeDelta>]) {
        for ca in changes
            .iter()
            .filter(|c| attributes::is_mapping_defining(&c.name))
        {
            let path = format!("{}[{}]", owner, ca.name);
            match ca.state {
                ChangeState::Added => self.never(
                    path,
                    rules::MAPPING_ATTRIBUTE_ADDED,
                    "mapping attributes may only be declared when the element is created",
                ),
                ChangeState::Deleted => self.never(
                    path,
                    rules::MAPPING_ATTRIBUTE_REMOVED,
                    "mapping attribute removed from a mapped element",
                ),
                ChangeState::Modified => {
                    let threshold_only = ca.name == attributes::SHARE_COLUMNS
                        && ca
                            .delta
                            .properties
                            .keys()
                            .all(|k| k == attributes::MAX_SHARED_COLUMNS_BEFORE_OVERFLOW);
                    if threshold_only {
                        self.gated(
                            path,
                            rules::OVERFLOW_THRESHOLD_CHANGED,
                            "shared column overflow threshold changed",
                        );
                    } else {
                        let keys: Vec<&str> =
                            ca.delta.properties.keys().map(String::as_str).collect();
                        self.never(
                            path,
                            rules::MAPPING_ATTRIBUTE_CHANGED,
                            format!("mapping attribute properties changed: {}", keys.join(", ")),
                        );
                    }
                }
            }
        }
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn class(&mut self, change: &ElementChange<ClassDelta>) {
        match change.state {
            ChangeState::Added => {}
            ChangeState::Deleted => self.deleted_class(&change.name),
            ChangeState::Modified => self.modified_class(&change.name, &change.delta),
        }
    }

    fn deleted_class(&mut self, name: &str) {
        let old = self.ctx.old;
        let new = self.ctx.new;
        let Some(id) = old.class_id(name) else {
            return;
        };
        let before = self.out.len();

        match old.class(id).kind {
            ClassKind::Struct => {
                let surviving: Vec<String> = old
                    .struct_usages(id)
                    .into_iter()
                    .filter(|usage| {
                        usage.split_once('.').map_or(false, |(class, prop)| {
                            new.class_by_name(class)
                                .map_or(false, |c| c.property(prop).is_some())
                        })
                    })
                    .collect();
                if !surviving.is_empty() {
                    self.never(
                        name,
                        rules::STRUCT_IN_USE_DELETED,
                        format!("struct still used by {}", surviving.join(", ")),
                    );
                }
            }
            ClassKind::CustomAttribute => {
                if new.attribute_in_use(name) {
                    self.never(
                        name,
                        rules::CUSTOM_ATTRIBUTE_IN_USE_DELETED,
                        "custom attribute class is still applied",
                    );
                }
            }
            ClassKind::Entity | ClassKind::Relationship(_) => {}
        }

        let relationships: Vec<&str> = old
            .constraint_usages(id)
            .into_iter()
            .filter(|rel| *rel != id)
            .map(|rel| old.class_name(rel))
            .filter(|rel| new.class_id(rel).is_some())
            .collect();
        if !relationships.is_empty() {
            self.never(
                name,
                rules::CONSTRAINT_CLASS_DELETED,
                format!("class is constrained by {}", relationships.join(", ")),
            );
        }

        let subclasses: Vec<&str> = old
            .derived_classes(id)
            .into_iter()
            .map(|sub| old.class_name(sub))
            .filter(|sub| new.class_id(sub).is_some())
            .collect();
        if !subclasses.is_empty() {
            self.never(
                name,
                rules::CLASS_WITH_SUBCLASSES_DELETED,
                format!("subclasses {} survive", subclasses.join(", ")),
            );
        }

        if self.out.len() == before {
            self.gated(name, rules::CLASS_DELETED, "class deleted");
        }
    }

    fn modified_class(&mut self, name: &str, delta: &ClassDelta) {
        let (Some(old_id), Some(new_id)) = (self.ctx.old.class_id(name), self.ctx.new.class_id(name))
        else {
            return;
        };

        if let Some(kind) = &delta.kind {
            self.never(
                name,
                rules::CLASS_KIND_CHANGED,
                format!("class kind changed from {} to {}", kind.old, kind.new),
            );
        }

        if let Some(modifier) = &delta.modifier {
            self.modifier(name, new_id, modifier.old, modifier.new);
        }

        if !delta.base_classes.is_empty() {
            self.base_classes(name, old_id, new_id, delta);
        }

        if let Some(rel) = &delta.relationship {
            if let Some(strength) = &rel.strength {
                self.never(
                    name,
                    rules::RELATIONSHIP_STRENGTH_CHANGED,
                    format!("strength changed from {:?} to {:?}", strength.old, strength.new),
                );
            }
            if let Some(direction) = &rel.direction {
                self.never(
                    name,
                    rules::RELATIONSHIP_DIRECTION_CHANGED,
                    format!(
                        "strength direction changed from {:?} to {:?}",
                        direction.old, direction.new
                    ),
                );
            }
            for (end, constraint) in [("Source", &rel.source), ("Target", &rel.target)] {
                let path = format!("{}.{}", name, end);
                if let Some(m) = &constraint.multiplicity {
                    self.never(
                        &path,
                        rules::CONSTRAINT_MULTIPLICITY_CHANGED,
                        format!("multiplicity changed from {} to {}", m.old, m.new),
                    );
                }
                if constraint.polymorphic.is_some() {
                    self.never(
                        &path,
                        rules::CONSTRAINT_POLYMORPHISM_CHANGED,
                        "polymorphic flag changed",
                    );
                }
                if let Some(classes) = &constraint.classes {
                    self.never(
                        &path,
                        rules::CONSTRAINT_CLASSES_CHANGED,
                        format!(
                            "constraint classes changed from [{}] to [{}]",
                            classes.old.join(", "),
                            classes.new.join(", ")
                        ),
                    );
                }
            }
        }

        if self.ctx.is_persisted(name) {
            self.mapping_attributes(name, &delta.custom_attributes);
        }

        for prop in &delta.properties {
            let path = format!("{}.{}", name, prop.name);
            match prop.state {
                ChangeState::Added => self.added_property(name, &prop.name, &path),
                ChangeState::Deleted => self.deleted_property(old_id, new_id, &prop.name, &path),
                ChangeState::Modified => self.modified_property(name, &prop.name, &prop.delta, &path),
            }
        }
    }

    fn modifier(&mut self, name: &str, new_id: ClassId, old: ClassModifier, new: ClassModifier) {
        let ctx = self.ctx;
        let has_instances = || ctx.instances.has_instances(name);
        match (old, new) {
            (ClassModifier::Abstract, _) => self.never(
                name,
                rules::MODIFIER_FROM_ABSTRACT,
                format!("modifier changed from Abstract to {}", new),
            ),
            (ClassModifier::Sealed, ClassModifier::Abstract) => self.never(
                name,
                rules::MODIFIER_TO_ABSTRACT,
                "modifier changed from Sealed to Abstract",
            ),
            (ClassModifier::None, ClassModifier::Sealed) => {
                if !ctx.new.derived_classes(new_id).is_empty() {
                    self.never(
                        name,
                        rules::SEALED_WITH_SUBCLASSES,
                        "class with subclasses cannot become Sealed",
                    );
                }
                if has_instances() {
                    self.never(
                        name,
                        rules::MODIFIER_WITH_INSTANCES,
                        "class has instances; cannot become Sealed",
                    );
                }
            }
            (ClassModifier::None, ClassModifier::Abstract) => {
                if has_instances() {
                    self.never(
                        name,
                        rules::MODIFIER_WITH_INSTANCES,
                        "class has instances; cannot become Abstract",
                    );
                }
            }
            _ => {}
        }
    }

    fn base_classes(&mut self, name: &str, old_id: ClassId, new_id: ClassId, delta: &ClassDelta) {
        let old = self.ctx.old;
        let new = self.ctx.new;

        let old_primary: Vec<&str> = old
            .class(old_id)
            .base_classes
            .iter()
            .filter(|b| !old.class(**b).is_mixin())
            .map(|b| old.class_name(*b))
            .collect();
        let new_primary: Vec<&str> = new
            .class(new_id)
            .base_classes
            .iter()
            .filter(|b| !new.class(**b).is_mixin())
            .map(|b| new.class_name(*b))
            .collect();
        if old_primary != new_primary {
            self.never(
                name,
                rules::BASE_CLASS_CHANGED,
                format!(
                    "base classes changed from [{}] to [{}]",
                    old_primary.join(", "),
                    new_primary.join(", ")
                ),
            );
        }

        for change in &delta.base_classes {
            match change.state {
                BaseClassState::Added => {
                    let Some(mixin) = new.class_id(&change.name) else {
                        continue;
                    };
                    if new.class(mixin).is_mixin() && !new.all_properties(mixin).is_empty() {
                        self.never(
                            name,
                            rules::MIXIN_WITH_PROPERTIES_ADDED,
                            format!("mixin '{}' declares properties", change.name),
                        );
                    }
                }
                BaseClassState::Deleted => {
                    let Some(mixin) = old.class_id(&change.name) else {
                        continue;
                    };
                    if !old.class(mixin).is_mixin() {
                        continue;
                    }
                    let used = old
                        .all_properties(mixin)
                        .iter()
                        .any(|(_, p)| self.ctx.layout.property_map(name, &p.name).is_some());
                    if used {
                        self.never(
                            name,
                            rules::MIXIN_IN_USE_REMOVED,
                            format!("mixin '{}' has mapped properties", change.name),
                        );
                    }
                }
                BaseClassState::Moved => {}
            }
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    fn added_property(&mut self, class: &str, prop: &str, path: &str) {
        // An override re-declared on an existing class reuses the base's column.
        let ctx = self.ctx;
        let Some(def) = ctx.new.class_by_name(class).and_then(|c| c.property(prop)) else {
            return;
        };
        if ColumnConstraints::read(def).is_constrained()
            && self.ctx.layout.property_map(class, prop).is_some()
        {
            self.never(
                path,
                rules::CONSTRAINT_ADDED_TO_MAPPED_PROPERTY,
                "column constraints cannot be added to an already mapped property",
            );
        }
    }

    fn deleted_property(&mut self, old_id: ClassId, new_id: ClassId, prop: &str, path: &str) {
        let old = self.ctx.old;
        let new = self.ctx.new;
        let layout = self.ctx.layout;

        if old.is_override(old_id, prop) && new.is_override(new_id, prop) {
            self.never(
                path,
                rules::OVERRIDDEN_PROPERTY_DELETED,
                "overriding property deleted while a base class still declares it",
            );
            return;
        }

        if matches!(old.class(old_id).kind, ClassKind::Struct) {
            self.deleted_struct_member(old_id, prop, path);
            return;
        }

        let owners = std::iter::once(old_id).chain(
            old.descendants(old_id)
                .into_iter()
                .filter(|d| old.class(*d).property(prop).is_none()),
        );
        for owner in owners {
            let owner_name = old.class_name(owner);
            let Some(mapping) = layout.class_map(owner_name) else {
                continue;
            };
            if mapping.strategy == MapStrategy::TablePerHierarchy {
                continue;
            }
            let kinds = layout.column_kinds(owner_name, prop);
            if kinds.iter().any(|k| !k.is_pooled()) {
                self.never(
                    path,
                    rules::PROPERTY_COLUMN_DROP,
                    format!(
                        "property owns a column of {} which cannot be dropped",
                        mapping.table.as_deref().unwrap_or(owner_name)
                    ),
                );
                return;
            }
        }
    }

    /// A struct member is stored in every class using the struct, possibly
    /// through nested structs. Its columns must be droppable in all of them.
    fn deleted_struct_member(&mut self, struct_id: ClassId, member: &str, path: &str) {
        let old = self.ctx.old;
        let layout = self.ctx.layout;

        for (user, access_path) in struct_member_paths(old, struct_id, member) {
            let nested = format!("{}.", access_path);
            let Some(property) = access_path.split('.').next() else {
                continue;
            };
            let users = std::iter::once(user).chain(old.descendants(user));
            for owner in users {
                let owner_name = old.class_name(owner);
                let Some(mapping) = layout.class_map(owner_name) else {
                    continue;
                };
                if mapping.strategy == MapStrategy::TablePerHierarchy {
                    continue;
                }
                let fixed = layout
                    .property_map(owner_name, property)
                    .into_iter()
                    .flat_map(|map| map.columns.iter())
                    .filter(|mc| mc.access_path == access_path || mc.access_path.starts_with(&nested))
                    .filter_map(|mc| layout.resolve_column(owner_name, &mc.access_path))
                    .find(|resolved| !resolved.kind().is_pooled());
                if let Some(resolved) = fixed {
                    self.never(
                        path,
                        rules::PROPERTY_COLUMN_DROP,
                        format!(
                            "struct member is stored in column {}.{} of {} which cannot be dropped",
                            resolved.table.name, resolved.column.name, owner_name
                        ),
                    );
                    return;
                }
            }
        }
    }

    fn modified_property(&mut self, class: &str, prop: &str, delta: &PropertyDelta, path: &str) {
        let ctx = self.ctx;
        let old_def = ctx.old.class_by_name(class).and_then(|c| c.property(prop));
        let new_def = ctx.new.class_by_name(class).and_then(|c| c.property(prop));
        let (Some(old_def), Some(new_def)) = (old_def, new_def) else {
            return;
        };

        if let Some(kind) = &delta.kind {
            self.never(
                path,
                rules::PROPERTY_KIND_CHANGED,
                format!("property kind changed from {} to {}", kind.old, kind.new),
            );
            return;
        }

        if let Some(t) = &delta.primitive_type {
            self.never(
                path,
                rules::PROPERTY_TYPE_CHANGED,
                format!("primitive type changed from {:?} to {:?}", t.old, t.new),
            );
        } else if let Some(e) = &delta.enumeration {
            if let Some(enum_name) = &e.new {
                let backing = self
                    .ctx
                    .new
                    .enumeration(enum_name)
                    .map(|en| en.backing.primitive());
                if backing.is_none() || backing != new_def.kind.primitive() {
                    self.never(
                        path,
                        rules::ENUMERATION_TYPE_MISMATCH,
                        format!(
                            "enumeration '{}' does not match the property's primitive type",
                            enum_name
                        ),
                    );
                }
            }
        }

        if let Some(s) = &delta.struct_class {
            self.never(
                path,
                rules::PROPERTY_TYPE_CHANGED,
                format!("struct type changed from {:?} to {:?}", s.old, s.new),
            );
        }
        if delta.bounds.is_some() {
            self.never(path, rules::ARRAY_BOUNDS_CHANGED, "array bounds changed");
        }
        if delta.navigation.is_some() {
            self.never(
                path,
                rules::NAVIGATION_CHANGED,
                "navigation relationship or direction changed",
            );
        }

        if let Some(koq) = &delta.kind_of_quantity {
            match (&koq.old, &koq.new) {
                (Some(old_koq), None) => self.never(
                    path,
                    rules::KIND_OF_QUANTITY_REMOVED,
                    format!("kind of quantity '{}' removed", old_koq),
                ),
                (Some(old_koq), Some(new_koq)) => {
                    let old_unit = self
                        .ctx
                        .old
                        .kind_of_quantity(old_koq)
                        .map(|k| k.persistence_unit.as_str());
                    let new_unit = self
                        .ctx
                        .new
                        .kind_of_quantity(new_koq)
                        .map(|k| k.persistence_unit.as_str());
                    if old_unit != new_unit {
                        self.never(
                            path,
                            rules::KIND_OF_QUANTITY_UNIT_CHANGED,
                            format!(
                                "persistence unit changed from {} to {}",
                                old_unit.unwrap_or("?"),
                                new_unit.unwrap_or("?")
                            ),
                        );
                    }
                }
                _ => {}
            }
        }

        for ca in &delta.custom_attributes {
            if ca.name == attributes::PROPERTY_MAP
                && self.ctx.layout.property_map(class, prop).is_some()
            {
                let before = ColumnConstraints::read(old_def);
                let after = ColumnConstraints::read(new_def);
                if (before.nullable && !after.nullable) || (!before.unique && after.unique) {
                    self.never(
                        path,
                        rules::CONSTRAINT_ADDED_TO_MAPPED_PROPERTY,
                        "column constraints cannot be added to an already mapped property",
                    );
                }
            }
            if ca.name == attributes::FOREIGN_KEY_CONSTRAINT && ca.state != ChangeState::Modified {
                self.never(
                    path,
                    rules::FOREIGN_KEY_KIND_CHANGED,
                    "navigation property switched between logical and physical foreign key",
                );
            }
        }
    }

    // =========================================================================
    // Enumerations
    // =========================================================================

    fn enumeration(&mut self, change: &ElementChange<EnumerationDelta>) {
        let name = &change.name;
        match change.state {
            ChangeState::Added => {}
            ChangeState::Deleted => {
                self.never(name, rules::ENUMERATION_DELETED, "enumeration deleted")
            }
            ChangeState::Modified => {
                let delta = &change.delta;
                if let Some(backing) = &delta.backing {
                    self.never(
                        name,
                        rules::ENUMERATION_TYPE_CHANGED,
                        format!("backing type changed from {:?} to {:?}", backing.old, backing.new),
                    );
                }
                if let Some(strict) = &delta.strict {
                    if !strict.old && strict.new {
                        self.never(
                            name,
                            rules::ENUMERATION_MADE_STRICT,
                            "non-strict enumeration made strict",
                        );
                    }
                }
                for e in &delta.enumerators {
                    let path = format!("{}.{}", name, e.name);
                    match e.state {
                        ChangeState::Added => {}
                        ChangeState::Deleted => {
                            self.never(path, rules::ENUMERATOR_DELETED, "enumerator deleted")
                        }
                        ChangeState::Modified => {
                            if let Some(value) = &e.delta.value {
                                self.never(
                                    &path,
                                    rules::ENUMERATOR_VALUE_CHANGED,
                                    format!("value changed from {} to {}", value.old, value.new),
                                );
                            }
                            if let Some(rename) = &e.delta.name {
                                if !self.ctx.crosses_legacy_threshold() {
                                    self.never(
                                        &path,
                                        rules::ENUMERATOR_RENAMED,
                                        format!(
                                            "renamed to '{}' outside the dialect {} upgrade",
                                            rename.new, self.ctx.legacy_dialect_threshold
                                        ),
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    // =========================================================================
    // Units and presentation metadata
    // =========================================================================

    fn units(&mut self, diff: &SchemaChange) {
        self.deletions(&diff.kinds_of_quantity, rules::KIND_OF_QUANTITY_DELETED);
        self.deletions(&diff.units, rules::UNIT_DELETED);
        self.deletions(&diff.phenomena, rules::PHENOMENON_DELETED);
        self.deletions(&diff.unit_systems, rules::UNIT_SYSTEM_DELETED);
        self.deletions(&diff.formats, rules::FORMAT_DELETED);
        self.deletions(&diff.categories, rules::CATEGORY_DELETED);

        for koq in modified(&diff.kinds_of_quantity) {
            if koq.delta.persistence_unit.is_some() || koq.delta.relative_error.is_some() {
                self.never(
                    &koq.name,
                    rules::KIND_OF_QUANTITY_CHANGED,
                    "persistence unit or relative error changed",
                );
            }
        }

        for unit in modified(&diff.units) {
            let d = &unit.delta;
            if d.unit_system.is_some() {
                self.never(&unit.name, rules::UNIT_SYSTEM_CHANGED, "unit system changed");
            }
            if d.phenomenon.is_some()
                || d.definition.is_some()
                || d.numerator.is_some()
                || d.denominator.is_some()
                || d.offset.is_some()
            {
                self.never(
                    &unit.name,
                    rules::UNIT_DEFINITION_CHANGED,
                    "unit definition changed",
                );
            }
        }

        for phenomenon in modified(&diff.phenomena) {
            if phenomenon.delta.definition.is_some() {
                self.never(
                    &phenomenon.name,
                    rules::PHENOMENON_DEFINITION_CHANGED,
                    "phenomenon definition changed",
                );
            }
        }
    }

    fn deletions<D: Delta>(&mut self, changes: &[ElementChange<D>], rule: &'static str) {
        for change in changes.iter().filter(|c| c.state == ChangeState::Deleted) {
            self.never(&change.name, rule, "deleted");
        }
    }
}

/// `(class, access path)` of every non-struct class storing `member` of
/// the struct, following struct-typed members outwards.
fn struct_member_paths(graph: &SchemaGraph, struct_id: ClassId, member: &str) -> Vec<(ClassId, String)> {
    let mut out = Vec::new();
    let mut pending = vec![(struct_id, member.to_string())];
    let mut visited = BTreeSet::new();
    let max_depth = graph.classes().count();
    while let Some((id, suffix)) = pending.pop() {
        if suffix.split('.').count() > max_depth || !visited.insert((id, suffix.clone())) {
            continue;
        }
        for usage in graph.struct_usages(id) {
            let Some((class, prop)) = usage.split_once('.') else {
                continue;
            };
            let Some(user) = graph.class_id(class) else {
                continue;
            };
            let access_path = format!("{}.{}", prop, suffix);
            if matches!(graph.class(user).kind, ClassKind::Struct) {
                pending.push((user, access_path));
            } else {
                out.push((user, access_path));
            }
        }
    }
    out
}

fn modified<D>(changes: &[ElementChange<D>]) -> impl Iterator<Item = &ElementChange<D>> {
    changes.iter().filter(|c| c.state == ChangeState::Modified)
}
