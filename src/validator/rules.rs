//! Rule names, gates and violations

use serde::Serialize;
use std::fmt;

/// When a rule's violation may still be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuleGate {
    /// Always rejected.
    Never,
    /// Accepted when the major version increased and the policy allows it.
    MajorUpgrade,
}

/// One rejected change node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleViolation {
    /// Offending element, e.g. `Pump`, `Pump.Flow`, `Color.Red`.
    pub path: String,
    pub rule: &'static str,
    pub gate: RuleGate,
    pub detail: String,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.rule, self.path, self.detail)
    }
}

/// All violations of a rejected revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectedChanges {
    pub violations: Vec<RuleViolation>,
}

impl RejectedChanges {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// True when some violation carries the given rule name.
    pub fn contains(&self, rule: &str) -> bool {
        self.violations.iter().any(|v| v.rule == rule)
    }

    /// True when some violation of `rule` is reported at `path`.
    pub fn contains_at(&self, rule: &str, path: &str) -> bool {
        self.violations.iter().any(|v| v.rule == rule && v.path == path)
    }

    pub fn rules(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.rule).collect()
    }
}

impl fmt::Display for RejectedChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

// Schema
pub const ALIAS_CHANGED: &str = "alias-changed";
pub const ALIAS_IN_USE: &str = "alias-in-use";
pub const REFERENCE_DOWNGRADED: &str = "reference-downgraded";
pub const VERSION_NOT_INCREMENTED: &str = "version-not-incremented";

// Class modifiers and hierarchy
pub const MODIFIER_FROM_ABSTRACT: &str = "modifier-from-abstract";
pub const MODIFIER_TO_ABSTRACT: &str = "modifier-to-abstract";
pub const SEALED_WITH_SUBCLASSES: &str = "sealed-with-subclasses";
pub const MODIFIER_WITH_INSTANCES: &str = "modifier-with-instances";
pub const CLASS_KIND_CHANGED: &str = "class-kind-changed";
pub const BASE_CLASS_CHANGED: &str = "base-class-changed";
pub const MIXIN_WITH_PROPERTIES_ADDED: &str = "mixin-with-properties-added";
pub const MIXIN_IN_USE_REMOVED: &str = "mixin-in-use-removed";

// Class deletion
pub const STRUCT_IN_USE_DELETED: &str = "struct-in-use-deleted";
pub const CUSTOM_ATTRIBUTE_IN_USE_DELETED: &str = "custom-attribute-in-use-deleted";
pub const CONSTRAINT_CLASS_DELETED: &str = "constraint-class-deleted";
pub const CLASS_WITH_SUBCLASSES_DELETED: &str = "class-with-subclasses-deleted";
pub const CLASS_DELETED: &str = "class-deleted";

// Properties
pub const PROPERTY_KIND_CHANGED: &str = "property-kind-changed";
pub const PROPERTY_TYPE_CHANGED: &str = "property-type-changed";
pub const ENUMERATION_TYPE_MISMATCH: &str = "enumeration-type-mismatch";
pub const ARRAY_BOUNDS_CHANGED: &str = "array-bounds-changed";
pub const NAVIGATION_CHANGED: &str = "navigation-changed";
pub const KIND_OF_QUANTITY_UNIT_CHANGED: &str = "kind-of-quantity-unit-changed";
pub const KIND_OF_QUANTITY_REMOVED: &str = "kind-of-quantity-removed";
pub const PROPERTY_COLUMN_DROP: &str = "property-column-drop";
pub const OVERRIDDEN_PROPERTY_DELETED: &str = "overridden-property-deleted";

// Custom attributes
pub const MAPPING_ATTRIBUTE_REMOVED: &str = "mapping-attribute-removed";
pub const MAPPING_ATTRIBUTE_ADDED: &str = "mapping-attribute-added";
pub const OVERFLOW_THRESHOLD_CHANGED: &str = "overflow-threshold-changed";
pub const MAPPING_ATTRIBUTE_CHANGED: &str = "mapping-attribute-changed";
pub const CONSTRAINT_ADDED_TO_MAPPED_PROPERTY: &str = "constraint-added-to-mapped-property";
pub const FOREIGN_KEY_KIND_CHANGED: &str = "foreign-key-kind-changed";

// Enumerations
pub const ENUMERATION_DELETED: &str = "enumeration-deleted";
pub const ENUMERATOR_DELETED: &str = "enumerator-deleted";
pub const ENUMERATOR_VALUE_CHANGED: &str = "enumerator-value-changed";
pub const ENUMERATOR_RENAMED: &str = "enumerator-renamed";
pub const ENUMERATION_TYPE_CHANGED: &str = "enumeration-type-changed";
pub const ENUMERATION_MADE_STRICT: &str = "enumeration-made-strict";

// Relationships
pub const RELATIONSHIP_STRENGTH_CHANGED: &str = "relationship-strength-changed";
pub const RELATIONSHIP_DIRECTION_CHANGED: &str = "relationship-direction-changed";
pub const CONSTRAINT_MULTIPLICITY_CHANGED: &str = "constraint-multiplicity-changed";
pub const CONSTRAINT_POLYMORPHISM_CHANGED: &str = "constraint-polymorphism-changed";
pub const CONSTRAINT_CLASSES_CHANGED: &str = "constraint-classes-changed";

// Units and presentation metadata
pub const KIND_OF_QUANTITY_DELETED: &str = "kind-of-quantity-deleted";
pub const UNIT_DELETED: &str = "unit-deleted";
pub const PHENOMENON_DELETED: &str = "phenomenon-deleted";
pub const UNIT_SYSTEM_DELETED: &str = "unit-system-deleted";
pub const FORMAT_DELETED: &str = "format-deleted";
pub const CATEGORY_DELETED: &str = "category-deleted";
pub const UNIT_DEFINITION_CHANGED: &str = "unit-definition-changed";
pub const PHENOMENON_DEFINITION_CHANGED: &str = "phenomenon-definition-changed";
pub const UNIT_SYSTEM_CHANGED: &str = "unit-system-changed";
pub const KIND_OF_QUANTITY_CHANGED: &str = "kind-of-quantity-changed";
