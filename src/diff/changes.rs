//! Typed change tree
//!
//! Every node is either a `ValueChange` (old/new pair of a scalar field) or
//! an `ElementChange` (a named element that was added, deleted or
//! modified). Unchanged fields are `None`; unchanged elements are absent.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::graph::{
    ArrayBounds, ClassKindTag, ClassModifier, DialectVersion, EnumBacking, EnumValue,
    Multiplicity, PrimitiveType, PropertyKindTag, SchemaVersion, Strength, StrengthDirection,
};

/// Old and new value of a field that differs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueChange<T> {
    pub old: T,
    pub new: T,
}

impl<T: PartialEq + Clone> ValueChange<T> {
    /// `Some` only when the values differ.
    pub fn between(old: &T, new: &T) -> Option<Self> {
        if old == new {
            None
        } else {
            Some(Self {
                old: old.clone(),
                new: new.clone(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeState {
    Added,
    Deleted,
    Modified,
}

/// A named element whose presence or content changed.
///
/// For `Added` and `Deleted` the delta is empty; consumers read the
/// element itself from the new or old graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementChange<D> {
    pub name: String,
    pub state: ChangeState,
    pub delta: D,
}

impl<D: Delta> ElementChange<D> {
    pub fn added(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ChangeState::Added,
            delta: D::default(),
        }
    }

    pub fn deleted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ChangeState::Deleted,
            delta: D::default(),
        }
    }

    fn is_cosmetic(&self) -> bool {
        self.state == ChangeState::Modified && self.delta.is_cosmetic()
    }
}

/// Common behaviour of change payloads.
pub trait Delta: Default {
    fn is_empty(&self) -> bool;

    /// True when nothing but display labels or descriptions changed.
    fn is_cosmetic(&self) -> bool;

    /// Adds the element changes below this node to `summary`.
    fn tally(&self, _summary: &mut ChangeSummary) {}
}

fn all_cosmetic<D: Delta>(changes: &[ElementChange<D>]) -> bool {
    changes.iter().all(ElementChange::is_cosmetic)
}

fn tally_all<D: Delta>(changes: &[ElementChange<D>], summary: &mut ChangeSummary) {
    for change in changes {
        match change.state {
            ChangeState::Added => summary.added += 1,
            ChangeState::Deleted => summary.deleted += 1,
            ChangeState::Modified => {
                summary.modified += 1;
                change.delta.tally(summary);
            }
        }
    }
}

/// Label and description of any element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_label: Option<ValueChange<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<ValueChange<Option<String>>>,
}

impl Delta for LabelDelta {
    fn is_empty(&self) -> bool {
        self.display_label.is_none() && self.description.is_none()
    }

    fn is_cosmetic(&self) -> bool {
        true
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Root of the change tree for one schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaChange {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<ValueChange<String>>,
    #[serde(flatten)]
    pub labels: LabelDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<ValueChange<SchemaVersion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<ValueChange<DialectVersion>>,
    pub references: Vec<ElementChange<ReferenceDelta>>,
    pub custom_attributes: Vec<ElementChange<AttributeDelta>>,
    pub classes: Vec<ElementChange<ClassDelta>>,
    pub enumerations: Vec<ElementChange<EnumerationDelta>>,
    pub kinds_of_quantity: Vec<ElementChange<KindOfQuantityDelta>>,
    pub units: Vec<ElementChange<UnitDelta>>,
    pub phenomena: Vec<ElementChange<PhenomenonDelta>>,
    pub unit_systems: Vec<ElementChange<LabelDelta>>,
    pub formats: Vec<ElementChange<FormatDelta>>,
    pub categories: Vec<ElementChange<CategoryDelta>>,
}

impl SchemaChange {
    /// True when the revision is identical to the persisted schema.
    pub fn is_empty(&self) -> bool {
        self.alias.is_none()
            && self.labels.is_empty()
            && self.version.is_none()
            && self.dialect.is_none()
            && self.references.is_empty()
            && self.custom_attributes.is_empty()
            && self.classes.is_empty()
            && self.enumerations.is_empty()
            && self.kinds_of_quantity.is_empty()
            && self.units.is_empty()
            && self.phenomena.is_empty()
            && self.unit_systems.is_empty()
            && self.formats.is_empty()
            && self.categories.is_empty()
    }

    /// True when the only differences are display labels and descriptions.
    /// The version and dialect must be unchanged as well.
    pub fn is_label_only(&self) -> bool {
        self.alias.is_none()
            && self.version.is_none()
            && self.dialect.is_none()
            && self.references.is_empty()
            && self.custom_attributes.is_empty()
            && all_cosmetic(&self.classes)
            && all_cosmetic(&self.enumerations)
            && all_cosmetic(&self.kinds_of_quantity)
            && all_cosmetic(&self.units)
            && all_cosmetic(&self.phenomena)
            && all_cosmetic(&self.unit_systems)
            && all_cosmetic(&self.formats)
            && all_cosmetic(&self.categories)
    }

    /// Counts element changes over the whole tree.
    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        tally_all(&self.references, &mut summary);
        tally_all(&self.custom_attributes, &mut summary);
        tally_all(&self.classes, &mut summary);
        tally_all(&self.enumerations, &mut summary);
        tally_all(&self.kinds_of_quantity, &mut summary);
        tally_all(&self.units, &mut summary);
        tally_all(&self.phenomena, &mut summary);
        tally_all(&self.unit_systems, &mut summary);
        tally_all(&self.formats, &mut summary);
        tally_all(&self.categories, &mut summary);
        summary
    }

    pub fn class(&self, name: &str) -> Option<&ElementChange<ClassDelta>> {
        self.classes.iter().find(|c| c.name == name)
    }
}

/// Element counts of a change tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub added: usize,
    pub deleted: usize,
    pub modified: usize,
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} deleted, {} modified",
            self.added, self.deleted, self.modified
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReferenceDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<ValueChange<SchemaVersion>>,
}

impl Delta for ReferenceDelta {
    fn is_empty(&self) -> bool {
        self.version.is_none()
    }

    fn is_cosmetic(&self) -> bool {
        self.is_empty()
    }
}

/// Changes to one custom attribute instance, keyed by attribute class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeDelta {
    /// Attribute property name → old/new value (`None` = absent).
    pub properties: BTreeMap<String, ValueChange<Option<String>>>,
}

impl AttributeDelta {
    pub fn property(&self, name: &str) -> Option<&ValueChange<Option<String>>> {
        self.properties.get(name)
    }
}

impl Delta for AttributeDelta {
    fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn is_cosmetic(&self) -> bool {
        self.is_empty()
    }
}

// =============================================================================
// Classes
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassDelta {
    #[serde(flatten)]
    pub labels: LabelDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ValueChange<ClassKindTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<ValueChange<ClassModifier>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub base_classes: Vec<BaseClassChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipDelta>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<ElementChange<PropertyDelta>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_attributes: Vec<ElementChange<AttributeDelta>>,
}

impl ClassDelta {
    pub fn property(&self, name: &str) -> Option<&ElementChange<PropertyDelta>> {
        self.properties.iter().find(|p| p.name == name)
    }
}

impl Delta for ClassDelta {
    fn is_empty(&self) -> bool {
        self.labels.is_empty()
            && self.kind.is_none()
            && self.modifier.is_none()
            && self.base_classes.is_empty()
            && self.relationship.is_none()
            && self.properties.is_empty()
            && self.custom_attributes.is_empty()
    }

    fn is_cosmetic(&self) -> bool {
        self.kind.is_none()
            && self.modifier.is_none()
            && self.base_classes.is_empty()
            && self.relationship.as_ref().map_or(true, RelationshipDelta::is_cosmetic)
            && self.custom_attributes.is_empty()
            && all_cosmetic(&self.properties)
    }

    fn tally(&self, summary: &mut ChangeSummary) {
        tally_all(&self.properties, summary);
        tally_all(&self.custom_attributes, summary);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BaseClassState {
    Added,
    Deleted,
    Moved,
}

/// One entry of the ordered base class list diff, matched by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseClassChange {
    pub name: String,
    pub state: BaseClassState,
    pub old_position: Option<usize>,
    pub new_position: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelationshipDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<ValueChange<Strength>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<ValueChange<StrengthDirection>>,
    pub source: ConstraintDelta,
    pub target: ConstraintDelta,
}

impl RelationshipDelta {
    pub fn is_empty(&self) -> bool {
        self.strength.is_none()
            && self.direction.is_none()
            && self.source.is_empty()
            && self.target.is_empty()
    }

    pub fn is_cosmetic(&self) -> bool {
        self.strength.is_none()
            && self.direction.is_none()
            && self.source.is_cosmetic()
            && self.target.is_cosmetic()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConstraintDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplicity: Option<ValueChange<Multiplicity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polymorphic: Option<ValueChange<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_label: Option<ValueChange<String>>,
    /// Constraint class names in declaration order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<ValueChange<Vec<String>>>,
}

impl ConstraintDelta {
    pub fn is_empty(&self) -> bool {
        self.role_label.is_none() && self.is_cosmetic()
    }

    /// Role labels are display text.
    pub fn is_cosmetic(&self) -> bool {
        self.multiplicity.is_none() && self.polymorphic.is_none() && self.classes.is_none()
    }
}

// =============================================================================
// Properties
// =============================================================================

/// Relationship and direction of a navigation property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    pub relationship: String,
    pub direction: StrengthDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyDelta {
    #[serde(flatten)]
    pub labels: LabelDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ValueChange<PropertyKindTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primitive_type: Option<ValueChange<Option<PrimitiveType>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<ValueChange<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub struct_class: Option<ValueChange<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<ValueChange<Option<ArrayBounds>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<ValueChange<Option<NavigationTarget>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_type: Option<ValueChange<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<ValueChange<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<ValueChange<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ValueChange<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind_of_quantity: Option<ValueChange<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<ValueChange<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<ValueChange<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<ValueChange<Option<u32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<ValueChange<Option<u32>>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_attributes: Vec<ElementChange<AttributeDelta>>,
}

impl Delta for PropertyDelta {
    fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.is_cosmetic()
    }

    fn is_cosmetic(&self) -> bool {
        self.kind.is_none()
            && self.primitive_type.is_none()
            && self.enumeration.is_none()
            && self.struct_class.is_none()
            && self.bounds.is_none()
            && self.navigation.is_none()
            && self.extended_type.is_none()
            && self.read_only.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.kind_of_quantity.is_none()
            && self.min_value.is_none()
            && self.max_value.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.custom_attributes.is_empty()
    }

    fn tally(&self, summary: &mut ChangeSummary) {
        tally_all(&self.custom_attributes, summary);
    }
}

// =============================================================================
// Enumerations
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnumerationDelta {
    #[serde(flatten)]
    pub labels: LabelDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backing: Option<ValueChange<EnumBacking>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<ValueChange<bool>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enumerators: Vec<ElementChange<EnumeratorDelta>>,
}

impl Delta for EnumerationDelta {
    fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.is_cosmetic()
    }

    fn is_cosmetic(&self) -> bool {
        self.backing.is_none() && self.strict.is_none() && all_cosmetic(&self.enumerators)
    }

    fn tally(&self, summary: &mut ChangeSummary) {
        tally_all(&self.enumerators, summary);
    }
}

/// Enumerator change; the element name is the old name unless added.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnumeratorDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<ValueChange<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueChange<EnumValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_label: Option<ValueChange<Option<String>>>,
}

impl Delta for EnumeratorDelta {
    fn is_empty(&self) -> bool {
        self.display_label.is_none() && self.is_cosmetic()
    }

    fn is_cosmetic(&self) -> bool {
        self.name.is_none() && self.value.is_none()
    }
}

// =============================================================================
// Units and presentation metadata
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KindOfQuantityDelta {
    #[serde(flatten)]
    pub labels: LabelDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_unit: Option<ValueChange<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_error: Option<ValueChange<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_formats: Option<ValueChange<Vec<String>>>,
}

impl Delta for KindOfQuantityDelta {
    fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.is_cosmetic()
    }

    fn is_cosmetic(&self) -> bool {
        self.persistence_unit.is_none()
            && self.relative_error.is_none()
            && self.presentation_formats.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitDelta {
    #[serde(flatten)]
    pub labels: LabelDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phenomenon: Option<ValueChange<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_system: Option<ValueChange<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<ValueChange<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerator: Option<ValueChange<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denominator: Option<ValueChange<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<ValueChange<f64>>,
}

impl Delta for UnitDelta {
    fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.is_cosmetic()
    }

    fn is_cosmetic(&self) -> bool {
        self.phenomenon.is_none()
            && self.unit_system.is_none()
            && self.definition.is_none()
            && self.numerator.is_none()
            && self.denominator.is_none()
            && self.offset.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhenomenonDelta {
    #[serde(flatten)]
    pub labels: LabelDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<ValueChange<String>>,
}

impl Delta for PhenomenonDelta {
    fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.is_cosmetic()
    }

    fn is_cosmetic(&self) -> bool {
        self.definition.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormatDelta {
    #[serde(flatten)]
    pub labels: LabelDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_type: Option<ValueChange<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<ValueChange<Option<u32>>>,
}

impl Delta for FormatDelta {
    fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.is_cosmetic()
    }

    fn is_cosmetic(&self) -> bool {
        self.format_type.is_none() && self.precision.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryDelta {
    #[serde(flatten)]
    pub labels: LabelDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<ValueChange<i32>>,
}

impl Delta for CategoryDelta {
    fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.is_cosmetic()
    }

    fn is_cosmetic(&self) -> bool {
        self.priority.is_none()
    }
}
