//! Schema element definitions
//!
//! Classes and properties are tagged variants: the kind-specific payload
//! lives inside the kind enum so that code matching on a kind is checked
//! for exhaustiveness by the compiler.
//!
//! Cross references between classes are `ClassId` indices into the owning
//! graph's class arena. Everything else (enumerations, kinds of quantity,
//! categories, units) is referenced by name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Index of a class inside its `SchemaGraph` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Custom attribute names with structural meaning.
pub mod attributes {
    /// Selects the map strategy of a class.
    pub const CLASS_MAP: &str = "ClassMap";
    /// Enables shared column pools for a class hierarchy.
    pub const SHARE_COLUMNS: &str = "ShareColumns";
    /// Splits a table-per-hierarchy table at each direct subclass.
    pub const JOINED_TABLE_PER_DIRECT_SUBCLASS: &str = "JoinedTablePerDirectSubclass";
    /// Schema level table prefix.
    pub const SCHEMA_MAP: &str = "SchemaMap";
    /// Column constraints of a property (nullability, uniqueness).
    pub const PROPERTY_MAP: &str = "PropertyMap";
    /// Turns a navigation property into a physical foreign key.
    pub const FOREIGN_KEY_CONSTRAINT: &str = "ForeignKeyConstraint";
    /// Marks an abstract entity class as a mixin.
    pub const IS_MIXIN: &str = "IsMixin";

    pub const MAP_STRATEGY: &str = "MapStrategy";
    pub const TABLE_NAME: &str = "TableName";
    pub const TABLE_PREFIX: &str = "TablePrefix";
    pub const MAX_SHARED_COLUMNS_BEFORE_OVERFLOW: &str = "MaxSharedColumnsBeforeOverflow";
    pub const APPLY_TO_SUBCLASSES_ONLY: &str = "ApplyToSubclassesOnly";
    pub const IS_NULLABLE: &str = "IsNullable";
    pub const IS_UNIQUE: &str = "IsUnique";

    /// Attributes that decide how a class is laid out in tables.
    pub fn is_mapping_defining(name: &str) -> bool {
        matches!(
            name,
            CLASS_MAP | SHARE_COLUMNS | JOINED_TABLE_PER_DIRECT_SUBCLASS | SCHEMA_MAP
        )
    }
}

/// A custom attribute instance attached to a schema, class or property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAttribute {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl CustomAttribute {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Reads a boolean property; absent means `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
    }
}

/// Finds an attribute by class name in a container's attribute list.
pub fn find_attribute<'a>(attrs: &'a [CustomAttribute], name: &str) -> Option<&'a CustomAttribute> {
    attrs.iter().find(|ca| ca.class_name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassModifier {
    #[default]
    None,
    Abstract,
    Sealed,
}

impl fmt::Display for ClassModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClassModifier::None => "None",
            ClassModifier::Abstract => "Abstract",
            ClassModifier::Sealed => "Sealed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Referencing,
    Holding,
    Embedding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthDirection {
    #[default]
    Forward,
    Backward,
}

/// Multiplicity `(lower..upper)`; `upper == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplicity {
    pub lower: u32,
    pub upper: Option<u32>,
}

impl Multiplicity {
    pub const ZERO_ONE: Multiplicity = Multiplicity { lower: 0, upper: Some(1) };
    pub const ZERO_MANY: Multiplicity = Multiplicity { lower: 0, upper: None };

    pub fn is_at_most_one(&self) -> bool {
        self.upper == Some(1)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "({}..{})", self.lower, upper),
            None => write!(f, "({}..*)", self.lower),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipConstraint {
    pub multiplicity: Multiplicity,
    pub polymorphic: bool,
    pub role_label: String,
    /// Ordered constraint classes.
    pub classes: Vec<ClassId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSpec {
    pub strength: Strength,
    pub direction: StrengthDirection,
    pub source: RelationshipConstraint,
    pub target: RelationshipConstraint,
}

/// Class kind with its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Entity,
    Struct,
    CustomAttribute,
    Relationship(RelationshipSpec),
}

impl ClassKind {
    pub fn tag(&self) -> ClassKindTag {
        match self {
            ClassKind::Entity => ClassKindTag::Entity,
            ClassKind::Struct => ClassKindTag::Struct,
            ClassKind::CustomAttribute => ClassKindTag::CustomAttribute,
            ClassKind::Relationship(_) => ClassKindTag::Relationship,
        }
    }
}

/// Payload-free class kind, used for comparisons and diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKindTag {
    Entity,
    Struct,
    CustomAttribute,
    Relationship,
}

impl fmt::Display for ClassKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub modifier: ClassModifier,
    pub kind: ClassKind,
    /// Ordered base classes; the first non-mixin base decides mapping.
    pub base_classes: Vec<ClassId>,
    pub properties: Vec<PropertyDef>,
    pub custom_attributes: Vec<CustomAttribute>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            display_label: None,
            description: None,
            modifier: ClassModifier::None,
            kind,
            base_classes: Vec::new(),
            properties: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&CustomAttribute> {
        find_attribute(&self.custom_attributes, name)
    }

    pub fn is_mixin(&self) -> bool {
        matches!(self.kind, ClassKind::Entity)
            && self.modifier == ClassModifier::Abstract
            && self.attribute(attributes::IS_MIXIN).is_some()
    }

    pub fn relationship(&self) -> Option<&RelationshipSpec> {
        match &self.kind {
            ClassKind::Relationship(spec) => Some(spec),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Binary,
    Boolean,
    DateTime,
    Double,
    Int,
    Long,
    Point2d,
    Point3d,
    String,
    Geometry,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Binary => "binary",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::DateTime => "dateTime",
            PrimitiveType::Double => "double",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Point2d => "point2d",
            PrimitiveType::Point3d => "point3d",
            PrimitiveType::String => "string",
            PrimitiveType::Geometry => "geometry",
        }
    }

    /// Parses a document type name; case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        let t = match name.to_ascii_lowercase().as_str() {
            "binary" => PrimitiveType::Binary,
            "boolean" | "bool" => PrimitiveType::Boolean,
            "datetime" => PrimitiveType::DateTime,
            "double" => PrimitiveType::Double,
            "int" => PrimitiveType::Int,
            "long" => PrimitiveType::Long,
            "point2d" => PrimitiveType::Point2d,
            "point3d" => PrimitiveType::Point3d,
            "string" => PrimitiveType::String,
            "geometry" | "bentley.geometry.common.igeometry" => PrimitiveType::Geometry,
            _ => return None,
        };
        Some(t)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Array occurrence bounds; `max == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArrayBounds {
    pub min: u32,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    Primitive {
        primitive: PrimitiveType,
        enumeration: Option<String>,
    },
    PrimitiveArray {
        primitive: PrimitiveType,
        enumeration: Option<String>,
        bounds: ArrayBounds,
    },
    Struct {
        struct_class: ClassId,
    },
    StructArray {
        struct_class: ClassId,
        bounds: ArrayBounds,
    },
    Navigation {
        relationship: ClassId,
        direction: StrengthDirection,
    },
}

impl PropertyKind {
    pub fn tag(&self) -> PropertyKindTag {
        match self {
            PropertyKind::Primitive { .. } => PropertyKindTag::Primitive,
            PropertyKind::PrimitiveArray { .. } => PropertyKindTag::PrimitiveArray,
            PropertyKind::Struct { .. } => PropertyKindTag::Struct,
            PropertyKind::StructArray { .. } => PropertyKindTag::StructArray,
            PropertyKind::Navigation { .. } => PropertyKindTag::Navigation,
        }
    }

    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            PropertyKind::Primitive { primitive, .. }
            | PropertyKind::PrimitiveArray { primitive, .. } => Some(*primitive),
            _ => None,
        }
    }

    pub fn enumeration(&self) -> Option<&str> {
        match self {
            PropertyKind::Primitive { enumeration, .. }
            | PropertyKind::PrimitiveArray { enumeration, .. } => enumeration.as_deref(),
            _ => None,
        }
    }

    pub fn struct_class(&self) -> Option<ClassId> {
        match self {
            PropertyKind::Struct { struct_class } | PropertyKind::StructArray { struct_class, .. } => {
                Some(*struct_class)
            }
            _ => None,
        }
    }

    pub fn bounds(&self) -> Option<ArrayBounds> {
        match self {
            PropertyKind::PrimitiveArray { bounds, .. } | PropertyKind::StructArray { bounds, .. } => {
                Some(*bounds)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKindTag {
    Primitive,
    PrimitiveArray,
    Struct,
    StructArray,
    Navigation,
}

impl PropertyKindTag {
    pub fn is_array(&self) -> bool {
        matches!(self, PropertyKindTag::PrimitiveArray | PropertyKindTag::StructArray)
    }
}

impl fmt::Display for PropertyKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub kind: PropertyKind,
    pub extended_type: Option<String>,
    pub read_only: bool,
    pub priority: i32,
    pub category: Option<String>,
    pub kind_of_quantity: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub custom_attributes: Vec<CustomAttribute>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            display_label: None,
            description: None,
            kind,
            extended_type: None,
            read_only: false,
            priority: 0,
            category: None,
            kind_of_quantity: None,
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            custom_attributes: Vec::new(),
        }
    }

    pub fn primitive(name: impl Into<String>, primitive: PrimitiveType) -> Self {
        Self::new(
            name,
            PropertyKind::Primitive {
                primitive,
                enumeration: None,
            },
        )
    }

    pub fn attribute(&self, name: &str) -> Option<&CustomAttribute> {
        find_attribute(&self.custom_attributes, name)
    }

    pub fn is_physical_foreign_key(&self) -> bool {
        matches!(self.kind, PropertyKind::Navigation { .. })
            && self.attribute(attributes::FOREIGN_KEY_CONSTRAINT).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumBacking {
    Int,
    String,
}

impl EnumBacking {
    pub fn primitive(&self) -> PrimitiveType {
        match self {
            EnumBacking::Int => PrimitiveType::Int,
            EnumBacking::String => PrimitiveType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Int(i64),
    Str(String),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Int(v) => write!(f, "{}", v),
            EnumValue::Str(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    pub value: EnumValue,
    pub display_label: Option<String>,
}

impl Enumerator {
    /// Name given to an enumerator declared in a dialect without
    /// enumerator names.
    pub fn legacy_name(enumeration: &str, value: &EnumValue) -> String {
        match value {
            EnumValue::Int(v) => format!("{}{}", enumeration, v),
            EnumValue::Str(v) => v
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumeration {
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub backing: EnumBacking,
    pub strict: bool,
    pub enumerators: Vec<Enumerator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindOfQuantity {
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub persistence_unit: String,
    #[serde(default)]
    pub relative_error: f64,
    #[serde(default)]
    pub presentation_formats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub phenomenon: String,
    pub unit_system: String,
    pub definition: String,
    #[serde(default = "unit_factor")]
    pub numerator: f64,
    #[serde(default = "unit_factor")]
    pub denominator: f64,
    #[serde(default)]
    pub offset: f64,
}

fn unit_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phenomenon {
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSystem {
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub format_type: String,
    pub precision: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCategory {
    pub name: String,
    pub display_label: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReference {
    pub name: String,
    pub version: super::SchemaVersion,
}
