//! JSON schema document format
//!
//! Documents reference classes, enumerations and quantities by name.
//! Optional fields default so that small documents stay small:
//!
//! ```json
//! {
//!   "name": "Plant", "alias": "pl", "version": "1.0.0", "dialect": "3.2",
//!   "classes": [
//!     { "name": "Pump", "modifier": "sealed",
//!       "properties": [ { "name": "Flow", "type": "double" } ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::graph::{
    ClassModifier, CustomAttribute, DialectVersion, EnumBacking, EnumValue, Format, KindOfQuantity,
    Phenomenon, PropertyCategory, SchemaReference, SchemaVersion, Strength, StrengthDirection,
    Unit, UnitSystem,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub name: String,
    #[serde(default)]
    pub alias: String,
    pub version: SchemaVersion,
    #[serde(default)]
    pub dialect: DialectVersion,
    pub label: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub references: Vec<SchemaReference>,
    #[serde(default)]
    pub custom_attributes: Vec<CustomAttribute>,
    #[serde(default)]
    pub classes: Vec<ClassDocument>,
    #[serde(default)]
    pub enumerations: Vec<EnumerationDocument>,
    #[serde(default)]
    pub kinds_of_quantity: Vec<KindOfQuantity>,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub phenomena: Vec<Phenomenon>,
    #[serde(default)]
    pub unit_systems: Vec<UnitSystem>,
    #[serde(default)]
    pub formats: Vec<Format>,
    #[serde(default)]
    pub categories: Vec<PropertyCategory>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassKindDocument {
    #[default]
    Entity,
    Struct,
    CustomAttribute,
    Relationship,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDocument {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKindDocument,
    #[serde(default)]
    pub modifier: ClassModifier,
    /// Shorthand for an abstract entity carrying `IsMixin`.
    #[serde(default)]
    pub mixin: bool,
    pub label: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub base_classes: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDocument>,
    #[serde(default)]
    pub custom_attributes: Vec<CustomAttribute>,
    pub relationship: Option<RelationshipDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDocument {
    pub strength: Strength,
    #[serde(default)]
    pub direction: StrengthDirection,
    pub source: ConstraintDocument,
    pub target: ConstraintDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintDocument {
    /// `"(0..1)"`, `"(1..*)"`, `"0..N"`.
    pub multiplicity: String,
    #[serde(default = "default_true")]
    pub polymorphic: bool,
    #[serde(default)]
    pub role_label: String,
    #[serde(default)]
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKindDocument {
    #[default]
    Primitive,
    PrimitiveArray,
    Struct,
    StructArray,
    Navigation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDocument {
    pub name: String,
    #[serde(default)]
    pub kind: PropertyKindDocument,
    /// Primitive type name, enumeration name or struct class name.
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub min_occurs: Option<u32>,
    pub max_occurs: Option<u32>,
    pub relationship: Option<String>,
    pub direction: Option<StrengthDirection>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub extended_type: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub priority: i32,
    pub category: Option<String>,
    pub kind_of_quantity: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    #[serde(default)]
    pub custom_attributes: Vec<CustomAttribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumerationDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub backing: EnumBacking,
    #[serde(default = "default_true")]
    pub strict: bool,
    pub label: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub enumerators: Vec<EnumeratorDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumeratorDocument {
    /// Ignored in legacy dialect documents, required otherwise.
    pub name: Option<String>,
    pub value: EnumValue,
    pub label: Option<String>,
}

fn default_true() -> bool {
    true
}
