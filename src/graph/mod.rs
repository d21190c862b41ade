//! Schema graph: the shared data model
//!
//! Pure data plus structural queries. Nothing in this module mutates a
//! persisted schema; a graph is built once (by the document parser or by
//! the catalog) and then read.

mod schema_graph;
mod types;
mod version;

pub use schema_graph::{SchemaGraph, StructLeaf};
pub use types::{
    attributes, find_attribute, ArrayBounds, ClassDef, ClassId, ClassKind, ClassKindTag,
    ClassModifier, CustomAttribute, EnumBacking, EnumValue, Enumeration, Enumerator, Format,
    KindOfQuantity, Multiplicity, Phenomenon, PrimitiveType, PropertyCategory, PropertyDef,
    PropertyKind, PropertyKindTag, RelationshipConstraint, RelationshipSpec, SchemaReference,
    Strength, StrengthDirection, Unit, UnitSystem,
};
pub use version::{DialectVersion, SchemaVersion};
