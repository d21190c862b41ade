//! Schema diff
//!
//! Pure comparison of two schema graphs. The diff knows nothing about
//! persistence or legality; the validator decides what a change means.

mod changes;
mod engine;

pub use changes::{
    AttributeDelta, BaseClassChange, BaseClassState, CategoryDelta, ChangeState, ChangeSummary,
    ClassDelta, ConstraintDelta, Delta, ElementChange, EnumerationDelta, EnumeratorDelta,
    FormatDelta, KindOfQuantityDelta, LabelDelta, NavigationTarget, PhenomenonDelta, PropertyDelta,
    ReferenceDelta, RelationshipDelta, SchemaChange, UnitDelta, ValueChange,
};
pub use engine::SchemaDiffEngine;
