//! Class mapping and column allocation
//!
//! Turns a validated revision plus the persisted layout into the next
//! layout. The layout only ever grows:
//! - an issued `(class, property) → (table, column)` pair is carried
//!   forward unchanged
//! - deleting a property frees its pool slot but keeps the column; the
//!   slot is not handed out again within the revision that freed it
//! - pools grow monotonically, spilling into an overflow table once the
//!   configured threshold is reached

mod allocator;
mod directives;
mod errors;
mod types;

pub use allocator::ClassMapAllocator;
pub use directives::{ColumnConstraints, MapDirectives, ShareColumnsDirective};
pub use errors::MappingConflict;
pub use types::{
    ClassMapping, Column, ColumnKind, ColumnType, FreedColumn, MapFlags, MapStrategy,
    MappedColumn, PhysicalLayout, PropertyMap, ResolvedColumn, Table, TableInfo, TableKind,
};
