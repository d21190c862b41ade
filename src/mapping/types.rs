//! Physical layout model
//!
//! Tables, columns, class mappings and property maps. Every element
//! carries a surrogate id drawn from the layout's monotonic counter; ids
//! are assigned at first creation and never reused.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::graph::PrimitiveType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapStrategy {
    NotMapped,
    OwnTable,
    TablePerHierarchy,
    ExistingTable,
}

impl MapStrategy {
    /// Parses a `ClassMap.MapStrategy` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NotMapped" => Some(MapStrategy::NotMapped),
            "OwnTable" => Some(MapStrategy::OwnTable),
            "TablePerHierarchy" => Some(MapStrategy::TablePerHierarchy),
            "ExistingTable" => Some(MapStrategy::ExistingTable),
            _ => None,
        }
    }
}

impl fmt::Display for MapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFlags {
    /// Direct subclasses of this class get their own joined table.
    pub joined_table_per_direct_subclass: bool,
    /// New properties of this class go to the shared column pool.
    pub share_columns: bool,
    /// Pool size before spilling into the overflow table; `None` is unbounded.
    pub max_shared_columns_before_overflow: Option<u32>,
    pub apply_to_subclasses_only: bool,
}

/// Mapping of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMapping {
    pub id: u64,
    pub class: String,
    pub strategy: MapStrategy,
    /// Table receiving the class's own new properties.
    pub table: Option<String>,
    pub flags: MapFlags,
    /// Root of the table-per-hierarchy lineage, when there is one.
    pub tph_root: Option<String>,
}

impl ClassMapping {
    pub fn is_mapped(&self) -> bool {
        self.strategy != MapStrategy::NotMapped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    Primary,
    Joined,
    Overflow,
    Existing,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Id, class id and link end columns.
    System,
    /// Named column owned by exactly one property leaf.
    Default,
    /// `ps<n>` pool slot.
    SharedData,
    /// `os<n>` slot in an overflow table.
    Overflow,
}

impl ColumnKind {
    pub fn is_pooled(&self) -> bool {
        matches!(self, ColumnKind::SharedData | ColumnKind::Overflow)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
    Boolean,
    Timestamp,
    /// Pool slots hold values of any type.
    Any,
}

impl ColumnType {
    pub fn for_primitive(primitive: PrimitiveType) -> Self {
        match primitive {
            PrimitiveType::Binary | PrimitiveType::Geometry => ColumnType::Blob,
            PrimitiveType::Boolean => ColumnType::Boolean,
            PrimitiveType::DateTime => ColumnType::Timestamp,
            PrimitiveType::Double | PrimitiveType::Point2d | PrimitiveType::Point3d => {
                ColumnType::Real
            }
            PrimitiveType::Int | PrimitiveType::Long => ColumnType::Integer,
            PrimitiveType::String => ColumnType::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: u64,
    pub name: String,
    pub kind: ColumnKind,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: u64,
    pub name: String,
    pub kind: TableKind,
    /// Table this one extends (joined and overflow tables).
    pub parent: Option<String>,
    /// Columns in creation order; never removed.
    pub columns: Vec<Column>,
    pub overflow: Option<String>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Pool columns of the given kind in slot order.
    pub fn pool(&self, kind: ColumnKind) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(move |c| c.kind == kind)
    }
}

/// One leaf of a property mapped to one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MappedColumn {
    /// `Prop`, `Prop.Member`, `Point.X`, `Nav.Id`.
    pub access_path: String,
    pub table: String,
    pub column: String,
}

/// A column a revision stopped using. Rows of `class` still hold the
/// deleted values until the row writer nulls them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FreedColumn {
    pub class: String,
    pub access_path: String,
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMap {
    pub id: u64,
    pub class: String,
    pub property: String,
    pub columns: Vec<MappedColumn>,
}

/// Column found by introspection.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedColumn<'a> {
    pub table: &'a Table,
    pub column: &'a Column,
}

impl ResolvedColumn<'_> {
    pub fn kind(&self) -> ColumnKind {
        self.column.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub kind: TableKind,
    pub column_count: usize,
    pub parent: Option<String>,
    pub overflow_table: Option<String>,
}

/// Complete physical layout of one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalLayout {
    next_id: u64,
    pub tables: BTreeMap<String, Table>,
    pub class_maps: BTreeMap<String, ClassMapping>,
    /// class → property → map
    pub property_maps: BTreeMap<String, BTreeMap<String, PropertyMap>>,
}

impl PhysicalLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the next surrogate id.
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn class_map(&self, class: &str) -> Option<&ClassMapping> {
        self.class_maps.get(class)
    }

    pub fn property_map(&self, class: &str, property: &str) -> Option<&PropertyMap> {
        self.property_maps.get(class).and_then(|maps| maps.get(property))
    }

    pub fn property_maps_of(&self, class: &str) -> impl Iterator<Item = &PropertyMap> {
        self.property_maps.get(class).into_iter().flat_map(|maps| maps.values())
    }

    /// Resolves `(class, access path)` to its table and column.
    pub fn resolve_column(&self, class: &str, access_path: &str) -> Option<ResolvedColumn<'_>> {
        let property = access_path.split('.').next()?;
        let map = self.property_map(class, property)?;
        let mapped = map.columns.iter().find(|c| c.access_path == access_path)?;
        let table = self.tables.get(&mapped.table)?;
        let column = table.column(&mapped.column)?;
        Some(ResolvedColumn { table, column })
    }

    /// Column kinds of every leaf of a property.
    pub fn column_kinds(&self, class: &str, property: &str) -> Vec<ColumnKind> {
        self.property_map(class, property)
            .map(|map| {
                map.columns
                    .iter()
                    .filter_map(|mc| self.tables.get(&mc.table)?.column(&mc.column))
                    .map(|c| c.kind)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn table_info(&self, name: &str) -> Option<TableInfo> {
        self.tables.get(name).map(|t| TableInfo {
            name: t.name.clone(),
            kind: t.kind,
            column_count: t.columns.len(),
            parent: t.parent.clone(),
            overflow_table: t.overflow.clone(),
        })
    }

    /// Every issued `(class, access path) → (table, column)` pair.
    pub fn issued_columns(&self) -> Vec<(String, MappedColumn)> {
        self.property_maps
            .iter()
            .flat_map(|(class, maps)| {
                maps.values()
                    .flat_map(move |m| m.columns.iter().map(move |c| (class.clone(), c.clone())))
            })
            .collect()
    }

    /// Pairs issued in `old` that this layout no longer carries, limited to
    /// surviving classes and columns.
    pub fn freed_since(&self, old: &PhysicalLayout) -> Vec<FreedColumn> {
        let current: BTreeSet<(String, MappedColumn)> = self.issued_columns().into_iter().collect();
        old.issued_columns()
            .into_iter()
            .filter(|pair| !current.contains(pair))
            .filter(|(class, _)| self.class_maps.contains_key(class))
            .filter(|(_, mc)| {
                self.tables
                    .get(&mc.table)
                    .map_or(false, |t| t.has_column(&mc.column))
            })
            .map(|(class, mc)| FreedColumn {
                class,
                access_path: mc.access_path,
                table: mc.table,
                column: mc.column,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_with_one_property() -> PhysicalLayout {
        let mut layout = PhysicalLayout::new();
        let table_id = layout.next_id();
        let column_id = layout.next_id();
        layout.tables.insert(
            "pl_Pump".into(),
            Table {
                id: table_id,
                name: "pl_Pump".into(),
                kind: TableKind::Primary,
                parent: None,
                columns: vec![Column {
                    id: column_id,
                    name: "ps1".into(),
                    kind: ColumnKind::SharedData,
                    column_type: ColumnType::Any,
                    nullable: true,
                    unique: false,
                }],
                overflow: None,
            },
        );
        let map_id = layout.next_id();
        layout.property_maps.entry("Pump".into()).or_default().insert(
            "Flow".into(),
            PropertyMap {
                id: map_id,
                class: "Pump".into(),
                property: "Flow".into(),
                columns: vec![MappedColumn {
                    access_path: "Flow".into(),
                    table: "pl_Pump".into(),
                    column: "ps1".into(),
                }],
            },
        );
        layout
    }

    #[test]
    fn test_resolve_column() {
        let layout = layout_with_one_property();
        let resolved = layout.resolve_column("Pump", "Flow").unwrap();
        assert_eq!(resolved.table.name, "pl_Pump");
        assert_eq!(resolved.column.name, "ps1");
        assert_eq!(resolved.kind(), ColumnKind::SharedData);
        assert!(layout.resolve_column("Pump", "Head").is_none());
    }

    #[test]
    fn test_surrogate_ids_are_monotonic() {
        let mut layout = layout_with_one_property();
        let a = layout.next_id();
        let b = layout.next_id();
        assert!(b > a);
        assert_eq!(a, 4);
    }

    #[test]
    fn test_table_info() {
        let layout = layout_with_one_property();
        let info = layout.table_info("pl_Pump").unwrap();
        assert_eq!(info.column_count, 1);
        assert_eq!(info.overflow_table, None);
    }

    #[test]
    fn test_layout_serde_keeps_id_counter() {
        let mut layout = layout_with_one_property();
        let json = serde_json::to_string(&layout).unwrap();
        let mut back: PhysicalLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(back.next_id(), layout.next_id());
    }
}
