//! ClassMapAllocator: validated revision + persisted layout → next layout
//!
//! Classes are processed base-first. Existing class mappings and issued
//! columns are carried forward verbatim; only classes, properties and
//! struct members without a mapping get one. Pool slots are chosen per
//! table scope: the lowest `ps<n>` not used by the class, its ancestors or
//! its descendants, then the overflow table's `os<n>` columns. A slot freed
//! by this revision is not reused before the next one.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::directives::{ColumnConstraints, MapDirectives};
use super::errors::MappingConflict;
use super::types::{
    ClassMapping, Column, ColumnKind, ColumnType, MapFlags, MapStrategy, MappedColumn,
    PhysicalLayout, PropertyMap, Table, TableKind,
};
use crate::graph::{ClassId, ClassKind, PrimitiveType, PropertyDef, PropertyKind, SchemaGraph};
use crate::validator::ValidatedChange;

const ID_COLUMN: &str = "Id";
const CLASS_ID_COLUMN: &str = "ClassId";
const SOURCE_ID_COLUMN: &str = "SourceId";
const TARGET_ID_COLUMN: &str = "TargetId";
const OVERFLOW_SUFFIX: &str = "_Overflow";

/// Computes physical layouts for validated revisions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassMapAllocator;

/// One physical value of a property.
struct Leaf {
    access_path: String,
    column_name: String,
    column_type: ColumnType,
}

impl ClassMapAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Produces the layout for `graph`, extending `old`.
    ///
    /// # Panics
    ///
    /// Panics if an already issued column assignment would change. The
    /// validator rejects every revision that could cause this.
    pub fn allocate(
        &self,
        validated: &ValidatedChange,
        graph: &SchemaGraph,
        old: &PhysicalLayout,
    ) -> Result<PhysicalLayout, MappingConflict> {
        debug!(
            schema = %graph.name,
            changes = %validated.change().summary(),
            "allocating layout"
        );

        let mut layout = old.clone();
        retire(graph, &mut layout);
        let freed: BTreeSet<(String, String)> = layout
            .freed_since(old)
            .into_iter()
            .map(|f| (f.table, f.column))
            .collect();

        let prefix = graph.table_prefix().to_string();
        for id in graph.topological_order() {
            let name = graph.class_name(id);
            if layout.class_map(name).is_some() {
                refresh_mapping(graph, id, &mut layout)?;
            } else {
                let mapping = map_class(graph, id, &mut layout, &prefix)?;
                debug!(
                    class = %name,
                    strategy = %mapping.strategy,
                    table = mapping.table.as_deref().unwrap_or("-"),
                    "class mapped"
                );
                layout.class_maps.insert(name.to_string(), mapping);
            }
            map_properties(graph, id, &mut layout, &freed)?;
        }

        ensure_carried_forward(old, &layout);
        Ok(layout)
    }
}

// =============================================================================
// Retiring deleted elements
// =============================================================================

fn retire(graph: &SchemaGraph, layout: &mut PhysicalLayout) {
    let gone: Vec<String> = layout
        .class_maps
        .keys()
        .filter(|class| graph.class_id(class).is_none())
        .cloned()
        .collect();
    for class in &gone {
        layout.class_maps.remove(class);
        layout.property_maps.remove(class);
        info!(class = %class, "class mapping retired");
    }

    for (class, maps) in layout.property_maps.iter_mut() {
        let Some(id) = graph.class_id(class) else {
            continue;
        };
        let visible: BTreeMap<&str, &PropertyDef> = graph
            .all_properties(id)
            .into_iter()
            .map(|(_, p)| (p.name.as_str(), p))
            .collect();
        maps.retain(|prop, _| {
            let keep = visible.contains_key(prop.as_str());
            if !keep {
                debug!(class = %class, property = %prop, "property map retired; slot freed");
            }
            keep
        });

        // Struct members deleted from a surviving property.
        for (prop, map) in maps.iter_mut() {
            let Some(def) = visible.get(prop.as_str()) else {
                continue;
            };
            let live: BTreeSet<String> = property_leaves(graph, def)
                .into_iter()
                .map(|leaf| leaf.access_path)
                .collect();
            map.columns.retain(|mc| {
                let keep = live.contains(&mc.access_path);
                if !keep {
                    debug!(
                        class = %class,
                        access_path = %mc.access_path,
                        "member column retired; slot freed"
                    );
                }
                keep
            });
        }
    }

    // A table stays while a class maps into it or a kept table extends it.
    let mut kept: BTreeSet<String> = layout
        .class_maps
        .values()
        .filter_map(|m| m.table.clone())
        .collect();
    loop {
        let parents: Vec<String> = kept
            .iter()
            .filter_map(|t| layout.tables.get(t).and_then(|t| t.parent.clone()))
            .filter(|p| !kept.contains(p))
            .collect();
        if parents.is_empty() {
            break;
        }
        kept.extend(parents);
    }
    let overflow: Vec<String> = kept
        .iter()
        .filter_map(|t| layout.tables.get(t).and_then(|t| t.overflow.clone()))
        .collect();
    kept.extend(overflow);

    let dropped: Vec<String> = layout
        .tables
        .keys()
        .filter(|t| !kept.contains(*t))
        .cloned()
        .collect();
    for table in dropped {
        layout.tables.remove(&table);
        info!(table = %table, "table dropped with its last class");
    }
}

// =============================================================================
// Class mapping
// =============================================================================

fn not_mapped(layout: &mut PhysicalLayout, class: &str) -> ClassMapping {
    ClassMapping {
        id: layout.next_id(),
        class: class.to_string(),
        strategy: MapStrategy::NotMapped,
        table: None,
        flags: MapFlags::default(),
        tph_root: None,
    }
}

fn map_class(
    graph: &SchemaGraph,
    id: ClassId,
    layout: &mut PhysicalLayout,
    prefix: &str,
) -> Result<ClassMapping, MappingConflict> {
    let class = graph.class(id);
    let name = class.name.as_str();

    let is_relationship = match &class.kind {
        ClassKind::Struct | ClassKind::CustomAttribute => return Ok(not_mapped(layout, name)),
        ClassKind::Entity if class.is_mixin() => return Ok(not_mapped(layout, name)),
        ClassKind::Relationship(_) if !graph.navigation_usages(id).is_empty() => {
            return Ok(not_mapped(layout, name))
        }
        ClassKind::Relationship(_) => true,
        ClassKind::Entity => false,
    };

    let directives = MapDirectives::read(class)?;

    let base = graph
        .primary_base(id)
        .and_then(|b| layout.class_map(graph.class_name(b)))
        .filter(|m| m.strategy == MapStrategy::TablePerHierarchy)
        .cloned();
    if let Some(base) = base {
        return map_tph_subclass(graph, id, layout, prefix, &directives, &base);
    }

    if directives.joined_table_per_direct_subclass
        && directives.strategy != Some(MapStrategy::TablePerHierarchy)
    {
        return Err(MappingConflict::new(
            name,
            "JoinedTablePerDirectSubclass requires TablePerHierarchy",
        ));
    }

    let strategy = directives.strategy.unwrap_or(MapStrategy::OwnTable);
    let table = match strategy {
        MapStrategy::NotMapped => return Ok(not_mapped(layout, name)),
        MapStrategy::OwnTable | MapStrategy::TablePerHierarchy => {
            let kind = if is_relationship {
                TableKind::Link
            } else {
                TableKind::Primary
            };
            let mut system = vec![ID_COLUMN];
            if strategy == MapStrategy::TablePerHierarchy {
                system.push(CLASS_ID_COLUMN);
            }
            if is_relationship {
                system.extend([SOURCE_ID_COLUMN, TARGET_ID_COLUMN]);
            }
            create_table(layout, format!("{}_{}", prefix, name), kind, None, &system)
        }
        MapStrategy::ExistingTable => {
            let table_name = directives.table_name.clone().ok_or_else(|| {
                MappingConflict::new(name, "ExistingTable requires a TableName")
            })?;
            create_table(layout, table_name, TableKind::Existing, None, &[ID_COLUMN])
        }
    };

    Ok(ClassMapping {
        id: layout.next_id(),
        class: name.to_string(),
        strategy,
        table: Some(table),
        flags: directives.flags(),
        tph_root: (strategy == MapStrategy::TablePerHierarchy).then(|| name.to_string()),
    })
}

fn map_tph_subclass(
    graph: &SchemaGraph,
    id: ClassId,
    layout: &mut PhysicalLayout,
    prefix: &str,
    directives: &MapDirectives,
    base: &ClassMapping,
) -> Result<ClassMapping, MappingConflict> {
    let name = graph.class_name(id);
    if directives.strategy.is_some() {
        return Err(MappingConflict::new(
            name,
            "map strategy declared below a TablePerHierarchy base",
        ));
    }
    if directives.share_columns.is_some() {
        return Err(MappingConflict::new(
            name,
            "ShareColumns must be declared on the hierarchy root",
        ));
    }
    if directives.joined_table_per_direct_subclass {
        let already_joined = graph.ancestors(id).into_iter().any(|a| {
            layout
                .class_map(graph.class_name(a))
                .map_or(false, |m| m.flags.joined_table_per_direct_subclass)
        });
        if already_joined {
            return Err(MappingConflict::new(
                name,
                "JoinedTablePerDirectSubclass is already declared higher in the hierarchy",
            ));
        }
    }

    let table = if base.flags.joined_table_per_direct_subclass {
        create_table(
            layout,
            format!("{}_{}", prefix, name),
            TableKind::Joined,
            base.table.clone(),
            &[ID_COLUMN],
        )
    } else {
        base.table.clone().ok_or_else(|| {
            MappingConflict::new(name, "TablePerHierarchy base has no table")
        })?
    };

    Ok(ClassMapping {
        id: layout.next_id(),
        class: name.to_string(),
        strategy: MapStrategy::TablePerHierarchy,
        table: Some(table),
        flags: MapFlags {
            joined_table_per_direct_subclass: directives.joined_table_per_direct_subclass,
            share_columns: base.flags.share_columns,
            max_shared_columns_before_overflow: base.flags.max_shared_columns_before_overflow,
            apply_to_subclasses_only: false,
        },
        tph_root: base.tph_root.clone(),
    })
}

/// Applies the one mapping change a persisted class may undergo: a new
/// overflow threshold, which is pushed down to the whole hierarchy.
fn refresh_mapping(
    graph: &SchemaGraph,
    id: ClassId,
    layout: &mut PhysicalLayout,
) -> Result<(), MappingConflict> {
    let class = graph.class(id);
    let Some(mapping) = layout.class_map(&class.name) else {
        return Ok(());
    };
    let directives = MapDirectives::read(class)?;
    let Some(share) = directives.share_columns else {
        return Ok(());
    };
    if !mapping.flags.share_columns {
        return Err(MappingConflict::new(
            &class.name,
            "ShareColumns added to an already mapped class",
        ));
    }
    if mapping.flags.max_shared_columns_before_overflow == share.max_before_overflow {
        return Ok(());
    }

    info!(
        class = %class.name,
        old = ?mapping.flags.max_shared_columns_before_overflow,
        new = ?share.max_before_overflow,
        "overflow threshold changed"
    );
    let root = class.name.clone();
    for m in layout.class_maps.values_mut() {
        if m.class == root || m.tph_root.as_deref() == Some(root.as_str()) {
            m.flags.max_shared_columns_before_overflow = share.max_before_overflow;
        }
    }
    Ok(())
}

// =============================================================================
// Tables
// =============================================================================

fn create_table(
    layout: &mut PhysicalLayout,
    name: String,
    kind: TableKind,
    parent: Option<String>,
    system_columns: &[&str],
) -> String {
    if layout.tables.contains_key(&name) {
        return name;
    }
    let id = layout.next_id();
    let columns = system_columns
        .iter()
        .map(|col| Column {
            id: layout.next_id(),
            name: col.to_string(),
            kind: ColumnKind::System,
            column_type: ColumnType::Integer,
            nullable: false,
            unique: *col == ID_COLUMN,
        })
        .collect();
    layout.tables.insert(
        name.clone(),
        Table {
            id,
            name: name.clone(),
            kind,
            parent,
            columns,
            overflow: None,
        },
    );
    info!(table = %name, kind = ?kind, "table created");
    name
}

fn ensure_overflow_table(layout: &mut PhysicalLayout, table: &str) -> String {
    if let Some(existing) = layout.tables.get(table).and_then(|t| t.overflow.clone()) {
        return existing;
    }
    let name = create_table(
        layout,
        format!("{}{}", table, OVERFLOW_SUFFIX),
        TableKind::Overflow,
        Some(table.to_string()),
        &[ID_COLUMN, CLASS_ID_COLUMN],
    );
    if let Some(parent) = layout.tables.get_mut(table) {
        parent.overflow = Some(name.clone());
    }
    name
}

fn push_column(
    layout: &mut PhysicalLayout,
    table: &str,
    name: String,
    kind: ColumnKind,
    column_type: ColumnType,
    constraints: ColumnConstraints,
) -> String {
    let id = layout.next_id();
    if let Some(t) = layout.tables.get_mut(table) {
        t.columns.push(Column {
            id,
            name: name.clone(),
            kind,
            column_type,
            nullable: constraints.nullable,
            unique: constraints.unique,
        });
    }
    name
}

// =============================================================================
// Properties
// =============================================================================

fn map_properties(
    graph: &SchemaGraph,
    id: ClassId,
    layout: &mut PhysicalLayout,
    freed: &BTreeSet<(String, String)>,
) -> Result<(), MappingConflict> {
    let name = graph.class_name(id);
    let Some(mapping) = layout.class_map(name).cloned() else {
        return Ok(());
    };
    let Some(table) = mapping.table.clone() else {
        return Ok(());
    };

    for (_, prop) in graph.all_properties(id) {
        let leaves = property_leaves(graph, prop);
        let existing = layout
            .property_map(name, &prop.name)
            .map(|m| (m.id, m.columns.clone()));

        let (map_id, columns) = match existing {
            Some((map_id, mut columns)) => {
                let missing: Vec<Leaf> = leaves
                    .into_iter()
                    .filter(|leaf| !columns.iter().any(|c| c.access_path == leaf.access_path))
                    .collect();
                if missing.is_empty() {
                    continue;
                }
                debug!(
                    class = %name,
                    property = %prop.name,
                    members = missing.len(),
                    "mapping new struct members"
                );
                let site = Site { graph, id, mapping: &mapping, table: &table, freed };
                columns.extend(place_leaves(&site, prop, missing, layout));
                (map_id, columns)
            }
            None => {
                ensure_navigable(graph, name, prop, layout)?;
                let site = Site { graph, id, mapping: &mapping, table: &table, freed };
                let columns = place_leaves(&site, prop, leaves, layout);
                (layout.next_id(), columns)
            }
        };
        let map = PropertyMap {
            id: map_id,
            class: name.to_string(),
            property: prop.name.clone(),
            columns,
        };
        layout
            .property_maps
            .entry(name.to_string())
            .or_default()
            .insert(prop.name.clone(), map);
    }
    Ok(())
}

/// A navigation property stores the related id in its own row, which
/// contradicts a relationship already persisted as a link table.
fn ensure_navigable(
    graph: &SchemaGraph,
    class: &str,
    prop: &PropertyDef,
    layout: &PhysicalLayout,
) -> Result<(), MappingConflict> {
    let PropertyKind::Navigation { relationship, .. } = &prop.kind else {
        return Ok(());
    };
    let relationship = graph.class_name(*relationship);
    let link_table = layout
        .class_map(relationship)
        .and_then(|m| m.table.as_deref())
        .and_then(|t| layout.table(t))
        .filter(|t| t.kind == TableKind::Link);
    match link_table {
        Some(table) => Err(MappingConflict::new(
            class,
            format!(
                "navigation property '{}' uses relationship '{}', which is mapped to link table {}",
                prop.name, relationship, table.name
            ),
        )),
        None => Ok(()),
    }
}

/// Where a class's new leaves are placed.
struct Site<'a> {
    graph: &'a SchemaGraph,
    id: ClassId,
    mapping: &'a ClassMapping,
    table: &'a str,
    /// Slots freed by the current revision
    freed: &'a BTreeSet<(String, String)>,
}

/// Leaves already mapped on a base of the same hierarchy table reuse its
/// columns; the rest get new ones.
fn place_leaves(
    site: &Site<'_>,
    prop: &PropertyDef,
    leaves: Vec<Leaf>,
    layout: &mut PhysicalLayout,
) -> Vec<MappedColumn> {
    let inherited =
        inherited_columns(site.graph, site.id, site.mapping, &prop.name, layout).unwrap_or_default();
    let (reused, own): (Vec<Leaf>, Vec<Leaf>) = leaves
        .into_iter()
        .partition(|leaf| inherited.iter().any(|c| c.access_path == leaf.access_path));

    let mut out: Vec<MappedColumn> = reused
        .iter()
        .filter_map(|leaf| {
            inherited
                .iter()
                .find(|c| c.access_path == leaf.access_path)
                .cloned()
        })
        .collect();
    out.extend(allocate_leaves(site, prop, own, layout));
    out
}

/// Columns of the same property on the nearest base in the same
/// table-per-hierarchy lineage; rows of the lineage share them.
fn inherited_columns(
    graph: &SchemaGraph,
    id: ClassId,
    mapping: &ClassMapping,
    prop: &str,
    layout: &PhysicalLayout,
) -> Option<Vec<MappedColumn>> {
    if mapping.strategy != MapStrategy::TablePerHierarchy {
        return None;
    }
    let mut current = graph.primary_base(id);
    while let Some(base) = current {
        let base_name = graph.class_name(base);
        let same_lineage = layout
            .class_map(base_name)
            .map_or(false, |m| m.tph_root == mapping.tph_root);
        if !same_lineage {
            return None;
        }
        if let Some(map) = layout.property_map(base_name, prop) {
            return Some(map.columns.clone());
        }
        current = graph.primary_base(base);
    }
    None
}

fn allocate_leaves(
    site: &Site<'_>,
    prop: &PropertyDef,
    leaves: Vec<Leaf>,
    layout: &mut PhysicalLayout,
) -> Vec<MappedColumn> {
    let Site { graph, id, mapping, table, freed } = *site;
    let class = graph.class_name(id);
    let shared = mapping.flags.share_columns && !mapping.flags.apply_to_subclasses_only;
    let constraints = ColumnConstraints::read(prop);

    let mut occupied = if shared {
        let mut occupied = occupied_slots(graph, id, layout);
        occupied.extend(freed.iter().cloned());
        occupied
    } else {
        BTreeSet::new()
    };

    let mut out = Vec::new();
    for leaf in leaves {
        let (slot_table, column) = if shared {
            let threshold = mapping.flags.max_shared_columns_before_overflow;
            let slot = shared_slot(layout, table, threshold, &occupied);
            occupied.insert(slot.clone());
            slot
        } else {
            let column_name = unique_column_name(layout, table, class, &leaf.column_name);
            let column = push_column(
                layout,
                table,
                column_name,
                ColumnKind::Default,
                leaf.column_type,
                constraints,
            );
            (table.to_string(), column)
        };
        debug!(
            class = %class,
            access_path = %leaf.access_path,
            table = %slot_table,
            column = %column,
            "column assigned"
        );
        out.push(MappedColumn {
            access_path: leaf.access_path,
            table: slot_table,
            column,
        });
    }
    out
}

/// `(table, column)` pairs used by the class, its ancestors and its
/// descendants. Rows of those classes may hold values in them.
fn occupied_slots(graph: &SchemaGraph, id: ClassId, layout: &PhysicalLayout) -> BTreeSet<(String, String)> {
    let mut lineage = graph.ancestors(id);
    lineage.push(id);
    lineage.extend(graph.descendants(id));

    lineage
        .into_iter()
        .flat_map(|c| layout.property_maps_of(graph.class_name(c)))
        .flat_map(|map| map.columns.iter())
        .map(|mc| (mc.table.clone(), mc.column.clone()))
        .collect()
}

fn shared_slot(
    layout: &mut PhysicalLayout,
    table: &str,
    threshold: Option<u32>,
    occupied: &BTreeSet<(String, String)>,
) -> (String, String) {
    let free = |table_name: &str, kind: ColumnKind, layout: &PhysicalLayout| {
        layout.table(table_name).and_then(|t| {
            t.pool(kind)
                .find(|c| !occupied.contains(&(table_name.to_string(), c.name.clone())))
                .map(|c| (table_name.to_string(), c.name.clone()))
        })
    };

    if let Some(slot) = free(table, ColumnKind::SharedData, &*layout) {
        return slot;
    }
    let overflow = layout.table(table).and_then(|t| t.overflow.clone());
    if let Some(overflow) = &overflow {
        if let Some(slot) = free(overflow.as_str(), ColumnKind::Overflow, &*layout) {
            return slot;
        }
    }

    let pool_size = layout
        .table(table)
        .map_or(0, |t| t.pool(ColumnKind::SharedData).count());
    let nullable = ColumnConstraints {
        nullable: true,
        unique: false,
    };
    if threshold.map_or(true, |max| pool_size < max as usize) {
        let column = push_column(
            layout,
            table,
            format!("ps{}", pool_size + 1),
            ColumnKind::SharedData,
            ColumnType::Any,
            nullable,
        );
        return (table.to_string(), column);
    }

    let overflow = ensure_overflow_table(layout, table);
    let overflow_size = layout
        .table(&overflow)
        .map_or(0, |t| t.pool(ColumnKind::Overflow).count());
    let column = push_column(
        layout,
        &overflow,
        format!("os{}", overflow_size + 1),
        ColumnKind::Overflow,
        ColumnType::Any,
        nullable,
    );
    (overflow, column)
}

fn unique_column_name(layout: &PhysicalLayout, table: &str, class: &str, base: &str) -> String {
    let taken = |name: &str| layout.table(table).map_or(false, |t| t.has_column(name));
    if !taken(base) {
        return base.to_string();
    }
    let qualified = format!("{}_{}", class, base);
    if !taken(&qualified) {
        return qualified;
    }
    (1..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or(qualified)
}

fn property_leaves(graph: &SchemaGraph, prop: &PropertyDef) -> Vec<Leaf> {
    match &prop.kind {
        PropertyKind::Primitive { primitive, .. } => primitive_leaves(&[prop.name.as_str()], *primitive),
        PropertyKind::PrimitiveArray { .. } | PropertyKind::StructArray { .. } => vec![Leaf {
            access_path: prop.name.clone(),
            column_name: prop.name.clone(),
            column_type: ColumnType::Text,
        }],
        PropertyKind::Struct { struct_class } => graph
            .struct_leaves(*struct_class)
            .into_iter()
            .flat_map(|leaf| {
                let mut path = vec![prop.name.as_str()];
                path.extend(leaf.path.iter().map(String::as_str));
                match leaf.primitive {
                    Some(primitive) => primitive_leaves(&path, primitive),
                    None => vec![Leaf {
                        access_path: path.join("."),
                        column_name: path.join("_"),
                        column_type: ColumnType::Text,
                    }],
                }
            })
            .collect(),
        PropertyKind::Navigation { .. } => vec![Leaf {
            access_path: format!("{}.Id", prop.name),
            column_name: format!("{}Id", prop.name),
            column_type: ColumnType::Integer,
        }],
    }
}

/// Points expand to one column per coordinate.
fn primitive_leaves(path: &[&str], primitive: PrimitiveType) -> Vec<Leaf> {
    let coordinates: &[&str] = match primitive {
        PrimitiveType::Point2d => &["X", "Y"],
        PrimitiveType::Point3d => &["X", "Y", "Z"],
        _ => &[],
    };
    let column_type = ColumnType::for_primitive(primitive);
    if coordinates.is_empty() {
        return vec![Leaf {
            access_path: path.join("."),
            column_name: path.join("_"),
            column_type,
        }];
    }
    coordinates
        .iter()
        .map(|axis| Leaf {
            access_path: format!("{}.{}", path.join("."), axis),
            column_name: format!("{}_{}", path.join("_"), axis),
            column_type,
        })
        .collect()
}

/// Issued pairs never change and columns are never removed from a
/// surviving table.
fn ensure_carried_forward(old: &PhysicalLayout, new: &PhysicalLayout) {
    for (class, maps) in &old.property_maps {
        for (prop, map) in maps {
            let Some(current) = new.property_map(class, prop) else {
                continue;
            };
            for issued in &map.columns {
                if let Some(now) = current
                    .columns
                    .iter()
                    .find(|c| c.access_path == issued.access_path)
                {
                    assert_eq!(
                        now, issued,
                        "column assignment of {}.{} changed",
                        class, issued.access_path
                    );
                }
            }
        }
    }
    for (name, table) in &old.tables {
        if let Some(current) = new.table(name) {
            assert!(
                current.columns.starts_with(&table.columns),
                "columns of table {} were rewritten",
                name
            );
        }
    }
}
