//! Catalog store trait and the in-memory store

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::errors::{CatalogError, CatalogResult};
use crate::graph::SchemaGraph;
use crate::mapping::PhysicalLayout;
use crate::validator::InstanceProbe;

/// One persisted schema: its graph and the layout issued for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub graph: SchemaGraph,
    pub layout: PhysicalLayout,
}

impl CatalogEntry {
    pub fn new(graph: SchemaGraph, layout: PhysicalLayout) -> Self {
        Self { graph, layout }
    }
}

/// Durable home of schemas and their layouts.
///
/// A store writes one schema at a time; `write_catalog` either replaces
/// the schema's entry completely or leaves it untouched.
pub trait CatalogStore: std::fmt::Debug {
    fn read_catalog(&self, schema: &str) -> CatalogResult<Option<CatalogEntry>>;

    fn write_catalog(&mut self, graph: &SchemaGraph, layout: &PhysicalLayout) -> CatalogResult<()>;

    /// Names of every persisted schema, sorted.
    fn schema_names(&self) -> CatalogResult<Vec<String>>;

    /// True when rows of `class` exist in the store.
    fn class_has_instances(&self, schema: &str, class: &str) -> bool;
}

/// `InstanceProbe` answering from a store for one schema.
pub struct StoreProbe<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
    schema: &'a str,
}

impl<'a, S: CatalogStore + ?Sized> StoreProbe<'a, S> {
    pub fn new(store: &'a S, schema: &'a str) -> Self {
        Self { store, schema }
    }
}

impl<S: CatalogStore + ?Sized> InstanceProbe for StoreProbe<'_, S> {
    fn has_instances(&self, class: &str) -> bool {
        self.store.class_has_instances(self.schema, class)
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: BTreeMap<String, CatalogEntry>,
    populated: BTreeSet<(String, String)>,
    write_failure: Option<String>,
    writes: usize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a class as holding rows.
    pub fn mark_populated(&mut self, schema: &str, class: &str) {
        self.populated.insert((schema.to_string(), class.to_string()));
    }

    /// Makes every following write fail with `reason`.
    pub fn fail_writes(&mut self, reason: impl Into<String>) {
        self.write_failure = Some(reason.into());
    }

    pub fn clear_write_failure(&mut self) {
        self.write_failure = None;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl CatalogStore for MemoryCatalog {
    fn read_catalog(&self, schema: &str) -> CatalogResult<Option<CatalogEntry>> {
        Ok(self.entries.get(schema).cloned())
    }

    fn write_catalog(&mut self, graph: &SchemaGraph, layout: &PhysicalLayout) -> CatalogResult<()> {
        if let Some(reason) = &self.write_failure {
            return Err(CatalogError::WriteRejected(reason.clone()));
        }
        self.entries.insert(
            graph.name.clone(),
            CatalogEntry::new(graph.clone(), layout.clone()),
        );
        self.writes += 1;
        Ok(())
    }

    fn schema_names(&self) -> CatalogResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn class_has_instances(&self, schema: &str, class: &str) -> bool {
        self.populated
            .contains(&(schema.to_string(), class.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SchemaVersion;

    fn graph(name: &str) -> SchemaGraph {
        SchemaGraph::new(name, name.to_lowercase(), SchemaVersion::new(1, 0, 0))
    }

    #[test]
    fn test_memory_round_trip() {
        let mut store = MemoryCatalog::new();
        assert!(store.read_catalog("Plant").unwrap().is_none());

        store.write_catalog(&graph("Plant"), &PhysicalLayout::new()).unwrap();
        let entry = store.read_catalog("Plant").unwrap().unwrap();
        assert_eq!(entry.graph.name, "Plant");
        assert_eq!(store.schema_names().unwrap(), vec!["Plant".to_string()]);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_injected_write_failure_leaves_store_untouched() {
        let mut store = MemoryCatalog::new();
        store.fail_writes("disk full");
        let err = store
            .write_catalog(&graph("Plant"), &PhysicalLayout::new())
            .unwrap_err();
        assert_eq!(err.code(), "SCHEMAMAP_CATALOG_WRITE_REJECTED");
        assert!(store.read_catalog("Plant").unwrap().is_none());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_store_probe() {
        let mut store = MemoryCatalog::new();
        store.mark_populated("Plant", "Pump");
        let probe = StoreProbe::new(&store, "Plant");
        assert!(probe.has_instances("Pump"));
        assert!(!probe.has_instances("Valve"));
    }
}
