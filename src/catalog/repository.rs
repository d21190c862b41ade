//! Per-import view of the persisted catalog

use std::collections::BTreeMap;
use tracing::debug;

use super::errors::CatalogResult;
use super::store::{CatalogEntry, CatalogStore};
use crate::graph::SchemaGraph;
use crate::mapping::PhysicalLayout;
use crate::observability::Event;

/// Snapshot of every persisted schema, loaded when an import starts and
/// dropped when it ends. Nothing is cached across imports.
#[derive(Debug, Default)]
pub struct SchemaRepository {
    entries: BTreeMap<String, CatalogEntry>,
}

impl SchemaRepository {
    pub fn load<S: CatalogStore + ?Sized>(store: &S) -> CatalogResult<Self> {
        let mut entries = BTreeMap::new();
        for name in store.schema_names()? {
            if let Some(entry) = store.read_catalog(&name)? {
                entries.insert(name, entry);
            }
        }
        debug!(event = %Event::CatalogLoaded, schemas = entries.len());
        Ok(Self { entries })
    }

    pub fn get(&self, schema: &str) -> Option<&CatalogEntry> {
        self.entries.get(schema)
    }

    pub fn graph(&self, schema: &str) -> Option<&SchemaGraph> {
        self.get(schema).map(|e| &e.graph)
    }

    pub fn layout(&self, schema: &str) -> Option<&PhysicalLayout> {
        self.get(schema).map(|e| &e.layout)
    }

    /// Aliases of every schema except `schema`.
    pub fn foreign_aliases(&self, schema: &str) -> Vec<String> {
        self.entries
            .values()
            .filter(|e| e.graph.name != schema)
            .map(|e| e.graph.alias.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
