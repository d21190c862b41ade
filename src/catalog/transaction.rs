//! Catalog transaction guard
//!
//! The guard holds the store exclusively for the whole import, so no
//! reader can observe a half-imported schema and no second import can
//! start. Changes are staged in memory and reach the store only on
//! `commit()`; dropping an uncommitted guard discards them.

use tracing::{info, warn};

use super::errors::CatalogResult;
use super::store::{CatalogEntry, CatalogStore, StoreProbe};
use crate::graph::SchemaGraph;
use crate::mapping::PhysicalLayout;
use crate::observability::Event;

pub struct CatalogTransaction<'s, S: CatalogStore + ?Sized> {
    store: &'s mut S,
    schema: String,
    staged: Option<CatalogEntry>,
    finished: bool,
}

impl<'s, S: CatalogStore + ?Sized> CatalogTransaction<'s, S> {
    pub fn begin(store: &'s mut S, schema: impl Into<String>) -> Self {
        Self {
            store,
            schema: schema.into(),
            staged: None,
            finished: false,
        }
    }

    /// Read access to the store while the transaction is open.
    pub fn store(&self) -> &S {
        &*self.store
    }

    pub fn probe(&self) -> StoreProbe<'_, S> {
        StoreProbe::new(&*self.store, &self.schema)
    }

    pub fn stage(&mut self, graph: SchemaGraph, layout: PhysicalLayout) {
        self.staged = Some(CatalogEntry::new(graph, layout));
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Writes the staged entry. Returns whether anything was written.
    pub fn commit(mut self) -> CatalogResult<bool> {
        let Some(entry) = self.staged.take() else {
            self.finished = true;
            return Ok(false);
        };
        // On failure the guard drops unfinished and logs the rollback.
        self.store.write_catalog(&entry.graph, &entry.layout)?;
        self.finished = true;
        info!(
            event = %Event::CatalogCommit,
            schema = %self.schema,
            version = %entry.graph.version
        );
        Ok(true)
    }
}

impl<S: CatalogStore + ?Sized> Drop for CatalogTransaction<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                event = %Event::CatalogRollback,
                schema = %self.schema,
                staged = self.staged.is_some()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::graph::SchemaVersion;

    fn graph() -> SchemaGraph {
        SchemaGraph::new("Plant", "pl", SchemaVersion::new(1, 0, 0))
    }

    #[test]
    fn test_nothing_reaches_store_before_commit() {
        let mut store = MemoryCatalog::new();
        {
            let mut tx = CatalogTransaction::begin(&mut store, "Plant");
            tx.stage(graph(), PhysicalLayout::new());
            assert!(tx.store().read_catalog("Plant").unwrap().is_none());
        }
        assert!(store.read_catalog("Plant").unwrap().is_none());
    }

    #[test]
    fn test_commit_writes_staged_entry() {
        let mut store = MemoryCatalog::new();
        let mut tx = CatalogTransaction::begin(&mut store, "Plant");
        tx.stage(graph(), PhysicalLayout::new());
        assert!(tx.commit().unwrap());
        assert!(store.read_catalog("Plant").unwrap().is_some());
    }

    #[test]
    fn test_commit_without_staged_entry_is_noop() {
        let mut store = MemoryCatalog::new();
        let tx = CatalogTransaction::begin(&mut store, "Plant");
        assert!(!tx.commit().unwrap());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_failed_commit_propagates() {
        let mut store = MemoryCatalog::new();
        store.fail_writes("injected");
        let mut tx = CatalogTransaction::begin(&mut store, "Plant");
        tx.stage(graph(), PhysicalLayout::new());
        assert!(tx.commit().is_err());
        assert!(store.read_catalog("Plant").unwrap().is_none());
    }
}
