//! Schema import pipeline
//!
//! parse → catalog snapshot → version check → diff → validate →
//! allocate → commit. Every stage before the commit works on immutable
//! snapshots; the commit is a single durable write. Any error aborts
//! with the catalog untouched.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{ImportError, ImportResult};
use super::options::ImportOptions;
use crate::catalog::{CatalogStore, CatalogTransaction, SchemaRepository};
use crate::diff::{ChangeSummary, SchemaChange, SchemaDiffEngine};
use crate::document::{DocumentParser, JsonDocumentParser};
use crate::graph::{DialectVersion, SchemaGraph};
use crate::mapping::{ClassMapAllocator, FreedColumn, PhysicalLayout};
use crate::observability::{Event, ImportScope};
use crate::validator::{ChangeValidator, ValidationContext};
use crate::version::{VersionCompatibilityChecker, VersionDelta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportOutcome {
    /// First import of the schema
    Created,
    /// Accepted revision of a persisted schema
    Upgraded,
    /// Identical to the persisted schema; nothing written
    Unchanged,
}

/// What an import did.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub import_id: Uuid,
    pub schema: String,
    pub outcome: ImportOutcome,
    pub version: VersionDelta,
    pub summary: ChangeSummary,
    /// Tables that did not exist before this import
    pub tables_created: Vec<String>,
    /// `(class, access path)` pairs issued by this import
    pub columns_issued: usize,
    /// Columns released by deleted properties; the row writer nulls them
    /// for rows of the listed classes
    pub freed_columns: Vec<FreedColumn>,
    pub change: SchemaChange,
}

impl ImportReport {
    pub fn wrote_catalog(&self) -> bool {
        self.outcome != ImportOutcome::Unchanged
    }
}

/// Imports schema revisions into a catalog store.
///
/// The importer owns its store; each import holds it exclusively through
/// a `CatalogTransaction`.
#[derive(Debug)]
pub struct SchemaImporter<S: CatalogStore> {
    store: S,
    legacy_dialect_threshold: DialectVersion,
}

impl<S: CatalogStore> SchemaImporter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            legacy_dialect_threshold: DialectVersion::NAMED_ENUMERATORS,
        }
    }

    pub fn with_legacy_threshold(mut self, threshold: DialectVersion) -> Self {
        self.legacy_dialect_threshold = threshold;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Parses a JSON schema document and imports it.
    pub fn import_document(&mut self, text: &str, options: &ImportOptions) -> ImportResult<ImportReport> {
        let parser = JsonDocumentParser::new(self.legacy_dialect_threshold);
        let graph = parser.parse(text)?;
        debug!(
            event = %Event::SchemaParsed,
            schema = %graph.name,
            classes = graph.class_count()
        );
        self.import_schema(graph, options)
    }

    pub fn import_schema(&mut self, graph: SchemaGraph, options: &ImportOptions) -> ImportResult<ImportReport> {
        let scope = ImportScope::new("IMPORT", graph.name.clone());
        match self.run(graph, options) {
            Ok(report) => {
                scope.complete_with(&format!(
                    "{:?}: {}, version {} -> {}",
                    report.outcome, report.summary, report.version.old, report.version.new
                ));
                Ok(report)
            }
            Err(e) => {
                scope.fail(e.code(), &e.to_string());
                Err(e)
            }
        }
    }

    /// Persisted layout of a schema.
    pub fn layout(&self, schema: &str) -> ImportResult<Option<PhysicalLayout>> {
        Ok(self.store.read_catalog(schema)?.map(|entry| entry.layout))
    }

    /// Persisted graph of a schema.
    pub fn graph(&self, schema: &str) -> ImportResult<Option<SchemaGraph>> {
        Ok(self.store.read_catalog(schema)?.map(|entry| entry.graph))
    }

    fn run(&mut self, graph: SchemaGraph, options: &ImportOptions) -> ImportResult<ImportReport> {
        let repo = SchemaRepository::load(&self.store)?;
        let mut tx = CatalogTransaction::begin(&mut self.store, graph.name.clone());

        let empty = PhysicalLayout::new();
        let persisted = repo.get(&graph.name);
        let old_layout = persisted.map_or(&empty, |entry| &entry.layout);
        let foreign_aliases = repo.foreign_aliases(&graph.name);

        let validated = match persisted {
            None => ChangeValidator.validate_initial(&graph, foreign_aliases),
            Some(entry) => {
                let version = VersionCompatibilityChecker
                    .check(&entry.graph, &graph)
                    .into_result()
                    .map_err(|reason| {
                        warn!(event = %Event::ValidationRejected, reason = %reason);
                        ImportError::Version(reason)
                    })?;
                debug!(
                    event = %Event::VersionChecked,
                    old = %version.old,
                    new = %version.new,
                    bump = %version.bump
                );

                let diff = SchemaDiffEngine.diff(&entry.graph, &graph);
                info!(
                    event = %Event::DiffComputed,
                    schema = %graph.name,
                    changes = %diff.summary()
                );
                if diff.is_empty() {
                    tx.commit()?;
                    info!(event = %Event::ImportNoop, schema = %graph.name);
                    return Ok(ImportReport {
                        import_id: Uuid::new_v4(),
                        schema: graph.name,
                        outcome: ImportOutcome::Unchanged,
                        version,
                        summary: ChangeSummary::default(),
                        tables_created: Vec::new(),
                        columns_issued: 0,
                        freed_columns: Vec::new(),
                        change: diff,
                    });
                }

                let probe = tx.probe();
                let ctx = ValidationContext::new(&entry.graph, &graph, &entry.layout, version, &probe)
                    .with_options(*options)
                    .with_legacy_threshold(self.legacy_dialect_threshold)
                    .with_foreign_aliases(foreign_aliases);
                ChangeValidator.validate(diff, &ctx)
            }
        }
        .map_err(|e| {
            warn!(event = %Event::ValidationRejected, code = e.code(), reason = %e);
            e
        })?;
        debug!(event = %Event::ValidationPassed, schema = %graph.name);

        let layout = ClassMapAllocator
            .allocate(&validated, &graph, old_layout)
            .map_err(|conflict| {
                warn!(event = %Event::MappingConflict, class = %conflict.class, reason = %conflict.reason);
                conflict
            })?;
        let tables_created: Vec<String> = layout
            .tables
            .keys()
            .filter(|name| old_layout.table(name).is_none())
            .cloned()
            .collect();
        let columns_issued = issued_since(old_layout, &layout);
        let freed_columns = layout.freed_since(old_layout);
        info!(
            event = %Event::LayoutAllocated,
            schema = %graph.name,
            tables = layout.tables.len(),
            tables_created = tables_created.len(),
            columns_issued,
            columns_freed = freed_columns.len()
        );

        let outcome = if persisted.is_some() {
            ImportOutcome::Upgraded
        } else {
            ImportOutcome::Created
        };
        let version = *validated.version();
        let schema = graph.name.clone();
        tx.stage(graph, layout);
        tx.commit()?;

        let change = validated.into_change();
        Ok(ImportReport {
            import_id: Uuid::new_v4(),
            schema,
            outcome,
            version,
            summary: change.summary(),
            tables_created,
            columns_issued,
            freed_columns,
            change,
        })
    }
}

fn issued_since(old: &PhysicalLayout, new: &PhysicalLayout) -> usize {
    let before: BTreeSet<_> = old.issued_columns().into_iter().collect();
    new.issued_columns()
        .into_iter()
        .filter(|pair| !before.contains(pair))
        .count()
}
