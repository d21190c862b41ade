//! Inputs of a validation run

use crate::diff::SchemaChange;
use crate::graph::{DialectVersion, SchemaGraph};
use crate::import::ImportOptions;
use crate::mapping::PhysicalLayout;
use crate::version::VersionDelta;

/// Answers whether rows of a class exist in the store.
pub trait InstanceProbe {
    fn has_instances(&self, class: &str) -> bool;
}

/// Probe for a store that holds no data yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInstances;

impl InstanceProbe for NoInstances {
    fn has_instances(&self, _class: &str) -> bool {
        false
    }
}

/// Everything the rule table consults besides the diff itself.
pub struct ValidationContext<'a> {
    pub old: &'a SchemaGraph,
    pub new: &'a SchemaGraph,
    /// Layout persisted with `old`; empty on a first import.
    pub layout: &'a PhysicalLayout,
    pub version: VersionDelta,
    pub options: ImportOptions,
    /// First dialect with named enumerators.
    pub legacy_dialect_threshold: DialectVersion,
    pub instances: &'a dyn InstanceProbe,
    /// Aliases of the other schemas in the catalog.
    pub foreign_aliases: Vec<String>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        old: &'a SchemaGraph,
        new: &'a SchemaGraph,
        layout: &'a PhysicalLayout,
        version: VersionDelta,
        instances: &'a dyn InstanceProbe,
    ) -> Self {
        Self {
            old,
            new,
            layout,
            version,
            options: ImportOptions::default(),
            legacy_dialect_threshold: DialectVersion::NAMED_ENUMERATORS,
            instances,
            foreign_aliases: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_legacy_threshold(mut self, threshold: DialectVersion) -> Self {
        self.legacy_dialect_threshold = threshold;
        self
    }

    pub fn with_foreign_aliases(mut self, aliases: Vec<String>) -> Self {
        self.foreign_aliases = aliases;
        self
    }

    /// True when a class already has a mapping in the persisted layout.
    pub fn is_persisted(&self, class: &str) -> bool {
        self.layout.class_map(class).is_some()
    }

    /// True while crossing from the legacy dialect into the named one.
    pub fn crosses_legacy_threshold(&self) -> bool {
        self.old.dialect < self.legacy_dialect_threshold
            && self.new.dialect >= self.legacy_dialect_threshold
    }
}

/// A change tree that passed validation. The allocator only accepts this.
#[derive(Debug, Clone)]
pub struct ValidatedChange {
    change: SchemaChange,
    version: VersionDelta,
}

impl ValidatedChange {
    pub(super) fn new(change: SchemaChange, version: VersionDelta) -> Self {
        Self { change, version }
    }

    pub fn change(&self) -> &SchemaChange {
        &self.change
    }

    pub fn version(&self) -> &VersionDelta {
        &self.version
    }

    pub fn into_change(self) -> SchemaChange {
        self.change
    }
}
