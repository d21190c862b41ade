//! schemamap - schema evolution validator and append-only column allocator
//!
//! Decides whether a revision of a class-based schema is a legal
//! evolution of the schema persisted in a catalog, and recomputes the
//! class → table and property → column mapping without invalidating any
//! column already issued.
//!
//! Pipeline: `document` → `diff` + `version` → `validator` → `mapping`
//! → `catalog`, driven by `import::SchemaImporter`.

pub mod catalog;
pub mod cli;
pub mod diff;
pub mod document;
pub mod graph;
pub mod import;
pub mod mapping;
pub mod observability;
pub mod validator;
pub mod version;

pub use import::{ImportError, ImportOptions, ImportReport, ImportResult, SchemaImporter};
