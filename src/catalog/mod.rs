//! Schema catalog persistence
//!
//! The catalog holds, per schema, the accepted graph and the physical
//! layout issued for it. Imports read it through a `SchemaRepository`
//! snapshot and write it through a `CatalogTransaction`; a schema entry
//! is replaced in one durable step or not at all.

mod checksum;
mod errors;
mod file;
mod repository;
mod store;
mod transaction;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{CatalogError, CatalogResult};
pub use file::{CommitInfo, FileCatalog};
pub use repository::SchemaRepository;
pub use store::{CatalogEntry, CatalogStore, MemoryCatalog, StoreProbe};
pub use transaction::CatalogTransaction;
