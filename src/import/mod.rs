//! Schema import
//!
//! Entry point of the crate: `SchemaImporter` runs a revision through
//! version check, diff, validation and allocation, and commits the
//! accepted graph with its layout to the catalog in one step.
//!
//! ```ignore
//! let mut importer = SchemaImporter::new(MemoryCatalog::new());
//! let report = importer.import_document(text, &ImportOptions::default())?;
//! let layout = importer.layout("Plant")?;
//! ```

mod config;
mod errors;
mod importer;
mod options;

pub use config::ImportConfig;
pub use errors::{ImportError, ImportResult};
pub use importer::{ImportOutcome, ImportReport, SchemaImporter};
pub use options::ImportOptions;
