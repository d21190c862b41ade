//! Observability for schema imports
//!
//! Structured logging on `tracing`. Every line carries an `event` field
//! drawn from `Event`; long-running stages are wrapped in an
//! `ImportScope`.
//!
//! Observability is read-only: nothing here influences an import's
//! outcome.
//!
//! ```ignore
//! use schemamap::observability::{Event, ImportScope};
//!
//! tracing::info!(event = %Event::DiffComputed, changes = 3);
//!
//! let scope = ImportScope::new("IMPORT", "Plant");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod scope;

pub use events::Event;
pub use scope::ImportScope;
