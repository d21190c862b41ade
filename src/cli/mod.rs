//! CLI module for schemamap
//!
//! Provides command-line interface for:
//! - import: validate a document and commit it to a file catalog
//! - diff: print the change tree between two documents
//! - inspect: show tables, class maps and property maps of a schema

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{diff, import, inspect, resolve_config, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
