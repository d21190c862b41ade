//! CLI command implementations
//!
//! Commands are thin: they resolve configuration, open the file catalog
//! and hand over to the import pipeline or the layout introspection API.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::catalog::{CatalogStore, FileCatalog};
use crate::diff::SchemaDiffEngine;
use crate::document::{DocumentParser, JsonDocumentParser};
use crate::import::{ImportConfig, SchemaImporter};
use crate::mapping::PhysicalLayout;
use crate::observability::Event;
use crate::version::{VersionCompatibilityChecker, VersionOutcome};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments, installs logging, dispatches, and prints the
/// error response on failure. This is the only function main.rs calls.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = resolve_config(&cli.command).and_then(|config| {
        init_tracing(&config.log_filter)?;
        info!(event = %Event::ConfigLoaded, catalog = %config.catalog_dir);
        run_command(cli.command, &config)
    });
    if let Err(e) = &result {
        write_error(e.code_str(), e.message(), e.details())?;
    }
    result
}

/// Loads the config file when one is given and applies flag overrides.
pub fn resolve_config(command: &Command) -> CliResult<ImportConfig> {
    let mut config = match command.config_path() {
        Some(path) => ImportConfig::load(path)?,
        None => ImportConfig::default(),
    };
    match command {
        Command::Import {
            catalog,
            disallow_major_upgrade,
            ..
        } => {
            if let Some(catalog) = catalog {
                config.catalog_dir = catalog.display().to_string();
            }
            if *disallow_major_upgrade {
                config.disallow_major_schema_upgrade = true;
            }
        }
        Command::Inspect { catalog, .. } => {
            if let Some(catalog) = catalog {
                config.catalog_dir = catalog.display().to_string();
            }
        }
        Command::Diff { .. } => {}
    }
    config.validate()?;
    Ok(config)
}

/// Installs the stderr subscriber; `RUST_LOG` wins over the config.
fn init_tracing(default_filter: &str) -> CliResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| CliError::config_error(format!("invalid log filter: {}", e)))?,
    };
    // A second install (tests) keeps the first subscriber.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
    Ok(())
}

pub fn run_command(cmd: Command, config: &ImportConfig) -> CliResult<()> {
    let data = match cmd {
        Command::Import { document, .. } => import(&document, config)?,
        Command::Diff { old, new, .. } => diff(&old, &new, config)?,
        Command::Inspect {
            schema,
            class,
            property,
            table,
            ..
        } => inspect(
            config,
            &schema,
            class.as_deref().zip(property.as_deref()),
            table.as_deref(),
        )?,
    };
    write_response(data)
}

fn read_document(path: &Path) -> CliResult<String> {
    fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("failed to read {}: {}", path.display(), e)))
}

/// Imports one document into the file catalog.
pub fn import(document: &Path, config: &ImportConfig) -> CliResult<Value> {
    let text = read_document(document)?;
    let store = FileCatalog::open(config.catalog_path())?;
    let mut importer =
        SchemaImporter::new(store).with_legacy_threshold(config.legacy_dialect_threshold);
    let report = importer.import_document(&text, &config.options())?;
    Ok(serde_json::to_value(&report)?)
}

/// Diffs two documents without touching any catalog.
pub fn diff(old: &Path, new: &Path, config: &ImportConfig) -> CliResult<Value> {
    let parser = JsonDocumentParser::new(config.legacy_dialect_threshold);
    let old_graph = parser.parse(&read_document(old)?)?;
    let new_graph = parser.parse(&read_document(new)?)?;

    let version = match VersionCompatibilityChecker.check(&old_graph, &new_graph) {
        VersionOutcome::Accepted(delta) => json!({ "accepted": true, "delta": delta }),
        VersionOutcome::Rejected { reason } => json!({ "accepted": false, "reason": reason }),
    };
    let change = SchemaDiffEngine.diff(&old_graph, &new_graph);
    Ok(json!({
        "version": version,
        "summary": change.summary(),
        "label_only": change.is_label_only(),
        "change": change,
    }))
}

/// Describes a persisted schema, one property map, or one table.
pub fn inspect(
    config: &ImportConfig,
    schema: &str,
    property: Option<(&str, &str)>,
    table: Option<&str>,
) -> CliResult<Value> {
    let store = FileCatalog::open(config.catalog_path())?;
    let entry = store
        .read_catalog(schema)?
        .ok_or_else(|| CliError::not_found(format!("schema '{}'", schema)))?;
    let layout = &entry.layout;

    if let Some((class, prop)) = property {
        let map = layout
            .property_map(class, prop)
            .ok_or_else(|| CliError::not_found(format!("property map {}.{}", class, prop)))?;
        let columns: Vec<Value> = map
            .columns
            .iter()
            .map(|mc| {
                let kind = layout
                    .resolve_column(class, &mc.access_path)
                    .map(|resolved| resolved.kind().to_string());
                json!({
                    "access_path": mc.access_path,
                    "table": mc.table,
                    "column": mc.column,
                    "kind": kind,
                })
            })
            .collect();
        return Ok(json!({ "class": class, "property": prop, "columns": columns }));
    }

    if let Some(name) = table {
        let info = layout
            .table_info(name)
            .ok_or_else(|| CliError::not_found(format!("table '{}'", name)))?;
        return Ok(serde_json::to_value(info)?);
    }

    Ok(json!({
        "schema": entry.graph.name,
        "alias": entry.graph.alias,
        "version": entry.graph.version.to_string(),
        "dialect": entry.graph.dialect.to_string(),
        "commit": store.commit_info(schema)?,
        "tables": table_summaries(layout),
        "classes": layout.class_maps.values().collect::<Vec<_>>(),
    }))
}

fn table_summaries(layout: &PhysicalLayout) -> Vec<Value> {
    layout
        .tables
        .keys()
        .filter_map(|name| layout.table_info(name))
        .map(|info| json!(info))
        .collect()
}
