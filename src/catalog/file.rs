//! File-backed catalog
//!
//! Layout under the catalog root:
//!
//! ```text
//! <root>/catalog/schema_<name>.json   one envelope per schema
//! <root>/catalog/instances.json       schema → classes holding rows
//! ```
//!
//! Each schema file is an envelope carrying the serialized entry, its
//! CRC32 and commit metadata. Writes go to a temp file which is fsynced
//! and then renamed over the previous file, so a reader sees either the
//! old entry or the new one. Reads verify the checksum before parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use uuid::Uuid;

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{CatalogError, CatalogResult};
use super::store::{CatalogEntry, CatalogStore};
use crate::graph::SchemaGraph;
use crate::mapping::PhysicalLayout;
use crate::observability::Event;

const CATALOG_DIR: &str = "catalog";
const ENTRY_PREFIX: &str = "schema_";
const ENTRY_SUFFIX: &str = ".json";
const INSTANCES_FILE: &str = "instances.json";
const ENVELOPE_FORMAT: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    format: u32,
    schema: String,
    commit_id: Uuid,
    committed_at: DateTime<Utc>,
    checksum: u32,
    /// Serialized `CatalogEntry`.
    payload: String,
}

/// Metadata of the last commit of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub commit_id: Uuid,
    pub committed_at: DateTime<Utc>,
    pub checksum: u32,
}

#[derive(Debug, Clone)]
pub struct FileCatalog {
    dir: PathBuf,
}

impl FileCatalog {
    /// Opens (or creates) the catalog under `root`.
    pub fn open(root: &Path) -> CatalogResult<Self> {
        let dir = root.join(CATALOG_DIR);
        fs::create_dir_all(&dir).map_err(|e| CatalogError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn entry_path(&self, schema: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", ENTRY_PREFIX, schema, ENTRY_SUFFIX))
    }

    fn temp_path(&self, schema: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}.tmp", ENTRY_PREFIX, schema, ENTRY_SUFFIX))
    }

    /// Commit metadata of a schema, verified like a full read.
    pub fn commit_info(&self, schema: &str) -> CatalogResult<Option<CommitInfo>> {
        Ok(self.read_envelope(schema)?.map(|(envelope, _)| CommitInfo {
            commit_id: envelope.commit_id,
            committed_at: envelope.committed_at,
            checksum: envelope.checksum,
        }))
    }

    /// Records that rows of `class` exist. Stands in for the row store.
    pub fn mark_populated(&self, schema: &str, class: &str) -> CatalogResult<()> {
        let mut instances = self.read_instances()?;
        instances
            .entry(schema.to_string())
            .or_default()
            .insert(class.to_string());
        let content = serde_json::to_vec_pretty(&instances)?;
        write_atomic(&self.dir.join(INSTANCES_FILE), &self.dir.join(format!("{}.tmp", INSTANCES_FILE)), &content)
    }

    fn read_instances(&self) -> CatalogResult<BTreeMap<String, BTreeSet<String>>> {
        let path = self.dir.join(INSTANCES_FILE);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read(&path).map_err(|e| CatalogError::io(&path, e))?;
        Ok(serde_json::from_slice(&content)?)
    }

    fn read_envelope(&self, schema: &str) -> CatalogResult<Option<(Envelope, CatalogEntry)>> {
        let path = self.entry_path(schema);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read(&path).map_err(|e| CatalogError::io(&path, e))?;

        let envelope: Envelope =
            serde_json::from_slice(&content).map_err(|e| corrupted(schema, e.to_string()))?;
        if envelope.format != ENVELOPE_FORMAT {
            return Err(corrupted(
                schema,
                format!("unsupported envelope format {}", envelope.format),
            ));
        }
        if envelope.schema != schema {
            return Err(corrupted(
                schema,
                format!("envelope names schema '{}'", envelope.schema),
            ));
        }
        if !verify_checksum(envelope.payload.as_bytes(), envelope.checksum) {
            let actual = compute_checksum(envelope.payload.as_bytes());
            error!(
                event = %Event::CatalogCorruption,
                schema,
                expected = envelope.checksum,
                actual,
                "catalog checksum mismatch"
            );
            return Err(CatalogError::ChecksumMismatch {
                schema: schema.to_string(),
                expected: envelope.checksum,
                actual,
            });
        }

        let entry: CatalogEntry = serde_json::from_str(&envelope.payload)
            .map_err(|e| corrupted(schema, e.to_string()))?;
        Ok(Some((envelope, entry)))
    }
}

fn corrupted(schema: &str, reason: String) -> CatalogError {
    error!(event = %Event::CatalogCorruption, schema, reason = %reason);
    CatalogError::Corrupted {
        schema: schema.to_string(),
        reason,
    }
}

/// Temp file, fsync, rename.
fn write_atomic(path: &Path, temp_path: &Path, content: &[u8]) -> CatalogResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| CatalogError::io(temp_path, e))?;
    file.write_all(content)
        .map_err(|e| CatalogError::io(temp_path, e))?;
    file.sync_all().map_err(|e| CatalogError::io(temp_path, e))?;
    drop(file);

    if let Err(e) = fs::rename(temp_path, path) {
        let _ = fs::remove_file(temp_path);
        return Err(CatalogError::io(path, e));
    }
    Ok(())
}

impl CatalogStore for FileCatalog {
    fn read_catalog(&self, schema: &str) -> CatalogResult<Option<CatalogEntry>> {
        Ok(self.read_envelope(schema)?.map(|(_, entry)| entry))
    }

    fn write_catalog(&mut self, graph: &SchemaGraph, layout: &PhysicalLayout) -> CatalogResult<()> {
        let entry = CatalogEntry::new(graph.clone(), layout.clone());
        let payload = serde_json::to_string(&entry)?;
        let envelope = Envelope {
            format: ENVELOPE_FORMAT,
            schema: graph.name.clone(),
            commit_id: Uuid::new_v4(),
            committed_at: Utc::now(),
            checksum: compute_checksum(payload.as_bytes()),
            payload,
        };
        let content = serde_json::to_vec_pretty(&envelope)?;

        write_atomic(
            &self.entry_path(&graph.name),
            &self.temp_path(&graph.name),
            &content,
        )?;
        debug!(
            schema = %graph.name,
            commit_id = %envelope.commit_id,
            bytes = content.len(),
            "catalog entry written"
        );
        Ok(())
    }

    fn schema_names(&self) -> CatalogResult<Vec<String>> {
        let mut names = Vec::new();
        let entries = fs::read_dir(&self.dir).map_err(|e| CatalogError::io(&self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| CatalogError::io(&self.dir, e))?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name
                .strip_prefix(ENTRY_PREFIX)
                .and_then(|rest| rest.strip_suffix(ENTRY_SUFFIX))
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn class_has_instances(&self, schema: &str, class: &str) -> bool {
        // An unreadable instances file counts as populated so that
        // data-dependent changes are refused rather than allowed.
        match self.read_instances() {
            Ok(instances) => instances
                .get(schema)
                .map_or(false, |classes| classes.contains(class)),
            Err(_) => true,
        }
    }
}
