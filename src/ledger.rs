//! Install ledger.
//!
//! Durable record of what is installed, keyed by `namespace/name` (bare name
//! for the default namespace). The ledger is the sole source of truth for
//! idempotence checks and slot occupancy. It is an explicit store passed by
//! reference through the install pipeline; tests construct it in memory.
//!
//! Persistence is per component: an entry is written only after all of that
//! component's files are materialized, so an interrupted run keeps completed
//! components consistent.

use crate::error::InstallError;
use crate::types::ComponentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Ledger file name at the project root.
pub const LEDGER_FILE: &str = "loadout.lock";

/// One installed component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Namespace the component was installed from.
    pub registry: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    pub version: String,
    pub installed_at: DateTime<Utc>,
    /// Project-relative paths of every file this component owns.
    pub files: Vec<PathBuf>,
    /// blake3 hex digest over the concatenated rewritten file contents, in
    /// file order. Diffs against this compare like-for-like.
    pub hash: String,
    #[serde(default)]
    pub registry_dependencies: Vec<String>,
}

/// Hash the rewritten contents actually written to disk.
pub fn content_hash<'a>(contents: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = blake3::Hasher::new();
    for content in contents {
        hasher.update(content.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// The install ledger: ordered map of ledger key to entry.
#[derive(Debug, Default)]
pub struct InstallLedger {
    entries: BTreeMap<String, LedgerEntry>,
    path: Option<PathBuf>,
}

impl InstallLedger {
    /// In-memory ledger, never persisted. Used by tests.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `<root>/loadout.lock`, or start empty when the file does
    /// not exist yet.
    pub fn load(project_root: &Path) -> Result<Self, InstallError> {
        let path = project_root.join(LEDGER_FILE);
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                InstallError::LedgerError(format!(
                    "Failed to parse {}: {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    /// Record an entry and persist. Overwrites any previous entry for the key.
    pub fn record(&mut self, key: String, entry: LedgerEntry) -> Result<(), InstallError> {
        self.entries.insert(key, entry);
        self.persist()
    }

    /// Remove an entry and persist. Removing an absent key is a no-op.
    pub fn remove(&mut self, key: &str) -> Result<Option<LedgerEntry>, InstallError> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn get(&self, key: &str) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &LedgerEntry)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<(), InstallError> {
        if let Some(path) = &self.path {
            let content = serde_json::to_string_pretty(&self.entries).map_err(|e| {
                InstallError::LedgerError(format!("Failed to serialize ledger: {}", e))
            })?;
            std::fs::write(path, content)?;
        }
        Ok(())
    }
}
