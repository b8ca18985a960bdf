//! Local state file
//!
//! One record per managed object, keyed by the address used in the
//! manifest. A record is only written after the remote operation that
//! produced it has returned.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted state of one managed object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub kind: String,
    /// ObjectID assigned by the server
    pub id: String,
    /// Canonical state as returned by the controller
    pub state: Value,
}

/// All managed objects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRecord>,
    pub last_updated: DateTime<Utc>,

    #[serde(skip)]
    path: PathBuf,
}

impl StateFile {
    /// Load state from `path`, or start empty if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, starting empty", path.display());
            return Ok(Self::empty(path));
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let mut state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
        state.path = path.to_path_buf();

        log::debug!(
            "Loaded {} records from {}",
            state.resources.len(),
            path.display()
        );
        Ok(state)
    }

    fn empty(path: &Path) -> Self {
        Self {
            resources: BTreeMap::new(),
            last_updated: Utc::now(),
            path: path.to_path_buf(),
        }
    }

    /// Write state back to the file it was loaded from
    pub fn save(&mut self) -> Result<()> {
        self.last_updated = Utc::now();

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;

        // Write-then-rename so an interrupted save leaves the old file intact.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))?;

        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, address: &str) -> Option<&ResourceRecord> {
        self.resources.get(address)
    }

    /// Replace the record at `address`
    pub fn put(&mut self, address: &str, kind: &str, id: String, state: Value) {
        self.resources.insert(
            address.to_string(),
            ResourceRecord {
                kind: kind.to_string(),
                id,
                state,
            },
        );
    }

    pub fn remove(&mut self, address: &str) -> Option<ResourceRecord> {
        self.resources.remove(address)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
