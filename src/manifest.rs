//! Desired-state manifest
//!
//! ```toml
//! [resources.chrome]
//! kind = "image"
//! name = "kasmweb/chrome:1.16.0"
//! friendly_name = "Chrome"
//! enabled = true
//!
//! [resources.kasm-registry]
//! kind = "registry"
//! registry_url = "https://registry.kasmweb.com/"
//! channel = "1.16.0"
//! ```
//!
//! Everything besides `kind` is the kind's desired state. Field names and
//! types are checked by the kind itself when the manifest is planned.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Declared resources by address
    #[serde(default)]
    pub resources: BTreeMap<String, DeclaredResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeclaredResource {
    pub kind: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DeclaredResource {
    /// Desired state in its JSON form
    pub fn desired(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest {}", path.display()))?;
        let manifest = Self::parse(&content)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;

        log::debug!(
            "Loaded {} resources from {}",
            manifest.resources.len(),
            path.display()
        );
        Ok(manifest)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
