//! Provider configuration
//!
//! Connection settings come from `<config_dir>/config.toml`, overridden by
//! command-line flags, which clap also fills from `KASM_URL`,
//! `KASM_API_KEY` and `KASM_API_SECRET`.

use anyhow::{Context, Result, bail};
use declarative::LookupPolicy;
use kasmkit::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::paths;

/// Contents of `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Deployment URL, e.g. `https://kasm.example.com`
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_secret: Option<String>,
    /// Accept self-signed certificates
    pub skip_tls_verify: bool,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// List calls made to find an asynchronously created object
    pub lookup_attempts: u32,
    /// Pause between those list calls
    pub lookup_delay_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let lookup = LookupPolicy::default();
        Self {
            url: None,
            api_key: None,
            api_key_secret: None,
            skip_tls_verify: false,
            timeout_secs: 30,
            lookup_attempts: lookup.attempts,
            lookup_delay_secs: lookup.delay.as_secs(),
        }
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_secret: Option<String>,
    pub insecure: bool,
}

impl ProviderConfig {
    /// Load the default config file; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        log::debug!("Loaded provider config from {}", path.display());
        Ok(config)
    }

    /// Apply command-line values on top of the file.
    pub fn merge(mut self, overrides: &Overrides) -> Self {
        if let Some(url) = &overrides.url {
            self.url = Some(url.clone());
        }
        if let Some(key) = &overrides.api_key {
            self.api_key = Some(key.clone());
        }
        if let Some(secret) = &overrides.api_key_secret {
            self.api_key_secret = Some(secret.clone());
        }
        self.skip_tls_verify |= overrides.insecure;
        self
    }

    /// Client settings; fails if any credential is missing.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let missing: Vec<&str> = [
            (&self.url, "url (--url / KASM_URL)"),
            (&self.api_key, "api_key (--api-key / KASM_API_KEY)"),
            (
                &self.api_key_secret,
                "api_key_secret (--api-secret / KASM_API_SECRET)",
            ),
        ]
        .into_iter()
        .filter(|(value, _)| value.as_deref().is_none_or(str::is_empty))
        .map(|(_, name)| name)
        .collect();

        if !missing.is_empty() {
            bail!(
                "Missing provider settings: {}. Set them in config.toml or pass them on the command line.",
                missing.join(", ")
            );
        }

        let mut config = ClientConfig::new(
            self.url.clone().unwrap_or_default(),
            self.api_key.clone().unwrap_or_default(),
            self.api_key_secret.clone().unwrap_or_default(),
        );
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.insecure = self.skip_tls_verify;
        Ok(config)
    }

    pub fn lookup_policy(&self) -> LookupPolicy {
        LookupPolicy::new(
            self.lookup_attempts,
            Duration::from_secs(self.lookup_delay_secs),
        )
    }
}
