//! Wire models for the Kasm Workspaces developer API.
//!
//! Objects returned by the API are dense: every field has a value, and
//! absence is the zero value (`""`, `0`, `false`). The API also sends
//! `null` for some unset fields; those deserialize to the zero value too.
//! Request payloads are sparse: `None` fields are skipped.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Value the API reports for "no session time limit".
pub const NO_TIME_LIMIT: i64 = -1;

/// Connection settings for a Kasm deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://kasm.example.com`
    pub url: String,
    /// API key id
    pub api_key: String,
    /// API key secret
    pub api_key_secret: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Accept self-signed certificates
    pub insecure: bool,
}

impl ClientConfig {
    /// Create a config with default timeout and certificate checks on.
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_key_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_key_secret: api_key_secret.into(),
            timeout: Duration::from_secs(30),
            insecure: false,
        }
    }
}

/// `null` and missing both read as the type's zero value.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn no_time_limit() -> i64 {
    NO_TIME_LIMIT
}

fn nullable_time_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(NO_TIME_LIMIT))
}

/// Config blobs arrive either as JSON text or as an embedded object.
fn json_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(String::new()),
        Some(other) => Ok(other.to_string()),
    }
}

// ============================================================================
// Images
// ============================================================================

/// A workspace image as returned by `get_images`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Server-assigned id
    pub image_id: String,
    /// Docker image reference, e.g. `kasmweb/chrome:1.16.0`
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// Display name
    #[serde(default, deserialize_with = "nullable")]
    pub friendly_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    /// CPU cores
    #[serde(default, deserialize_with = "nullable")]
    pub cores: f64,
    /// Memory in bytes
    #[serde(default, deserialize_with = "nullable")]
    pub memory: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub enabled: bool,
    /// Thumbnail path or URL
    #[serde(default, deserialize_with = "nullable")]
    pub image_src: String,
    #[serde(default, deserialize_with = "nullable")]
    pub docker_registry: String,
    /// Docker run overrides, JSON text
    #[serde(default, deserialize_with = "json_text")]
    pub run_config: String,
    /// Exec hooks, JSON text
    #[serde(default, deserialize_with = "json_text")]
    pub exec_config: String,
    #[serde(default, deserialize_with = "nullable")]
    pub restrict_to_network: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub persistent_profile_path: String,
    /// Seconds, or [`NO_TIME_LIMIT`]
    #[serde(default = "no_time_limit", deserialize_with = "nullable_time_limit")]
    pub session_time_limit: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub categories: Vec<String>,
    /// Whether the image has been pulled on an agent
    #[serde(default, deserialize_with = "nullable")]
    pub available: bool,
}

/// Body of `create_image` / `update_image`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub name: String,
    pub friendly_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_registry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrict_to_network: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_profile_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_time_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

// ============================================================================
// Casting configurations
// ============================================================================

/// A casting configuration as returned by `get_cast_config(s)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CastConfig {
    pub cast_config_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub casting_config_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub image_id: String,
    /// URL path segment, `/#/cast/<key>`
    #[serde(default, deserialize_with = "nullable")]
    pub key: String,
    #[serde(default, deserialize_with = "nullable")]
    pub allowed_referrers: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub limit_sessions: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub session_remaining: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub limit_ips: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub ip_request_limit: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub ip_request_seconds: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub error_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub enable_sharing: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub disable_control_panel: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub disable_tips: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub disable_fixed_res: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub allow_anonymous: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub group_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub require_recaptcha: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub kasm_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub dynamic_kasm_url: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub allow_resume: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub enforce_client_settings: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub allow_kasm_audio: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub allow_kasm_uploads: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub allow_kasm_downloads: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub allow_kasm_clipboard_down: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub allow_kasm_clipboard_up: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub allow_kasm_microphone: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub valid_until: String,
    /// Friendly name of the referenced image
    #[serde(default, deserialize_with = "nullable")]
    pub image_friendly_name: String,
}

/// Body of `create_cast_config` / `update_cast_config`.
///
/// `allowed_referrers` is always present: the API rejects a missing list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CastConfigPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast_config_id: Option<String>,
    pub casting_config_name: String,
    pub image_id: String,
    pub key: String,
    pub allowed_referrers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_sessions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_ips: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_request_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_request_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_sharing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_control_panel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_tips: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_fixed_res: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_anonymous: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_recaptcha: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kasm_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_kasm_url: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_resume: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforce_client_settings: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_kasm_audio: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_kasm_uploads: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_kasm_downloads: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_kasm_clipboard_down: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_kasm_clipboard_up: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_kasm_microphone: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}

// ============================================================================
// Registries
// ============================================================================

/// A workspace registry as returned by `get_registries`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub registry_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub registry_url: String,
    /// Release channel, as normalized by the server (`1.16.0` -> `1.16`)
    #[serde(default, deserialize_with = "nullable")]
    pub channel: String,
    #[serde(default, deserialize_with = "nullable")]
    pub do_auto_update: bool,
    /// Display name read from the registry's metadata
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub schema_version: String,
    #[serde(default, deserialize_with = "nullable")]
    pub is_verified: bool,
}

/// Body of `create_registry` / `update_registry`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistryPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_id: Option<String>,
    pub registry_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub do_auto_update: Option<bool>,
}

// ============================================================================
// Session connection info
// ============================================================================

/// Session status as returned by `get_kasm_status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KasmStatus {
    #[serde(default, deserialize_with = "nullable")]
    pub kasm_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub user_id: String,
    /// Path of the session viewer, relative to the deployment URL
    #[serde(default, deserialize_with = "nullable")]
    pub kasm_url: String,
    /// e.g. `starting`, `running`, `stopped`
    #[serde(default, deserialize_with = "nullable")]
    pub operational_status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub operational_message: String,
    /// Startup progress, 0-100
    #[serde(default, deserialize_with = "nullable")]
    pub operational_progress: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub hostname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub port: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub container_ip: String,
}

/// Body of `get_kasm_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KasmStatusQuery {
    pub kasm_id: String,
    pub user_id: String,
    #[serde(default)]
    pub skip_agent_check: bool,
}
