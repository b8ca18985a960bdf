//! # kasmkit
//!
//! Pure Rust client for the Kasm Workspaces developer API.
//!
//! This crate provides:
//! - Dense wire models for images, casting configurations, and registries
//! - Sparse request payloads that only carry the fields a caller set
//! - Error categories shared by status-code and `error_message` failures
//! - A [`Backend`](backend::Backend) trait so callers can swap in fakes
//!
//! ## Example
//!
//! ```no_run
//! use kasmkit::{Client, ClientConfig};
//!
//! let client = Client::new(ClientConfig::new(
//!     "https://kasm.example.com",
//!     "api-key",
//!     "api-key-secret",
//! ));
//!
//! for image in client.list_images().expect("Failed to list images") {
//!     println!("{} ({})", image.friendly_name, image.name);
//! }
//! ```

pub mod backend;
pub mod error;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{
    CastConfig, CastConfigPayload, ClientConfig, Image, ImagePayload, KasmStatus, KasmStatusQuery,
    NO_TIME_LIMIT, Registry, RegistryPayload,
};

use backend::{Backend, http::HttpBackend};
use std::sync::Arc;

/// High-level client for the Kasm developer API.
///
/// The client wraps a backend and adds the lookups the API lacks, such as
/// fetching one image or registry by id. Cloning is cheap; clones share
/// the backend.
#[derive(Clone)]
pub struct Client {
    backend: Arc<dyn Backend>,
}

impl Client {
    /// Create a client that talks HTTP to one deployment.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            backend: Arc::new(HttpBackend::new(config)),
        }
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// List all workspace images.
    pub fn list_images(&self) -> Result<Vec<Image>> {
        self.backend.list_images()
    }

    /// Find one image by scanning the image list.
    pub fn get_image(&self, image_id: &str) -> Result<Image> {
        self.list_images()?
            .into_iter()
            .find(|image| image.image_id == image_id)
            .ok_or_else(|| Error::NotFound {
                kind: "image",
                id: image_id.to_string(),
            })
    }

    /// Create an image.
    pub fn create_image(&self, payload: &ImagePayload) -> Result<Image> {
        self.backend.create_image(payload)
    }

    /// Update an image.
    pub fn update_image(&self, image_id: &str, payload: &ImagePayload) -> Result<Image> {
        self.backend.update_image(image_id, payload)
    }

    // =========================================================================
    // Casting configurations
    // =========================================================================

    /// List all casting configurations.
    pub fn list_cast_configs(&self) -> Result<Vec<CastConfig>> {
        self.backend.list_cast_configs()
    }

    /// Fetch one casting configuration.
    pub fn get_cast_config(&self, cast_config_id: &str) -> Result<CastConfig> {
        self.backend.get_cast_config(cast_config_id)
    }

    /// Create a casting configuration.
    pub fn create_cast_config(&self, payload: &CastConfigPayload) -> Result<CastConfig> {
        self.backend.create_cast_config(payload)
    }

    /// Update a casting configuration.
    pub fn update_cast_config(
        &self,
        cast_config_id: &str,
        payload: &CastConfigPayload,
    ) -> Result<CastConfig> {
        self.backend.update_cast_config(cast_config_id, payload)
    }

    /// Delete a casting configuration.
    pub fn delete_cast_config(&self, cast_config_id: &str) -> Result<()> {
        self.backend.delete_cast_config(cast_config_id)
    }

    // =========================================================================
    // Registries
    // =========================================================================

    /// List all workspace registries.
    pub fn list_registries(&self) -> Result<Vec<Registry>> {
        self.backend.list_registries()
    }

    /// Find one registry by scanning the registry list.
    pub fn get_registry(&self, registry_id: &str) -> Result<Registry> {
        self.list_registries()?
            .into_iter()
            .find(|registry| registry.registry_id == registry_id)
            .ok_or_else(|| Error::NotFound {
                kind: "registry",
                id: registry_id.to_string(),
            })
    }

    /// Add a registry. It only becomes visible once the server has
    /// fetched its metadata.
    pub fn create_registry(&self, payload: &RegistryPayload) -> Result<()> {
        self.backend.create_registry(payload)
    }

    /// Update a registry.
    pub fn update_registry(&self, registry_id: &str, payload: &RegistryPayload) -> Result<Registry> {
        self.backend.update_registry(registry_id, payload)
    }

    /// Remove a registry.
    pub fn delete_registry(&self, registry_id: &str) -> Result<()> {
        self.backend.delete_registry(registry_id)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Status and connection info of a running session.
    pub fn get_kasm_status(&self, query: &KasmStatusQuery) -> Result<KasmStatus> {
        self.backend.get_kasm_status(query)
    }
}
