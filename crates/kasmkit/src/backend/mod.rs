//! Backend abstraction for Kasm API operations.
//!
//! The [`Backend`] trait defines the typed calls of the developer API,
//! allowing for different implementations (real HTTP, fakes for testing).

pub mod http;

use crate::error::Result;
use crate::types::{
    CastConfig, CastConfigPayload, Image, ImagePayload, KasmStatus, KasmStatusQuery, Registry,
    RegistryPayload,
};

/// Backend trait for Kasm API operations.
///
/// There is no single-image fetch and no image deletion in the developer
/// API; callers list images and delete them from the admin UI.
pub trait Backend: Send + Sync {
    /// List all workspace images.
    fn list_images(&self) -> Result<Vec<Image>>;

    /// Create an image; the API returns it.
    fn create_image(&self, payload: &ImagePayload) -> Result<Image>;

    /// Replace an image's settings.
    fn update_image(&self, image_id: &str, payload: &ImagePayload) -> Result<Image>;

    /// List all casting configurations.
    fn list_cast_configs(&self) -> Result<Vec<CastConfig>>;

    /// Fetch one casting configuration.
    fn get_cast_config(&self, cast_config_id: &str) -> Result<CastConfig>;

    /// Create a casting configuration; the API returns it.
    fn create_cast_config(&self, payload: &CastConfigPayload) -> Result<CastConfig>;

    /// Replace a casting configuration's settings.
    fn update_cast_config(
        &self,
        cast_config_id: &str,
        payload: &CastConfigPayload,
    ) -> Result<CastConfig>;

    /// Delete a casting configuration.
    fn delete_cast_config(&self, cast_config_id: &str) -> Result<()>;

    /// List all workspace registries.
    fn list_registries(&self) -> Result<Vec<Registry>>;

    /// Add a registry. The API only acknowledges the request; the registry
    /// shows up in [`Backend::list_registries`] once its metadata is fetched.
    fn create_registry(&self, payload: &RegistryPayload) -> Result<()>;

    /// Replace a registry's settings.
    fn update_registry(&self, registry_id: &str, payload: &RegistryPayload) -> Result<Registry>;

    /// Remove a registry.
    fn delete_registry(&self, registry_id: &str) -> Result<()>;

    /// Status and connection info of a running session.
    fn get_kasm_status(&self, query: &KasmStatusQuery) -> Result<KasmStatus>;
}
