//! Workspace images
//!
//! Images are read by scanning `get_images`; there is no single-image
//! endpoint. The developer API cannot delete images either, so a destroy
//! keeps the record and points the operator at the admin UI.

use declarative::{DeleteSupport, Fetch, Field, Normalized, ObjectKind};
use kasmkit::{Image, ImagePayload, NO_TIME_LIMIT};
use serde::{Deserialize, Serialize};

/// Desired and persisted state of an image
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSpec {
    /// Docker image reference, e.g. `kasmweb/chrome:1.16.0`
    pub name: String,
    pub friendly_name: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub cores: Field<f64>,
    /// Bytes
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub memory: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub image_src: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub docker_registry: Field<String>,
    /// JSON text
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub run_config: Field<String>,
    /// JSON text
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub exec_config: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub restrict_to_network: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub persistent_profile_path: Field<String>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub session_time_limit: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub categories: Field<Vec<String>>,

    // Computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

pub struct ImageKind;

const DELETE_GUIDANCE: &str = "the developer API cannot delete workspace images; delete it from \
     Admin > Workspaces in the Kasm UI, then run `kasmctl refresh`";

impl ObjectKind for ImageKind {
    const NAME: &'static str = "image";
    const FETCH: Fetch = Fetch::ListScan;
    const DELETE: DeleteSupport = DeleteSupport::OutOfBand {
        guidance: DELETE_GUIDANCE,
    };
    const COMPUTED: &'static [&'static str] = &["image_id", "available"];

    type Spec = ImageSpec;
    type Remote = Image;
    type Payload = ImagePayload;

    fn create_payload(spec: &ImageSpec) -> ImagePayload {
        ImagePayload {
            image_id: None,
            name: spec.name.clone(),
            friendly_name: spec.friendly_name.clone(),
            description: spec.description.to_payload(),
            cores: spec.cores.to_payload(),
            memory: spec.memory.to_payload(),
            enabled: spec.enabled.to_payload(),
            image_src: spec.image_src.to_payload(),
            docker_registry: spec.docker_registry.to_payload(),
            run_config: spec.run_config.to_payload(),
            exec_config: spec.exec_config.to_payload(),
            restrict_to_network: spec.restrict_to_network.to_payload(),
            persistent_profile_path: spec.persistent_profile_path.to_payload(),
            session_time_limit: spec.session_time_limit.to_payload(),
            categories: spec.categories.to_payload(),
        }
    }

    fn update_payload(spec: &ImageSpec) -> ImagePayload {
        ImagePayload {
            cores: Some(spec.cores.value_or(0.0)),
            memory: Some(spec.memory.value_or(0)),
            enabled: Some(spec.enabled.value_or(false)),
            restrict_to_network: Some(spec.restrict_to_network.value_or(false)),
            session_time_limit: Some(spec.session_time_limit.value_or(NO_TIME_LIMIT)),
            categories: Some(spec.categories.to_present_list()),
            ..Self::create_payload(spec)
        }
    }

    fn from_remote(remote: &Image, prior: Option<&ImageSpec>) -> Normalized<ImageSpec> {
        let none = String::new();
        let state = ImageSpec {
            name: remote.name.clone(),
            friendly_name: remote.friendly_name.clone(),
            description: Field::from_remote(
                &remote.description,
                &none,
                prior.map(|p| &p.description),
            ),
            cores: Field::from_remote(&remote.cores, &0.0, prior.map(|p| &p.cores)),
            memory: Field::from_remote(&remote.memory, &0, prior.map(|p| &p.memory)),
            enabled: Field::from_remote(&remote.enabled, &false, prior.map(|p| &p.enabled)),
            image_src: Field::from_remote(&remote.image_src, &none, prior.map(|p| &p.image_src)),
            docker_registry: Field::from_remote(
                &remote.docker_registry,
                &none,
                prior.map(|p| &p.docker_registry),
            ),
            run_config: json_text_from_remote(&remote.run_config, prior.map(|p| &p.run_config)),
            exec_config: json_text_from_remote(
                &remote.exec_config,
                prior.map(|p| &p.exec_config),
            ),
            restrict_to_network: Field::from_remote(
                &remote.restrict_to_network,
                &false,
                prior.map(|p| &p.restrict_to_network),
            ),
            persistent_profile_path: Field::from_remote(
                &remote.persistent_profile_path,
                &none,
                prior.map(|p| &p.persistent_profile_path),
            ),
            session_time_limit: Field::from_remote(
                &remote.session_time_limit,
                &NO_TIME_LIMIT,
                prior.map(|p| &p.session_time_limit),
            ),
            categories: Field::list_from_remote(&remote.categories, prior.map(|p| &p.categories)),
            image_id: Some(remote.image_id.clone()),
            available: Some(remote.available),
        };
        Normalized::new(state)
    }

    fn remote_id(remote: &Image) -> String {
        remote.image_id.clone()
    }

    fn natural_key(spec: &ImageSpec) -> String {
        spec.name.clone()
    }

    fn matches_natural_key(spec: &ImageSpec, remote: &Image) -> bool {
        spec.name == remote.name
    }
}

/// Read a JSON-text field back. The server re-encodes the document, so a
/// declared text that parses to the same JSON is kept verbatim.
fn json_text_from_remote(remote: &str, prior: Option<&Field<String>>) -> Field<String> {
    if let Some(Field::Explicit(declared)) = prior {
        let same = match (
            serde_json::from_str::<serde_json::Value>(declared),
            serde_json::from_str::<serde_json::Value>(remote),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => declared == remote,
        };
        if same {
            return Field::Explicit(declared.clone());
        }
    }
    Field::from_remote(&remote.to_string(), &String::new(), prior)
}
