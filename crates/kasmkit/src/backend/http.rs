//! Kasm developer API backend over HTTP.
//!
//! Every call is a `POST /api/public/<endpoint>` with the API key and
//! secret in the JSON body. Failures come back either as a non-2xx status
//! or as a 200 with an `error_message` field.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{
    CastConfig, CastConfigPayload, ClientConfig, Image, ImagePayload, KasmStatus, KasmStatusQuery,
    Registry, RegistryPayload,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Longest slice of an unparseable body quoted in an error.
const MAX_ERROR_BODY: usize = 200;

/// HTTP backend.
///
/// # Example
///
/// ```no_run
/// use kasmkit::backend::Backend;
/// use kasmkit::backend::http::HttpBackend;
/// use kasmkit::ClientConfig;
///
/// let backend = HttpBackend::new(ClientConfig::new(
///     "https://kasm.example.com",
///     "key",
///     "secret",
/// ));
/// let images = backend.list_images().unwrap();
/// println!("Found {} images", images.len());
/// ```
pub struct HttpBackend {
    agent: ureq::Agent,
    config: ClientConfig,
}

#[derive(Serialize)]
struct Authenticated<'a> {
    api_key: &'a str,
    api_key_secret: &'a str,
    #[serde(flatten)]
    body: Value,
}

impl HttpBackend {
    /// Create a backend for one deployment.
    pub fn new(config: ClientConfig) -> Self {
        let mut builder = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false);
        if config.insecure {
            builder = builder.tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }
        let agent = ureq::Agent::new_with_config(builder.build());

        Self { agent, config }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/public/{}",
            self.config.url.trim_end_matches('/'),
            endpoint
        )
    }

    /// POST to an endpoint and return the checked JSON body.
    fn call(&self, endpoint: &str, body: Value) -> Result<Value> {
        let url = self.endpoint_url(endpoint);
        log::debug!("POST {url}");

        let request = Authenticated {
            api_key: &self.config.api_key,
            api_key_secret: &self.config.api_key_secret,
            body,
        };

        let mut response = self
            .agent
            .post(&url)
            .send_json(&request)
            .map_err(|e| transport_error(endpoint, e))?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| transport_error(endpoint, e))?;
        log::trace!("{endpoint} -> HTTP {status}: {text}");

        decode_response(endpoint, status, &text)
    }

    /// POST and decode one field of the response.
    fn call_for<T: DeserializeOwned>(&self, endpoint: &str, body: Value, field: &str) -> Result<T> {
        let mut value = self.call(endpoint, body)?;
        take_field(endpoint, &mut value, field)
    }
}

fn transport_error(endpoint: &str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::StatusCode(status) => Error::Status {
            endpoint: endpoint.to_string(),
            status,
            message: String::new(),
        },
        other => Error::Network {
            endpoint: endpoint.to_string(),
            message: other.to_string(),
        },
    }
}

/// Turn a raw response into a JSON body, or a categorized error.
fn decode_response(endpoint: &str, status: u16, text: &str) -> Result<Value> {
    let parsed: Option<Value> = serde_json::from_str(text).ok();
    let error_message = parsed
        .as_ref()
        .and_then(|v| v.get("error_message"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    if !(200..300).contains(&status) {
        let message = error_message.unwrap_or_else(|| text.chars().take(MAX_ERROR_BODY).collect());
        return Err(Error::Status {
            endpoint: endpoint.to_string(),
            status,
            message,
        });
    }

    if let Some(message) = error_message {
        return Err(Error::Api {
            endpoint: endpoint.to_string(),
            message,
        });
    }

    match parsed {
        Some(value) => Ok(value),
        None if text.trim().is_empty() => Ok(Value::Object(serde_json::Map::new())),
        None => Err(Error::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: format!(
                "body is not JSON: {}",
                text.chars().take(MAX_ERROR_BODY).collect::<String>()
            ),
        }),
    }
}

fn take_field<T: DeserializeOwned>(endpoint: &str, value: &mut Value, field: &str) -> Result<T> {
    let inner = value.get_mut(field).map(Value::take).ok_or_else(|| Error::InvalidResponse {
        endpoint: endpoint.to_string(),
        message: format!("missing field `{field}`"),
    })?;
    serde_json::from_value(inner).map_err(|e| Error::InvalidResponse {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

impl Backend for HttpBackend {
    fn list_images(&self) -> Result<Vec<Image>> {
        self.call_for("get_images", json!({}), "images")
    }

    fn create_image(&self, payload: &ImagePayload) -> Result<Image> {
        self.call_for("create_image", json!({ "target_image": payload }), "image")
    }

    fn update_image(&self, image_id: &str, payload: &ImagePayload) -> Result<Image> {
        let target = ImagePayload {
            image_id: Some(image_id.to_string()),
            ..payload.clone()
        };
        self.call_for("update_image", json!({ "target_image": target }), "image")
    }

    fn list_cast_configs(&self) -> Result<Vec<CastConfig>> {
        self.call_for("get_cast_configs", json!({}), "cast_configs")
    }

    fn get_cast_config(&self, cast_config_id: &str) -> Result<CastConfig> {
        let body = json!({ "target_cast_config": { "cast_config_id": cast_config_id } });
        let mut value = self.call("get_cast_config", body)?;
        // Unknown ids come back as an empty object rather than an error.
        if value.get("cast_config").is_none_or(Value::is_null) {
            return Err(Error::NotFound {
                kind: "cast_config",
                id: cast_config_id.to_string(),
            });
        }
        take_field("get_cast_config", &mut value, "cast_config")
    }

    fn create_cast_config(&self, payload: &CastConfigPayload) -> Result<CastConfig> {
        self.call_for(
            "create_cast_config",
            json!({ "target_cast_config": payload }),
            "cast_config",
        )
    }

    fn update_cast_config(
        &self,
        cast_config_id: &str,
        payload: &CastConfigPayload,
    ) -> Result<CastConfig> {
        let target = CastConfigPayload {
            cast_config_id: Some(cast_config_id.to_string()),
            ..payload.clone()
        };
        self.call_for(
            "update_cast_config",
            json!({ "target_cast_config": target }),
            "cast_config",
        )
    }

    fn delete_cast_config(&self, cast_config_id: &str) -> Result<()> {
        let body = json!({ "target_cast_config": { "cast_config_id": cast_config_id } });
        self.call("delete_cast_config", body).map(|_| ())
    }

    fn list_registries(&self) -> Result<Vec<Registry>> {
        self.call_for("get_registries", json!({}), "registries")
    }

    fn create_registry(&self, payload: &RegistryPayload) -> Result<()> {
        self.call("create_registry", json!({ "target_registry": payload }))
            .map(|_| ())
    }

    fn update_registry(&self, registry_id: &str, payload: &RegistryPayload) -> Result<Registry> {
        let target = RegistryPayload {
            registry_id: Some(registry_id.to_string()),
            ..payload.clone()
        };
        self.call_for(
            "update_registry",
            json!({ "target_registry": target }),
            "registry",
        )
    }

    fn delete_registry(&self, registry_id: &str) -> Result<()> {
        let body = json!({ "target_registry": { "registry_id": registry_id } });
        self.call("delete_registry", body).map(|_| ())
    }

    fn get_kasm_status(&self, query: &KasmStatusQuery) -> Result<KasmStatus> {
        let mut value = self.call("get_kasm_status", json!(query))?;

        // Connection details sit beside a nested `kasm` object; fold the
        // two into one status.
        let mut status: KasmStatus = match value.get_mut("kasm").map(Value::take) {
            Some(kasm) if !kasm.is_null() => {
                serde_json::from_value(kasm).map_err(|e| Error::InvalidResponse {
                    endpoint: "get_kasm_status".to_string(),
                    message: e.to_string(),
                })?
            }
            _ => {
                return Err(Error::NotFound {
                    kind: "kasm",
                    id: query.kasm_id.clone(),
                });
            }
        };
        let top: KasmStatus = serde_json::from_value(value).map_err(|e| Error::InvalidResponse {
            endpoint: "get_kasm_status".to_string(),
            message: e.to_string(),
        })?;

        for (slot, top_value) in [
            (&mut status.kasm_url, top.kasm_url),
            (&mut status.operational_status, top.operational_status),
            (&mut status.operational_message, top.operational_message),
        ] {
            if !top_value.is_empty() {
                *slot = top_value;
            }
        }
        if top.operational_progress != 0 {
            status.operational_progress = top.operational_progress;
        }
        if status.kasm_id.is_empty() {
            status.kasm_id.clone_from(&query.kasm_id);
        }
        if status.user_id.is_empty() {
            status.user_id.clone_from(&query.user_id);
        }
        Ok(status)
    }
}
