//! Binding of the Kasm client to the controllers' client seam
//!
//! One [`KasmApi`] value serves every kind. Client errors are mapped onto
//! the closed [`ErrorKind`] set here and nowhere else.

use declarative::{ClassifiedError, CreateResponse, ErrorKind, LookupApi, RemoteApi};
use kasmkit::{Client, ErrorCategory};

use super::cast_config::CastConfigKind;
use super::connection_info::ConnectionInfoKind;
use super::image::ImageKind;
use super::registry::RegistryKind;

/// Kasm developer API, as seen by controllers and data sources
#[derive(Clone)]
pub struct KasmApi {
    client: Client,
}

impl KasmApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Map a client error onto the controller taxonomy.
pub fn classify(err: &kasmkit::Error) -> ClassifiedError {
    let kind = match err.category() {
        ErrorCategory::Network => ErrorKind::Transient,
        ErrorCategory::NotFound => ErrorKind::NotFound,
        ErrorCategory::Permission => ErrorKind::Unauthorized,
        ErrorCategory::Conflict => ErrorKind::Conflict,
        ErrorCategory::Format | ErrorCategory::Other => ErrorKind::Unknown,
    };
    ClassifiedError::new(kind, err.to_string())
}

fn call<T>(result: kasmkit::Result<T>) -> Result<T, ClassifiedError> {
    result.map_err(|e| classify(&e))
}

impl RemoteApi<ImageKind> for KasmApi {
    fn create(
        &self,
        payload: &kasmkit::ImagePayload,
    ) -> Result<CreateResponse<kasmkit::Image>, ClassifiedError> {
        call(self.client.create_image(payload)).map(CreateResponse::Object)
    }

    fn get(&self, id: &str) -> Result<kasmkit::Image, ClassifiedError> {
        call(self.client.get_image(id))
    }

    fn list(&self) -> Result<Vec<kasmkit::Image>, ClassifiedError> {
        call(self.client.list_images())
    }

    fn update(
        &self,
        id: &str,
        payload: &kasmkit::ImagePayload,
    ) -> Result<kasmkit::Image, ClassifiedError> {
        call(self.client.update_image(id, payload))
    }

    // Images declare out-of-band deletion, so controllers never get here.
    fn delete(&self, id: &str) -> Result<(), ClassifiedError> {
        Err(ClassifiedError::unknown(format!(
            "image {id}: deletion is not available through the developer API"
        )))
    }
}

impl RemoteApi<CastConfigKind> for KasmApi {
    fn create(
        &self,
        payload: &kasmkit::CastConfigPayload,
    ) -> Result<CreateResponse<kasmkit::CastConfig>, ClassifiedError> {
        call(self.client.create_cast_config(payload)).map(CreateResponse::Object)
    }

    fn get(&self, id: &str) -> Result<kasmkit::CastConfig, ClassifiedError> {
        call(self.client.get_cast_config(id))
    }

    fn list(&self) -> Result<Vec<kasmkit::CastConfig>, ClassifiedError> {
        call(self.client.list_cast_configs())
    }

    fn update(
        &self,
        id: &str,
        payload: &kasmkit::CastConfigPayload,
    ) -> Result<kasmkit::CastConfig, ClassifiedError> {
        call(self.client.update_cast_config(id, payload))
    }

    fn delete(&self, id: &str) -> Result<(), ClassifiedError> {
        call(self.client.delete_cast_config(id))
    }
}

impl RemoteApi<RegistryKind> for KasmApi {
    fn create(
        &self,
        payload: &kasmkit::RegistryPayload,
    ) -> Result<CreateResponse<kasmkit::Registry>, ClassifiedError> {
        call(self.client.create_registry(payload)).map(|()| CreateResponse::Accepted)
    }

    fn get(&self, id: &str) -> Result<kasmkit::Registry, ClassifiedError> {
        call(self.client.get_registry(id))
    }

    fn list(&self) -> Result<Vec<kasmkit::Registry>, ClassifiedError> {
        call(self.client.list_registries())
    }

    fn update(
        &self,
        id: &str,
        payload: &kasmkit::RegistryPayload,
    ) -> Result<kasmkit::Registry, ClassifiedError> {
        call(self.client.update_registry(id, payload))
    }

    fn delete(&self, id: &str) -> Result<(), ClassifiedError> {
        call(self.client.delete_registry(id))
    }
}

impl LookupApi<ConnectionInfoKind> for KasmApi {
    fn lookup(
        &self,
        query: &kasmkit::KasmStatusQuery,
    ) -> Result<kasmkit::KasmStatus, ClassifiedError> {
        call(self.client.get_kasm_status(query))
    }
}
