//! Resource Registry
//!
//! Composes independently defined controllers and data sources into the
//! set a host exposes. Entries are kept in registration order; the first
//! entry registered under a name wins.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::controller::Controller;
use crate::datasource::DataSource;
use crate::error::{Error, Result};
use crate::resource::{ObjectKind, RemoteApi};
use crate::types::{Applied, DeleteOutcome, ReadOutcome};

/// Object-safe, JSON-valued view of a [`Controller`].
pub trait ManagedResource: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Decode a desired state and return its canonical JSON form.
    ///
    /// Declaring a computed field is an error. Canonical forms compare
    /// equal to persisted state for the same declared values (e.g. `2` and
    /// `2.0` for a float field).
    fn validate(&self, desired: &Value) -> Result<Value>;

    fn create(&self, desired: &Value, cancel: &CancelToken) -> Result<Applied<Value>>;

    fn read(
        &self,
        id: &str,
        prior: Option<&Value>,
        cancel: &CancelToken,
    ) -> Result<ReadOutcome<Value>>;

    fn update(&self, id: &str, desired: &Value, cancel: &CancelToken) -> Result<Applied<Value>>;

    fn delete(&self, id: &str, cancel: &CancelToken) -> Result<DeleteOutcome>;

    fn import(&self, id: &str, cancel: &CancelToken) -> Result<Applied<Value>>;
}

fn decode<K: ObjectKind>(value: &Value, identifier: &str) -> Result<K::Spec>
where
    K::Spec: DeserializeOwned,
{
    serde_json::from_value(value.clone()).map_err(|source| Error::InvalidState {
        object_kind: K::NAME,
        identifier: identifier.to_string(),
        source,
    })
}

fn encode<K: ObjectKind>(applied: Applied<K::Spec>) -> Result<Applied<Value>>
where
    K::Spec: Serialize,
{
    let identifier = applied.id.clone();
    applied.try_map(|state| {
        serde_json::to_value(state).map_err(|source| Error::InvalidState {
            object_kind: K::NAME,
            identifier,
            source,
        })
    })
}

impl<K, C> ManagedResource for Controller<K, C>
where
    K: ObjectKind,
    K::Spec: Serialize + DeserializeOwned,
    C: RemoteApi<K>,
{
    fn kind(&self) -> &'static str {
        K::NAME
    }

    fn validate(&self, desired: &Value) -> Result<Value> {
        if let Some(field) = K::COMPUTED
            .iter()
            .copied()
            .find(|field| desired.get(field).is_some_and(|v| !v.is_null()))
        {
            return Err(Error::ComputedField {
                object_kind: K::NAME,
                field,
            });
        }
        let spec = decode::<K>(desired, "<desired>")?;
        serde_json::to_value(spec).map_err(|source| Error::InvalidState {
            object_kind: K::NAME,
            identifier: "<desired>".to_string(),
            source,
        })
    }

    fn create(&self, desired: &Value, cancel: &CancelToken) -> Result<Applied<Value>> {
        let spec = decode::<K>(desired, "<desired>")?;
        encode::<K>(Controller::create(self, &spec, cancel)?)
    }

    fn read(
        &self,
        id: &str,
        prior: Option<&Value>,
        cancel: &CancelToken,
    ) -> Result<ReadOutcome<Value>> {
        let prior = prior.map(|p| decode::<K>(p, id)).transpose()?;
        match Controller::read(self, id, prior.as_ref(), cancel)? {
            ReadOutcome::Present(applied) => Ok(ReadOutcome::Present(encode::<K>(applied)?)),
            ReadOutcome::Gone => Ok(ReadOutcome::Gone),
        }
    }

    fn update(&self, id: &str, desired: &Value, cancel: &CancelToken) -> Result<Applied<Value>> {
        let spec = decode::<K>(desired, id)?;
        encode::<K>(Controller::update(self, id, &spec, cancel)?)
    }

    fn delete(&self, id: &str, cancel: &CancelToken) -> Result<DeleteOutcome> {
        Controller::delete(self, id, cancel)
    }

    fn import(&self, id: &str, cancel: &CancelToken) -> Result<Applied<Value>> {
        encode::<K>(Controller::import(self, id, cancel)?)
    }
}

/// Registered controllers and data sources, in registration order.
#[derive(Default)]
pub struct Registry {
    resources: Vec<Box<dyn ManagedResource>>,
    data_sources: Vec<Box<dyn DataSource>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_resource(&mut self, resource: impl ManagedResource + 'static) -> &mut Self {
        log::trace!("Registering resource kind {}", resource.kind());
        self.resources.push(Box::new(resource));
        self
    }

    pub fn register_data_source(&mut self, source: impl DataSource + 'static) -> &mut Self {
        log::trace!("Registering data source {}", source.name());
        self.data_sources.push(Box::new(source));
        self
    }

    /// Controller registered under `kind`
    pub fn resource(&self, kind: &str) -> Result<&dyn ManagedResource> {
        self.resources
            .iter()
            .find(|r| r.kind() == kind)
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))
    }

    /// Data source registered under `name`
    pub fn data_source(&self, name: &str) -> Result<&dyn DataSource> {
        self.data_sources
            .iter()
            .find(|d| d.name() == name)
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::UnknownKind(name.to_string()))
    }

    pub fn resource_kinds(&self) -> Vec<&'static str> {
        self.resources.iter().map(|r| r.kind()).collect()
    }

    pub fn data_source_names(&self) -> Vec<&'static str> {
        self.data_sources.iter().map(|d| d.name()).collect()
    }
}
