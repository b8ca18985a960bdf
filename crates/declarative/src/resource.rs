//! Object kinds and the remote client seam
//!
//! An [`ObjectKind`] describes one type of remote object: its sparse desired
//! state, its dense remote form, and the Field Normalizer between them.
//! A [`RemoteApi`] performs the calls. Controllers combine the two and never
//! depend on a concrete client, so fakes and recorders are substitutable.

use std::fmt;

use crate::error::ClassifiedError;
use crate::types::Normalized;

/// How a kind is fetched during Read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// `RemoteApi::get` by id
    ById,
    /// `RemoteApi::list`, then select the object whose id matches
    ListScan,
}

/// Whether Delete is available through the API for a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSupport {
    Supported,
    /// Deletion has to happen elsewhere; the object stays in local state
    OutOfBand { guidance: &'static str },
}

/// Answer of a create call
#[derive(Debug, Clone, PartialEq)]
pub enum CreateResponse<R> {
    /// The created object was returned synchronously
    Object(R),
    /// The request was accepted but the object is not returned yet
    Accepted,
}

/// One type of remote object and its field mapping.
///
/// # Example
///
/// ```ignore
/// struct ImageKind;
///
/// impl ObjectKind for ImageKind {
///     const NAME: &'static str = "image";
///     const FETCH: Fetch = Fetch::ListScan;
///     type Spec = ImageSpec;
///     type Remote = kasmkit::Image;
///     type Payload = kasmkit::ImagePayload;
///     // ...
/// }
/// ```
pub trait ObjectKind: Send + Sync + 'static {
    /// Kind name used in messages and for registry lookup
    const NAME: &'static str;

    /// Read strategy
    const FETCH: Fetch = Fetch::ById;

    /// Delete capability
    const DELETE: DeleteSupport = DeleteSupport::Supported;

    /// Fields only the server sets; a desired state may not declare them
    const COMPUTED: &'static [&'static str] = &[];

    /// Sparse desired (and persisted) state
    type Spec: Clone + PartialEq + fmt::Debug + Send + Sync;

    /// Dense server-side representation
    type Remote: Clone + fmt::Debug + Send + Sync;

    /// Request body for create and update
    type Payload: fmt::Debug + Send + Sync;

    /// Payload for Create: explicit fields only.
    ///
    /// Never reads computed-only fields.
    fn create_payload(spec: &Self::Spec) -> Self::Payload;

    /// Payload for Update: the full desired state.
    ///
    /// Defaults to the create payload; kinds whose API has no partial
    /// patch override this to send resolved defaults.
    fn update_payload(spec: &Self::Spec) -> Self::Payload {
        Self::create_payload(spec)
    }

    /// Normalize a remote object. `prior` is the last caller-declared
    /// state, if one is known.
    fn from_remote(remote: &Self::Remote, prior: Option<&Self::Spec>) -> Normalized<Self::Spec>;

    /// ObjectID of a remote object
    fn remote_id(remote: &Self::Remote) -> String;

    /// Natural key of a desired state, used in messages and async lookup
    fn natural_key(spec: &Self::Spec) -> String;

    /// Whether a remote object matches the natural key of a desired state
    fn matches_natural_key(spec: &Self::Spec, remote: &Self::Remote) -> bool;
}

/// Typed remote operations for one kind.
pub trait RemoteApi<K: ObjectKind>: Send + Sync {
    fn create(&self, payload: &K::Payload) -> Result<CreateResponse<K::Remote>, ClassifiedError>;

    fn get(&self, id: &str) -> Result<K::Remote, ClassifiedError>;

    fn list(&self) -> Result<Vec<K::Remote>, ClassifiedError>;

    fn update(&self, id: &str, payload: &K::Payload) -> Result<K::Remote, ClassifiedError>;

    fn delete(&self, id: &str) -> Result<(), ClassifiedError>;
}

impl<K: ObjectKind, T: RemoteApi<K> + ?Sized> RemoteApi<K> for &T {
    fn create(&self, payload: &K::Payload) -> Result<CreateResponse<K::Remote>, ClassifiedError> {
        (**self).create(payload)
    }

    fn get(&self, id: &str) -> Result<K::Remote, ClassifiedError> {
        (**self).get(id)
    }

    fn list(&self) -> Result<Vec<K::Remote>, ClassifiedError> {
        (**self).list()
    }

    fn update(&self, id: &str, payload: &K::Payload) -> Result<K::Remote, ClassifiedError> {
        (**self).update(id, payload)
    }

    fn delete(&self, id: &str) -> Result<(), ClassifiedError> {
        (**self).delete(id)
    }
}
