//! # Declarative
//!
//! A framework for reconciling remote objects against a declared state.
//!
//! This crate provides the core abstractions for declaring desired state,
//! reading actual state from a remote API, and converging the two.
//!
//! ## Core Concepts
//!
//! - **Field**: a tri-state desired value (unset, or explicit including zero)
//! - **ObjectKind**: one type of remote object and its field mapping
//! - **RemoteApi**: typed create/get/list/update/delete calls for a kind
//! - **Controller**: drives Create, Read, Update, Delete, and Import
//! - **Registry**: the controllers and data sources a host exposes
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{CancelToken, Controller, ReadOutcome};
//!
//! let controller = Controller::<RegistryKind, _>::new(api.clone());
//! let cancel = CancelToken::new();
//!
//! let created = controller.create(&desired, &cancel)?;
//! state.insert(created.id.clone(), created.state);
//!
//! match controller.read(&created.id, state.get(&created.id), &cancel)? {
//!     ReadOutcome::Present(applied) => state.insert(applied.id, applied.state),
//!     ReadOutcome::Gone => state.remove(&created.id),
//! };
//! ```
//!
//! ## Injection Points
//!
//! - [`RemoteApi`] / [`LookupApi`]: the remote client, one per kind
//! - [`Sleeper`]: the pause between asynchronous-create lookups
//! - [`CancelToken`]: caller-supplied cancellation and deadline
//!
//! Controllers hold no global state; the client is passed in at
//! construction.

pub mod cancel;
pub mod controller;
pub mod datasource;
pub mod diff;
pub mod error;
pub mod field;
pub mod lookup;
pub mod registry;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use cancel::{CancelToken, Sleeper, ThreadSleeper};
pub use controller::Controller;
pub use datasource::{DataSource, Lookup, LookupApi, LookupKind};
pub use diff::{Action, DiffSummary, FieldChange, ResourceDiff, diff_fields, group_by_kind};
pub use error::{ClassifiedError, Error, ErrorKind, Result};
pub use field::Field;
pub use lookup::{LookupPolicy, find_by_natural_key};
pub use registry::{ManagedResource, Registry};
pub use resource::{CreateResponse, DeleteSupport, Fetch, ObjectKind, RemoteApi};
pub use types::{
    Applied, DeleteOutcome, Discrepancy, LifecycleState, Normalized, Operation, ReadOutcome,
    Warning,
};
