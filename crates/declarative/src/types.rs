//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation attempted against a remote object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
    Lookup,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
            Self::Lookup => "lookup",
        };
        f.write_str(name)
    }
}

/// Lifecycle of one object instance as seen by a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Absent,
    Creating,
    Present,
    Updating,
    Deleting,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A server value that was not applied over a declared value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub field: &'static str,
    pub declared: String,
    pub remote: String,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: declared {:?}, server reports {:?} (keeping declared value)",
            self.field, self.declared, self.remote
        )
    }
}

/// Output of the Field Normalizer for one remote object
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<S> {
    pub state: S,
    pub discrepancies: Vec<Discrepancy>,
}

impl<S> Normalized<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            discrepancies: Vec::new(),
        }
    }
}

/// A remote object that now matches its desired state
#[derive(Debug, Clone, PartialEq)]
pub struct Applied<S> {
    /// Identifier assigned by the remote system
    pub id: String,
    /// Canonical state to persist
    pub state: S,
    /// Server values that were noted but not applied
    pub discrepancies: Vec<Discrepancy>,
}

impl<S> Applied<S> {
    /// Convert the state while keeping id and discrepancies.
    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> Applied<T> {
        Applied {
            id: self.id,
            state: f(self.state),
            discrepancies: self.discrepancies,
        }
    }

    pub fn try_map<T, E>(self, f: impl FnOnce(S) -> Result<T, E>) -> Result<Applied<T>, E> {
        Ok(Applied {
            id: self.id,
            state: f(self.state)?,
            discrepancies: self.discrepancies,
        })
    }
}

/// Result of refreshing an object
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<S> {
    /// The object exists; persist the refreshed state
    Present(Applied<S>),
    /// The object no longer exists; drop local state
    Gone,
}

impl<S> ReadOutcome<S> {
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone)
    }
}

/// Advisory surfaced to the caller without failing the operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub summary: String,
    pub detail: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.summary, self.detail)
    }
}

/// Result of a delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The object was deleted; drop local state
    Removed,
    /// The object was already gone; drop local state
    AlreadyAbsent(Warning),
    /// The object still exists remotely; keep local state
    Retained(Warning),
}

impl DeleteOutcome {
    /// Whether local state should be dropped
    pub fn drops_state(&self) -> bool {
        !matches!(self, Self::Retained(_))
    }

    pub fn warning(&self) -> Option<&Warning> {
        match self {
            Self::Removed => None,
            Self::AlreadyAbsent(w) | Self::Retained(w) => Some(w),
        }
    }
}
