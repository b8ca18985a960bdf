//! Error taxonomy for reconciliation.
//!
//! Remote clients return a [`ClassifiedError`]: a closed [`ErrorKind`] plus
//! the server's message. Controllers wrap it into an [`Error`] carrying the
//! operation, the object kind, and the identifier involved.

use thiserror::Error;

use crate::types::Operation;

/// Semantic category of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Object does not exist remotely
    NotFound,
    /// Caller lacks permission
    Unauthorized,
    /// Payload invalid for the object's current state
    Conflict,
    /// Network or availability blip
    Transient,
    /// Anything else
    Unknown,
}

impl ErrorKind {
    /// Whether this kind may be retried inside the bounded lookup loop.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "object not found",
            Self::Unauthorized => "not authorized",
            Self::Conflict => "conflict",
            Self::Transient => "temporarily unavailable",
            Self::Unknown => "unexpected error",
        }
    }

    /// Actionable advice for the operator, where there is one.
    pub fn advice(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized => {
                Some("check the API key, its secret, and the key's permissions")
            }
            Self::Transient => Some("the server may be overloaded or restarting; try again"),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// A failure reported by a remote client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }
}

/// Errors surfaced by controllers and the registry.
#[derive(Debug, Error)]
pub enum Error {
    /// A classified remote failure, with context
    #[error("{operation} {object_kind} {identifier:?} failed: {}{}", .source, advice_suffix(.source.kind))]
    Remote {
        operation: Operation,
        object_kind: &'static str,
        identifier: String,
        #[source]
        source: ClassifiedError,
    },

    /// The object was not queryable after an asynchronous create
    #[error(
        "create {object_kind} {natural_key:?} failed: object did not appear after {attempts} attempts"
    )]
    LookupExhausted {
        object_kind: &'static str,
        natural_key: String,
        attempts: u32,
    },

    /// The caller cancelled the operation or its deadline passed
    #[error("{operation} {object_kind} {identifier:?} cancelled")]
    Cancelled {
        operation: Operation,
        object_kind: &'static str,
        identifier: String,
    },

    /// No controller or data source is registered under this name
    #[error("unknown kind {0:?}")]
    UnknownKind(String),

    /// A desired state declares a field only the server sets
    #[error("{object_kind}: {field:?} is computed by the server and cannot be declared")]
    ComputedField {
        object_kind: &'static str,
        field: &'static str,
    },

    /// State could not be converted to or from its JSON form
    #[error("{object_kind} {identifier:?}: invalid state: {source}")]
    InvalidState {
        object_kind: &'static str,
        identifier: String,
        #[source]
        source: serde_json::Error,
    },
}

fn advice_suffix(kind: ErrorKind) -> String {
    kind.advice()
        .map(|advice| format!(" ({advice})"))
        .unwrap_or_default()
}

impl Error {
    pub fn remote(
        operation: Operation,
        object_kind: &'static str,
        identifier: impl Into<String>,
        source: ClassifiedError,
    ) -> Self {
        Self::Remote {
            operation,
            object_kind,
            identifier: identifier.into(),
            source,
        }
    }

    /// The classified kind, for remote failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Remote { source, .. } => Some(source.kind),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == Some(ErrorKind::Unauthorized)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
