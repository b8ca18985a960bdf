//! Error types for Kasm API operations.
//!
//! Errors are categorized so callers can decide what is retryable and what
//! feedback to give. The API reports failures both through HTTP status
//! codes and through an `error_message` field in a 200 response, so both
//! paths end up in the same categories.

use thiserror::Error;

/// Categories of Kasm API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection, timeout, or server-side availability problem (retryable)
    Network,
    /// The referenced object does not exist
    NotFound,
    /// Missing or insufficient credentials
    Permission,
    /// Request rejected for the object's current state
    Conflict,
    /// Response could not be decoded
    Format,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Object not found",
            Self::Permission => "Permission denied",
            Self::Conflict => "Request rejected",
            Self::Format => "Unexpected response",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check the deployment URL and that the API server is reachable",
            Self::NotFound => "Verify the id, or refresh state if the object was deleted",
            Self::Permission => "Check the API key, its secret, and the key's permissions",
            Self::Conflict => "Fix the rejected field and apply again",
            Self::Format => "Check that the URL points at a Kasm Workspaces deployment",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during Kasm API calls.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure (connection, DNS, TLS, timeout)
    #[error("network error calling {endpoint}: {message}")]
    Network {
        /// API endpoint that was called
        endpoint: String,
        /// Underlying transport error
        message: String,
    },

    /// Non-success HTTP status
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        /// API endpoint that was called
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The API answered with an `error_message`
    #[error("{endpoint}: {message}")]
    Api {
        /// API endpoint that was called
        endpoint: String,
        /// `error_message` from the response body
        message: String,
    },

    /// A list call did not contain the requested object
    #[error("{kind} {id} not found")]
    NotFound {
        /// Object kind, e.g. `image`
        kind: &'static str,
        /// Requested id
        id: String,
    },

    /// Response body could not be decoded
    #[error("invalid response from {endpoint}: {message}")]
    InvalidResponse {
        /// API endpoint that was called
        endpoint: String,
        /// Decoding error
        message: String,
    },
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::Status { status, .. } => category_for_status(*status),
            Error::Api { message, .. } => category_for_message(message),
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::InvalidResponse { .. } => ErrorCategory::Format,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Message without the endpoint prefix, for callers that add their own
    /// context.
    pub fn detail(&self) -> String {
        match self {
            Error::Network { message, .. }
            | Error::Api { message, .. }
            | Error::InvalidResponse { message, .. } => message.clone(),
            Error::Status {
                status, message, ..
            } => format!("HTTP {status}: {message}"),
            Error::NotFound { .. } => self.to_string(),
        }
    }
}

fn category_for_status(status: u16) -> ErrorCategory {
    match status {
        401 | 403 => ErrorCategory::Permission,
        404 => ErrorCategory::NotFound,
        400 | 409 | 422 => ErrorCategory::Conflict,
        408 | 429 | 500..=599 => ErrorCategory::Network,
        _ => ErrorCategory::Other,
    }
}

/// Classify an `error_message` returned with a 200 response.
fn category_for_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();

    if lower.contains("unauthorized")
        || lower.contains("access denied")
        || lower.contains("permission")
        || lower.contains("invalid api key")
        || lower.contains("invalid credentials")
    {
        return ErrorCategory::Permission;
    }

    if lower.contains("not found")
        || lower.contains("does not exist")
        || lower.contains("no such")
        || lower.contains("unknown id")
    {
        return ErrorCategory::NotFound;
    }

    if lower.contains("already exists")
        || lower.contains("duplicate")
        || lower.contains("conflict")
        || lower.contains("invalid")
        || lower.contains("required")
    {
        return ErrorCategory::Conflict;
    }

    if lower.contains("timed out") || lower.contains("unavailable") || lower.contains("try again")
    {
        return ErrorCategory::Network;
    }

    ErrorCategory::Other
}

/// Result type for Kasm API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> Error {
        Error::Status {
            endpoint: "get_images".to_string(),
            status: code,
            message: String::new(),
        }
    }

    fn api(message: &str) -> Error {
        Error::Api {
            endpoint: "create_cast_config".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_status_categories() {
        assert_eq!(status(401).category(), ErrorCategory::Permission);
        assert_eq!(status(403).category(), ErrorCategory::Permission);
        assert_eq!(status(404).category(), ErrorCategory::NotFound);
        assert_eq!(status(409).category(), ErrorCategory::Conflict);
        assert_eq!(status(503).category(), ErrorCategory::Network);
        assert_eq!(status(418).category(), ErrorCategory::Other);
        assert!(status(502).is_retryable());
        assert!(!status(404).is_retryable());
    }

    #[test]
    fn test_api_message_categories() {
        assert_eq!(
            api("Unauthorized access attempt").category(),
            ErrorCategory::Permission
        );
        assert_eq!(
            api("Cast config does not exist").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            api("A casting config with this key already exists").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(api("Something odd").category(), ErrorCategory::Other);
    }

    #[test]
    fn test_detail_strips_endpoint() {
        assert_eq!(api("Invalid image_id").detail(), "Invalid image_id");
        assert!(status(500).detail().starts_with("HTTP 500"));
    }
}
