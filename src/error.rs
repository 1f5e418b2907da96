//! Error types for collaborator calls
//!
//! Errors are classified by how long they are likely to last:
//! - Transient: network issues, timeouts, 5xx answers
//! - Permanent: 4xx answers, unknown login, payloads that do not decode
//!
//! Nothing here is retried. Pages degrade and record a [`PageDiagnostic`].

use thiserror::Error;

/// Failure of a call to the data-access service or a partner service.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Network error calling {service}: {message}")]
    Network { service: &'static str, message: String },

    #[error("{service} did not answer within {secs} seconds")]
    Timeout { service: &'static str, secs: u64 },

    #[error("{service} answered {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to decode {service} response: {message}")]
    Decode { service: &'static str, message: String },
}

impl CollaboratorError {
    /// Map a reqwest transport error, keeping timeouts distinct.
    pub fn from_transport(service: &'static str, err: reqwest::Error, timeout_secs: Option<u64>) -> Self {
        match timeout_secs {
            Some(secs) if err.is_timeout() => CollaboratorError::Timeout { service, secs },
            _ if err.is_decode() => CollaboratorError::Decode {
                service,
                message: err.to_string(),
            },
            _ => CollaboratorError::Network {
                service,
                message: err.to_string(),
            },
        }
    }

    /// Returns true if the same call could succeed a moment later.
    pub fn is_transient(&self) -> bool {
        match self {
            CollaboratorError::Network { .. } | CollaboratorError::Timeout { .. } => true,
            CollaboratorError::Status { status, .. } => *status >= 500,
            CollaboratorError::NotFound(_) | CollaboratorError::Decode { .. } => false,
        }
    }

    /// Get a user-facing recovery hint
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CollaboratorError::Network { .. } => "Check that the service is running and reachable.",
            CollaboratorError::Timeout { .. } => "The service is slow to answer. Reload the page.",
            CollaboratorError::Status { status, .. } if *status >= 500 => {
                "The service reported an internal error. Reload the page later."
            }
            CollaboratorError::Status { .. } => "Check the service URLs in ~/.sitepulse/config.json",
            CollaboratorError::NotFound(_) => "Check the identifier and try again.",
            CollaboratorError::Decode { .. } => "The service returned an unexpected format.",
        }
    }
}

/// Serializable summary attached to a degraded page.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDiagnostic {
    pub message: String,
    pub error_type: ErrorType,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Transient,
    Permanent,
}

impl From<&CollaboratorError> for PageDiagnostic {
    fn from(err: &CollaboratorError) -> Self {
        let error_type = if err.is_transient() {
            ErrorType::Transient
        } else {
            ErrorType::Permanent
        };

        PageDiagnostic {
            message: err.to_string(),
            error_type,
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let upstream = CollaboratorError::Status {
            service: "data",
            status: 503,
            message: "down".into(),
        };
        let missing = CollaboratorError::Status {
            service: "data",
            status: 404,
            message: "nope".into(),
        };
        assert!(upstream.is_transient());
        assert!(!missing.is_transient());
        assert_ne!(upstream.recovery_suggestion(), missing.recovery_suggestion());
    }

    #[test]
    fn test_diagnostic_from_timeout() {
        let err = CollaboratorError::Timeout {
            service: "formations",
            secs: 5,
        };
        let diagnostic = PageDiagnostic::from(&err);
        assert_eq!(diagnostic.error_type, ErrorType::Transient);
        assert_eq!(diagnostic.message, "formations did not answer within 5 seconds");
        let value = serde_json::to_value(&diagnostic).expect("encode");
        assert_eq!(value["errorType"], "transient");
        assert!(value.get("recoverySuggestion").is_some());
    }

    #[test]
    fn test_decode_is_permanent() {
        let err = CollaboratorError::Decode {
            service: "data",
            message: "expected array".into(),
        };
        assert!(!err.is_transient());
        assert_eq!(PageDiagnostic::from(&err).error_type, ErrorType::Permanent);
    }
}
