//! Error types for the CircleCI provider.

use thiserror::Error;

use crate::client::ClientError;
use crate::schema::Diagnostic;

/// Errors that can occur while serving a provider operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource already exists (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Operation timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Operation not supported by the resource.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// The CircleCI API call failed. Passed through unchanged.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns the inner message for string variants, the full display
    /// string otherwise.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::AlreadyExists(msg)
            | Self::DeadlineExceeded(msg)
            | Self::Unimplemented(msg) => msg.clone(),
            Self::Serialization(err) => err.to_string(),
            Self::Client(err) => err.to_string(),
        }
    }

    /// Render the error as an error diagnostic for the host.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string());
        match self {
            Self::Client(ClientError::Api { status, .. }) => {
                diagnostic.with_detail(format!("CircleCI API returned HTTP {}", status))
            }
            _ => diagnostic,
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        err.to_diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("circleci_project 'widgets'".to_string());
        assert_eq!(
            format!("{}", err),
            "Resource not found: circleci_project 'widgets'"
        );

        let err = ProviderError::UnknownResource("circleci_context".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: circleci_context");

        let err = ProviderError::DeadlineExceeded("create timed out".to_string());
        assert_eq!(format!("{}", err), "Deadline exceeded: create timed out");
    }

    #[test]
    fn test_client_error_is_transparent() {
        let err: ProviderError = ClientError::Api {
            status: 400,
            message: "Bad Request".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "API error (400): Bad Request");
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::Configuration("token is required".to_string());
        assert_eq!(err.message(), "token is required");

        let err: ProviderError = ClientError::InvalidToken.into();
        assert_eq!(err.message(), "invalid API token format");
    }

    #[test]
    fn test_to_diagnostic() {
        let err = ProviderError::AlreadyExists("FOO".to_string());
        let diagnostic: Diagnostic = err.into();
        assert_eq!(diagnostic.severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostic.summary, "Resource already exists: FOO");
        assert!(diagnostic.detail.is_none());

        let err: ProviderError = ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        let diagnostic = err.to_diagnostic();
        assert_eq!(
            diagnostic.detail.as_deref(),
            Some("CircleCI API returned HTTP 500")
        );
    }
}
