use thiserror::Error;

/// Errors returned by the CircleCI API client.
///
/// Messages must never contain the API token.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The token was rejected (HTTP 401/403).
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Connection failure, timeout, or other transport problem.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    /// The token cannot be used as a header value.
    #[error("invalid API token format")]
    InvalidToken,
}

impl ClientError {
    /// Whether retrying the same call may succeed.
    ///
    /// Network failures, rate limiting and server-side errors are transient.
    /// Everything else is returned to the caller on first occurrence.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Auth { .. } | Self::Decode { .. } | Self::InvalidToken => false,
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::Api {
            status: 404,
            message: "Project not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error (404): Project not found");
    }

    #[test]
    fn test_auth_error_display() {
        let err = ClientError::Auth {
            message: "You must log in first.".to_string(),
        };
        assert_eq!(err.to_string(), "authentication failed: You must log in first.");
    }

    #[test]
    fn test_transient_classification() {
        let server_error = ClientError::Api {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert!(server_error.is_transient());

        let rate_limited = ClientError::Api {
            status: 429,
            message: "Too Many Requests".to_string(),
        };
        assert!(rate_limited.is_transient());

        let bad_request = ClientError::Api {
            status: 400,
            message: "Bad Request".to_string(),
        };
        assert!(!bad_request.is_transient());

        let auth = ClientError::Auth {
            message: "denied".to_string(),
        };
        assert!(!auth.is_transient());
        assert!(!ClientError::InvalidToken.is_transient());
    }

    #[test]
    fn test_status() {
        let err = ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(ClientError::InvalidToken.status(), None);
    }

    #[test]
    fn test_error_does_not_contain_token() {
        let token = "circle_super_secret_token";
        let err = ClientError::InvalidToken;
        assert!(!err.to_string().contains(token));
    }
}
