//! Error types for the Zendesk API.

use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by a Zendesk transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// Credentials were rejected (401/403).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Too many requests (429).
    #[error("rate limited{}", .retry_after.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimited {
        /// Seconds to wait, from the `Retry-After` header.
        retry_after: Option<u64>,
    },

    /// The resource does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The payload was rejected (400/422).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The server failed (5xx).
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status.
        status: u16,
        /// Response body.
        message: String,
    },

    /// A response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The transport was closed.
    #[error("not connected to Zendesk")]
    NotConnected,
}

impl ApiError {
    /// Maps an HTTP error status to an error.
    pub fn from_status(status: u16, body: impl Into<String>, retry_after: Option<u64>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::Authentication(body),
            404 => Self::NotFound(body),
            429 => Self::RateLimited { retry_after },
            400 | 422 => Self::Validation(body),
            _ => Self::Server {
                status,
                message: body,
            },
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Connection(_)
                | ApiError::Timeout
                | ApiError::RateLimited { .. }
                | ApiError::Server { .. }
                | ApiError::NotConnected
        )
    }

    /// Returns true if no later request of the batch can succeed either.
    pub fn aborts_batch(&self) -> bool {
        matches!(
            self,
            ApiError::Connection(_)
                | ApiError::Authentication(_)
                | ApiError::RateLimited { .. }
                | ApiError::NotConnected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(ApiError::from_status(401, "", None), ApiError::Authentication(_)));
        assert!(matches!(ApiError::from_status(404, "", None), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_status(422, "", None), ApiError::Validation(_)));
        assert_eq!(
            ApiError::from_status(429, "", Some(30)),
            ApiError::RateLimited {
                retry_after: Some(30)
            }
        );
        assert!(matches!(
            ApiError::from_status(503, "busy", None),
            ApiError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn retryable_errors() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::Connection("reset".into()).is_retryable());
        assert!(!ApiError::Validation("bad email".into()).is_retryable());
        assert!(!ApiError::Authentication("bad token".into()).is_retryable());
    }

    #[test]
    fn batch_fatal_errors() {
        assert!(ApiError::Authentication("bad token".into()).aborts_batch());
        assert!(ApiError::RateLimited { retry_after: None }.aborts_batch());
        assert!(!ApiError::Validation("bad email".into()).aborts_batch());
        assert!(!ApiError::NotFound("ticket 9".into()).aborts_batch());
        assert!(!ApiError::Timeout.aborts_batch());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            ApiError::RateLimited {
                retry_after: Some(5)
            }
            .to_string(),
            "rate limited, retry after 5s"
        );
        assert_eq!(ApiError::NotConnected.to_string(), "not connected to Zendesk");
    }
}
