//! Error types for topic publish operations.
//!
//! Defines the raw transport error taxonomy plus its categorization into
//! the stable [`ErrorKind`] contract. Retry and circuit-breaker decisions
//! key off these variants, so the retriable set is defined here in one
//! place.

use sluice_core::ErrorKind;
use thiserror::Error;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, PublishError>;

/// Raw errors surfaced by the topic transport and the resilience stack.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The service rejected the message parameters.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Service-provided rejection detail.
        message: String,
    },

    /// The caller is not authorized for the topic.
    #[error("authorization error: {message}")]
    AuthorizationFailure {
        /// Service-provided rejection detail.
        message: String,
    },

    /// The topic does not exist.
    #[error("topic not found: {message}")]
    TopicNotFound {
        /// Service-provided detail.
        message: String,
    },

    /// The service is shedding load.
    #[error("throttled: {message}")]
    Throttled {
        /// Service-provided detail.
        message: String,
    },

    /// The service's key-management dependency is shedding load.
    #[error("KMS throttled: {message}")]
    KmsThrottled {
        /// Service-provided detail.
        message: String,
    },

    /// The key-management configuration for the topic is unusable.
    #[error("KMS configuration error: {message}")]
    KmsConfiguration {
        /// Service-provided detail.
        message: String,
    },

    /// The service reported an internal fault.
    #[error("service internal error: {message}")]
    InternalError {
        /// Service-provided detail.
        message: String,
    },

    /// HTTP response with no recognizable service error code.
    #[error("unexpected HTTP status {status}")]
    HttpStatus {
        /// Response status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The per-attempt timeout expired before the transport answered.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that was exceeded, in milliseconds.
        timeout_ms: u64,
    },

    /// The circuit breaker refused the call.
    #[error("circuit breaker open")]
    CircuitOpen,

    /// Network-level failure before any response arrived.
    #[error("network error: {message}")]
    Network {
        /// Connection failure detail.
        message: String,
    },

    /// Anything that did not match a known failure shape.
    #[error("unexpected error: {message}")]
    Unexpected {
        /// Failure detail.
        message: String,
    },
}

impl PublishError {
    /// Creates a throttling error.
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::Throttled { message: message.into() }
    }

    /// Creates an internal service error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError { message: message.into() }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates an unexpected error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected { message: message.into() }
    }

    /// Whether another attempt against the transport may succeed.
    ///
    /// Only throttling (service or KMS), service internal faults, and bare
    /// HTTP 500/503 responses are worth retrying. Timeouts are terminal:
    /// the attempt already consumed the full per-call budget.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Throttled { .. } | Self::KmsThrottled { .. } | Self::InternalError { .. } => true,
            Self::HttpStatus { status, .. } => matches!(status, 500 | 503),
            Self::InvalidParameter { .. }
            | Self::AuthorizationFailure { .. }
            | Self::TopicNotFound { .. }
            | Self::KmsConfiguration { .. }
            | Self::Timeout { .. }
            | Self::CircuitOpen
            | Self::Network { .. }
            | Self::Unexpected { .. } => false,
        }
    }

    /// Whether this failure counts toward the breaker's consecutive-failure
    /// threshold. Same set as [`is_retriable`](Self::is_retriable): client
    /// mistakes and fail-fast signals must never trip the circuit.
    pub fn trips_circuit(&self) -> bool {
        self.is_retriable()
    }

    /// Stable category for the caller-facing outcome.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } => ErrorKind::InvalidInput,
            Self::AuthorizationFailure { .. } => ErrorKind::AuthorizationFailure,
            Self::TopicNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::Throttled { .. } | Self::KmsThrottled { .. } => ErrorKind::Throttling,
            Self::Timeout { .. }
            | Self::CircuitOpen
            | Self::InternalError { .. }
            | Self::KmsConfiguration { .. } => ErrorKind::ServiceUnavailable,
            Self::HttpStatus { status, .. } if (500..=599).contains(status) => {
                ErrorKind::ServiceUnavailable
            },
            Self::HttpStatus { .. } | Self::Network { .. } | Self::Unexpected { .. } => {
                ErrorKind::Unknown
            },
        }
    }

    /// Caller-facing detail string, led by the stable prefix for the
    /// category.
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidParameter { message } => {
                format!("Invalid message format or attributes: {message}")
            },
            Self::AuthorizationFailure { message } => format!("Authorization failure: {message}"),
            Self::TopicNotFound { message } => format!("Resource not found: {message}"),
            Self::Throttled { message } | Self::KmsThrottled { message } => {
                format!("Request throttled: {message}")
            },
            Self::KmsConfiguration { message } => format!("KMS configuration error: {message}"),
            Self::Timeout { .. } => "Request timed out".to_string(),
            Self::CircuitOpen => "Circuit breaker open".to_string(),
            Self::InternalError { message } => format!("AWS internal error: {message}"),
            Self::HttpStatus { status, .. } if (500..=599).contains(status) => {
                format!("AWS internal error: HTTP {status}")
            },
            Self::HttpStatus { status, .. } => format!("Unexpected error: HTTP {status}"),
            Self::Network { message } => format!("Unexpected error: {message}"),
            Self::Unexpected { message } => format!("Unexpected error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_set_is_exactly_throttling_and_internal() {
        assert!(PublishError::throttled("slow down").is_retriable());
        assert!(PublishError::KmsThrottled { message: "kms busy".into() }.is_retriable());
        assert!(PublishError::internal("oops").is_retriable());
        assert!(PublishError::HttpStatus { status: 500, body: String::new() }.is_retriable());
        assert!(PublishError::HttpStatus { status: 503, body: String::new() }.is_retriable());

        assert!(!PublishError::HttpStatus { status: 502, body: String::new() }.is_retriable());
        assert!(!PublishError::Timeout { timeout_ms: 5000 }.is_retriable());
        assert!(!PublishError::CircuitOpen.is_retriable());
        assert!(!PublishError::InvalidParameter { message: String::new() }.is_retriable());
        assert!(!PublishError::AuthorizationFailure { message: String::new() }.is_retriable());
        assert!(!PublishError::TopicNotFound { message: String::new() }.is_retriable());
        assert!(!PublishError::KmsConfiguration { message: String::new() }.is_retriable());
        assert!(!PublishError::network("connection refused").is_retriable());
        assert!(!PublishError::unexpected("???").is_retriable());
    }

    #[test]
    fn categorization_matches_contract() {
        assert_eq!(
            PublishError::InvalidParameter { message: String::new() }.error_kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            PublishError::AuthorizationFailure { message: String::new() }.error_kind(),
            ErrorKind::AuthorizationFailure
        );
        assert_eq!(
            PublishError::TopicNotFound { message: String::new() }.error_kind(),
            ErrorKind::ResourceNotFound
        );
        assert_eq!(PublishError::throttled("x").error_kind(), ErrorKind::Throttling);
        assert_eq!(
            PublishError::KmsThrottled { message: String::new() }.error_kind(),
            ErrorKind::Throttling
        );
        assert_eq!(
            PublishError::Timeout { timeout_ms: 5000 }.error_kind(),
            ErrorKind::ServiceUnavailable
        );
        assert_eq!(PublishError::CircuitOpen.error_kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(PublishError::internal("x").error_kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(
            PublishError::KmsConfiguration { message: String::new() }.error_kind(),
            ErrorKind::ServiceUnavailable
        );
        assert_eq!(PublishError::network("x").error_kind(), ErrorKind::Unknown);
        assert_eq!(PublishError::unexpected("x").error_kind(), ErrorKind::Unknown);
    }

    #[test]
    fn detail_prefixes_are_stable() {
        assert!(PublishError::Timeout { timeout_ms: 5000 }.detail().starts_with("Request timed out"));
        assert_eq!(PublishError::CircuitOpen.detail(), "Circuit breaker open");
        assert!(PublishError::throttled("x").detail().starts_with("Request throttled"));
        assert!(PublishError::internal("x").detail().starts_with("AWS internal error"));
        assert!(PublishError::InvalidParameter { message: "bad attr".into() }
            .detail()
            .starts_with("Invalid message format or attributes"));
        assert!(PublishError::KmsConfiguration { message: "disabled".into() }
            .detail()
            .starts_with("KMS configuration error"));
    }
}
