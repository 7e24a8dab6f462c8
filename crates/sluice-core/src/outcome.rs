//! Categorized publish outcomes.
//!
//! Every boundary between pipeline components speaks `Outcome<T>`: either a
//! success value or a failure carrying a stable `ErrorKind` category plus a
//! human-readable detail string. Raw transport errors only exist inside the
//! publisher's resilience stack; they are categorized into an `Outcome` at
//! the boundary and never escape it.

use std::{error::Error, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// Stable error taxonomy exposed to callers.
///
/// The `Display` form is the snake_case label used as the `error_type`
/// metrics tag, so variants must keep their labels stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Not an error; paired with a present success value.
    None,
    /// The caller handed over a malformed message.
    InvalidInput,
    /// The transport rejected the caller's credentials.
    AuthorizationFailure,
    /// The target topic (or related resource) does not exist.
    ResourceNotFound,
    /// The downstream service cannot currently serve the request.
    ServiceUnavailable,
    /// The downstream service is shedding load.
    Throttling,
    /// Anything that did not match a known category.
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::InvalidInput => write!(f, "invalid_input"),
            Self::AuthorizationFailure => write!(f, "authorization_failure"),
            Self::ResourceNotFound => write!(f, "resource_not_found"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::Throttling => write!(f, "throttling"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of a single publish operation.
///
/// Invariant: `is_success()` holds exactly when `kind()` is
/// [`ErrorKind::None`] and a value is present.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// The operation completed and produced a value.
    Success(T),
    /// The operation failed terminally.
    Failure {
        /// Error category for metrics and caller dispatch.
        kind: ErrorKind,
        /// Human-readable detail; safe to log, never contains secrets.
        detail: String,
        /// The underlying error, when one exists.
        source: Option<Arc<dyn Error + Send + Sync>>,
    },
}

impl<T> Outcome<T> {
    /// Wraps a success value.
    pub fn success(value: T) -> Self {
        Self::Success(value)
    }

    /// Builds a failure from a category and detail text.
    pub fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::Failure { kind, detail: detail.into(), source: None }
    }

    /// Builds a failure that keeps the causing error attached.
    pub fn failure_with_source(
        kind: ErrorKind,
        detail: impl Into<String>,
        source: Arc<dyn Error + Send + Sync>,
    ) -> Self {
        Self::Failure { kind, detail: detail.into(), source: Some(source) }
    }

    /// Returns `true` for a success outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the error category; [`ErrorKind::None`] for successes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Success(_) => ErrorKind::None,
            Self::Failure { kind, .. } => *kind,
        }
    }

    /// Returns the failure detail, if this is a failure.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { detail, .. } => Some(detail.as_str()),
        }
    }

    /// Returns the success value, if present.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure { .. } => None,
        }
    }

    /// Consumes the outcome and returns the success value, if present.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_has_kind_none() {
        let outcome = Outcome::success("id-1");
        assert!(outcome.is_success());
        assert_eq!(outcome.kind(), ErrorKind::None);
        assert_eq!(outcome.value(), Some(&"id-1"));
        assert_eq!(outcome.detail(), None);
    }

    #[test]
    fn failure_carries_kind_and_detail() {
        let outcome: Outcome<String> =
            Outcome::failure(ErrorKind::Throttling, "Request throttled: slow down");
        assert!(!outcome.is_success());
        assert_eq!(outcome.kind(), ErrorKind::Throttling);
        assert_eq!(outcome.detail(), Some("Request throttled: slow down"));
        assert!(outcome.value().is_none());
    }

    #[test]
    fn error_kind_labels_are_stable() {
        assert_eq!(ErrorKind::None.to_string(), "none");
        assert_eq!(ErrorKind::InvalidInput.to_string(), "invalid_input");
        assert_eq!(ErrorKind::AuthorizationFailure.to_string(), "authorization_failure");
        assert_eq!(ErrorKind::ResourceNotFound.to_string(), "resource_not_found");
        assert_eq!(ErrorKind::ServiceUnavailable.to_string(), "service_unavailable");
        assert_eq!(ErrorKind::Throttling.to_string(), "throttling");
        assert_eq!(ErrorKind::Unknown.to_string(), "unknown");
    }
}
