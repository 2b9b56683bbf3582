//! Error types for the drive reconciler
//!
//! Provides structured error types for the drive indexer, the drive selector
//! and the cluster adapters.

use thiserror::Error;

/// Unified error type for the reconciler
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Kubernetes Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Watch failed: {0}")]
    WatchFailed(String),

    // =========================================================================
    // Drive Store Errors
    // =========================================================================
    #[error("Cached object {key} is not a drive record: {reason}")]
    TypeMismatch { key: String, reason: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Action to take on error during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Requeue with exponential backoff
    RequeueWithBackoff,
    /// Don't requeue, wait for changes
    NoRequeue,
}

impl Error {
    /// Determine what action to take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            // Transient errors - retry with backoff
            Error::Kube(_) | Error::WatchFailed(_) => ErrorAction::RequeueWithBackoff,

            // Logic/configuration errors - don't retry automatically
            Error::TypeMismatch { .. } | Error::Configuration(_) => ErrorAction::NoRequeue,

            // Payload decoding errors - retry with backoff
            Error::JsonParse(_) => ErrorAction::RequeueWithBackoff,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self.action(), ErrorAction::NoRequeue)
    }

    /// Check if this error is transient
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Kube(_) | Error::WatchFailed(_))
    }
}

/// Result type alias for the reconciler
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_actions() {
        let err = Error::TypeMismatch {
            key: "drive-1".into(),
            reason: "found v1/ConfigMap".into(),
        };
        assert_eq!(err.action(), ErrorAction::NoRequeue);

        let err = Error::Configuration("bad config".into());
        assert_eq!(err.action(), ErrorAction::NoRequeue);

        let err = Error::WatchFailed("410 Gone".into());
        assert_eq!(err.action(), ErrorAction::RequeueWithBackoff);

        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.action(), ErrorAction::RequeueWithBackoff);
    }

    #[test]
    fn test_error_retryable() {
        let transient = Error::WatchFailed("connection reset".into());
        assert!(transient.is_retryable());
        assert!(transient.is_transient());

        let mismatch = Error::TypeMismatch {
            key: "drive-1".into(),
            reason: "object carries no type information".into(),
        };
        assert!(!mismatch.is_retryable());
        assert!(!mismatch.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = Error::TypeMismatch {
            key: "drive-1".into(),
            reason: "found v1/ConfigMap".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cached object drive-1 is not a drive record: found v1/ConfigMap"
        );
    }
}
