use thiserror::Error;

use crate::capability::store::StoreError;

/// Repository error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Index, alias or template configuration failed. Fatal: the application
    /// cannot proceed against a misconfigured store.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The store rejected the query (malformed expression, bad field, ...)
    #[error("Query error: {0}")]
    Query(String),

    /// Free-text or filter expression failed to parse
    #[error("Expression error: {0}")]
    Expression(String),

    /// Store call failed for a reason other than "not found"
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Cursor paging could not derive a lower bound for the next page
    #[error("Cursor paging error: {0}")]
    CursorPaging(String),

    /// An operation was called on a document type lacking a required capability
    #[error("Capability mismatch: {0}")]
    CapabilityMismatch(String),

    /// The operation was cancelled before it completed
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Internal invariant violations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            RepositoryError::Configuration(_) => "CONFIGURATION_ERROR",
            RepositoryError::Query(_) => "QUERY_ERROR",
            RepositoryError::Expression(_) => "EXPRESSION_ERROR",
            RepositoryError::Store(_) => "STORE_ERROR",
            RepositoryError::Serialization(_) => "SERIALIZATION_ERROR",
            RepositoryError::CursorPaging(_) => "CURSOR_PAGING_ERROR",
            RepositoryError::CapabilityMismatch(_) => "CAPABILITY_MISMATCH",
            RepositoryError::Cancelled(_) => "CANCELLED",
            RepositoryError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error is fatal for application startup
    pub fn is_fatal(&self) -> bool {
        matches!(self, RepositoryError::Configuration(_))
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for RepositoryError {
    fn from(err: config::ConfigError) -> Self {
        RepositoryError::Configuration(err.to_string())
    }
}

/// Store failures other than "not found" surface as store errors; "not found"
/// is normalized to empty results at the repository boundary, never here.
impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidQuery(msg) => RepositoryError::Query(msg),
            other => RepositoryError::Store(other.to_string()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            RepositoryError::Configuration("test".to_string()).error_code(),
            "CONFIGURATION_ERROR"
        );
        assert_eq!(
            RepositoryError::CursorPaging("test".to_string()).error_code(),
            "CURSOR_PAGING_ERROR"
        );
        assert_eq!(
            RepositoryError::CapabilityMismatch("test".to_string()).error_code(),
            "CAPABILITY_MISMATCH"
        );
    }

    #[test]
    fn test_only_configuration_errors_are_fatal() {
        assert!(RepositoryError::Configuration("test".to_string()).is_fatal());
        assert!(!RepositoryError::Query("test".to_string()).is_fatal());
        assert!(!RepositoryError::Store("test".to_string()).is_fatal());
    }

    #[test]
    fn test_store_error_conversion() {
        let err: RepositoryError = StoreError::InvalidQuery("bad range".to_string()).into();
        assert_eq!(err.error_code(), "QUERY_ERROR");

        let err: RepositoryError = StoreError::Unavailable("connection reset".to_string()).into();
        assert_eq!(err.error_code(), "STORE_ERROR");
    }
}
