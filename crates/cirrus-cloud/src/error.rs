//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error for '{resource}': {message}")]
    ApiError { resource: String, message: String },

    #[error("Provider throttled request for '{resource}': {message}")]
    Throttled { resource: String, message: String },

    #[error("Timeout waiting for terminal state of '{resource}'")]
    Timeout { resource: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Ledger file error: {0}")]
    LedgerError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Transient failures are safe to retry with backoff; everything
    /// else is terminal for the resource.
    pub fn is_transient(&self) -> bool {
        matches!(self, CloudError::Throttled { .. } | CloudError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CloudError::Throttled {
            resource: "lb".into(),
            message: "429".into()
        }
        .is_transient());
        assert!(CloudError::Timeout { resource: "lb".into() }.is_transient());
        assert!(!CloudError::ApiError {
            resource: "lb".into(),
            message: "quota exceeded".into()
        }
        .is_transient());
    }
}
