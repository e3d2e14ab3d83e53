//! Error types for interception operations

use thiserror::Error;

/// Main error type for interception operations
#[derive(Debug, Error)]
pub enum InterceptError {
    /// A bundled asset could not be opened
    #[error("Resource not found: {path}")]
    ResourceNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An asset path escapes the asset root or is otherwise unusable
    #[error("Invalid asset path: {0}")]
    InvalidAssetPath(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// Certificate-related errors
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rules file parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InterceptError {
    /// Whether this error came from a missing or unreadable asset.
    pub fn is_resource_not_found(&self) -> bool {
        matches!(
            self,
            InterceptError::ResourceNotFound { .. } | InterceptError::InvalidAssetPath(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_not_found_display_and_source() {
        let err = InterceptError::ResourceNotFound {
            path: "images/error.png".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };

        assert_eq!(err.to_string(), "Resource not found: images/error.png");
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_resource_not_found());
    }

    #[test]
    fn test_configuration_is_not_asset_error() {
        let err = InterceptError::Configuration("bad".to_string());
        assert!(!err.is_resource_not_found());
    }
}
