//! Error types for the RAPT pipeline
//!
//! Provides a bounded error taxonomy so callers always see one of a
//! small set of failure kinds:
//! - Document/metadata problems detected before any remote call
//! - Upstream failures (embedding service, vector store, language model)
//!   surfaced only after the retry budget is exhausted
//! - A generic indexing wrapper preserving the original message for
//!   anything unexpected

use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// The source could not be parsed as the expected document format.
    #[error("Document format error: {message}")]
    DocumentFormat { message: String },

    /// Required identification fields are missing or malformed.
    #[error("Metadata validation failed: {message}")]
    MetadataValidation { message: String },

    /// Embedding service failure after the retry budget was exhausted.
    #[error("Embedding generation failed: {message}")]
    EmbeddingGeneration { message: String },

    /// Vector store write failure after the retry budget was exhausted.
    #[error("Vector store write failed: {message}")]
    VectorStoreWrite { message: String },

    /// Vector store read failure. The read path is single-attempt.
    #[error("Vector store query failed: {message}")]
    VectorStoreRead { message: String },

    /// Language model completion failure.
    #[error("Completion failed: {message}")]
    Completion { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Catch-all for unexpected failures during indexing; carries the
    /// original message so no error detail is truncated.
    #[error("Unexpected error during indexing: {message}")]
    Indexing { message: String },
}

impl AppError {
    /// Whether the boundary should treat this as a caller mistake
    /// rather than a service-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::DocumentFormat { .. } | AppError::MetadataValidation { .. }
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Indexing {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Indexing {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Indexing {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        let err = AppError::MetadataValidation {
            message: "document_id is required".into(),
        };
        assert!(err.is_client_error());

        let err = AppError::VectorStoreWrite {
            message: "upstream 503".into(),
        };
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_indexing_wrap_preserves_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: AppError = io.into();
        assert!(err.to_string().contains("missing file"));
    }
}
