//! Metadata validation
//!
//! Runs strictly before extraction or embedding work is dispatched, so a
//! rejected document causes no partial side effects.

use rapt_common::errors::{AppError, Result};
use rapt_common::types::DocumentMetadata;

/// Enforce required identification fields.
///
/// `document_id` must be non-empty after trimming. `date_uploaded` is
/// typed, so parseability is enforced at the serde boundary; the default
/// (current time) is applied there when the caller omits it.
pub fn validate_metadata(metadata: &DocumentMetadata) -> Result<()> {
    if metadata.document_id.trim().is_empty() {
        return Err(AppError::MetadataValidation {
            message: "document_id is required".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_metadata_passes() {
        let metadata = DocumentMetadata::new("doc1");
        assert!(validate_metadata(&metadata).is_ok());
    }

    #[test]
    fn test_empty_document_id_rejected() {
        let metadata = DocumentMetadata::new("");
        let err = validate_metadata(&metadata).unwrap_err();
        assert!(matches!(err, AppError::MetadataValidation { .. }));
        assert!(err.to_string().contains("document_id"));
    }

    #[test]
    fn test_whitespace_document_id_rejected() {
        let metadata = DocumentMetadata::new("   ");
        assert!(validate_metadata(&metadata).is_err());
    }
}
