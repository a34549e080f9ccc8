//! PDF paragraph extraction
//!
//! Produces an ordered sequence of non-blank, trimmed paragraph strings.
//! Paragraph policy: within a page's text, split on blank-line
//! boundaries, discard fragments that trim to nothing, and concatenate
//! per-page sequences in page order. Pages with no extractable text
//! layer fall back to OCR; pages are independent, so a failure on one
//! degrades to zero paragraphs for that page and never aborts the rest.

use crate::ocr::OcrEngine;
use async_trait::async_trait;
use rapt_common::errors::{AppError, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Trait for document text extraction
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract ordered paragraphs from the document at `path`.
    /// A structurally valid document with no pages yields an empty
    /// sequence, not an error.
    async fn extract(&self, path: &Path) -> Result<Vec<String>>;
}

/// PDF extractor backed by lopdf with per-page OCR fallback
pub struct PdfExtractor {
    ocr: Arc<dyn OcrEngine>,
}

impl PdfExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }
}

/// Split page text on blank-line boundaries, trimming each fragment and
/// discarding empties.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let doc = lopdf::Document::load(path).map_err(|e| AppError::DocumentFormat {
            message: format!("Failed to load PDF {}: {}", path.display(), e),
        })?;

        let pages = doc.get_pages();
        debug!(page_count = pages.len(), path = %path.display(), "Extracting text from PDF");

        let mut paragraphs = Vec::new();

        for page_number in pages.keys().copied() {
            let text = match doc.extract_text(&[page_number]) {
                Ok(text) if !text.trim().is_empty() => text,
                // No text layer on this page, or extraction failed:
                // fall back to OCR for this page only
                other => {
                    if let Err(e) = &other {
                        debug!(page = page_number, error = %e, "Text layer extraction failed");
                    }
                    match self.ocr.recognize_page(path, page_number).await {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(
                                page = page_number,
                                error = %e,
                                "OCR failed, skipping page"
                            );
                            continue;
                        }
                    }
                }
            };

            paragraphs.extend(split_paragraphs(&text));
        }

        debug!(
            paragraphs = paragraphs.len(),
            "Paragraph extraction complete"
        );
        Ok(paragraphs)
    }
}
