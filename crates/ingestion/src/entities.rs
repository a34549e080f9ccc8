//! Best-effort named-entity observation
//!
//! A lightweight heuristic: runs of capitalized words are treated as
//! candidate entities and logged for observability. This never affects
//! indexing and cannot fail.

use regex_lite::Regex;
use tracing::debug;

/// Extract candidate entities (multi-word capitalized spans) from text.
pub fn extract_entities(text: &str) -> Vec<String> {
    let pattern = match Regex::new(r"[A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)+") {
        Ok(p) => p,
        Err(_) => return Vec::new(),
    };

    pattern
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Log candidate entities per paragraph. Observability only.
pub fn observe_entities(document_id: &str, paragraphs: &[String]) {
    for (paragraph_id, text) in paragraphs.iter().enumerate() {
        let entities = extract_entities(text);
        if !entities.is_empty() {
            debug!(
                document_id = document_id,
                paragraph_id = paragraph_id,
                entities = ?entities,
                "Entities observed"
            );
        }
    }
}
