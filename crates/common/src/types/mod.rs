//! Core data types shared across the pipeline
//!
//! A document is identified by `document_id`; extraction yields ordered
//! [`Chunk`]s whose `paragraph_id` is a zero-based, gapless index within
//! one ingestion call. Each chunk becomes exactly one [`VectorRecord`]
//! whose id is reconstructible from `(document_id, paragraph_id)` alone,
//! which is what makes re-ingestion idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Metadata attached to a document at ingestion time.
///
/// Immutable once attached to a chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Owning document identifier (required, non-empty)
    pub document_id: String,

    /// Upload timestamp; defaulted to the current time at the boundary
    /// when the caller omits it
    #[serde(default = "Utc::now")]
    pub date_uploaded: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl DocumentMetadata {
    /// Create metadata with `date_uploaded` set to now.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            date_uploaded: Utc::now(),
            title: None,
            author: None,
            tags: None,
        }
    }

    /// Flatten into the JSON object stored alongside each vector.
    pub fn to_json(&self) -> Value {
        json!({
            "document_id": self.document_id,
            "date_uploaded": self.date_uploaded.to_rfc3339(),
            "title": self.title,
            "author": self.author,
            "tags": self.tags,
        })
    }
}

/// A unit of extracted document text; the atomic item that gets one
/// embedding vector and one vector-store record. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub document_id: String,
    /// Zero-based sequence index within the document
    pub paragraph_id: usize,
    /// Non-empty, trimmed paragraph text
    pub text: String,
}

impl Chunk {
    /// Deterministic vector-store id for this chunk.
    pub fn vector_id(&self) -> String {
        vector_id(&self.document_id, self.paragraph_id)
    }
}

/// Stable record id: `{document_id}_p{paragraph_id}`.
///
/// Re-ingesting the same document/paragraph pair overwrites rather than
/// duplicates.
pub fn vector_id(document_id: &str, paragraph_id: usize) -> String {
    format!("{}_p{}", document_id, paragraph_id)
}

/// A record owned by the vector index's backing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    /// Flat object: DocumentMetadata fields plus `text` and `paragraph_id`
    pub metadata: Value,
}

impl VectorRecord {
    /// Build a record from a chunk, its embedding, and the document
    /// metadata.
    pub fn from_chunk(chunk: &Chunk, values: Vec<f32>, metadata: &DocumentMetadata) -> Self {
        let mut payload = metadata.to_json();
        if let Value::Object(ref mut map) = payload {
            map.insert("text".into(), Value::String(chunk.text.clone()));
            map.insert("paragraph_id".into(), json!(chunk.paragraph_id));
        }
        Self {
            id: chunk.vector_id(),
            values,
            metadata: payload,
        }
    }
}

/// A single similarity match, transient per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    /// Similarity in [0, 1], higher = more relevant
    pub score: f32,
    pub metadata: Value,
}

impl QueryMatch {
    /// Matched chunk text, if the record carried one.
    pub fn text(&self) -> Option<&str> {
        self.metadata.get("text").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_id_deterministic() {
        assert_eq!(vector_id("D1", 3), "D1_p3");
        assert_eq!(vector_id("D1", 3), vector_id("D1", 3));
        assert_eq!(vector_id("doc1", 0), "doc1_p0");
    }

    #[test]
    fn test_record_from_chunk() {
        let metadata = DocumentMetadata {
            title: Some("Report".into()),
            ..DocumentMetadata::new("doc1")
        };
        let chunk = Chunk {
            document_id: "doc1".into(),
            paragraph_id: 2,
            text: "some paragraph".into(),
        };
        let record = VectorRecord::from_chunk(&chunk, vec![0.1, 0.2], &metadata);

        assert_eq!(record.id, "doc1_p2");
        assert_eq!(record.metadata["text"], "some paragraph");
        assert_eq!(record.metadata["paragraph_id"], 2);
        assert_eq!(record.metadata["document_id"], "doc1");
        assert_eq!(record.metadata["title"], "Report");
    }

    #[test]
    fn test_metadata_date_defaults_on_deserialize() {
        let metadata: DocumentMetadata =
            serde_json::from_str(r#"{"document_id": "doc1"}"#).unwrap();
        assert_eq!(metadata.document_id, "doc1");
        // defaulted at the boundary, not epoch
        assert!(metadata.date_uploaded.timestamp() > 0);
    }

    #[test]
    fn test_match_text_accessor() {
        let m = QueryMatch {
            id: "doc1_p0".into(),
            score: 0.9,
            metadata: serde_json::json!({ "text": "hello" }),
        };
        assert_eq!(m.text(), Some("hello"));

        let empty = QueryMatch {
            id: "doc1_p1".into(),
            score: 0.1,
            metadata: serde_json::json!({}),
        };
        assert_eq!(empty.text(), None);
    }
}
