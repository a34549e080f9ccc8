//! Indexing orchestrator
//!
//! Composes validation, extraction, embedding, and upsert into a single
//! document-ingestion operation. Stages run strictly in sequence; each
//! must fully succeed before the next starts. No rollback is attempted
//! on a later-stage failure: partial writes from a failed mid-batch
//! upsert remain, and re-ingestion overwrites them by id.

use crate::entities::observe_entities;
use crate::pdf::TextExtractor;
use crate::validate::validate_metadata;
use rapt_common::embeddings::Embedder;
use rapt_common::errors::{AppError, Result};
use rapt_common::metrics::{DOCUMENTS_INDEXED_TOTAL, PARAGRAPHS_INDEXED_TOTAL};
use rapt_common::types::{Chunk, DocumentMetadata, VectorRecord};
use rapt_common::vector::VectorIndex;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Document ingestion pipeline over injected collaborators.
pub struct DocumentIndexer {
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl DocumentIndexer {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            extractor,
            embedder,
            index,
        }
    }

    /// Index one document, returning the number of paragraphs indexed.
    ///
    /// Zero extractable paragraphs is a valid terminal success (`Ok(0)`);
    /// no embedding or upsert call is made in that case.
    #[instrument(skip(self, metadata), fields(document_id = %metadata.document_id, path = %path.display()))]
    pub async fn index_document(
        &self,
        path: &Path,
        metadata: &DocumentMetadata,
    ) -> Result<usize> {
        // Validation first: no partial side effects for a rejected call
        validate_metadata(metadata)?;

        let paragraphs = self.extractor.extract(path).await?;
        if paragraphs.is_empty() {
            info!("Document has no extractable paragraphs");
            return Ok(0);
        }

        observe_entities(&metadata.document_id, &paragraphs);

        let embeddings = self.embedder.embed_batch(&paragraphs).await?;
        if embeddings.len() != paragraphs.len() {
            return Err(AppError::Indexing {
                message: format!(
                    "Embedding count {} does not match paragraph count {}",
                    embeddings.len(),
                    paragraphs.len()
                ),
            });
        }

        let records: Vec<VectorRecord> = paragraphs
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(paragraph_id, (text, values))| {
                let chunk = Chunk {
                    document_id: metadata.document_id.clone(),
                    paragraph_id,
                    text: text.clone(),
                };
                VectorRecord::from_chunk(&chunk, values, metadata)
            })
            .collect();

        self.index.upsert(records).await?;

        let indexed = paragraphs.len();
        metrics::counter!(DOCUMENTS_INDEXED_TOTAL).increment(1);
        metrics::counter!(PARAGRAPHS_INDEXED_TOTAL).increment(indexed as u64);
        info!(indexed = indexed, "Document indexed");

        Ok(indexed)
    }

    /// Index a batch of documents sequentially, returning the total
    /// paragraphs indexed. Per-document failures are logged and skipped
    /// so one bad document does not sink the batch.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn index_documents(
        &self,
        documents: &[(std::path::PathBuf, DocumentMetadata)],
    ) -> Result<usize> {
        let mut total = 0;

        for (path, metadata) in documents {
            match self.index_document(path, metadata).await {
                Ok(indexed) => total += indexed,
                Err(e) => {
                    error!(
                        document_id = %metadata.document_id,
                        path = %path.display(),
                        error = %e,
                        "Failed to index document"
                    );
                }
            }
        }

        info!(total = total, "Batch ingestion complete");
        Ok(total)
    }

    /// Remove records by id. Deleting unknown ids is a no-op.
    pub async fn delete(&self, ids: &[String]) -> Result<()> {
        self.index.delete(ids).await
    }
}
