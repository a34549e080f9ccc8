//! End-to-end ingestion pipeline tests over in-memory fakes.

use async_trait::async_trait;
use rapt_common::embeddings::{Embedder, MockEmbedder};
use rapt_common::errors::{AppError, Result};
use rapt_common::types::DocumentMetadata;
use rapt_common::vector::{MemoryVectorIndex, VectorIndex};
use rapt_ingestion::pdf::TextExtractor;
use rapt_ingestion::DocumentIndexer;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Extractor fake returning a fixed paragraph list and counting calls.
struct StaticExtractor {
    paragraphs: Vec<String>,
    calls: AtomicUsize,
}

impl StaticExtractor {
    fn new(paragraphs: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            paragraphs: paragraphs.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for StaticExtractor {
    async fn extract(&self, _path: &Path) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.paragraphs.clone())
    }
}

/// Extractor fake that always fails to parse.
struct BrokenExtractor;

#[async_trait]
impl TextExtractor for BrokenExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<String>> {
        Err(AppError::DocumentFormat {
            message: format!("Cannot parse {}", path.display()),
        })
    }
}

fn pipeline(
    extractor: Arc<dyn TextExtractor>,
) -> (DocumentIndexer, Arc<MockEmbedder>, Arc<MemoryVectorIndex>) {
    let embedder = Arc::new(MockEmbedder::new(16));
    let index = Arc::new(MemoryVectorIndex::new());
    let indexer = DocumentIndexer::new(extractor, embedder.clone(), index.clone());
    (indexer, embedder, index)
}

#[tokio::test]
async fn two_paragraph_document_yields_two_records() {
    let extractor = StaticExtractor::new(&["First paragraph.", "Second paragraph."]);
    let (indexer, _, index) = pipeline(extractor.clone());

    let metadata = DocumentMetadata::new("doc1");
    let indexed = indexer
        .index_document(Path::new("doc1.pdf"), &metadata)
        .await
        .unwrap();

    assert_eq!(indexed, 2);
    assert_eq!(index.len(), 2);

    let p0 = index.get("doc1_p0").unwrap();
    let p1 = index.get("doc1_p1").unwrap();
    assert_eq!(p0.metadata["text"], "First paragraph.");
    assert_eq!(p0.metadata["paragraph_id"], 0);
    assert_eq!(p1.metadata["text"], "Second paragraph.");
    assert_eq!(p1.metadata["document_id"], "doc1");
}

#[tokio::test]
async fn reingestion_overwrites_instead_of_duplicating() {
    let extractor = StaticExtractor::new(&["First paragraph.", "Second paragraph."]);
    let (indexer, _, index) = pipeline(extractor);

    let metadata = DocumentMetadata::new("doc1");
    indexer
        .index_document(Path::new("doc1.pdf"), &metadata)
        .await
        .unwrap();
    indexer
        .index_document(Path::new("doc1.pdf"), &metadata)
        .await
        .unwrap();

    assert_eq!(index.len(), 2);
}

#[tokio::test]
async fn missing_document_id_fails_before_extraction() {
    let extractor = StaticExtractor::new(&["unused"]);
    let (indexer, embedder, index) = pipeline(extractor.clone());

    let metadata = DocumentMetadata::new("");
    let err = indexer
        .index_document(Path::new("doc.pdf"), &metadata)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::MetadataValidation { .. }));
    assert_eq!(extractor.calls(), 0);
    assert_eq!(embedder.batch_calls(), 0);
    assert!(index.is_empty());
}

#[tokio::test]
async fn empty_document_is_soft_success_with_no_remote_calls() {
    let extractor = StaticExtractor::new(&[]);
    let (indexer, embedder, index) = pipeline(extractor.clone());

    let metadata = DocumentMetadata::new("doc1");
    let indexed = indexer
        .index_document(Path::new("doc1.pdf"), &metadata)
        .await
        .unwrap();

    assert_eq!(indexed, 0);
    assert_eq!(extractor.calls(), 1);
    assert_eq!(embedder.batch_calls(), 0);
    assert!(index.is_empty());
}

#[tokio::test]
async fn format_error_propagates_unchanged() {
    let (indexer, embedder, index) = pipeline(Arc::new(BrokenExtractor));

    let metadata = DocumentMetadata::new("doc1");
    let err = indexer
        .index_document(Path::new("bad.pdf"), &metadata)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DocumentFormat { .. }));
    assert_eq!(embedder.batch_calls(), 0);
    assert!(index.is_empty());
}

#[tokio::test]
async fn batch_ingestion_skips_failures_and_sums_the_rest() {
    let extractor = StaticExtractor::new(&["One.", "Two.", "Three."]);
    let (indexer, _, index) = pipeline(extractor);

    let documents = vec![
        (PathBuf::from("a.pdf"), DocumentMetadata::new("docA")),
        // invalid metadata: logged and skipped
        (PathBuf::from("b.pdf"), DocumentMetadata::new("")),
        (PathBuf::from("c.pdf"), DocumentMetadata::new("docC")),
    ];

    let total = indexer.index_documents(&documents).await.unwrap();
    assert_eq!(total, 6);
    assert_eq!(index.len(), 6);
}

#[tokio::test]
async fn delete_removes_records_by_id() {
    let extractor = StaticExtractor::new(&["One.", "Two."]);
    let (indexer, _, index) = pipeline(extractor);

    let metadata = DocumentMetadata::new("doc1");
    indexer
        .index_document(Path::new("doc1.pdf"), &metadata)
        .await
        .unwrap();

    indexer
        .delete(&["doc1_p0".to_string(), "never-existed".to_string()])
        .await
        .unwrap();

    assert_eq!(index.len(), 1);
    assert!(index.get("doc1_p0").is_none());
    assert!(index.get("doc1_p1").is_some());
}
