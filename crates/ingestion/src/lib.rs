//! RAPT Ingestion
//!
//! Turns a source document into vector-store records:
//! 1. Validates metadata before any work is dispatched
//! 2. Extracts ordered paragraph chunks (OCR fallback per textless page)
//! 3. Embeds chunks in batches
//! 4. Upserts records keyed by stable chunk identifiers

pub mod entities;
pub mod indexer;
pub mod ocr;
pub mod pdf;
pub mod validate;

pub use indexer::DocumentIndexer;
pub use ocr::{NoopOcr, OcrEngine, TesseractOcr};
pub use pdf::{PdfExtractor, TextExtractor};
pub use validate::validate_metadata;
