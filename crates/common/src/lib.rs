//! RAPT Common Library
//!
//! Shared code for the RAPT pipeline crates including:
//! - Core data types (metadata, chunks, vector records)
//! - Error types and handling
//! - Configuration management
//! - Retry policy for upstream calls
//! - Embedding client abstraction
//! - Vector index gateway
//! - Metrics and observability

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod metrics;
pub mod retry;
pub mod types;
pub mod vector;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use retry::RetryPolicy;
pub use types::{Chunk, DocumentMetadata, QueryMatch, VectorRecord};
pub use vector::VectorIndex;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Default embedding dimension (ada-002)
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Batch size used for embedding requests and vector upserts
pub const UPSTREAM_BATCH_SIZE: usize = 100;
