//! Embedding service abstraction
//!
//! Converts text chunks into fixed-dimension vectors via a remote
//! embedding service. Requests are grouped into fixed-size batches to
//! respect provider limits; batches are issued in sequence and results
//! concatenated in input order, so downstream chunk-to-vector alignment
//! by index stays correct. Each batch call runs under the shared
//! [`RetryPolicy`]; an embedding set is all-or-nothing for a given
//! invocation.

use crate::config::EmbeddingConfig;
use crate::errors::{AppError, Result};
use crate::metrics::{EMBEDDING_DURATION_SECONDS, EMBEDDING_REQUESTS_TOTAL};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Trait for embedding generation
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embeddings for `texts`, same length and order as input.
    /// Empty input yields empty output without any remote call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;
}

/// OpenAI-compatible embedding client
#[derive(Debug)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    dimension: usize,
    batch_size: usize,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Create a new embedder from configuration.
    pub fn new(config: &EmbeddingConfig, retry: RetryPolicy) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "embedding.api_key is required".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
            retry,
        })
    }

    async fn request_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.api_base);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&EmbeddingRequest {
                input: texts,
                model: &self.model,
            })
            .send()
            .await
            .map_err(|e| AppError::EmbeddingGeneration {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingGeneration {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::EmbeddingGeneration {
                    message: format!("Failed to parse response: {}", e),
                })?;

        if result.data.len() != texts.len() {
            return Err(AppError::EmbeddingGeneration {
                message: format!(
                    "Provider returned {} vectors for {} inputs",
                    result.data.len(),
                    texts.len()
                ),
            });
        }

        Ok(result.data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            metrics::counter!(EMBEDDING_REQUESTS_TOTAL).increment(1);
            let embeddings = self
                .retry
                .run("embedding", || self.request_batch(batch))
                .await?;
            all_embeddings.extend(embeddings);
        }

        debug!(
            texts = texts.len(),
            batches = texts.len().div_ceil(self.batch_size),
            "Embedding invocation complete"
        );
        metrics::histogram!(EMBEDDING_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        Ok(all_embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Deterministic embedder for tests: identical text always maps to the
/// same vector, so similarity assertions are stable.
pub struct MockEmbedder {
    dimension: usize,
    batch_calls: std::sync::atomic::AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            batch_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of embed_batch invocations that reached this embedder.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        use rand::{Rng, SeedableRng};
        let seed = text
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let raw: Vec<f32> = (0..self.dimension).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt().max(f32::EPSILON);
        raw.into_iter().map(|v| v / norm).collect()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.batch_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_preserves_length_and_order() {
        let embedder = MockEmbedder::new(8);
        let texts: Vec<String> = (0..5).map(|i| format!("text {}", i)).collect();
        let embeddings = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), texts.len());
        for e in &embeddings {
            assert_eq!(e.len(), 8);
        }
        // order preserved: re-embedding a single element matches its slot
        let single = embedder.embed_batch(&texts[2..3]).await.unwrap();
        assert_eq!(single[0], embeddings[2]);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let embedder = MockEmbedder::new(8);
        let embeddings = embedder.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
        assert_eq!(embedder.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_identical_text_identical_vector() {
        let embedder = MockEmbedder::new(16);
        let a = embedder
            .embed_batch(&["same text".to_string()])
            .await
            .unwrap();
        let b = embedder
            .embed_batch(&["same text".to_string()])
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_openai_embedder_empty_input_short_circuits() {
        // No network is reachable in tests; an empty input must return
        // before any request is attempted.
        let config = EmbeddingConfig {
            api_key: Some("test-key".into()),
            ..EmbeddingConfig::default()
        };
        let embedder = OpenAiEmbedder::new(&config, RetryPolicy::default()).unwrap();
        let embeddings = embedder.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_transport_surfaces_embedding_error() {
        // loopback port 1 is never listening, so every attempt fails at
        // connect and the retry budget drains without sleeping
        let config = EmbeddingConfig {
            api_key: Some("test-key".into()),
            api_base: "http://127.0.0.1:1".into(),
            timeout_secs: 1,
            ..EmbeddingConfig::default()
        };
        let retry = RetryPolicy::new(3, std::time::Duration::ZERO, std::time::Duration::ZERO);
        let embedder = OpenAiEmbedder::new(&config, retry).unwrap();

        let err = embedder
            .embed_batch(&["text".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmbeddingGeneration { .. }));
    }

    #[test]
    fn test_openai_embedder_requires_api_key() {
        let config = EmbeddingConfig::default();
        let err = OpenAiEmbedder::new(&config, RetryPolicy::default()).unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }
}
