//! Vector index gateway
//!
//! Upserts, queries, and deletes vector records in a remote similarity
//! index. Writes are batched (batch size 100, issued in sequence) and
//! retried under the shared [`RetryPolicy`]; upsert is idempotent by
//! record id (last write wins), which is what makes re-ingestion safe.
//! The read path is a single best-effort attempt.

use crate::config::VectorIndexConfig;
use crate::errors::{AppError, Result};
use crate::retry::RetryPolicy;
use crate::types::{QueryMatch, VectorRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Trait for the similarity index backing store
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert-or-overwrite records by id. Batched internally; a failed
    /// batch aborts the remaining batches (partial writes are safe to
    /// leave because re-ingestion overwrites by id).
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()>;

    /// Top-`top_k` matches for `vector` within `namespace`, sorted by
    /// descending score.
    async fn query(&self, vector: &[f32], top_k: usize, namespace: &str)
        -> Result<Vec<QueryMatch>>;

    /// Remove records by id. Deleting a non-existent id is a no-op.
    async fn delete(&self, ids: &[String]) -> Result<()>;
}

/// HTTP client for a Pinecone-style vector index service
#[derive(Debug)]
pub struct RemoteVectorIndex {
    client: reqwest::Client,
    url: String,
    api_key: String,
    namespace: String,
    batch_size: usize,
    retry: RetryPolicy,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    namespace: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
    namespace: &'a str,
}

impl RemoteVectorIndex {
    /// Create a new index client from configuration.
    pub fn new(config: &VectorIndexConfig, retry: RetryPolicy) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "vector_index.api_key is required".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            api_key,
            namespace: config.namespace.clone(),
            batch_size: config.batch_size.max(1),
            retry,
        })
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.url, path))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::VectorStoreWrite {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::VectorStoreWrite {
                message: format!("API error {}: {}", status, body),
            });
        }

        Ok(response)
    }

    async fn upsert_batch(&self, batch: &[VectorRecord]) -> Result<()> {
        self.post_json(
            "/vectors/upsert",
            &UpsertRequest {
                vectors: batch,
                namespace: &self.namespace,
            },
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for RemoteVectorIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        for batch in records.chunks(self.batch_size) {
            self.retry
                .run("vector_upsert", || self.upsert_batch(batch))
                .await?;
        }

        debug!(
            records = records.len(),
            batches = records.len().div_ceil(self.batch_size),
            namespace = %self.namespace,
            "Upsert complete"
        );
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<QueryMatch>> {
        // Single attempt: a failed read is immediately visible and
        // re-issuable by the caller.
        let response = self
            .post_json(
                "/query",
                &QueryRequest {
                    vector,
                    top_k,
                    include_metadata: true,
                    namespace,
                },
            )
            .await
            .map_err(|e| AppError::VectorStoreRead {
                message: e.to_string(),
            })?;

        let result: QueryResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::VectorStoreRead {
                    message: format!("Failed to parse response: {}", e),
                })?;

        Ok(result.matches)
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.post_json(
            "/vectors/delete",
            &DeleteRequest {
                ids,
                namespace: &self.namespace,
            },
        )
        .await?;
        Ok(())
    }
}

/// In-memory index for tests and local runs.
///
/// Brute-force cosine similarity over all stored vectors; upsert is
/// last-write-wins by id, matching the remote store's semantics.
/// Holds a single flat record space, so the query namespace is accepted
/// and ignored.
#[derive(Default)]
pub struct MemoryVectorIndex {
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch a record by id (test support).
    pub fn get(&self, id: &str) -> Option<VectorRecord> {
        self.records.read().unwrap().get(id).cloned()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        let mut stored = self.records.write().unwrap();
        for record in records {
            stored.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        _namespace: &str,
    ) -> Result<Vec<QueryMatch>> {
        let stored = self.records.read().unwrap();
        let mut matches: Vec<QueryMatch> = stored
            .values()
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.values).max(0.0),
                metadata: record.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut stored = self.records.write().unwrap();
        for id in ids {
            stored.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, values: Vec<f32>, text: &str) -> VectorRecord {
        VectorRecord {
            id: id.into(),
            values,
            metadata: json!({ "text": text }),
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_id() {
        let index = MemoryVectorIndex::new();

        let records = vec![
            record("doc1_p0", vec![1.0, 0.0], "first"),
            record("doc1_p1", vec![0.0, 1.0], "second"),
        ];
        index.upsert(records.clone()).await.unwrap();
        index.upsert(records).await.unwrap();

        assert_eq!(index.len(), 2);

        // re-upsert with new values overwrites
        index
            .upsert(vec![record("doc1_p0", vec![0.5, 0.5], "updated")])
            .await
            .unwrap();
        assert_eq!(index.len(), 2);
        let stored = index.get("doc1_p0").unwrap();
        assert_eq!(stored.metadata["text"], "updated");
        assert_eq!(stored.values, vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn test_query_sorted_and_bounded() {
        let index = MemoryVectorIndex::new();
        index
            .upsert(vec![
                record("a", vec![1.0, 0.0], "aligned"),
                record("b", vec![0.7, 0.7], "diagonal"),
                record("c", vec![0.0, 1.0], "orthogonal"),
            ])
            .await
            .unwrap();

        let matches = index.query(&[1.0, 0.0], 2, "default").await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert!(matches[0].score >= matches[1].score);
        assert!(matches[0].score > 0.99);
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_noop() {
        let index = MemoryVectorIndex::new();
        index
            .upsert(vec![record("a", vec![1.0], "text")])
            .await
            .unwrap();

        index
            .delete(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_remote_index_requires_api_key() {
        let config = VectorIndexConfig::default();
        let err = RemoteVectorIndex::new(&config, RetryPolicy::default()).unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }
}
