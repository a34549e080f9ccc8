//! Retrieval-augmented query engine
//!
//! One `answer` call is one conversation turn: embed the query, fetch
//! the top-K nearest chunks, keep only matches at or above the
//! session's relevance threshold, and generate a response from the
//! assembled prompt. A session's temperature and threshold are fixed by
//! the first request that created it; later requests against the same
//! conversation id reuse the stored values.

use std::sync::Arc;

use rapt_common::embeddings::Embedder;
use rapt_common::errors::{AppError, Result};
use rapt_common::metrics::QUERY_TURNS_TOTAL;
use rapt_common::vector::VectorIndex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::llm::ChatModel;
use crate::prompt::{build_prompt, NO_CONTEXT_FOUND, STOP_SEQUENCE};
use crate::session::{ConversationSession, SessionStore, Turn};

/// One user query.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub text: String,

    /// Generation temperature; only honored when this request creates
    /// the session
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Relevance threshold; only honored when this request creates the
    /// session
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Index namespace override for the session
    #[serde(default)]
    pub namespace: Option<String>,

    /// Continue an existing conversation; omitted starts a new one
    #[serde(default)]
    pub conversation_id: Option<String>,
}

fn default_temperature() -> f32 {
    0.1
}

fn default_threshold() -> f32 {
    0.3
}

/// One generated answer.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub response: String,
    /// Echoed or freshly generated; clients pass it back to continue
    /// the conversation
    pub conversation_id: String,
}

/// The query pipeline: embedding, retrieval, threshold filtering,
/// prompt assembly, and generation.
pub struct RagEngine {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn ChatModel>,
    sessions: Arc<dyn SessionStore>,
    top_k: usize,
    namespace: String,
}

impl RagEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn ChatModel>,
        sessions: Arc<dyn SessionStore>,
        top_k: usize,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            sessions,
            top_k: top_k.max(1),
            namespace: namespace.into(),
        }
    }

    /// Answer one conversation turn.
    #[instrument(skip(self, request), fields(conversation_id))]
    pub async fn answer(&self, request: QueryRequest) -> Result<QueryResponse> {
        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::Span::current().record("conversation_id", conversation_id.as_str());

        // Atomic lookup-or-create: racing first turns on the same id
        // land on one session, and an existing session's settings win.
        let namespace = request
            .namespace
            .clone()
            .unwrap_or_else(|| self.namespace.clone());
        let handle = self
            .sessions
            .get_or_insert(ConversationSession::new(
                conversation_id.clone(),
                request.temperature,
                request.threshold,
                namespace,
            ))
            .await;

        // Holding the lock across the whole turn keeps history ordered
        // under concurrent requests for the same conversation.
        let mut session = handle.lock().await;

        let vectors = self
            .embedder
            .embed_batch(std::slice::from_ref(&request.text))
            .await?;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| AppError::EmbeddingGeneration {
                message: "Embedding service returned no vector for query".to_string(),
            })?;

        let matches = self
            .index
            .query(&query_vector, self.top_k, &session.namespace)
            .await?;
        let qualifying: Vec<_> = matches
            .iter()
            .filter(|m| m.score >= session.relevance_threshold)
            .collect();

        let (context, score) = if qualifying.is_empty() {
            debug!(
                matches = matches.len(),
                threshold = session.relevance_threshold,
                "No match cleared the relevance threshold"
            );
            (NO_CONTEXT_FOUND.to_string(), 0.0)
        } else {
            for m in &qualifying {
                if let Some(text) = m.text() {
                    session.contexts.push(text.to_string());
                }
            }
            (session.contexts.join("\n"), qualifying[0].score)
        };

        let prompt = build_prompt(&request.text, &context, score);
        let completion = self
            .llm
            .generate(&prompt, &[STOP_SEQUENCE.to_string()], session.temperature)
            .await?;

        let response = completion
            .text
            .trim()
            .trim_end_matches(STOP_SEQUENCE)
            .trim()
            .to_string();

        session.history.push(Turn {
            query: request.text,
            response: response.clone(),
        });
        metrics::counter!(QUERY_TURNS_TOTAL).increment(1);
        info!(
            turn = session.history.len(),
            score, "Conversation turn answered"
        );

        Ok(QueryResponse {
            response,
            conversation_id,
        })
    }
}
