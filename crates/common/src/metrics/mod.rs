//! Metrics and observability utilities
//!
//! Metric names and registration for the ingestion and query paths.
//! Recording goes through the `metrics` facade; wiring an exporter is
//! left to the embedding application.

use metrics::{describe_counter, describe_histogram, Unit};

/// Metrics prefix for all RAPT metrics
pub const METRICS_PREFIX: &str = "rapt";

pub const DOCUMENTS_INDEXED_TOTAL: &str = "rapt_documents_indexed_total";
pub const PARAGRAPHS_INDEXED_TOTAL: &str = "rapt_paragraphs_indexed_total";
pub const EMBEDDING_REQUESTS_TOTAL: &str = "rapt_embedding_requests_total";
pub const RETRY_ATTEMPTS_TOTAL: &str = "rapt_retry_attempts_total";
pub const QUERY_TURNS_TOTAL: &str = "rapt_query_turns_total";
pub const LLM_TOKENS_TOTAL: &str = "rapt_llm_tokens_total";
pub const EMBEDDING_DURATION_SECONDS: &str = "rapt_embedding_duration_seconds";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        DOCUMENTS_INDEXED_TOTAL,
        Unit::Count,
        "Documents successfully indexed"
    );

    describe_counter!(
        PARAGRAPHS_INDEXED_TOTAL,
        Unit::Count,
        "Paragraphs embedded and upserted"
    );

    describe_counter!(
        EMBEDDING_REQUESTS_TOTAL,
        Unit::Count,
        "Batched requests issued to the embedding service"
    );

    describe_counter!(
        RETRY_ATTEMPTS_TOTAL,
        Unit::Count,
        "Failed upstream attempts that were retried"
    );

    describe_counter!(
        QUERY_TURNS_TOTAL,
        Unit::Count,
        "Conversation turns answered by the query engine"
    );

    describe_counter!(
        LLM_TOKENS_TOTAL,
        Unit::Count,
        "Tokens reported by the language model, labeled by kind"
    );

    describe_histogram!(
        EMBEDDING_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of a full embed invocation"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_carry_prefix() {
        for name in [
            DOCUMENTS_INDEXED_TOTAL,
            PARAGRAPHS_INDEXED_TOTAL,
            EMBEDDING_REQUESTS_TOTAL,
            RETRY_ATTEMPTS_TOTAL,
            QUERY_TURNS_TOTAL,
            LLM_TOKENS_TOTAL,
            EMBEDDING_DURATION_SECONDS,
        ] {
            assert!(name.starts_with(METRICS_PREFIX));
        }
    }
}
