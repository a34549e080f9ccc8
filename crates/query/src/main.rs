//! RAPT Query CLI
//!
//! Answers one query per invocation:
//! - `query ask <text> [conversation_id]`

use rapt_common::config::AppConfig;
use rapt_common::embeddings::OpenAiEmbedder;
use rapt_common::metrics::register_metrics;
use rapt_common::vector::RemoteVectorIndex;
use rapt_common::VERSION;
use rapt_query::{InMemorySessions, OpenAiChat, QueryRequest, RagEngine};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    register_metrics();
    info!("Starting RAPT query v{}", VERSION);

    let retry = config.retry_policy();
    let embedder = Arc::new(OpenAiEmbedder::new(&config.embedding, retry)?);
    let index = Arc::new(RemoteVectorIndex::new(&config.vector_index, retry)?);
    let llm = Arc::new(OpenAiChat::new(&config.llm)?);
    let sessions = Arc::new(InMemorySessions::new(config.sessions.capacity));
    let engine = RagEngine::new(
        embedder,
        index,
        llm,
        sessions,
        config.vector_index.top_k,
        config.vector_index.namespace.clone(),
    );

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("ask") if args.len() >= 3 => {
            let response = engine
                .answer(QueryRequest {
                    text: args[2].clone(),
                    temperature: 0.1,
                    threshold: 0.3,
                    namespace: None,
                    conversation_id: args.get(3).cloned(),
                })
                .await?;
            println!("{}", serde_json::to_string(&response)?);
        }
        _ => {
            eprintln!("Usage:");
            eprintln!("  query ask <text> [conversation_id]");
            std::process::exit(2);
        }
    }

    Ok(())
}
