//! RAPT Ingestion CLI
//!
//! Operates the indexing pipeline locally:
//! - `ingestion index <pdf> <document_id> [title]`
//! - `ingestion batch <pdf>...` (document id taken from the file stem)
//! - `ingestion delete <record_id>...`

use rapt_ingestion::{DocumentIndexer, PdfExtractor, TesseractOcr};
use rapt_common::config::AppConfig;
use rapt_common::embeddings::OpenAiEmbedder;
use rapt_common::metrics::register_metrics;
use rapt_common::types::DocumentMetadata;
use rapt_common::vector::RemoteVectorIndex;
use rapt_common::VERSION;
use std::path::Path;
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
    info!("Starting RAPT ingestion v{}", VERSION);

    let retry = config.retry_policy();
    let ocr = Arc::new(TesseractOcr::new(config.ocr.clone()));
    let extractor = Arc::new(PdfExtractor::new(ocr));
    let embedder = Arc::new(OpenAiEmbedder::new(&config.embedding, retry)?);
    let index = Arc::new(RemoteVectorIndex::new(&config.vector_index, retry)?);
    let indexer = DocumentIndexer::new(extractor, embedder, index);

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("index") if args.len() >= 4 => {
            let path = Path::new(&args[2]);
            let mut metadata = DocumentMetadata::new(args[3].clone());
            metadata.title = args.get(4).cloned();

            let indexed = indexer.index_document(path, &metadata).await?;
            println!("{{\"indexed_paragraphs\": {}}}", indexed);
        }
        Some("batch") if args.len() >= 3 => {
            let documents: Vec<(std::path::PathBuf, DocumentMetadata)> = args[2..]
                .iter()
                .map(|arg| {
                    let path = std::path::PathBuf::from(arg);
                    let document_id = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| arg.clone());
                    (path, DocumentMetadata::new(document_id))
                })
                .collect();

            let total = indexer.index_documents(&documents).await?;
            println!("{{\"indexed_paragraphs\": {}}}", total);
        }
        Some("delete") if args.len() >= 3 => {
            let ids: Vec<String> = args[2..].to_vec();
            indexer.delete(&ids).await?;
            println!("Deleted {} record(s)", ids.len());
        }
        _ => {
            eprintln!("Usage:");
            eprintln!("  ingestion index <pdf> <document_id> [title]");
            eprintln!("  ingestion batch <pdf>...");
            eprintln!("  ingestion delete <record_id>...");
            std::process::exit(2);
        }
    }

    Ok(())
}
