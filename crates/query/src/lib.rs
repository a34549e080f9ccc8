//! RAPT Query Engine
//!
//! Answers user queries with retrieval-augmented generation:
//! 1. Resolves or lazily creates per-conversation session state
//! 2. Embeds the query and retrieves top-K similar chunks
//! 3. Filters matches by the session's relevance threshold
//! 4. Assembles a structured prompt and delegates generation to a
//!    language-model client
//!
//! Sessions live in process memory only and are lost on restart.

pub mod engine;
pub mod llm;
pub mod prompt;
pub mod session;

pub use engine::{QueryRequest, QueryResponse, RagEngine};
pub use llm::{ChatModel, Completion, OpenAiChat};
pub use session::{ConversationSession, InMemorySessions, SessionStore};
