//! Conversation session registry
//!
//! One mutable session per conversation id, created lazily on first use
//! and owned by the registry for the process lifetime. Handles are
//! `Arc<Mutex<...>>`; the engine holds the lock for a whole turn, so at
//! most one turn per conversation is in flight and history cannot
//! interleave. Lookup-or-create is a single atomic operation, so
//! concurrent first turns on the same unseen id always land on the same
//! session. The in-memory store is capacity-bounded with
//! least-recently-used eviction.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// One completed (query, response) exchange.
#[derive(Debug, Clone)]
pub struct Turn {
    pub query: String,
    pub response: String,
}

/// Per-conversation mutable state.
#[derive(Debug)]
pub struct ConversationSession {
    pub conversation_id: String,
    /// Generation temperature; fixed at session creation
    pub temperature: f32,
    /// Minimum similarity score for a match to be used as context;
    /// fixed at session creation
    pub relevance_threshold: f32,
    pub namespace: String,
    /// Ordered (query, response) history
    pub history: Vec<Turn>,
    /// Running list of context texts seen by this conversation
    pub contexts: Vec<String>,
}

impl ConversationSession {
    pub fn new(
        conversation_id: impl Into<String>,
        temperature: f32,
        relevance_threshold: f32,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            temperature,
            relevance_threshold,
            namespace: namespace.into(),
            history: Vec::new(),
            contexts: Vec::new(),
        }
    }
}

/// Shared handle to one session
pub type SessionHandle = Arc<Mutex<ConversationSession>>;

/// Trait for session storage, injectable so tests can substitute their
/// own implementation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session, marking it recently used.
    async fn get(&self, conversation_id: &str) -> Option<SessionHandle>;

    /// Return the handle already registered for the session's
    /// conversation id, or register `session` and return its handle.
    /// Lookup and insertion happen under one registry lock: callers
    /// racing on an unseen id all receive the same handle.
    async fn get_or_insert(&self, session: ConversationSession) -> SessionHandle;

    /// Number of live sessions.
    async fn len(&self) -> usize;
}

struct Entry {
    last_used: u64,
    handle: SessionHandle,
}

struct Inner {
    clock: u64,
    entries: HashMap<String, Entry>,
}

/// In-memory session store with LRU eviction.
pub struct InMemorySessions {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl InMemorySessions {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                clock: 0,
                entries: HashMap::new(),
            }),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessions {
    async fn get(&self, conversation_id: &str) -> Option<SessionHandle> {
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let clock = inner.clock;
        inner.entries.get_mut(conversation_id).map(|entry| {
            entry.last_used = clock;
            entry.handle.clone()
        })
    }

    async fn get_or_insert(&self, session: ConversationSession) -> SessionHandle {
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let clock = inner.clock;

        let id = session.conversation_id.clone();
        if let Some(entry) = inner.entries.get_mut(&id) {
            entry.last_used = clock;
            return entry.handle.clone();
        }

        if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone())
            {
                debug!(conversation_id = %oldest, "Evicting least-recently-used session");
                inner.entries.remove(&oldest);
            }
        }

        let handle: SessionHandle = Arc::new(Mutex::new(session));
        inner.entries.insert(
            id,
            Entry {
                last_used: clock,
                handle: handle.clone(),
            },
        );
        handle
    }

    async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}
