//! Session Lifecycle - Message Tracking, Flush, Hierarchical Summary
//!
//! `TigerStyle`: Atomic single-flight flush, graceful summary fallbacks.
//!
//! Tracks the ordered in-memory message list for one conversation, mirrors
//! turns into the active-session pool, drives periodic and end-of-session
//! flushes through the Processor, and closes a session out with hierarchical
//! summarization: chunk, summarize each chunk, meta-summarize, title.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::{
    POOL_PRIORITY_ASSISTANT_TURN, POOL_PRIORITY_USER_TURN, SESSION_CHUNK_FALLBACK_CHARS_MAX,
    SESSION_SUMMARY_CHUNK_SIZE_DEFAULT, SESSION_SUMMARY_FALLBACK_CHARS_MAX,
};
use crate::llm::{prompts, GenerationRequest, LlmProvider, TaskType};
use crate::pool::{PoolItem, PoolName, SharedMemoryManager};
use crate::processor::{MemoryProcessor, ProcessError};
use crate::storage::{MemoryStore, Role, SessionPatch, StorageError, VectorStore};

static DOUBLE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new("  +").expect("space pattern"));

// =============================================================================
// Error Types
// =============================================================================

/// Errors from session lifecycle operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Durable session or memory persistence failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The enrichment pipeline failed fatally during a flush
    #[error("processing error: {0}")]
    Process(#[from] ProcessError),

    /// No session has been started
    #[error("no active session")]
    NoActiveSession,
}

// =============================================================================
// Messages
// =============================================================================

/// One turn of the in-memory conversation log.
#[derive(Debug, Clone)]
pub struct SessionMessage {
    /// Turn role
    pub role: Role,
    /// Cleaned content
    pub content: String,
    /// Arrival time
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SessionState {
    session_id: Option<i64>,
    project: Option<String>,
    messages: Vec<SessionMessage>,
    /// Indices already flushed to durable memory
    flushed: HashSet<usize>,
}

// =============================================================================
// Session Lifecycle
// =============================================================================

/// Per-conversation lifecycle driver.
///
/// One instance per session; no cross-session sharing. Mutation of the
/// message list happens under a plain mutex never held across await points,
/// and the flush path is guarded by an atomic single-flight gate so a
/// background flush, a periodic flush, and an end-of-session flush can never
/// double-process a message.
pub struct SessionLifecycle<L, S, V> {
    store: Arc<S>,
    processor: Arc<MemoryProcessor<L, S, V>>,
    manager: SharedMemoryManager,
    llm: Arc<L>,
    summary_chunk_size: usize,
    state: Arc<StdMutex<SessionState>>,
    flushing: Arc<AtomicBool>,
}

impl<L, S, V> Clone for SessionLifecycle<L, S, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            processor: Arc::clone(&self.processor),
            manager: self.manager.clone(),
            llm: Arc::clone(&self.llm),
            summary_chunk_size: self.summary_chunk_size,
            state: Arc::clone(&self.state),
            flushing: Arc::clone(&self.flushing),
        }
    }
}

impl<L, S, V> SessionLifecycle<L, S, V>
where
    L: LlmProvider + 'static,
    S: MemoryStore + 'static,
    V: VectorStore + 'static,
{
    /// Create a lifecycle over shared collaborators.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        processor: Arc<MemoryProcessor<L, S, V>>,
        manager: SharedMemoryManager,
        llm: Arc<L>,
    ) -> Self {
        Self {
            store,
            processor,
            manager,
            llm,
            summary_chunk_size: SESSION_SUMMARY_CHUNK_SIZE_DEFAULT,
            state: Arc::new(StdMutex::new(SessionState::default())),
            flushing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the hierarchical summarization chunk size.
    ///
    /// # Panics
    /// Debug-panics on zero.
    #[must_use]
    pub fn with_summary_chunk_size(mut self, size: usize) -> Self {
        debug_assert!(size > 0, "chunk size must be positive");
        self.summary_chunk_size = size;
        self
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current session id, if started.
    #[must_use]
    pub fn session_id(&self) -> Option<i64> {
        self.lock_state().session_id
    }

    /// Current project label, if any.
    #[must_use]
    pub fn project(&self) -> Option<String> {
        self.lock_state().project.clone()
    }

    /// The pool manager handle this lifecycle mirrors turns into. The agent
    /// loop gathers prompt context through it.
    #[must_use]
    pub fn manager(&self) -> &SharedMemoryManager {
        &self.manager
    }

    /// Number of messages in the in-memory log.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.lock_state().messages.len()
    }

    /// Snapshot of the in-memory log.
    #[must_use]
    pub fn messages(&self) -> Vec<SessionMessage> {
        self.lock_state().messages.clone()
    }

    /// Start a new session, or resume an existing one.
    ///
    /// Resuming loads the session's durable memories into the in-memory log,
    /// all marked as already flushed, and restores the session id and
    /// project.
    ///
    /// # Errors
    /// When session creation or the resume reads fail.
    #[tracing::instrument(skip(self))]
    pub async fn start(
        &self,
        project: Option<&str>,
        resume_session_id: Option<i64>,
    ) -> Result<i64, SessionError> {
        if let Some(resume_id) = resume_session_id {
            if let Some(session) = self.store.get_session(resume_id).await? {
                let memories = self.store.memories_by_session(session.id).await?;

                let mut state = self.lock_state();
                state.session_id = Some(session.id);
                state.project.clone_from(&session.project);
                state.messages.clear();
                state.flushed.clear();
                for memory in &memories {
                    state.messages.push(SessionMessage {
                        role: memory.role,
                        content: memory.content.clone(),
                        timestamp: memory.timestamp,
                    });
                    let index = state.messages.len() - 1;
                    state.flushed.insert(index);
                }
                info!(session_id = session.id, messages = memories.len(), "resumed session");
                return Ok(session.id);
            }
        }

        let session_id = self.store.create_session("New Session", project).await?;
        {
            let mut state = self.lock_state();
            state.session_id = Some(session_id);
            state.project = project.map(str::to_string);
            state.messages.clear();
            state.flushed.clear();
        }
        info!(session_id, ?project, "started new session");
        Ok(session_id)
    }

    /// Append a turn and mirror it into the active-session pool.
    ///
    /// User turns carry priority 1.0, everything else 0.8.
    pub async fn add_message(&self, role: Role, content: &str) {
        let cleaned = clean_text(content);

        let session_id = {
            let mut state = self.lock_state();
            state.messages.push(SessionMessage {
                role,
                content: cleaned.clone(),
                timestamp: Utc::now(),
            });
            state.session_id
        };

        let priority = if role == Role::User {
            POOL_PRIORITY_USER_TURN
        } else {
            POOL_PRIORITY_ASSISTANT_TURN
        };
        let mut item =
            PoolItem::new(format!("{role}: {cleaned}"), role).with_priority(priority);
        if let Some(id) = session_id {
            item = item.with_session(id);
        }
        self.manager
            .add_memory(PoolName::ActiveSession.as_str(), item)
            .await;
    }

    /// Flush unflushed user/assistant messages into durable memory.
    ///
    /// Guarded by an atomic single-flight gate: a call that finds another
    /// flush in flight is a no-op. Messages are marked flushed one by one, so
    /// a failed flush resumes where it stopped. Touches the durable session
    /// row on completion.
    ///
    /// # Errors
    /// When the Processor's mandatory persistence step or the session touch
    /// fails. The single-flight gate is always released.
    pub async fn dump_to_memory(&self) -> Result<(), SessionError> {
        if self
            .flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("flush already in flight");
            return Ok(());
        }

        let result = self.flush_inner().await;
        self.flushing.store(false, Ordering::Release);
        result
    }

    async fn flush_inner(&self) -> Result<(), SessionError> {
        let (session_id, pending) = {
            let state = self.lock_state();
            let Some(session_id) = state.session_id else {
                return Ok(());
            };
            let pending: Vec<(usize, SessionMessage)> = state
                .messages
                .iter()
                .enumerate()
                .filter(|(index, _)| !state.flushed.contains(index))
                .map(|(index, message)| (index, message.clone()))
                .collect();
            (session_id, pending)
        };

        for (index, message) in pending {
            if message.role == Role::User || message.role == Role::Assistant {
                self.processor
                    .process_message(&message.content, message.role, Some(session_id))
                    .await?;
            }
            self.lock_state().flushed.insert(index);
        }

        let message_count = self.message_count();
        self.store
            .update_session(
                session_id,
                SessionPatch::new()
                    .touch(Utc::now())
                    .with_message_count(message_count),
            )
            .await?;
        Ok(())
    }

    /// Fire-and-forget flush for the periodic path.
    ///
    /// Errors are logged; completion is not awaited.
    pub fn spawn_dump(&self) {
        let lifecycle = self.clone();
        tokio::spawn(async move {
            if let Err(e) = lifecycle.dump_to_memory().await {
                warn!(error = %e, "background flush failed");
            }
        });
    }

    /// End the session: flush the remainder, then build the hierarchical
    /// summary and title and persist them to the session row.
    ///
    /// # Errors
    /// When reading the session's memories or persisting the summary fails.
    #[tracing::instrument(skip(self))]
    pub async fn end_session(&self) -> Result<(), SessionError> {
        let Some(session_id) = self.session_id() else {
            return Err(SessionError::NoActiveSession);
        };

        if let Err(e) = self.dump_to_memory().await {
            warn!(error = %e, "final flush failed, summarizing what was stored");
        }

        self.create_session_summary(session_id).await?;
        info!(session_id, "session ended");
        Ok(())
    }

    /// Hierarchical summarization: when the session's memory count exceeds
    /// the chunk size, summarize consecutive chunks independently and then
    /// meta-summarize the chunk summaries; otherwise summarize directly.
    /// Every LLM call has a deterministic fallback.
    async fn create_session_summary(&self, session_id: i64) -> Result<(), SessionError> {
        let memories = self.store.memories_by_session(session_id).await?;
        if memories.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = memories
            .iter()
            .map(|memory| memory.summary_or_content())
            .collect();

        let summary = if texts.len() > self.summary_chunk_size {
            let mut chunk_summaries = Vec::new();
            for chunk in texts.chunks(self.summary_chunk_size) {
                let chunk_text = chunk.join("\n");
                let chunk_summary = match self
                    .generate_utility(prompts::summarize_session_summaries(&chunk_text))
                    .await
                {
                    Ok(summary) => summary,
                    Err(e) => {
                        warn!(error = %e, "chunk summarization failed");
                        truncate_chars(&chunk_text, SESSION_CHUNK_FALLBACK_CHARS_MAX)
                    }
                };
                chunk_summaries.push(chunk_summary);
            }

            let combined = chunk_summaries.join("\n");
            match self
                .generate_utility(prompts::summarize_session_summaries(&combined))
                .await
            {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(error = %e, "meta-summarization failed");
                    combined
                }
            }
        } else {
            let all_text = texts.join("\n");
            match self
                .generate_utility(prompts::summarize_session_conversation(&all_text))
                .await
            {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(error = %e, "session summarization failed");
                    truncate_chars(&all_text, SESSION_SUMMARY_FALLBACK_CHARS_MAX)
                }
            }
        };

        let title = match self
            .generate_utility(prompts::generate_session_title(&summary))
            .await
        {
            Ok(title) => title,
            Err(e) => {
                warn!(error = %e, "title generation failed");
                format!("Session {session_id}")
            }
        };

        self.store
            .update_session(
                session_id,
                SessionPatch::new()
                    .with_title(title.trim())
                    .with_summary(summary.trim()),
            )
            .await?;
        Ok(())
    }

    async fn generate_utility(&self, prompt: String) -> Result<String, crate::llm::GenerationError> {
        let request = GenerationRequest::new(prompt).with_system(prompts::UTILITY_SYSTEM_PROMPT);
        self.llm.generate(TaskType::Summarization, &request).await
    }
}

// =============================================================================
// Text Cleaning
// =============================================================================

/// Normalize line endings, turn tabs into spaces, and collapse runs of
/// spaces.
fn clean_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let cleaned = text.trim().replace("\r\n", "\n").replace('\t', " ");
    DOUBLE_SPACE.replace_all(&cleaned, " ").to_string()
}

/// Truncate to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// =============================================================================
// Tests
// =============================================================================
