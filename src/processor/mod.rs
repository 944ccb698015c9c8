//! Memory Processor - Background Enrichment Pipeline
//!
//! `TigerStyle`: One fatal step, everything else degrades gracefully.
//!
//! Pipeline for a conversation message:
//! classify -> summarize -> persist -> embed -> tag -> rank -> importance.
//!
//! Persistence (step 3) is mandatory and its failure propagates; the steps
//! after it are best-effort and never roll it back. A memory may permanently
//! lack tags or a rank if those calls failed; that is an accepted terminal
//! state.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::{
    MEMORY_IMPORTANCE_LLM_DEFAULT, MEMORY_IMPORTANCE_MAX, MEMORY_IMPORTANCE_MIN,
    MEMORY_IMPORTANCE_RECENCY_BONUS, MEMORY_IMPORTANCE_TAG_BONUS,
    MEMORY_IMPORTANCE_TAG_COUNT_THRESHOLD, MEMORY_RANK_DEFAULT, MEMORY_RANK_MAX, MEMORY_RANK_MIN,
};
use crate::llm::{prompts, GenerationRequest, LlmProvider, TaskType};
use crate::noise::should_skip_default;
use crate::storage::{
    Collection, CoreMemoryRecord, LessonRecord, MemoryPatch, MemoryRecord, MemoryStore, Role,
    StorageError, VectorStore,
};
use crate::tagging::tag_message_default;

static DECIMAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").expect("decimal pattern"));

// =============================================================================
// Error Types
// =============================================================================

/// Errors from the enrichment pipeline.
///
/// Only durable persistence failures surface here; every LLM-dependent step
/// degrades silently to its fallback.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Durable persistence failed; no partial row remains
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// Memory Processor
// =============================================================================

/// Background enrichment pipeline over the three collaborators.
#[derive(Debug)]
pub struct MemoryProcessor<L, S, V> {
    llm: Arc<L>,
    store: Arc<S>,
    vectors: Arc<V>,
}

impl<L, S, V> MemoryProcessor<L, S, V>
where
    L: LlmProvider,
    S: MemoryStore,
    V: VectorStore,
{
    /// Create a processor over shared collaborators.
    #[must_use]
    pub fn new(llm: Arc<L>, store: Arc<S>, vectors: Arc<V>) -> Self {
        Self { llm, store, vectors }
    }

    /// Run the full pipeline for one conversation message.
    ///
    /// Returns `Ok(None)` when the message is filtered as noise (no side
    /// effects), `Ok(Some(id))` with the new memory id otherwise.
    ///
    /// # Errors
    /// Only when the mandatory persistence step fails.
    #[tracing::instrument(skip(self, text), fields(role = role.as_str(), len = text.len()))]
    pub async fn process_message(
        &self,
        text: &str,
        role: Role,
        session_id: Option<i64>,
    ) -> Result<Option<i64>, ProcessError> {
        // Step 1: noise gate
        if should_skip_default(text) {
            debug!("skipping noise message");
            return Ok(None);
        }

        // Step 2: summarize, falling back to the raw text
        let summary = match self.generate_utility(TaskType::Summarization, prompts::summarize_memory(text)).await
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "summarization failed, using raw text");
                text.to_string()
            }
        };

        // Step 3: persist (mandatory)
        let record = MemoryRecord::conversation(session_id, role, text, summary.clone());
        let memory_id = self.store.create_memory(&record).await?;

        // Step 4: embed the summary for semantic matching
        let mut metadata = HashMap::new();
        if let Some(sid) = session_id {
            metadata.insert("session_id".to_string(), sid.to_string());
        }
        metadata.insert("role".to_string(), role.as_str().to_string());
        if let Err(e) = self
            .vectors
            .upsert(Collection::Memories, memory_id, &summary, metadata)
            .await
        {
            warn!(memory_id, error = %e, "embedding failed");
        }

        // Step 5: tag
        let tags = tag_message_default(text);
        if let Err(e) = self.store.tag_memory(memory_id, &tags).await {
            warn!(memory_id, error = %e, "tagging failed");
        }

        // Step 6: rank
        match self.generate_utility(TaskType::Ranking, prompts::rank_memory(text)).await {
            Ok(response) => {
                let rank = parse_rank(&response);
                if let Err(e) = self
                    .store
                    .update_memory(memory_id, MemoryPatch::new().with_rank(rank))
                    .await
                {
                    warn!(memory_id, error = %e, "rank update failed");
                }
            }
            Err(e) => warn!(memory_id, error = %e, "ranking failed"),
        }

        // Step 7: importance
        if let Err(e) = self.score_importance(memory_id, text).await {
            warn!(memory_id, error = %e, "importance calculation failed");
        }

        Ok(Some(memory_id))
    }

    /// Persist a core memory with best-effort embed and tag.
    ///
    /// # Errors
    /// Only when persistence fails.
    #[tracing::instrument(skip(self, text))]
    pub async fn process_core_memory(
        &self,
        text: &str,
        session_id: Option<i64>,
    ) -> Result<i64, ProcessError> {
        let record = CoreMemoryRecord::new(text, session_id);
        let core_id = self.store.create_core_memory(&record).await?;

        if let Err(e) = self
            .vectors
            .upsert(Collection::CoreMemories, core_id, text, HashMap::new())
            .await
        {
            warn!(core_id, error = %e, "core memory embedding failed");
        }

        let tags = tag_message_default(text);
        if let Err(e) = self.store.tag_core_memory(core_id, &tags).await {
            warn!(core_id, error = %e, "core memory tagging failed");
        }

        Ok(core_id)
    }

    /// Extract a lesson from a conversation excerpt and persist it, with
    /// best-effort embed and tag. The extraction falls back to the raw
    /// excerpt when the LLM call fails.
    ///
    /// # Errors
    /// Only when persistence fails.
    #[tracing::instrument(skip(self, conversation_text))]
    pub async fn process_lesson(
        &self,
        conversation_text: &str,
        session_id: i64,
    ) -> Result<i64, ProcessError> {
        let lesson_text = match self
            .generate_utility(TaskType::Summarization, prompts::extract_lesson(conversation_text))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "lesson extraction failed, storing raw excerpt");
                conversation_text.to_string()
            }
        };

        let record = LessonRecord::new(lesson_text.clone(), Some(session_id));
        let lesson_id = self.store.create_lesson(&record).await?;

        if let Err(e) = self
            .vectors
            .upsert(Collection::Lessons, lesson_id, &lesson_text, HashMap::new())
            .await
        {
            warn!(lesson_id, error = %e, "lesson embedding failed");
        }

        let tags = tag_message_default(&lesson_text);
        if let Err(e) = self.store.tag_lesson(lesson_id, &tags).await {
            warn!(lesson_id, error = %e, "lesson tagging failed");
        }

        Ok(lesson_id)
    }

    /// Importance = LLM rating (default on failure) + recency bonus +
    /// tag-density bonus, clamped.
    async fn score_importance(&self, memory_id: i64, text: &str) -> Result<(), StorageError> {
        let llm_importance = match self
            .generate_utility(TaskType::Ranking, prompts::ask_importance(text))
            .await
        {
            Ok(response) => parse_unit_float(&response, MEMORY_IMPORTANCE_LLM_DEFAULT),
            Err(_) => MEMORY_IMPORTANCE_LLM_DEFAULT,
        };

        let tag_count = self.store.memory_tag_count(memory_id).await?;
        let importance = compose_importance(llm_importance, tag_count);

        self.store
            .update_memory(memory_id, MemoryPatch::new().with_importance(importance))
            .await
    }

    async fn generate_utility(
        &self,
        task: TaskType,
        prompt: String,
    ) -> Result<String, crate::llm::GenerationError> {
        let request = GenerationRequest::new(prompt).with_system(prompts::UTILITY_SYSTEM_PROMPT);
        self.llm.generate(task, &request).await
    }
}

// =============================================================================
// Parsing Helpers
// =============================================================================

/// First digit in [1, 5] found in the response; default 3.
fn parse_rank(text: &str) -> u8 {
    for ch in text.trim().chars() {
        if let Some(digit) = ch.to_digit(10) {
            #[allow(clippy::cast_possible_truncation)]
            let value = digit as u8;
            if (MEMORY_RANK_MIN..=MEMORY_RANK_MAX).contains(&value) {
                return value;
            }
        }
    }
    MEMORY_RANK_DEFAULT
}

/// First decimal number in the response clamped to [0, 1]; `default` when
/// none parses.
fn parse_unit_float(text: &str, default: f32) -> f32 {
    DECIMAL_PATTERN
        .find(text.trim())
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .map_or(default, |value| {
            value.clamp(MEMORY_IMPORTANCE_MIN, MEMORY_IMPORTANCE_MAX)
        })
}

/// Combine the LLM rating with the recency and tag-density bonuses.
fn compose_importance(llm_importance: f32, tag_count: usize) -> f32 {
    let mut importance = llm_importance + MEMORY_IMPORTANCE_RECENCY_BONUS;
    if tag_count > MEMORY_IMPORTANCE_TAG_COUNT_THRESHOLD {
        importance += MEMORY_IMPORTANCE_TAG_BONUS;
    }
    importance.clamp(MEMORY_IMPORTANCE_MIN, MEMORY_IMPORTANCE_MAX)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType};
    use crate::llm::SimLlmProvider;
    use crate::storage::{SimMemoryStore, SimVectorStore};

    type SimProcessor = MemoryProcessor<SimLlmProvider, SimMemoryStore, SimVectorStore>;

    fn processor(seed: u64) -> (SimProcessor, Arc<SimMemoryStore>, Arc<SimVectorStore>) {
        let llm = Arc::new(SimLlmProvider::with_seed(seed));
        let store = Arc::new(SimMemoryStore::new());
        let vectors = Arc::new(SimVectorStore::new());
        (
            MemoryProcessor::new(llm, store.clone(), vectors.clone()),
            store,
            vectors,
        )
    }

    const SUBSTANTIVE: &str =
        "I think we should remember that the scheduler deadlocks when two flush \
         tasks race on the same session state.";

    // =========================================================================
    // Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_rank() {
        assert_eq!(parse_rank("4"), 4);
        assert_eq!(parse_rank("  Rank: 5 out of 5"), 5);
        assert_eq!(parse_rank("zero meaning 0, then 2"), 2);
        assert_eq!(parse_rank("no digits at all"), 3);
        assert_eq!(parse_rank("999"), 3);
        assert_eq!(parse_rank(""), 3);
    }

    #[test]
    fn test_parse_unit_float() {
        assert!((parse_unit_float("0.7", 0.3) - 0.7).abs() < f32::EPSILON);
        assert!((parse_unit_float("importance: 0.25", 0.3) - 0.25).abs() < f32::EPSILON);
        // Out-of-range values clamp
        assert!((parse_unit_float("1.5", 0.3) - 1.0).abs() < f32::EPSILON);
        // Unparseable falls back
        assert!((parse_unit_float("none", 0.3) - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_compose_importance_clamped() {
        assert!((compose_importance(0.3, 0) - 0.4).abs() < f32::EPSILON);
        assert!((compose_importance(0.3, 7) - 0.6).abs() < f32::EPSILON);
        // Never exceeds 1.0 regardless of LLM output
        assert!((compose_importance(1.0, 10) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_compose_importance_tag_threshold_is_exclusive() {
        // Exactly six tags earns no bonus
        assert!((compose_importance(0.5, 6) - 0.6).abs() < f32::EPSILON);
        assert!((compose_importance(0.5, 7) - 0.8).abs() < f32::EPSILON);
    }

    // =========================================================================
    // Pipeline Tests
    // =========================================================================

    #[tokio::test]
    async fn test_noise_is_skipped_without_side_effects() {
        let (processor, store, vectors) = processor(42);

        let result = processor.process_message("ok", Role::User, Some(1)).await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.memory_count(), 0);
        assert_eq!(vectors.count(Collection::Memories), 0);
    }

    #[tokio::test]
    async fn test_full_pipeline_enriches_memory() {
        let (processor, store, vectors) = processor(42);

        let memory_id = processor
            .process_message(SUBSTANTIVE, Role::User, Some(1))
            .await
            .unwrap()
            .expect("substantive message must create a memory");

        let memory = store.get_memory(memory_id).await.unwrap().unwrap();
        assert_eq!(memory.content, SUBSTANTIVE);
        assert!(memory.summary.is_some());
        assert!((MEMORY_RANK_MIN..=MEMORY_RANK_MAX).contains(&memory.rank));
        assert!(memory.importance > 0.0 && memory.importance <= 1.0);
        assert!(!memory.tags.is_empty());
        assert_eq!(vectors.count(Collection::Memories), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_fatal() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(
            FaultConfig::new(FaultType::StoreWriteFail, 1.0).with_filter("write_memory"),
        );
        let llm = Arc::new(SimLlmProvider::with_seed(42));
        let store = Arc::new(SimMemoryStore::with_faults(Arc::new(injector)));
        let vectors = Arc::new(SimVectorStore::new());
        let processor = MemoryProcessor::new(llm, store.clone(), vectors);

        let result = processor.process_message(SUBSTANTIVE, Role::User, Some(1)).await;
        assert!(result.is_err());
        assert_eq!(store.memory_count(), 0);
    }

    #[tokio::test]
    async fn test_llm_outage_degrades_gracefully() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::LlmUnavailable, 1.0));
        let llm = Arc::new(SimLlmProvider::with_faults(42, Arc::new(injector)));
        let store = Arc::new(SimMemoryStore::new());
        let vectors = Arc::new(SimVectorStore::new());
        let processor = MemoryProcessor::new(llm, store.clone(), vectors);

        let memory_id = processor
            .process_message(SUBSTANTIVE, Role::User, Some(1))
            .await
            .unwrap()
            .expect("memory must be created despite LLM outage");

        let memory = store.get_memory(memory_id).await.unwrap().unwrap();
        // Summary fell back to the raw text
        assert_eq!(memory.summary.as_deref(), Some(SUBSTANTIVE));
        // Rank step was skipped entirely
        assert_eq!(memory.rank, 0);
        // Importance fell back: 0.3 default + 0.1 recency, few tags
        assert!((memory.importance - 0.4).abs() < 1e-6);
        // Tagging is pure and still ran
        assert!(!memory.tags.is_empty());
    }

    #[tokio::test]
    async fn test_vector_outage_is_swallowed() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::VectorUpsertFail, 1.0).with_filter("upsert"));
        let llm = Arc::new(SimLlmProvider::with_seed(42));
        let store = Arc::new(SimMemoryStore::new());
        let vectors = Arc::new(SimVectorStore::with_faults(Arc::new(injector)));
        let processor = MemoryProcessor::new(llm, store.clone(), vectors.clone());

        let memory_id = processor
            .process_message(SUBSTANTIVE, Role::User, Some(1))
            .await
            .unwrap();
        assert!(memory_id.is_some());
        assert_eq!(vectors.count(Collection::Memories), 0);
        assert_eq!(store.memory_count(), 1);
    }

    #[tokio::test]
    async fn test_process_core_memory() {
        let (processor, store, vectors) = processor(42);

        let core_id = processor
            .process_core_memory("The user prefers answers without preamble.", Some(3))
            .await
            .unwrap();

        let cores = store.active_core_memories().await.unwrap();
        assert_eq!(cores.len(), 1);
        assert_eq!(cores[0].id, core_id);
        assert_eq!(cores[0].source_session_id, Some(3));
        assert_eq!(vectors.count(Collection::CoreMemories), 1);
    }

    #[tokio::test]
    async fn test_process_lesson_extracts_via_llm() {
        let (processor, store, vectors) = processor(42);

        let lesson_id = processor
            .process_lesson("user: the bot ignored my constraint\nassistant: apologies", 5)
            .await
            .unwrap();

        let lessons = store.list_lessons().await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].id, lesson_id);
        // Sim LLM produced an extraction, not the raw excerpt
        assert!(lessons[0].content.contains("Lessons"));
        assert_eq!(vectors.count(Collection::Lessons), 1);
    }

    #[tokio::test]
    async fn test_process_lesson_falls_back_to_raw_excerpt() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::LlmTimeout, 1.0));
        let llm = Arc::new(SimLlmProvider::with_faults(42, Arc::new(injector)));
        let store = Arc::new(SimMemoryStore::new());
        let vectors = Arc::new(SimVectorStore::new());
        let processor = MemoryProcessor::new(llm, store.clone(), vectors);

        let excerpt = "user: remember to confirm before deleting\nassistant: noted";
        processor.process_lesson(excerpt, 5).await.unwrap();

        let lessons = store.list_lessons().await.unwrap();
        assert_eq!(lessons[0].content, excerpt);
    }
}
