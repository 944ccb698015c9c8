//! Memory Search - Boosted Semantic Recall
//!
//! `TigerStyle`: Strict query gate, over-fetch, filter, boost, rank.
//!
//! Query pipeline: noise gate -> LLM rephrase -> vector search -> filter
//! (similarity floor, same-session exclusion, rank threshold) -> rank boost
//! -> sort. The rephrase step rewrites the question into the declarative
//! style memories are stored in, which is what the vector index matches
//! best; it falls back to the original query on failure.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::constants::{
    SEARCH_AUXILIARY_RESULTS_COUNT_DEFAULT, SEARCH_CANDIDATE_MULTIPLIER, SEARCH_QUERY_SKIP_LENGTH_PRIMARY,
    SEARCH_QUERY_SKIP_LENGTH_SECONDARY, SEARCH_RANK_BOOST_SCALE, SEARCH_RANK_THRESHOLD_DEFAULT,
    SEARCH_RESULTS_COUNT_DEFAULT, SEARCH_SIMILARITY_MIN,
};
use crate::llm::{prompts, GenerationRequest, LlmProvider, TaskType};
use crate::noise::{contains_signal_word, should_skip};
use crate::storage::{Collection, MemoryStore, StorageError, VectorHit, VectorStore};

// =============================================================================
// Error Types
// =============================================================================

/// Errors from the search pipeline.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Durable store read failed while loading a candidate
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// Result Type
// =============================================================================

/// A recalled memory with its boosted ranking score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Durable memory id
    pub memory_id: i64,
    /// Raw memory content
    pub text: String,
    /// Summary (content when no summary exists)
    pub summary: String,
    /// Vector similarity in [0, 1]
    pub similarity: f32,
    /// Similarity plus the rank-derived boost
    pub boosted_score: f32,
    /// Quality rank 1-5
    pub rank: u8,
    /// Importance score
    pub importance: f32,
}

/// Rank-derived boost: rank 1 adds nothing, rank 5 adds the full scale.
fn boosted_score(similarity: f32, rank: u8) -> f32 {
    let normalized = f32::from(rank.saturating_sub(1)) / 4.0;
    similarity + normalized * SEARCH_RANK_BOOST_SCALE
}

// =============================================================================
// Memory Search
// =============================================================================

/// Query-time recall pipeline over the three collaborators.
#[derive(Debug)]
pub struct MemorySearch<L, S, V> {
    llm: Arc<L>,
    store: Arc<S>,
    vectors: Arc<V>,
    min_rank: u8,
    search_limit: usize,
}

impl<L, S, V> MemorySearch<L, S, V>
where
    L: LlmProvider,
    S: MemoryStore,
    V: VectorStore,
{
    /// Create a search pipeline with default thresholds.
    #[must_use]
    pub fn new(llm: Arc<L>, store: Arc<S>, vectors: Arc<V>) -> Self {
        Self {
            llm,
            store,
            vectors,
            min_rank: SEARCH_RANK_THRESHOLD_DEFAULT,
            search_limit: SEARCH_RESULTS_COUNT_DEFAULT,
        }
    }

    /// Set the minimum rank a memory needs to be recalled.
    #[must_use]
    pub fn with_min_rank(mut self, min_rank: u8) -> Self {
        self.min_rank = min_rank;
        self
    }

    /// Set the default result count.
    ///
    /// # Panics
    /// Debug-panics on zero.
    #[must_use]
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        debug_assert!(limit > 0, "search limit must be positive");
        self.search_limit = limit;
        self
    }

    /// Search memories by semantic similarity with rank boosting.
    ///
    /// Memories belonging to `current_session_id` are never recalled: the
    /// session already has its own turns in context.
    ///
    /// # Errors
    /// Propagates durable-store read failures; a vector-store failure
    /// degrades to an empty result.
    #[tracing::instrument(skip(self, query), fields(len = query.len()))]
    pub async fn search(
        &self,
        query: &str,
        current_session_id: Option<i64>,
        n_results: Option<usize>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let n_results = n_results.unwrap_or(self.search_limit);

        // Step 1: two-stage noise gate, tuned for short queries
        if should_skip(query, SEARCH_QUERY_SKIP_LENGTH_PRIMARY) {
            return Ok(Vec::new());
        }
        if should_skip(query, SEARCH_QUERY_SKIP_LENGTH_SECONDARY) && !contains_signal_word(query) {
            return Ok(Vec::new());
        }

        // Step 2: rephrase into the declarative style memories are stored in
        let request = GenerationRequest::new(prompts::rephrase_as_memory_style(query))
            .with_system(prompts::UTILITY_SYSTEM_PROMPT);
        let memory_query = match self.llm.generate(TaskType::Summarization, &request).await {
            Ok(rephrased) => rephrased,
            Err(e) => {
                warn!(error = %e, "query rephrase failed, using original");
                query.to_string()
            }
        };

        // Step 3: over-fetch candidates for post-filtering
        let candidates = match self
            .vectors
            .query(
                Collection::Memories,
                &memory_query,
                n_results * SEARCH_CANDIDATE_MULTIPLIER,
                None,
            )
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "vector search failed");
                return Ok(Vec::new());
            }
        };

        // Steps 4-5: filter and boost
        let mut results = Vec::new();
        for candidate in candidates {
            if candidate.similarity < SEARCH_SIMILARITY_MIN {
                continue;
            }

            if let Some(current) = current_session_id {
                let same_session = candidate
                    .metadata
                    .get("session_id")
                    .is_some_and(|sid| *sid == current.to_string());
                if same_session {
                    continue;
                }
            }

            let Some(memory) = self.store.get_memory(candidate.id).await? else {
                continue;
            };
            if memory.rank < self.min_rank {
                continue;
            }

            let summary = memory.summary_or_content().to_string();
            results.push(SearchResult {
                memory_id: memory.id,
                text: memory.content,
                summary,
                similarity: candidate.similarity,
                boosted_score: boosted_score(candidate.similarity, memory.rank),
                rank: memory.rank,
                importance: memory.importance,
            });
        }

        // Step 6: sort by boosted score, keep the top n
        results.sort_by(|a, b| b.boosted_score.total_cmp(&a.boosted_score));
        results.truncate(n_results);

        // Postcondition
        debug_assert!(results.len() <= n_results, "results exceed requested count");
        Ok(results)
    }

    /// Direct passthrough search over core memories, unboosted.
    pub async fn search_core_memories(&self, query: &str, n_results: usize) -> Vec<VectorHit> {
        self.passthrough(Collection::CoreMemories, query, n_results)
            .await
    }

    /// Direct passthrough search over lessons, unboosted.
    pub async fn search_lessons(&self, query: &str, n_results: usize) -> Vec<VectorHit> {
        self.passthrough(Collection::Lessons, query, n_results).await
    }

    /// [`Self::search_core_memories`] with the default auxiliary result count.
    pub async fn search_core_memories_default(&self, query: &str) -> Vec<VectorHit> {
        self.search_core_memories(query, SEARCH_AUXILIARY_RESULTS_COUNT_DEFAULT)
            .await
    }

    /// [`Self::search_lessons`] with the default auxiliary result count.
    pub async fn search_lessons_default(&self, query: &str) -> Vec<VectorHit> {
        self.search_lessons(query, SEARCH_AUXILIARY_RESULTS_COUNT_DEFAULT)
            .await
    }

    async fn passthrough(
        &self,
        collection: Collection,
        query: &str,
        n_results: usize,
    ) -> Vec<VectorHit> {
        match self.vectors.query(collection, query, n_results, None).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(collection = collection.as_str(), error = %e, "passthrough search failed");
                Vec::new()
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::llm::SimLlmProvider;
    use crate::storage::{
        MemoryPatch, MemoryRecord, Role, SimMemoryStore, SimVectorStore, VectorResult,
    };

    // =========================================================================
    // Boost Arithmetic
    // =========================================================================

    #[test]
    fn test_boost_arithmetic() {
        assert!((boosted_score(0.8, 5) - 1.0).abs() < 1e-6);
        assert!((boosted_score(0.8, 1) - 0.8).abs() < 1e-6);
        assert!((boosted_score(0.6, 3) - 0.7).abs() < 1e-6);
    }

    // =========================================================================
    // Stub vector store with preset hits
    // =========================================================================

    #[derive(Debug)]
    struct StubVectorStore {
        hits: Vec<VectorHit>,
    }

    #[async_trait]
    impl VectorStore for StubVectorStore {
        async fn upsert(
            &self,
            _collection: Collection,
            _id: i64,
            _text: &str,
            _metadata: HashMap<String, String>,
        ) -> VectorResult<()> {
            Ok(())
        }

        async fn query(
            &self,
            _collection: Collection,
            _text: &str,
            k: usize,
            _filter: Option<&HashMap<String, String>>,
        ) -> VectorResult<Vec<VectorHit>> {
            Ok(self.hits.iter().take(k).cloned().collect())
        }

        async fn delete(&self, _collection: Collection, _id: i64) -> VectorResult<()> {
            Ok(())
        }
    }

    fn hit(id: i64, similarity: f32, session_id: Option<i64>) -> VectorHit {
        let mut metadata = HashMap::new();
        if let Some(sid) = session_id {
            metadata.insert("session_id".to_string(), sid.to_string());
        }
        VectorHit {
            id,
            similarity,
            metadata,
        }
    }

    async fn seed_memory(
        store: &SimMemoryStore,
        session_id: Option<i64>,
        content: &str,
        rank: u8,
    ) -> i64 {
        let record = MemoryRecord::conversation(session_id, Role::User, content, content);
        let id = store.create_memory(&record).await.unwrap();
        store
            .update_memory(id, MemoryPatch::new().with_rank(rank).with_importance(0.5))
            .await
            .unwrap();
        id
    }

    fn search_over(
        store: Arc<SimMemoryStore>,
        hits: Vec<VectorHit>,
    ) -> MemorySearch<SimLlmProvider, SimMemoryStore, StubVectorStore> {
        MemorySearch::new(
            Arc::new(SimLlmProvider::with_seed(42)),
            store,
            Arc::new(StubVectorStore { hits }),
        )
    }

    const QUERY: &str = "do you remember what we decided about the scheduler deadlock";

    // =========================================================================
    // Gate Tests
    // =========================================================================

    #[tokio::test]
    async fn test_noise_query_rejected() {
        let store = Arc::new(SimMemoryStore::new());
        let search = search_over(store, vec![hit(1, 0.9, None)]);

        assert!(search.search("ok", None, None).await.unwrap().is_empty());
        assert!(search.search("", None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_short_query_without_signal_rejected() {
        let store = Arc::new(SimMemoryStore::new());
        let search = search_over(store, vec![hit(1, 0.9, None)]);

        // 14 chars: passes the length-10 gate, fails the length-20 + signal gate
        let results = search.search("parser bug fix", None, None).await.unwrap();
        assert!(results.is_empty());
    }

    // =========================================================================
    // Filter / Boost Tests
    // =========================================================================

    #[tokio::test]
    async fn test_low_similarity_discarded() {
        let store = Arc::new(SimMemoryStore::new());
        let id = seed_memory(&store, Some(1), "the scheduler deadlock fix", 5).await;
        let search = search_over(store, vec![hit(id, 0.49, None)]);

        let results = search.search(QUERY, None, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_current_session_excluded() {
        let store = Arc::new(SimMemoryStore::new());
        let own = seed_memory(&store, Some(7), "decided in this session", 5).await;
        let other = seed_memory(&store, Some(3), "decided in an earlier session", 5).await;
        let search = search_over(
            store,
            vec![hit(own, 0.9, Some(7)), hit(other, 0.8, Some(3))],
        );

        let results = search.search(QUERY, Some(7), None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory_id, other);
    }

    #[tokio::test]
    async fn test_rank_threshold_filters() {
        let store = Arc::new(SimMemoryStore::new());
        let weak = seed_memory(&store, Some(1), "low quality memory", 2).await;
        let strong = seed_memory(&store, Some(1), "high quality memory", 4).await;
        let search = search_over(store, vec![hit(weak, 0.9, None), hit(strong, 0.8, None)]);

        let results = search.search(QUERY, None, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory_id, strong);
    }

    #[tokio::test]
    async fn test_boost_reorders_results() {
        let store = Arc::new(SimMemoryStore::new());
        // Higher similarity but minimum rank...
        let similar = seed_memory(&store, Some(1), "close match low rank", 3).await;
        // ...loses to slightly lower similarity at maximum rank
        let ranked = seed_memory(&store, Some(1), "good match high rank", 5).await;
        let search = search_over(
            store,
            vec![hit(similar, 0.82, None), hit(ranked, 0.75, None)],
        );

        let results = search.search(QUERY, None, None).await.unwrap();
        assert_eq!(results.len(), 2);
        // 0.75 + 0.2 = 0.95 beats 0.82 + 0.1 = 0.92
        assert_eq!(results[0].memory_id, ranked);
        assert!(results[0].boosted_score > results[1].boosted_score);
    }

    #[tokio::test]
    async fn test_result_count_cap() {
        let store = Arc::new(SimMemoryStore::new());
        let mut hits = Vec::new();
        for i in 0..6 {
            let id = seed_memory(&store, Some(1), &format!("memory number {i}"), 4).await;
            #[allow(clippy::cast_precision_loss)]
            hits.push(hit(id, 0.9 - i as f32 * 0.01, None));
        }
        let search = search_over(store, hits);

        let results = search.search(QUERY, None, Some(3)).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_memory_row_skipped() {
        let store = Arc::new(SimMemoryStore::new());
        let search = search_over(store, vec![hit(999, 0.9, None)]);

        let results = search.search(QUERY, None, None).await.unwrap();
        assert!(results.is_empty());
    }

    // =========================================================================
    // Degradation Tests
    // =========================================================================

    #[tokio::test]
    async fn test_vector_failure_degrades_to_empty() {
        use crate::dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType};

        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::VectorQueryFail, 1.0).with_filter("query"));
        let store = Arc::new(SimMemoryStore::new());
        let search = MemorySearch::new(
            Arc::new(SimLlmProvider::with_seed(42)),
            store,
            Arc::new(SimVectorStore::with_faults(Arc::new(injector))),
        );

        let results = search.search(QUERY, None, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_passthrough_searches() {
        let store = Arc::new(SimMemoryStore::new());
        let vectors = Arc::new(SimVectorStore::new());
        vectors
            .upsert(
                Collection::Lessons,
                1,
                "confirm before destructive operations",
                HashMap::new(),
            )
            .await
            .unwrap();
        let search = MemorySearch::new(
            Arc::new(SimLlmProvider::with_seed(42)),
            store,
            vectors,
        );

        let lessons = search.search_lessons("destructive operations", 5).await;
        assert_eq!(lessons.len(), 1);
        assert!(search.search_core_memories("anything", 5).await.is_empty());
    }
}
