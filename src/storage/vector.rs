//! Vector Store Trait and Simulation
//!
//! `TigerStyle`: Trait seam over the similarity collaborator, deterministic
//! sim for tests.
//!
//! The collaborator owns embedding generation and nearest-neighbor indexing;
//! this crate only upserts text under an id and asks for the top-k most
//! similar documents. Three collections: memories, core memories, lessons.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::error::{VectorError, VectorResult};
use crate::constants::SIM_EMBEDDING_DIMENSIONS_COUNT;
use crate::dst::FaultInjector;

// =============================================================================
// Collections
// =============================================================================

/// Vector collections, one per durable memory kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Conversation memories
    Memories,
    /// User-scoped core memories
    CoreMemories,
    /// Extracted lessons
    Lessons,
}

impl Collection {
    /// Collection name on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memories => "memories",
            Self::CoreMemories => "core_memories",
            Self::Lessons => "lessons",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Trait
// =============================================================================

/// A similarity hit from the vector store.
#[derive(Debug, Clone)]
pub struct VectorHit {
    /// Document id (the durable row id)
    pub id: i64,
    /// Similarity in [0, 1], higher is more similar
    pub similarity: f32,
    /// Metadata stored at upsert time
    pub metadata: HashMap<String, String>,
}

/// Abstract vector store collaborator.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert a document: the collaborator embeds `text` and indexes it
    /// under `id` with the given metadata.
    async fn upsert(
        &self,
        collection: Collection,
        id: i64,
        text: &str,
        metadata: HashMap<String, String>,
    ) -> VectorResult<()>;

    /// Query the top-`k` most similar documents, optionally restricted to
    /// exact metadata matches. Results are sorted by similarity descending.
    async fn query(
        &self,
        collection: Collection,
        text: &str,
        k: usize,
        filter: Option<&HashMap<String, String>>,
    ) -> VectorResult<Vec<VectorHit>>;

    /// Remove a document.
    async fn delete(&self, collection: Collection, id: i64) -> VectorResult<()>;
}

// =============================================================================
// Simulated Vector Store
// =============================================================================

#[derive(Debug, Default)]
struct SimCollection {
    documents: HashMap<i64, (Vec<f32>, HashMap<String, String>)>,
}

/// Deterministic in-memory vector store.
///
/// Embeds text as a hashed bag-of-words vector and ranks by cosine
/// similarity normalized to [0, 1]. Word overlap drives similarity, which is
/// enough for pipeline tests without a real embedding model.
#[derive(Debug, Clone, Default)]
pub struct SimVectorStore {
    collections: Arc<RwLock<HashMap<Collection, SimCollection>>>,
    fault_injector: Option<Arc<FaultInjector>>,
}

impl SimVectorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with fault injection.
    #[must_use]
    pub fn with_faults(fault_injector: Arc<FaultInjector>) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            fault_injector: Some(fault_injector),
        }
    }

    fn fault_fires(&self, operation: &str) -> bool {
        self.fault_injector
            .as_ref()
            .is_some_and(|injector| injector.should_inject(operation).is_some())
    }

    /// Hashed bag-of-words embedding: every lowercased word increments a
    /// dimension chosen by a stable hash.
    fn embed(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; SIM_EMBEDDING_DIMENSIONS_COUNT];
        for word in text.to_lowercase().split_whitespace() {
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in word.bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            }
            #[allow(clippy::cast_possible_truncation)]
            let dim = (hash % SIM_EMBEDDING_DIMENSIONS_COUNT as u64) as usize;
            vector[dim] += 1.0;
        }
        vector
    }

    /// Cosine similarity normalized from [-1, 1] into [0, 1].
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        let similarity = dot / (norm_a * norm_b);
        (similarity + 1.0) / 2.0
    }

    /// Documents held in a collection (test inspection).
    #[must_use]
    pub fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&collection)
            .map_or(0, |c| c.documents.len())
    }
}

#[async_trait]
impl VectorStore for SimVectorStore {
    async fn upsert(
        &self,
        collection: Collection,
        id: i64,
        text: &str,
        metadata: HashMap<String, String>,
    ) -> VectorResult<()> {
        if self.fault_fires("vector_upsert") {
            return Err(VectorError::upsert("injected fault"));
        }

        let embedding = Self::embed(text);
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        collections
            .entry(collection)
            .or_default()
            .documents
            .insert(id, (embedding, metadata));
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        text: &str,
        k: usize,
        filter: Option<&HashMap<String, String>>,
    ) -> VectorResult<Vec<VectorHit>> {
        if self.fault_fires("vector_query") {
            return Err(VectorError::query("injected fault"));
        }

        let query_embedding = Self::embed(text);
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        let Some(stored) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<VectorHit> = stored
            .documents
            .iter()
            .filter(|(_, (_, metadata))| match filter {
                Some(wanted) => wanted.iter().all(|(key, value)| {
                    metadata.get(key).is_some_and(|found| found == value)
                }),
                None => true,
            })
            .map(|(&id, (embedding, metadata))| VectorHit {
                id,
                similarity: Self::cosine_similarity(&query_embedding, embedding),
                metadata: metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity).then(a.id.cmp(&b.id)));
        hits.truncate(k);

        // Postcondition
        debug_assert!(hits.len() <= k, "results must not exceed k");
        Ok(hits)
    }

    async fn delete(&self, collection: Collection, id: i64) -> VectorResult<()> {
        if self.fault_fires("vector_delete") {
            return Err(VectorError::delete("injected fault"));
        }

        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        if let Some(stored) = collections.get_mut(&collection) {
            stored.documents.remove(&id);
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
