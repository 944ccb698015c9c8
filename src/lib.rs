//! # Engram
//!
//! The memory-curation engine of a persistent-memory conversational agent:
//! it decides what the agent remembers right now, how much of it fits in a
//! bounded context window, what gets evicted, and which excerpts are promoted
//! to long-term, semantically searchable storage.
//!
//! ## Features
//!
//! - **Token budget pools**: five named pools carved out of one context
//!   window, with rollover of unused budget and oldest-first overflow
//!   eviction
//! - **Noise classifier and tagger**: pure, deterministic gates that keep
//!   greetings and filler out of durable memory and label what gets in
//! - **Background enrichment**: summarize, persist, embed, tag, rank, and
//!   score every remembered turn, tolerating partial failure at every
//!   LLM-dependent step
//! - **Boosted semantic recall**: vector search filtered by quality rank and
//!   re-ordered by a rank-derived boost
//! - **Hierarchical session summaries**: chunk, summarize, meta-summarize,
//!   title
//! - **Simulation-first testing**: deterministic sim collaborators with
//!   fault injection for every external dependency
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use engram::llm::SimLlmProvider;
//! use engram::pool::{MemoryManager, MemoryManagerConfig, SharedMemoryManager};
//! use engram::processor::MemoryProcessor;
//! use engram::session::SessionLifecycle;
//! use engram::storage::{Role, SimMemoryStore, SimVectorStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(SimLlmProvider::with_seed(42));
//! let store = Arc::new(SimMemoryStore::new());
//! let vectors = Arc::new(SimVectorStore::new());
//!
//! let processor = Arc::new(MemoryProcessor::new(llm.clone(), store.clone(), vectors.clone()));
//! let manager = SharedMemoryManager::new(MemoryManager::new(&MemoryManagerConfig::default()))
//!     .with_summarizer(llm.clone());
//!
//! let session = SessionLifecycle::new(store.clone(), processor, manager.clone(), llm.clone());
//! session.start(Some("demo"), None).await?;
//! session
//!     .add_message(Role::User, "Remember that deployments happen on Fridays.")
//!     .await;
//! session.dump_to_memory().await?;
//!
//! // The gather call is the sole read path for prompt assembly
//! let context = manager.gather(None).await;
//! assert!(!context.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Session Lifecycle                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  Memory Manager (5 pools)  │  Memory Processor (enrich)  │
//! │  Core / ActiveSession /    │  classify → summarize →     │
//! │  RecentHistory / Recall /  │  persist → embed → tag →    │
//! │  Buffer                    │  rank → importance          │
//! ├──────────────────────────────────────────────────────────┤
//! │  Noise Classifier │ Tagger │ Memory Search (boosted)     │
//! ├──────────────────────────────────────────────────────────┤
//! │  LlmProvider │ MemoryStore │ VectorStore  (collaborators)│
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod dst;
pub mod llm;
pub mod noise;
pub mod pool;
pub mod processor;
pub mod search;
pub mod session;
pub mod storage;
pub mod tagging;

// Re-export the main surface
pub use llm::{GenerationError, GenerationRequest, LlmProvider, SimLlmProvider, TaskType};
pub use pool::{
    estimate_tokens, MemoryManager, MemoryManagerConfig, Pool, PoolItem, PoolName, PoolSettings,
    PoolUsage, PoolsConfig, SharedMemoryManager,
};
pub use processor::{MemoryProcessor, ProcessError};
pub use search::{MemorySearch, SearchError, SearchResult};
pub use session::{SessionError, SessionLifecycle, SessionMessage};
pub use storage::{
    Collection, CoreMemoryRecord, LessonRecord, MemoryKind, MemoryPatch, MemoryRecord,
    MemoryStore, Role, SessionPatch, SessionRecord, SimMemoryStore, SimVectorStore, StorageError,
    TagCategory, VectorError, VectorHit, VectorStore,
};
