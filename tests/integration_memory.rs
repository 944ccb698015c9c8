//! End-to-End Memory Pipeline Tests
//!
//! Drives the full stack over the simulation collaborators: session turns
//! flow through the noise gate and enrichment pipeline into durable and
//! vector storage, and come back out through boosted recall and the pool
//! gather path.

use std::sync::Arc;

use engram::llm::SimLlmProvider;
use engram::pool::{
    MemoryManager, MemoryManagerConfig, PoolName, PoolSettings, PoolsConfig, SharedMemoryManager,
};
use engram::processor::MemoryProcessor;
use engram::search::MemorySearch;
use engram::session::SessionLifecycle;
use engram::storage::{MemoryStore, Role, SimMemoryStore, SimVectorStore};

type SimStack = (
    Arc<SimLlmProvider>,
    Arc<SimMemoryStore>,
    Arc<SimVectorStore>,
);

fn sim_stack(seed: u64) -> SimStack {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    (
        Arc::new(SimLlmProvider::with_seed(seed)),
        Arc::new(SimMemoryStore::new()),
        Arc::new(SimVectorStore::new()),
    )
}

fn lifecycle(
    (llm, store, vectors): &SimStack,
) -> SessionLifecycle<SimLlmProvider, SimMemoryStore, SimVectorStore> {
    let processor = Arc::new(MemoryProcessor::new(
        Arc::clone(llm),
        Arc::clone(store),
        Arc::clone(vectors),
    ));
    let manager = SharedMemoryManager::new(MemoryManager::new(&MemoryManagerConfig::default()))
        .with_summarizer(Arc::clone(llm) as Arc<dyn engram::LlmProvider>);
    SessionLifecycle::new(Arc::clone(store), processor, manager, Arc::clone(llm))
}

// =============================================================================
// Remember → Recall
// =============================================================================

#[tokio::test]
async fn test_conversation_becomes_searchable_memory() {
    let stack = sim_stack(42);
    let session = lifecycle(&stack);
    let (llm, store, vectors) = &stack;

    let first_session = session.start(Some("infra"), None).await.unwrap();
    session
        .add_message(
            Role::User,
            "Remember that the staging database migration deadlocks when the \
             scheduler runs two flush tasks against the same session.",
        )
        .await;
    session
        .add_message(
            Role::Assistant,
            "I think the scheduler deadlock comes from the flush guard not being \
             atomic; we should serialize the migration flushes.",
        )
        .await;
    session.add_message(Role::User, "ok").await;
    session.end_session().await.unwrap();

    // The noise turn ("ok") was filtered; two memories persisted and embedded
    assert_eq!(store.memory_count(), 2);
    let memories = store.memories_by_session(first_session).await.unwrap();
    assert_eq!(memories.len(), 2);
    for memory in &memories {
        assert!((3..=5).contains(&memory.rank));
        assert!(memory.importance > 0.0 && memory.importance <= 1.0);
    }

    // The session row got a title and a summary
    let row = store.get_session(first_session).await.unwrap().unwrap();
    assert!(row.title.starts_with("Notes:"));
    assert!(row.summary.is_some());
    assert_eq!(row.message_count, 3);

    // A later session recalls the deadlock, never its own turns
    let search = MemorySearch::new(Arc::clone(llm), Arc::clone(store), Arc::clone(vectors));
    let results = search
        .search(
            "do you remember what deadlocks the staging database migration",
            Some(first_session + 1),
            Some(5),
        )
        .await
        .unwrap();
    assert!(!results.is_empty());
    assert!(results[0].text.contains("deadlock"));
    for result in &results {
        assert!(result.boosted_score >= result.similarity);
    }

    // The same query from inside the originating session recalls nothing
    let own = search
        .search(
            "do you remember what deadlocks the staging database migration",
            Some(first_session),
            Some(5),
        )
        .await
        .unwrap();
    assert!(own.is_empty());
}

// =============================================================================
// Gather Path
// =============================================================================

#[tokio::test]
async fn test_gather_builds_labeled_context() {
    let stack = sim_stack(7);
    let session = lifecycle(&stack);

    session.start(None, None).await.unwrap();
    session
        .add_message(Role::User, "Remember that deployments happen on Fridays.")
        .await;
    session
        .add_message(Role::Assistant, "Noted; I will plan the release window around Friday.")
        .await;

    let context = session.manager().gather(None).await;
    assert_eq!(context.len(), 2);
    for item in &context {
        assert_eq!(item.pool_label, "ActiveSession");
    }
    // User turn outranks the assistant turn
    assert!(context[0].text.starts_with("user:"));
}

// =============================================================================
// Overflow Rollup
// =============================================================================

#[tokio::test]
async fn test_overflow_rolls_up_into_recent_history() {
    let pools = PoolsConfig {
        core: PoolSettings {
            percentage: 0.0,
            hard_cap: None,
            rollover_priority: 0,
        },
        active_session: PoolSettings {
            percentage: 0.25,
            hard_cap: Some(40),
            rollover_priority: 0,
        },
        recent_history: PoolSettings {
            percentage: 0.75,
            hard_cap: None,
            rollover_priority: 0,
        },
        recall: PoolSettings {
            percentage: 0.0,
            hard_cap: None,
            rollover_priority: 0,
        },
        buffer: PoolSettings {
            percentage: 0.0,
            hard_cap: None,
            rollover_priority: 0,
        },
    };
    let config = MemoryManagerConfig::new()
        .with_system_prompt_reserve(64)
        .with_total_context_tokens(224)
        .with_overflow_batch_size(1)
        .with_pools(pools);

    let llm = Arc::new(SimLlmProvider::with_seed(11));
    let manager = SharedMemoryManager::new(MemoryManager::new(&config)).with_summarizer(llm);

    for i in 0..3 {
        let mut text = format!("turn {i} about the incident review");
        while text.len() < 80 {
            text.push_str(" detail");
        }
        manager
            .add_memory(
                "ActiveSession",
                engram::PoolItem::new(text, Role::User).with_priority(0.5),
            )
            .await;
    }
    manager.wait_for_background().await;

    let usage = manager.usage().await;
    assert_eq!(usage[&PoolName::ActiveSession].item_count, 2);
    assert_eq!(usage[&PoolName::RecentHistory].item_count, 1);
}

// =============================================================================
// Core Memories and Lessons
// =============================================================================

#[tokio::test]
async fn test_core_memory_and_lesson_passthrough_search() {
    let (llm, store, vectors) = sim_stack(13);
    let processor = MemoryProcessor::new(Arc::clone(&llm), Arc::clone(&store), Arc::clone(&vectors));

    processor
        .process_core_memory("The user prefers answers without preamble.", Some(1))
        .await
        .unwrap();
    processor
        .process_lesson(
            "user: you deleted the wrong file\nassistant: I should have confirmed first",
            1,
        )
        .await
        .unwrap();

    let search = MemorySearch::new(llm, store.clone(), vectors);
    assert_eq!(
        search
            .search_core_memories("answers without preamble", 5)
            .await
            .len(),
        1
    );
    assert_eq!(search.search_lessons("confirm before acting", 5).await.len(), 1);

    // Lessons and core memories are durable rows too
    assert_eq!(store.active_core_memories().await.unwrap().len(), 1);
    assert_eq!(store.list_lessons().await.unwrap().len(), 1);
}

// =============================================================================
// Determinism
// =============================================================================

#[tokio::test]
async fn test_same_seed_same_enrichment() {
    async fn run(seed: u64) -> (u8, f32) {
        let (llm, store, vectors) = sim_stack(seed);
        let processor = MemoryProcessor::new(llm, store.clone(), vectors);
        let id = processor
            .process_message(
                "Remember that the migration deadlocks under concurrent flushes.",
                Role::User,
                Some(1),
            )
            .await
            .unwrap()
            .unwrap();
        let memory = store.get_memory(id).await.unwrap().unwrap();
        (memory.rank, memory.importance)
    }

    assert_eq!(run(42).await, run(42).await);
}
