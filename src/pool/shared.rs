//! Shared Memory Manager - Async Mutex and Overflow Summarization
//!
//! `TigerStyle`: One mutex for every mutation path.
//!
//! Wraps the synchronous [`MemoryManager`] for use from the chat path and
//! from background tasks at once. Overflow batches evicted from the
//! active-session pool are summarized in a fire-and-forget task; on success
//! the summary lands in the recent-history pool under the same mutex the
//! synchronous path uses. Completion is not awaited by callers; tests and
//! shutdown paths can drain in-flight work with [`SharedMemoryManager::wait_for_background`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::item::PoolItem;
use super::manager::{MemoryManager, PoolName, PoolUsage};
use crate::constants::POOL_PRIORITY_OVERFLOW_SUMMARY;
use crate::llm::{prompts, GenerationRequest, LlmProvider, TaskType};
use crate::storage::Role;

/// Thread-safe manager handle with optional overflow summarization.
#[derive(Clone)]
pub struct SharedMemoryManager {
    inner: Arc<Mutex<MemoryManager>>,
    summarizer: Option<Arc<dyn LlmProvider>>,
    background: Arc<StdMutex<Vec<JoinHandle<()>>>>,
}

impl SharedMemoryManager {
    /// Wrap a manager without overflow summarization.
    #[must_use]
    pub fn new(manager: MemoryManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
            summarizer: None,
            background: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    /// Enable overflow summarization through the given provider.
    #[must_use]
    pub fn with_summarizer(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.summarizer = Some(llm);
        self
    }

    /// Add an item to a named pool.
    ///
    /// When the insert evicts overflow batches from the active-session pool
    /// and a summarizer is configured, each batch is summarized in a spawned
    /// task and the summary inserted into recent history. Eviction proceeds
    /// regardless of summarization outcome.
    pub async fn add_memory(&self, pool_name: &str, item: PoolItem) {
        let evicted = self.inner.lock().await.add_memory(pool_name, item);

        if PoolName::parse(pool_name) != Some(PoolName::ActiveSession) {
            return;
        }
        let Some(llm) = &self.summarizer else {
            return;
        };

        for batch in evicted {
            let combined = batch
                .iter()
                .map(|evicted_item| evicted_item.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if combined.trim().is_empty() {
                continue;
            }

            let handle = tokio::spawn(summarize_and_store(
                Arc::clone(&self.inner),
                Arc::clone(llm),
                combined,
            ));
            self.background
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(handle);
        }
    }

    /// Gather items across all pools within the budget.
    pub async fn gather(&self, token_budget: Option<usize>) -> Vec<PoolItem> {
        self.inner.lock().await.gather(token_budget)
    }

    /// Usage snapshot for every pool.
    pub async fn usage(&self) -> BTreeMap<PoolName, PoolUsage> {
        self.inner.lock().await.usage()
    }

    /// Run a closure against the locked manager (maintenance paths).
    pub async fn with_manager<R>(&self, f: impl FnOnce(&mut MemoryManager) -> R) -> R {
        let mut manager = self.inner.lock().await;
        f(&mut manager)
    }

    /// Await all in-flight overflow summarization tasks.
    pub async fn wait_for_background(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut background = self.background.lock().unwrap_or_else(|e| e.into_inner());
            background.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "overflow summarization task panicked");
            }
        }
    }
}

/// Summarize evicted overflow and store the result in recent history.
async fn summarize_and_store(
    inner: Arc<Mutex<MemoryManager>>,
    llm: Arc<dyn LlmProvider>,
    text: String,
) {
    let request =
        GenerationRequest::new(prompts::summarize_overflow(&text)).with_system(prompts::UTILITY_SYSTEM_PROMPT);

    match llm.generate(TaskType::Summarization, &request).await {
        Ok(summary) if !summary.trim().is_empty() => {
            let item = PoolItem::new(summary.clone(), Role::System)
                .with_priority(POOL_PRIORITY_OVERFLOW_SUMMARY);
            inner
                .lock()
                .await
                .add_memory(PoolName::RecentHistory.as_str(), item);
            info!(summary = %summary.chars().take(80).collect::<String>(), "overflow summarized into recent history");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "failed to summarize overflow"),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType};
    use crate::llm::SimLlmProvider;
    use crate::pool::{MemoryManagerConfig, PoolSettings, PoolsConfig};

    /// ActiveSession capped at 40 tokens, RecentHistory at 120, batch size 1.
    fn overflow_manager() -> MemoryManager {
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
        MemoryManager::new(&config)
    }

    fn turn(marker: &str, tokens: usize) -> PoolItem {
        let mut text = format!("{marker}:");
        while text.len() < tokens * 4 {
            text.push('x');
        }
        PoolItem::new(text, Role::User).with_priority(0.5)
    }

    #[tokio::test]
    async fn test_overflow_summarized_into_recent_history() {
        let shared = SharedMemoryManager::new(overflow_manager())
            .with_summarizer(Arc::new(SimLlmProvider::with_seed(42)));

        shared.add_memory("ActiveSession", turn("a", 20)).await;
        shared.add_memory("ActiveSession", turn("b", 20)).await;
        shared.add_memory("ActiveSession", turn("c", 20)).await;
        shared.wait_for_background().await;

        let usage = shared.usage().await;
        assert_eq!(usage[&PoolName::ActiveSession].item_count, 2);
        // Exactly one scheduled RecentHistory insertion
        assert_eq!(usage[&PoolName::RecentHistory].item_count, 1);

        let gathered = shared.gather(None).await;
        let summary = gathered
            .iter()
            .find(|item| item.pool_label == "RecentHistory")
            .expect("summary must be gatherable");
        assert!(summary.text.starts_with("Summary:"));
        assert_eq!(summary.role, Role::System);
    }

    #[tokio::test]
    async fn test_no_summarizer_means_plain_eviction() {
        let shared = SharedMemoryManager::new(overflow_manager());

        shared.add_memory("ActiveSession", turn("a", 20)).await;
        shared.add_memory("ActiveSession", turn("b", 20)).await;
        shared.add_memory("ActiveSession", turn("c", 20)).await;
        shared.wait_for_background().await;

        let usage = shared.usage().await;
        assert_eq!(usage[&PoolName::ActiveSession].item_count, 2);
        assert_eq!(usage[&PoolName::RecentHistory].item_count, 0);
    }

    #[tokio::test]
    async fn test_summarization_failure_does_not_block_eviction() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::LlmTimeout, 1.0));
        let llm = Arc::new(SimLlmProvider::with_faults(42, Arc::new(injector)));

        let shared = SharedMemoryManager::new(overflow_manager()).with_summarizer(llm);

        shared.add_memory("ActiveSession", turn("a", 20)).await;
        shared.add_memory("ActiveSession", turn("b", 20)).await;
        shared.add_memory("ActiveSession", turn("c", 20)).await;
        shared.wait_for_background().await;

        let usage = shared.usage().await;
        // Eviction proceeded regardless of summarization outcome
        assert_eq!(usage[&PoolName::ActiveSession].item_count, 2);
        assert_eq!(usage[&PoolName::RecentHistory].item_count, 0);
    }

    #[tokio::test]
    async fn test_overflow_from_other_pools_not_summarized() {
        let shared = SharedMemoryManager::new(overflow_manager())
            .with_summarizer(Arc::new(SimLlmProvider::with_seed(42)));

        // RecentHistory overflow must not feed back into itself
        for i in 0..5 {
            shared
                .add_memory("RecentHistory", turn(&format!("r{i}"), 40))
                .await;
        }
        shared.wait_for_background().await;

        let usage = shared.usage().await;
        assert!(usage[&PoolName::RecentHistory].used_tokens <= 120 + 40);
    }
}
