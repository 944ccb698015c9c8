//! Memory Manager - Five Named Pools over One Global Budget
//!
//! `TigerStyle`: Deterministic integer budgeting, oldest-first eviction,
//! greedy first-fit gathering.
//!
//! Budget allocation runs once at construction: each pool gets
//! `floor(global_budget x percentage)` clamped to its hard cap, and the unused
//! remainder rolls over in equal integer shares to pools with a positive
//! rollover priority. The division remainder is deliberately left
//! unallocated.

use std::collections::BTreeMap;

use tracing::{info, warn};

use super::item::PoolItem;
use crate::constants::{
    CONTEXT_TOKENS_TOTAL_DEFAULT, OVERFLOW_BATCH_SIZE_DEFAULT,
    POOL_ACTIVE_SESSION_PERCENTAGE_DEFAULT, POOL_ACTIVE_SESSION_ROLLOVER_PRIORITY,
    POOL_BUFFER_PERCENTAGE_DEFAULT, POOL_BUFFER_ROLLOVER_PRIORITY, POOL_CORE_PERCENTAGE_DEFAULT,
    POOL_CORE_ROLLOVER_PRIORITY, POOL_CORE_TOKENS_CAP, POOL_RECALL_PERCENTAGE_DEFAULT,
    POOL_RECALL_ROLLOVER_PRIORITY, POOL_RECALL_TOKENS_CAP,
    POOL_RECENT_HISTORY_PERCENTAGE_DEFAULT, POOL_RECENT_HISTORY_ROLLOVER_PRIORITY,
    SYSTEM_PROMPT_RESERVE_TOKENS_DEFAULT,
};
use crate::storage::Role;

// =============================================================================
// Pool Names
// =============================================================================

/// The five pools, in gather declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PoolName {
    /// Durable user facts and preferences
    Core,
    /// Live turns of the current conversation
    ActiveSession,
    /// Summaries of evicted conversation overflow
    RecentHistory,
    /// Semantic search results pulled back into context
    Recall,
    /// Scratch space
    Buffer,
}

impl PoolName {
    /// Display label shown to callers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "Core",
            Self::ActiveSession => "ActiveSession",
            Self::RecentHistory => "RecentHistory",
            Self::Recall => "Recall",
            Self::Buffer => "Buffer",
        }
    }

    /// Parse a pool name. Returns None for unknown names; callers treat that
    /// as a logged no-op rather than an error.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Core" => Some(Self::Core),
            "ActiveSession" => Some(Self::ActiveSession),
            "RecentHistory" => Some(Self::RecentHistory),
            "Recall" => Some(Self::Recall),
            "Buffer" => Some(Self::Buffer),
            _ => None,
        }
    }

    /// All pools in declaration order.
    #[must_use]
    pub fn all() -> &'static [PoolName] {
        &[
            Self::Core,
            Self::ActiveSession,
            Self::RecentHistory,
            Self::Recall,
            Self::Buffer,
        ]
    }

    /// Display label applied to gathered lesson-role items regardless of the
    /// physical pool they came from.
    pub(crate) const LESSONS_LABEL: &'static str = "Lessons";
}

impl std::fmt::Display for PoolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Budget settings for one pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    /// Share of the global budget, in [0, 1]
    pub percentage: f64,
    /// Absolute ceiling in tokens, enforced at read time
    pub hard_cap: Option<usize>,
    /// Rollover weight; zero excludes the pool from rollover
    pub rollover_priority: u32,
}

/// Settings for all five pools.
#[derive(Debug, Clone)]
pub struct PoolsConfig {
    /// Core pool settings
    pub core: PoolSettings,
    /// Active-session pool settings
    pub active_session: PoolSettings,
    /// Recent-history pool settings
    pub recent_history: PoolSettings,
    /// Recall pool settings
    pub recall: PoolSettings,
    /// Buffer pool settings
    pub buffer: PoolSettings,
}

impl Default for PoolsConfig {
    fn default() -> Self {
        Self {
            core: PoolSettings {
                percentage: POOL_CORE_PERCENTAGE_DEFAULT,
                hard_cap: Some(POOL_CORE_TOKENS_CAP),
                rollover_priority: POOL_CORE_ROLLOVER_PRIORITY,
            },
            active_session: PoolSettings {
                percentage: POOL_ACTIVE_SESSION_PERCENTAGE_DEFAULT,
                hard_cap: None,
                rollover_priority: POOL_ACTIVE_SESSION_ROLLOVER_PRIORITY,
            },
            recent_history: PoolSettings {
                percentage: POOL_RECENT_HISTORY_PERCENTAGE_DEFAULT,
                hard_cap: None,
                rollover_priority: POOL_RECENT_HISTORY_ROLLOVER_PRIORITY,
            },
            recall: PoolSettings {
                percentage: POOL_RECALL_PERCENTAGE_DEFAULT,
                hard_cap: Some(POOL_RECALL_TOKENS_CAP),
                rollover_priority: POOL_RECALL_ROLLOVER_PRIORITY,
            },
            buffer: PoolSettings {
                percentage: POOL_BUFFER_PERCENTAGE_DEFAULT,
                hard_cap: None,
                rollover_priority: POOL_BUFFER_ROLLOVER_PRIORITY,
            },
        }
    }
}

impl PoolsConfig {
    fn get(&self, name: PoolName) -> &PoolSettings {
        match name {
            PoolName::Core => &self.core,
            PoolName::ActiveSession => &self.active_session,
            PoolName::RecentHistory => &self.recent_history,
            PoolName::Recall => &self.recall,
            PoolName::Buffer => &self.buffer,
        }
    }
}

/// Manager configuration.
#[derive(Debug, Clone)]
pub struct MemoryManagerConfig {
    /// Total context window in tokens
    pub total_context_tokens: usize,
    /// Tokens reserved for the system prompt
    pub system_prompt_reserve: usize,
    /// Items evicted per trim batch
    pub overflow_batch_size: usize,
    /// Per-pool settings
    pub pools: PoolsConfig,
}

impl Default for MemoryManagerConfig {
    fn default() -> Self {
        Self {
            total_context_tokens: CONTEXT_TOKENS_TOTAL_DEFAULT,
            system_prompt_reserve: SYSTEM_PROMPT_RESERVE_TOKENS_DEFAULT,
            overflow_batch_size: OVERFLOW_BATCH_SIZE_DEFAULT,
            pools: PoolsConfig::default(),
        }
    }
}

impl MemoryManagerConfig {
    /// Create a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total context window.
    ///
    /// # Panics
    /// Debug-panics when the window does not exceed the reserve.
    #[must_use]
    pub fn with_total_context_tokens(mut self, tokens: usize) -> Self {
        debug_assert!(
            tokens > self.system_prompt_reserve,
            "context window must exceed the system prompt reserve"
        );
        self.total_context_tokens = tokens;
        self
    }

    /// Set the system prompt reserve.
    #[must_use]
    pub fn with_system_prompt_reserve(mut self, tokens: usize) -> Self {
        self.system_prompt_reserve = tokens;
        self
    }

    /// Set the trim batch size.
    ///
    /// # Panics
    /// Debug-panics on zero.
    #[must_use]
    pub fn with_overflow_batch_size(mut self, size: usize) -> Self {
        debug_assert!(size > 0, "overflow batch size must be positive");
        self.overflow_batch_size = size;
        self
    }

    /// Replace the per-pool settings.
    #[must_use]
    pub fn with_pools(mut self, pools: PoolsConfig) -> Self {
        self.pools = pools;
        self
    }
}

// =============================================================================
// Pool
// =============================================================================

/// A single capped, priority-ordered token budget.
///
/// Invariant: items stay sorted by priority descending (stable, so equal
/// priorities keep insertion order). The used-token sum is recomputed on
/// demand from item text; there is no running counter to drift.
#[derive(Debug)]
pub struct Pool {
    name: PoolName,
    max_tokens: usize,
    hard_cap: Option<usize>,
    items: Vec<PoolItem>,
}

impl Pool {
    /// Create an empty pool.
    #[must_use]
    pub fn new(name: PoolName, max_tokens: usize, hard_cap: Option<usize>) -> Self {
        Self {
            name,
            max_tokens,
            hard_cap,
            items: Vec::new(),
        }
    }

    /// Pool name.
    #[must_use]
    pub fn name(&self) -> PoolName {
        self.name
    }

    /// Soft budget in tokens (mutable via rollover).
    #[must_use]
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Optional hard ceiling, enforced at read time.
    #[must_use]
    pub fn hard_cap(&self) -> Option<usize> {
        self.hard_cap
    }

    /// Sum of item token estimates.
    #[must_use]
    pub fn used_tokens(&self) -> usize {
        self.items.iter().map(PoolItem::tokens).sum()
    }

    /// Number of held items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Whether the pool holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item, keeping the priority order.
    ///
    /// An item whose text already exists in the pool is silently rejected
    /// (content-based de-duplication; the O(n) scan is fine at this scale).
    pub fn add(&mut self, item: PoolItem) {
        if self.items.iter().any(|existing| existing.text == item.text) {
            return;
        }
        self.items.push(item);
        self.items
            .sort_by(|a, b| b.priority.total_cmp(&a.priority));
    }

    /// Greedy first-fit pack of the priority-sorted items.
    ///
    /// Walks items in order and takes each one that fits under
    /// `min(available_tokens, hard_cap or max_tokens)`, stopping at the first
    /// item that would overflow. No skip-ahead, no bin packing.
    #[must_use]
    pub fn top_entries(&self, available_tokens: usize) -> Vec<&PoolItem> {
        let effective_cap = available_tokens.min(self.hard_cap.unwrap_or(self.max_tokens));

        let mut selected = Vec::new();
        let mut used = 0;
        for item in &self.items {
            if used + item.tokens() <= effective_cap {
                used += item.tokens();
                selected.push(item);
            } else {
                break;
            }
        }
        selected
    }

    /// Remove and return the `count` oldest items (smallest timestamp first).
    pub fn remove_oldest(&mut self, count: usize) -> Vec<PoolItem> {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by_key(|&i| self.items[i].timestamp);
        order.truncate(count);
        // Remove back to front so earlier indices stay valid
        order.sort_unstable_by(|a, b| b.cmp(a));

        let mut removed: Vec<PoolItem> =
            order.into_iter().map(|i| self.items.remove(i)).collect();
        removed.sort_by_key(|item| item.timestamp);
        removed
    }

    /// Remove all items.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn grow(&mut self, bonus: usize) {
        self.max_tokens += bonus;
    }
}

// =============================================================================
// Usage Reporting
// =============================================================================

/// Usage snapshot for one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolUsage {
    /// Tokens currently held
    pub used_tokens: usize,
    /// Soft budget
    pub max_tokens: usize,
    /// Item count
    pub item_count: usize,
    /// Hard ceiling, if any
    pub hard_cap: Option<usize>,
}

// =============================================================================
// Memory Manager
// =============================================================================

/// Owner of the five pools and the global token budget.
#[derive(Debug)]
pub struct MemoryManager {
    global_budget: usize,
    overflow_batch_size: usize,
    pools: Vec<Pool>,
}

impl MemoryManager {
    /// Create a manager, allocating pool budgets from the global window.
    ///
    /// `global_budget = total_context_tokens - system_prompt_reserve`. Each
    /// pool starts at `floor(global_budget x percentage)` clamped to its hard
    /// cap; the unused remainder is split in equal integer shares among pools
    /// with a positive rollover priority. The division remainder is dropped.
    #[must_use]
    pub fn new(config: &MemoryManagerConfig) -> Self {
        let global_budget = config
            .total_context_tokens
            .saturating_sub(config.system_prompt_reserve);

        let mut pools = Vec::with_capacity(PoolName::all().len());
        let mut total_allocated = 0;
        for &name in PoolName::all() {
            let settings = config.pools.get(name);
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            #[allow(clippy::cast_sign_loss)]
            let base = (global_budget as f64 * settings.percentage).floor() as usize;
            let capped = match settings.hard_cap {
                Some(cap) => base.min(cap),
                None => base,
            };
            total_allocated += capped;
            pools.push(Pool::new(name, capped, settings.hard_cap));
        }

        let unused = global_budget.saturating_sub(total_allocated);
        if unused > 0 {
            let eligible: Vec<usize> = PoolName::all()
                .iter()
                .enumerate()
                .filter(|(_, name)| config.pools.get(**name).rollover_priority > 0)
                .map(|(i, _)| i)
                .collect();
            if !eligible.is_empty() {
                let bonus = unused / eligible.len();
                for i in eligible {
                    pools[i].grow(bonus);
                }
            }
        }

        // Postcondition: allocation never overshoots the global budget by
        // more than the dropped division remainder.
        debug_assert!(
            pools.iter().map(Pool::max_tokens).sum::<usize>() <= global_budget.max(total_allocated),
            "pool budgets exceed global budget"
        );

        Self {
            global_budget,
            overflow_batch_size: config.overflow_batch_size.max(1),
            pools,
        }
    }

    /// Global token budget after the system prompt reserve.
    #[must_use]
    pub fn global_budget(&self) -> usize {
        self.global_budget
    }

    /// Look up a pool by name.
    #[must_use]
    pub fn pool(&self, name: PoolName) -> &Pool {
        &self.pools[name as usize]
    }

    fn pool_mut(&mut self, name: PoolName) -> &mut Pool {
        &mut self.pools[name as usize]
    }

    /// Add an item to a named pool, trimming first when the item would push
    /// the pool over budget.
    ///
    /// An unknown pool name is a logged no-op, keeping the hot path resilient
    /// to config drift. Returns the batches evicted by the pre-insert trim,
    /// oldest batch first (empty when no trim ran).
    pub fn add_memory(&mut self, pool_name: &str, item: PoolItem) -> Vec<Vec<PoolItem>> {
        let Some(name) = PoolName::parse(pool_name) else {
            warn!(pool = pool_name, "unknown pool, dropping item");
            return Vec::new();
        };

        let mut evicted = Vec::new();
        if self.pool(name).used_tokens() + item.tokens() > self.pool(name).max_tokens() {
            evicted = self.trim_pool_for(name, item.tokens());
        }

        self.pool_mut(name).add(item);
        evicted
    }

    /// Evict oldest batches until the pool fits its budget.
    ///
    /// Stops early if a batch removal returns no items. Returns the evicted
    /// batches so the caller can schedule overflow summarization.
    pub fn trim_pool(&mut self, name: PoolName) -> Vec<Vec<PoolItem>> {
        self.trim_pool_for(name, 0)
    }

    /// Trim leaving headroom for an incoming item of `incoming_tokens`.
    fn trim_pool_for(&mut self, name: PoolName, incoming_tokens: usize) -> Vec<Vec<PoolItem>> {
        let batch_size = self.overflow_batch_size;
        let pool = self.pool_mut(name);

        let mut batches = Vec::new();
        while pool.used_tokens() + incoming_tokens > pool.max_tokens() {
            let batch = pool.remove_oldest(batch_size);
            if batch.is_empty() {
                break;
            }
            batches.push(batch);
        }

        // Postcondition: either the pool fits or it is empty.
        debug_assert!(
            pool.used_tokens() <= pool.max_tokens() || pool.is_empty(),
            "trim left pool over budget"
        );
        batches
    }

    /// Gather items from all pools, in declaration order, within a global
    /// token budget (defaults to the full global budget).
    ///
    /// Returns clones labeled with their display pool name; items with the
    /// lesson role are relabeled "Lessons" regardless of physical pool. The
    /// remaining budget is decremented across the whole call, not per pool.
    #[must_use]
    pub fn gather(&self, token_budget: Option<usize>) -> Vec<PoolItem> {
        let budget = token_budget.unwrap_or(self.global_budget);

        let mut remaining = budget;
        let mut result: Vec<PoolItem> = Vec::new();
        for pool in &self.pools {
            for entry in pool.top_entries(remaining) {
                let mut selected = entry.clone();
                selected.pool_label = if selected.role == Role::Lesson {
                    PoolName::LESSONS_LABEL.to_string()
                } else {
                    pool.name().as_str().to_string()
                };
                remaining -= selected.tokens();
                result.push(selected);
            }
        }

        // Postcondition: the gathered set never exceeds the budget.
        debug_assert!(
            result.iter().map(PoolItem::tokens).sum::<usize>() <= budget,
            "gather exceeded token budget"
        );
        result
    }

    /// Usage snapshot for every pool, in declaration order.
    #[must_use]
    pub fn usage(&self) -> BTreeMap<PoolName, PoolUsage> {
        self.pools
            .iter()
            .map(|pool| {
                (
                    pool.name(),
                    PoolUsage {
                        used_tokens: pool.used_tokens(),
                        max_tokens: pool.max_tokens(),
                        item_count: pool.item_count(),
                        hard_cap: pool.hard_cap(),
                    },
                )
            })
            .collect()
    }

    /// Log per-pool usage at info level.
    pub fn log_usage(&self) {
        for (name, usage) in self.usage() {
            info!(
                pool = name.as_str(),
                used = usage.used_tokens,
                max = usage.max_tokens,
                items = usage.item_count,
                "pool usage"
            );
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
