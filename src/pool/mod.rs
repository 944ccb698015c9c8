//! Token Budget Pools
//!
//! `TigerStyle`: Bounded budgets, explicit eviction, no hidden counters.
//!
//! A [`Pool`] is a single capped, priority-ordered buffer of remembered text
//! fragments. The [`MemoryManager`] owns five named pools, allocates their
//! budgets from a global context window, and provides the `gather` read path
//! the surrounding agent loop uses to build a prompt.
//! [`SharedMemoryManager`] adds the async mutex and the fire-and-forget
//! overflow summarization contract on top.

mod item;
mod manager;
mod shared;

pub use item::{estimate_tokens, PoolItem};
pub use manager::{
    MemoryManager, MemoryManagerConfig, Pool, PoolName, PoolSettings, PoolUsage, PoolsConfig,
};
pub use shared::SharedMemoryManager;
