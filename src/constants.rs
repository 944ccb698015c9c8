//! `TigerStyle` Constants
//!
//! All limits use big-endian naming: `CATEGORY_SPECIFICS_UNIT_LIMIT`
//! Example: `POOL_CORE_TOKENS_CAP` (not `MAX_CORE_POOL`)
//!
//! Every constant includes units in the name:
//! - `_TOKENS_*` for token budgets
//! - `_BYTES_*` for size limits
//! - `_COUNT_*` for quantity limits
//! - `_CHARS_*` for character truncation lengths

// =============================================================================
// Token Estimation
// =============================================================================

/// Bytes of text per estimated token (fixed heuristic, not a tokenizer)
pub const TOKEN_ESTIMATE_BYTES_PER_TOKEN: usize = 4;

// =============================================================================
// Context Window Budget
// =============================================================================

/// Default total context window in tokens
pub const CONTEXT_TOKENS_TOTAL_DEFAULT: usize = 32_768;

/// Tokens reserved for the system prompt, off the top of the window
pub const SYSTEM_PROMPT_RESERVE_TOKENS_DEFAULT: usize = 2_048;

/// Number of items evicted per trim batch
pub const OVERFLOW_BATCH_SIZE_DEFAULT: usize = 4;

// =============================================================================
// Pool Defaults
// =============================================================================

/// Number of memory pools
pub const POOL_COUNT: usize = 5;

/// Core pool share of the global budget
pub const POOL_CORE_PERCENTAGE_DEFAULT: f64 = 0.10;

/// Core pool hard cap in tokens
pub const POOL_CORE_TOKENS_CAP: usize = 2_048;

/// Core pool rollover priority
pub const POOL_CORE_ROLLOVER_PRIORITY: u32 = 5;

/// Active-session pool share of the global budget
pub const POOL_ACTIVE_SESSION_PERCENTAGE_DEFAULT: f64 = 0.35;

/// Active-session pool rollover priority
pub const POOL_ACTIVE_SESSION_ROLLOVER_PRIORITY: u32 = 3;

/// Recent-history pool share of the global budget
pub const POOL_RECENT_HISTORY_PERCENTAGE_DEFAULT: f64 = 0.15;

/// Recent-history pool rollover priority
pub const POOL_RECENT_HISTORY_ROLLOVER_PRIORITY: u32 = 4;

/// Recall pool share of the global budget
pub const POOL_RECALL_PERCENTAGE_DEFAULT: f64 = 0.30;

/// Recall pool hard cap in tokens
pub const POOL_RECALL_TOKENS_CAP: usize = 8_192;

/// Recall pool rollover priority
pub const POOL_RECALL_ROLLOVER_PRIORITY: u32 = 2;

/// Buffer pool share of the global budget
pub const POOL_BUFFER_PERCENTAGE_DEFAULT: f64 = 0.10;

/// Buffer pool rollover priority
pub const POOL_BUFFER_ROLLOVER_PRIORITY: u32 = 1;

/// Priority score for user turns mirrored into the active-session pool
pub const POOL_PRIORITY_USER_TURN: f32 = 1.0;

/// Priority score for assistant turns mirrored into the active-session pool
pub const POOL_PRIORITY_ASSISTANT_TURN: f32 = 0.8;

/// Priority score for overflow summaries inserted into recent history
pub const POOL_PRIORITY_OVERFLOW_SUMMARY: f32 = 1.0;

// =============================================================================
// Noise Classifier Limits
// =============================================================================

/// Texts shorter than this need a signal word to survive the skip gate
pub const NOISE_SKIP_LENGTH_DEFAULT: usize = 80;

/// Minimum word count to be worth remembering
pub const NOISE_WORD_COUNT_MIN: usize = 3;

/// Normalized texts at or under this word count may be pure noise
pub const NOISE_SHORT_WORDS_COUNT_MAX: usize = 2;

/// Normalized texts at or under this length may be pure noise
pub const NOISE_SHORT_CHARS_MAX: usize = 10;

// =============================================================================
// Tagging Limits
// =============================================================================

/// Maximum tags emitted per message
pub const TAGS_PER_MESSAGE_COUNT_MAX: usize = 7;

/// Behavior tag score added by a strong trigger match
pub const TAG_BEHAVIOR_STRONG_SCORE: i32 = 2;

/// Behavior tag score added by a soft trigger match
pub const TAG_BEHAVIOR_SOFT_SCORE: i32 = 1;

/// Minimum cumulative score for a behavior tag to be emitted
pub const TAG_BEHAVIOR_CONFIDENCE_THRESHOLD_DEFAULT: i32 = 1;

/// Sentinel tag emitted when no behavior tag reaches the threshold
pub const TAG_NEUTRAL_SENTINEL: &str = "neutral";

// =============================================================================
// Enrichment Pipeline Limits
// =============================================================================

/// Quality rank lower bound
pub const MEMORY_RANK_MIN: u8 = 1;

/// Quality rank upper bound
pub const MEMORY_RANK_MAX: u8 = 5;

/// Rank assigned when the LLM call or digit parse fails
pub const MEMORY_RANK_DEFAULT: u8 = 3;

/// Importance lower bound
pub const MEMORY_IMPORTANCE_MIN: f32 = 0.0;

/// Importance upper bound
pub const MEMORY_IMPORTANCE_MAX: f32 = 1.0;

/// Importance assumed when the LLM rating cannot be parsed
pub const MEMORY_IMPORTANCE_LLM_DEFAULT: f32 = 0.3;

/// Starting importance for core memories and lessons
pub const MEMORY_IMPORTANCE_DEFAULT_CORE: f32 = 0.5;

/// Recency bonus, applied unconditionally at creation time
pub const MEMORY_IMPORTANCE_RECENCY_BONUS: f32 = 0.1;

/// Bonus applied when a memory carries many tags
pub const MEMORY_IMPORTANCE_TAG_BONUS: f32 = 0.2;

/// Tag count must exceed this for the tag bonus
pub const MEMORY_IMPORTANCE_TAG_COUNT_THRESHOLD: usize = 6;

// =============================================================================
// Search Limits
// =============================================================================

/// Skip-gate length for the primary query noise check
pub const SEARCH_QUERY_SKIP_LENGTH_PRIMARY: usize = 10;

/// Skip-gate length for the secondary query noise check
pub const SEARCH_QUERY_SKIP_LENGTH_SECONDARY: usize = 20;

/// Candidates below this similarity are discarded
pub const SEARCH_SIMILARITY_MIN: f32 = 0.5;

/// Candidates fetched per requested result (over-fetch for post-filtering)
pub const SEARCH_CANDIDATE_MULTIPLIER: usize = 2;

/// Maximum boost contributed by a perfect rank
pub const SEARCH_RANK_BOOST_SCALE: f32 = 0.2;

/// Default number of search results
pub const SEARCH_RESULTS_COUNT_DEFAULT: usize = 20;

/// Memories ranked below this are never recalled
pub const SEARCH_RANK_THRESHOLD_DEFAULT: u8 = 3;

/// Default result count for core-memory and lesson passthrough searches
pub const SEARCH_AUXILIARY_RESULTS_COUNT_DEFAULT: usize = 10;

// =============================================================================
// Session Limits
// =============================================================================

/// Memories per chunk during hierarchical summarization
pub const SESSION_SUMMARY_CHUNK_SIZE_DEFAULT: usize = 20;

/// Fallback truncation for a failed chunk summary
pub const SESSION_CHUNK_FALLBACK_CHARS_MAX: usize = 200;

/// Fallback truncation for a failed direct session summary
pub const SESSION_SUMMARY_FALLBACK_CHARS_MAX: usize = 500;

/// Default page size for session listing
pub const SESSION_LIST_COUNT_DEFAULT: usize = 50;

// =============================================================================
// Simulation Limits
// =============================================================================

/// Maximum size of an LLM prompt
pub const LLM_PROMPT_BYTES_MAX: usize = 100_000;

/// Dimensions of the simulated bag-of-words embedding
pub const SIM_EMBEDDING_DIMENSIONS_COUNT: usize = 256;

/// Maximum fault probability (1.0 = always)
pub const FAULT_PROBABILITY_MAX: f64 = 1.0;

// =============================================================================
// Tests
// =============================================================================
