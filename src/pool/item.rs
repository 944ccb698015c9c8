//! Pool Items and Token Estimation

use chrono::{DateTime, Utc};

use crate::constants::TOKEN_ESTIMATE_BYTES_PER_TOKEN;
use crate::storage::Role;

/// Rough token estimate: text length over four.
///
/// A fixed heuristic, not a tokenizer call, applied uniformly everywhere a
/// token count is needed.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / TOKEN_ESTIMATE_BYTES_PER_TOKEN
}

/// A scored text fragment held by a pool.
///
/// Immutable once created; the display pool label is assigned at gather time,
/// not at insert time. Token count is derived from the text on demand so the
/// two can never drift apart.
#[derive(Debug, Clone)]
pub struct PoolItem {
    /// The remembered text
    pub text: String,
    /// Priority score, higher sorts first
    pub priority: f32,
    /// Creation time, drives oldest-first eviction
    pub timestamp: DateTime<Utc>,
    /// Origin role of the fragment
    pub role: Role,
    /// Display pool label, assigned at gather time
    pub pool_label: String,
    /// Originating session, if any
    pub session_id: Option<i64>,
}

impl PoolItem {
    /// Create a new item stamped with the current time.
    #[must_use]
    pub fn new(text: impl Into<String>, role: Role) -> Self {
        Self {
            text: text.into(),
            priority: 0.0,
            timestamp: Utc::now(),
            role,
            pool_label: String::new(),
            session_id: None,
        }
    }

    /// Set the priority score.
    ///
    /// # Panics
    /// Debug-panics on a non-finite priority.
    #[must_use]
    pub fn with_priority(mut self, priority: f32) -> Self {
        debug_assert!(priority.is_finite(), "priority must be finite");
        self.priority = priority;
        self
    }

    /// Override the creation timestamp (deterministic tests).
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the originating session.
    #[must_use]
    pub fn with_session(mut self, session_id: i64) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Estimated token cost of this item.
    #[must_use]
    pub fn tokens(&self) -> usize {
        estimate_tokens(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcdefg"), 1);
        assert_eq!(estimate_tokens("a".repeat(80).as_str()), 20);
    }

    #[test]
    fn test_item_tokens_track_text() {
        let item = PoolItem::new("x".repeat(40), Role::User);
        assert_eq!(item.tokens(), 10);
    }

    #[test]
    fn test_item_builder() {
        let item = PoolItem::new("hello world, again", Role::Assistant)
            .with_priority(0.8)
            .with_session(7);
        assert!((item.priority - 0.8).abs() < f32::EPSILON);
        assert_eq!(item.session_id, Some(7));
        assert!(item.pool_label.is_empty());
    }
}
