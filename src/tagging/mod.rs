//! Tagger - Rule-Based Topic, Behavior, and Trigger Extraction
//!
//! `TigerStyle`: Pure, deterministic, no I/O, cannot fail.
//!
//! Three independent rule passes over a message:
//! - **Topics**: regex tables, a tag per table row with any matching pattern
//! - **Behaviors**: strong substring triggers (+2) and soft word-boundary
//!   triggers (+1) accumulate a score per tag; tags at or above the confidence
//!   threshold are emitted, with a `"neutral"` sentinel when none qualify
//! - **Background triggers**: substring phrase lists for actionable items,
//!   independent of the combined tag output
//!
//! [`tag_message`] combines behaviors and topics, behavior tags first.

mod patterns;

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{
    TAGS_PER_MESSAGE_COUNT_MAX, TAG_BEHAVIOR_CONFIDENCE_THRESHOLD_DEFAULT,
    TAG_BEHAVIOR_SOFT_SCORE, TAG_BEHAVIOR_STRONG_SCORE, TAG_NEUTRAL_SENTINEL,
};
use patterns::{BACKGROUND_TRIGGER_RULES, BEHAVIOR_RULES, TOPIC_RULES};

// =============================================================================
// Compiled Rule Tables
// =============================================================================

/// Topic regexes, compiled once, case-insensitive.
static COMPILED_TOPICS: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    TOPIC_RULES
        .iter()
        .map(|(name, raw)| {
            let compiled = raw
                .iter()
                .map(|p| Regex::new(&format!("(?i){p}")).expect("topic pattern"))
                .collect();
            (*name, compiled)
        })
        .collect()
});

/// Soft behavior triggers as word-boundary regexes, compiled once.
static COMPILED_SOFT_TRIGGERS: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    BEHAVIOR_RULES
        .iter()
        .map(|(name, _, soft)| {
            let compiled = soft
                .iter()
                .map(|t| {
                    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(t))).expect("soft trigger")
                })
                .collect();
            (*name, compiled)
        })
        .collect()
});

// =============================================================================
// Tagging
// =============================================================================

/// Extract topic tags from a message. A tag is emitted when any of its
/// patterns matches, independent of other tags. Output is in table order.
#[must_use]
pub fn tag_topics(message: &str) -> Vec<String> {
    COMPILED_TOPICS
        .iter()
        .filter(|(_, regexes)| regexes.iter().any(|r| r.is_match(message)))
        .map(|(name, _)| (*name).to_string())
        .collect()
}

/// Extract behavior tags using cumulative trigger scores.
///
/// Each strong trigger found as a lowercase substring adds +2; each soft
/// trigger found on a word boundary adds +1. Tags with a score at or above
/// `confidence_threshold` are emitted; when none qualify the `"neutral"`
/// sentinel is returned alone.
#[must_use]
pub fn tag_behaviors(message: &str, confidence_threshold: i32) -> Vec<String> {
    let lower = message.to_lowercase();

    let mut result = Vec::new();
    for ((name, strong, _), (_, soft_regexes)) in
        BEHAVIOR_RULES.iter().zip(COMPILED_SOFT_TRIGGERS.iter())
    {
        let mut score = 0;
        for trigger in strong.iter() {
            if lower.contains(&trigger.to_lowercase()) {
                score += TAG_BEHAVIOR_STRONG_SCORE;
            }
        }
        for soft in soft_regexes {
            if soft.is_match(message) {
                score += TAG_BEHAVIOR_SOFT_SCORE;
            }
        }
        if score >= confidence_threshold {
            result.push((*name).to_string());
        }
    }

    if result.is_empty() {
        result.push(TAG_NEUTRAL_SENTINEL.to_string());
    }
    result
}

/// Detect background actionable triggers (research ideas, pending tasks,
/// lesson candidates) via substring matching. Independent of [`tag_message`].
#[must_use]
pub fn detect_background_triggers(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();

    BACKGROUND_TRIGGER_RULES
        .iter()
        .filter(|(_, phrases)| phrases.iter().any(|p| lower.contains(p)))
        .map(|(name, _)| (*name).to_string())
        .collect()
}

/// Combined tagger: behavior tags followed by topic tags, de-duplicated in
/// first-seen order and capped at `max_tags`.
///
/// The `"neutral"` sentinel is dropped whenever any other tag is present.
/// When the cap is exceeded, behavior tags are kept ahead of topic tags and
/// the remainder is discarded.
#[must_use]
pub fn tag_message(message: &str, max_tags: usize) -> Vec<String> {
    let behavior_tags = tag_behaviors(message, TAG_BEHAVIOR_CONFIDENCE_THRESHOLD_DEFAULT);
    let topic_tags = tag_topics(message);

    let mut all_tags: Vec<String> = Vec::new();
    for tag in behavior_tags.iter().chain(topic_tags.iter()) {
        if !all_tags.contains(tag) {
            all_tags.push(tag.clone());
        }
    }

    if all_tags.len() > 1 {
        all_tags.retain(|t| t != TAG_NEUTRAL_SENTINEL);
    }

    all_tags.truncate(max_tags);

    // Postcondition
    debug_assert!(all_tags.len() <= max_tags, "tag cap violated");
    all_tags
}

/// [`tag_message`] with the default cap.
#[must_use]
pub fn tag_message_default(message: &str) -> Vec<String> {
    tag_message(message, TAGS_PER_MESSAGE_COUNT_MAX)
}

// =============================================================================
// Tests
// =============================================================================
