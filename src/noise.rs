//! Noise Classifier - Is a Fragment Worth Remembering?
//!
//! `TigerStyle`: Pure functions over arbitrary strings, no I/O, cannot fail.
//!
//! Filters greetings, reactions, and filler before they enter the enrichment
//! pipeline, and rejects low-value queries before they hit vector search.
//! `should_skip` is the single gate used by both pipelines; call sites choose
//! the length threshold.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{
    NOISE_SHORT_CHARS_MAX, NOISE_SHORT_WORDS_COUNT_MAX, NOISE_SKIP_LENGTH_DEFAULT,
    NOISE_WORD_COUNT_MIN,
};

// =============================================================================
// Curated Word Sets
// =============================================================================

/// Words correlated with substantive content. Substring containment is
/// intentional: "thinking" and "remembered" must hit.
const SIGNAL_WORDS: &[&str] = &[
    "you", "feel", "doing", "okay", "sure", "think", "remember", "what", "why", "still", "about",
    "mean", "want", "been",
];

/// Known noise phrases, matched exactly after normalization.
const NOISE_PHRASES: &[&str] = &[
    // Greetings
    "hi",
    "hello",
    "hey",
    "hi there",
    "hey there",
    "yo",
    "whats up",
    "sup",
    "howdy",
    "good morning",
    "good afternoon",
    "good night",
    "bye",
    "goodbye",
    "see ya",
    "later",
    "take care",
    "gn",
    "night",
    // Short affirmatives/negatives
    "ok",
    "okay",
    "yeah",
    "nah",
    "maybe",
    "got it",
    "roger",
    "sure",
    "yup",
    "nope",
    "yes",
    "no",
    "alright",
    "right",
    "uh huh",
    "mm hmm",
    "mhm",
    "aye",
    "bet",
    "fine",
    "k",
    "kk",
    // Generic reactions
    "wow",
    "oh",
    "ah",
    "huh",
    "oops",
    "whoops",
    "hm",
    "hmm",
    "heh",
    "hmm ok",
    "okay then",
    "cool",
    "nice",
    "great",
    "awesome",
    "interesting",
    "noted",
    "makes sense",
    "understood",
    // Internet/text slang
    "lol",
    "haha",
    "lmao",
    "lmfao",
    "rofl",
    "smh",
    "brb",
    "btw",
    "idk",
    "imo",
    "imho",
    "tbh",
    "omg",
    "omfg",
    "ikr",
    "yeet",
    "fr",
    "nvm",
    "ffs",
    "wtf",
    "wth",
];

/// Filler words that are noise only when they stand alone.
const FILLER_WORDS: &[&str] = &["um", "uh", "well", "like", "you know", "i mean"];

static LAUGHTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(ha|lol|lmao|rofl)+!*$").expect("laughter pattern"));

static DECLARATIVE_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(I|My|This|The|It|There is|[A-Z][a-z]+)\b").expect("declarative pattern")
});

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

// =============================================================================
// Classification
// =============================================================================

/// Lowercase, strip punctuation, and collapse whitespace for phrase comparison.
fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = PUNCTUATION.replace_all(lower.trim(), "");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

/// Check whether text contains any signal word indicating meaningful content.
#[must_use]
pub fn contains_signal_word(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    SIGNAL_WORDS.iter().any(|word| lower.contains(word))
}

/// Check whether text is pure noise: a known greeting/filler/reaction phrase,
/// a standalone filler word, a very short fragment, or repeated laughter.
///
/// Empty or whitespace-only text is always noise.
#[must_use]
pub fn is_noise(text: &str) -> bool {
    if text.trim().is_empty() {
        return true;
    }

    let normalized = normalize(text);

    if NOISE_PHRASES.contains(&normalized.as_str()) {
        return true;
    }

    if FILLER_WORDS.contains(&normalized.as_str()) {
        return true;
    }

    let word_count = normalized.split_whitespace().count();
    if word_count <= NOISE_SHORT_WORDS_COUNT_MAX && normalized.chars().count() <= NOISE_SHORT_CHARS_MAX
    {
        return true;
    }

    LAUGHTER_PATTERN.is_match(&normalized)
}

/// Check whether text reads as a declarative sentence: starts with a subject,
/// contains no question mark, ends with strong punctuation, and has low clause
/// complexity (fewer than two commas).
///
/// Available for callers but not consulted by [`should_skip`].
#[must_use]
pub fn is_declarative(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }

    let starts_with_subject = DECLARATIVE_START.is_match(text);
    let no_questions = !text.contains('?');
    let ends_with_punct = text.ends_with('.') || text.ends_with('!');
    let low_complexity = text.matches(',').count() < 2;

    starts_with_subject && no_questions && ends_with_punct && low_complexity
}

/// Single skip gate shared by the enrichment and search pipelines.
///
/// A message is skipped when it is noise, when it is shorter than `max_len`
/// characters without containing a signal word, or when it has fewer than
/// three words. Call sites pick `max_len`: 80 for enrichment, 10/20 for
/// query filtering.
#[must_use]
pub fn should_skip(text: &str, max_len: usize) -> bool {
    if is_noise(text) {
        return true;
    }

    if text.chars().count() < max_len && !contains_signal_word(text) {
        return true;
    }

    text.split_whitespace().count() < NOISE_WORD_COUNT_MIN
}

/// [`should_skip`] with the default enrichment threshold.
#[must_use]
pub fn should_skip_default(text: &str) -> bool {
    should_skip(text, NOISE_SKIP_LENGTH_DEFAULT)
}

// =============================================================================
// Tests
// =============================================================================
