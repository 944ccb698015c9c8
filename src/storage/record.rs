//! Durable Records
//!
//! `TigerStyle`: Explicit types, closed enums, no open maps.
//!
//! These are the rows the relational collaborator persists. Created once and
//! kept indefinitely; archival (or deactivation for core memories) is the
//! only removal path, never deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MEMORY_IMPORTANCE_DEFAULT_CORE;

// =============================================================================
// Roles
// =============================================================================

/// Origin of a text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// User turn
    User,
    /// Assistant turn
    Assistant,
    /// System-injected text (overflow summaries, notices)
    System,
    /// Extracted behavioral lesson
    Lesson,
}

impl Role {
    /// String form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Lesson => "lesson",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Memory
// =============================================================================

/// Kind of durable memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// A conversation turn
    Conversation,
    /// A user-scoped fact or preference
    Core,
    /// An extracted behavioral takeaway
    Lesson,
    /// A whole-session summary
    SessionSummary,
}

/// A durable memory row.
///
/// Created by the Processor and mutated only by it (rank, importance,
/// summary); never deleted, only archived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Row id, store-assigned
    pub id: i64,
    /// Originating session, if any
    pub session_id: Option<i64>,
    /// Origin role
    pub role: Role,
    /// Raw content
    pub content: String,
    /// Generated summary (raw content on summarization failure)
    pub summary: Option<String>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Quality rank 1-5; 0 means unrated
    pub rank: u8,
    /// Importance score 0.0-1.0
    pub importance: f32,
    /// Associated tag names
    pub tags: Vec<String>,
    /// Kind of memory
    pub kind: MemoryKind,
    /// Archived flag (the only removal path)
    pub archived: bool,
}

impl MemoryRecord {
    /// Create an unrated conversation memory ready for insertion.
    #[must_use]
    pub fn conversation(
        session_id: Option<i64>,
        role: Role,
        content: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            session_id,
            role,
            content: content.into(),
            summary: Some(summary.into()),
            timestamp: Utc::now(),
            rank: 0,
            importance: 0.0,
            tags: Vec::new(),
            kind: MemoryKind::Conversation,
            archived: false,
        }
    }

    /// The summary when present, else the raw content.
    #[must_use]
    pub fn summary_or_content(&self) -> &str {
        match &self.summary {
            Some(summary) if !summary.is_empty() => summary,
            _ => &self.content,
        }
    }
}

/// Field updates for a memory row. Unset fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct MemoryPatch {
    /// Replace the summary
    pub summary: Option<String>,
    /// Replace the rank
    pub rank: Option<u8>,
    /// Replace the importance
    pub importance: Option<f32>,
    /// Set the archived flag
    pub archived: Option<bool>,
}

impl MemoryPatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rank.
    #[must_use]
    pub fn with_rank(mut self, rank: u8) -> Self {
        self.rank = Some(rank);
        self
    }

    /// Set the importance.
    #[must_use]
    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = Some(importance);
        self
    }

    /// Set the summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Archive the row.
    #[must_use]
    pub fn archive(mut self) -> Self {
        self.archived = Some(true);
        self
    }
}

// =============================================================================
// Core Memory
// =============================================================================

/// A durable, user-scoped fact or preference, independent of any session.
///
/// Deactivated when superseded, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreMemoryRecord {
    /// Row id, store-assigned
    pub id: i64,
    /// The fact or preference
    pub content: String,
    /// Category: general, preference, fact, personality
    pub category: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Importance score 0.0-1.0
    pub importance: f32,
    /// Associated tag names
    pub tags: Vec<String>,
    /// Session the fact was extracted from, if any
    pub source_session_id: Option<i64>,
    /// Active flag; superseded rows are deactivated
    pub active: bool,
}

impl CoreMemoryRecord {
    /// Create an active core memory ready for insertion.
    #[must_use]
    pub fn new(content: impl Into<String>, source_session_id: Option<i64>) -> Self {
        Self {
            id: 0,
            content: content.into(),
            category: "general".to_string(),
            timestamp: Utc::now(),
            importance: MEMORY_IMPORTANCE_DEFAULT_CORE,
            tags: Vec::new(),
            source_session_id,
            active: true,
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

// =============================================================================
// Lesson
// =============================================================================

/// A durable behavioral takeaway extracted from a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    /// Row id, store-assigned
    pub id: i64,
    /// The lesson text
    pub content: String,
    /// Optional condensed form
    pub summary: Option<String>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Quality rank 1-5
    pub rank: u8,
    /// Importance score 0.0-1.0
    pub importance: f32,
    /// Associated tag names
    pub tags: Vec<String>,
    /// Session the lesson came from
    pub source_session_id: Option<i64>,
}

impl LessonRecord {
    /// Create a lesson ready for insertion.
    #[must_use]
    pub fn new(content: impl Into<String>, source_session_id: Option<i64>) -> Self {
        Self {
            id: 0,
            content: content.into(),
            summary: None,
            timestamp: Utc::now(),
            rank: 3,
            importance: MEMORY_IMPORTANCE_DEFAULT_CORE,
            tags: Vec::new(),
            source_session_id,
        }
    }
}

// =============================================================================
// Tags
// =============================================================================

/// Tag category. A tag name is globally unique per (name, category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    /// Subject-matter tag
    Topic,
    /// Behavioral tag
    Behavior,
    /// Background actionable trigger
    Background,
}

impl TagCategory {
    /// String form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Behavior => "behavior",
            Self::Background => "background",
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// A durable session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Row id, store-assigned
    pub id: i64,
    /// Generated or default title
    pub title: String,
    /// Final hierarchical summary, set at session end
    pub summary: Option<String>,
    /// Optional project label
    pub project: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last flush or update time
    pub last_active: DateTime<Utc>,
    /// Archived flag
    pub archived: bool,
    /// Message count at last flush
    pub message_count: usize,
}

/// Field updates for a session row. Unset fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    /// Replace the title
    pub title: Option<String>,
    /// Replace the summary
    pub summary: Option<String>,
    /// Touch the last-active time
    pub last_active: Option<DateTime<Utc>>,
    /// Replace the message count
    pub message_count: Option<usize>,
    /// Set the archived flag
    pub archived: Option<bool>,
}

impl SessionPatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Touch the last-active time.
    #[must_use]
    pub fn touch(mut self, at: DateTime<Utc>) -> Self {
        self.last_active = Some(at);
        self
    }

    /// Set the message count.
    #[must_use]
    pub fn with_message_count(mut self, count: usize) -> Self {
        self.message_count = Some(count);
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
