//! Relational Store Trait
//!
//! `TigerStyle`: Abstract interface over the durable collaborator.
//!
//! Inserts are all-or-nothing: a failed create leaves no partial row behind.
//! All implementations must satisfy the same contract the [`super::SimMemoryStore`]
//! tests pin down.

use async_trait::async_trait;

use super::error::StorageResult;
use super::record::{
    CoreMemoryRecord, LessonRecord, MemoryPatch, MemoryRecord, SessionPatch, SessionRecord,
    TagCategory,
};

/// Abstract durable relational store.
///
/// CRUD for Session/Memory/CoreMemory/Lesson rows plus tag association and
/// tag-count queries. Row ids are store-assigned.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    // -------------------------------------------------------------------------
    // Sessions
    // -------------------------------------------------------------------------

    /// Create a session row, returning its id.
    async fn create_session(&self, title: &str, project: Option<&str>) -> StorageResult<i64>;

    /// Apply a patch to a session row.
    async fn update_session(&self, session_id: i64, patch: SessionPatch) -> StorageResult<()>;

    /// Get a session by id.
    async fn get_session(&self, session_id: i64) -> StorageResult<Option<SessionRecord>>;

    /// List sessions by last-active descending, optionally filtered by project.
    async fn list_sessions(
        &self,
        limit: usize,
        project: Option<&str>,
    ) -> StorageResult<Vec<SessionRecord>>;

    // -------------------------------------------------------------------------
    // Memories
    // -------------------------------------------------------------------------

    /// Insert a memory row, returning its id. All-or-nothing.
    async fn create_memory(&self, record: &MemoryRecord) -> StorageResult<i64>;

    /// Apply a patch to a memory row.
    async fn update_memory(&self, memory_id: i64, patch: MemoryPatch) -> StorageResult<()>;

    /// Get a memory by id.
    async fn get_memory(&self, memory_id: i64) -> StorageResult<Option<MemoryRecord>>;

    /// All memories of a session, oldest first.
    async fn memories_by_session(&self, session_id: i64) -> StorageResult<Vec<MemoryRecord>>;

    // -------------------------------------------------------------------------
    // Core memories
    // -------------------------------------------------------------------------

    /// Insert a core memory row, returning its id.
    async fn create_core_memory(&self, record: &CoreMemoryRecord) -> StorageResult<i64>;

    /// Deactivate a superseded core memory.
    async fn deactivate_core_memory(&self, core_memory_id: i64) -> StorageResult<()>;

    /// All active core memories, most important first.
    async fn active_core_memories(&self) -> StorageResult<Vec<CoreMemoryRecord>>;

    // -------------------------------------------------------------------------
    // Lessons
    // -------------------------------------------------------------------------

    /// Insert a lesson row, returning its id.
    async fn create_lesson(&self, record: &LessonRecord) -> StorageResult<i64>;

    /// All lessons, newest first.
    async fn list_lessons(&self) -> StorageResult<Vec<LessonRecord>>;

    // -------------------------------------------------------------------------
    // Tags
    // -------------------------------------------------------------------------

    /// Get or create a tag, returning its id. Unique per (name, category).
    async fn create_or_get_tag(&self, name: &str, category: TagCategory) -> StorageResult<i64>;

    /// Associate tag names with a memory.
    async fn tag_memory(&self, memory_id: i64, tag_names: &[String]) -> StorageResult<()>;

    /// Associate tag names with a core memory.
    async fn tag_core_memory(&self, core_memory_id: i64, tag_names: &[String])
        -> StorageResult<()>;

    /// Associate tag names with a lesson.
    async fn tag_lesson(&self, lesson_id: i64, tag_names: &[String]) -> StorageResult<()>;

    /// Tag names associated with a memory.
    async fn memory_tags(&self, memory_id: i64) -> StorageResult<Vec<String>>;

    /// Number of tags associated with a memory (importance calculation).
    async fn memory_tag_count(&self, memory_id: i64) -> StorageResult<usize>;
}
