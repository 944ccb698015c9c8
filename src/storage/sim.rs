//! `SimMemoryStore` - In-Memory Relational Store for Tests
//!
//! `TigerStyle`: Deterministic, fault-injectable, no external dependencies.
//!
//! Sequential row ids, insertion-ordered rows, interior mutability behind a
//! `RwLock` so it can be shared through `Arc` by the Processor, Search, and
//! Session components at once.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::backend::MemoryStore;
use super::error::{StorageError, StorageResult};
use super::record::{
    CoreMemoryRecord, LessonRecord, MemoryPatch, MemoryRecord, SessionPatch, SessionRecord,
    TagCategory,
};
use crate::dst::FaultInjector;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    sessions: HashMap<i64, SessionRecord>,
    memories: HashMap<i64, MemoryRecord>,
    core_memories: HashMap<i64, CoreMemoryRecord>,
    lessons: HashMap<i64, LessonRecord>,
    /// (name, category) -> tag id
    tags: HashMap<(String, TagCategory), i64>,
    /// memory id -> tag names, association order preserved
    memory_tags: HashMap<i64, Vec<String>>,
    core_memory_tags: HashMap<i64, Vec<String>>,
    lesson_tags: HashMap<i64, Vec<String>>,
}

impl Inner {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store for deterministic simulation testing.
#[derive(Debug, Clone, Default)]
pub struct SimMemoryStore {
    inner: Arc<RwLock<Inner>>,
    fault_injector: Option<Arc<FaultInjector>>,
}

impl SimMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with fault injection.
    #[must_use]
    pub fn with_faults(fault_injector: Arc<FaultInjector>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            fault_injector: Some(fault_injector),
        }
    }

    fn check_fault(&self, operation: &str) -> StorageResult<()> {
        if let Some(injector) = &self.fault_injector {
            if let Some(fault) = injector.should_inject(operation) {
                let message = format!("injected fault: {}", fault.as_str());
                return Err(if operation.contains("write") {
                    StorageError::write(message)
                } else {
                    StorageError::read(message)
                });
            }
        }
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Total memory rows (test inspection).
    #[must_use]
    pub fn memory_count(&self) -> usize {
        self.read().memories.len()
    }

    /// Total session rows (test inspection).
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.read().sessions.len()
    }
}

#[async_trait]
impl MemoryStore for SimMemoryStore {
    async fn create_session(&self, title: &str, project: Option<&str>) -> StorageResult<i64> {
        self.check_fault("store_write_session")?;

        let mut inner = self.write();
        let id = inner.allocate_id();
        let now = Utc::now();
        inner.sessions.insert(
            id,
            SessionRecord {
                id,
                title: title.to_string(),
                summary: None,
                project: project.map(str::to_string),
                created_at: now,
                last_active: now,
                archived: false,
                message_count: 0,
            },
        );
        Ok(id)
    }

    async fn update_session(&self, session_id: i64, patch: SessionPatch) -> StorageResult<()> {
        self.check_fault("store_write_session")?;

        let mut inner = self.write();
        let session = inner
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| StorageError::not_found("session", session_id))?;

        if let Some(title) = patch.title {
            session.title = title;
        }
        if let Some(summary) = patch.summary {
            session.summary = Some(summary);
        }
        if let Some(last_active) = patch.last_active {
            session.last_active = last_active;
        }
        if let Some(count) = patch.message_count {
            session.message_count = count;
        }
        if let Some(archived) = patch.archived {
            session.archived = archived;
        }
        Ok(())
    }

    async fn get_session(&self, session_id: i64) -> StorageResult<Option<SessionRecord>> {
        self.check_fault("store_read_session")?;
        Ok(self.read().sessions.get(&session_id).cloned())
    }

    async fn list_sessions(
        &self,
        limit: usize,
        project: Option<&str>,
    ) -> StorageResult<Vec<SessionRecord>> {
        self.check_fault("store_read_session")?;

        let inner = self.read();
        let mut sessions: Vec<SessionRecord> = inner
            .sessions
            .values()
            .filter(|s| match project {
                Some(p) => s.project.as_deref() == Some(p),
                None => true,
            })
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_active.cmp(&a.last_active).then(b.id.cmp(&a.id)));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn create_memory(&self, record: &MemoryRecord) -> StorageResult<i64> {
        self.check_fault("store_write_memory")?;

        let mut inner = self.write();
        let id = inner.allocate_id();
        let mut stored = record.clone();
        stored.id = id;
        inner.memories.insert(id, stored);
        Ok(id)
    }

    async fn update_memory(&self, memory_id: i64, patch: MemoryPatch) -> StorageResult<()> {
        self.check_fault("store_write_memory")?;

        let mut inner = self.write();
        let memory = inner
            .memories
            .get_mut(&memory_id)
            .ok_or_else(|| StorageError::not_found("memory", memory_id))?;

        if let Some(summary) = patch.summary {
            memory.summary = Some(summary);
        }
        if let Some(rank) = patch.rank {
            memory.rank = rank;
        }
        if let Some(importance) = patch.importance {
            memory.importance = importance;
        }
        if let Some(archived) = patch.archived {
            memory.archived = archived;
        }
        Ok(())
    }

    async fn get_memory(&self, memory_id: i64) -> StorageResult<Option<MemoryRecord>> {
        self.check_fault("store_read_memory")?;

        let inner = self.read();
        Ok(inner.memories.get(&memory_id).cloned().map(|mut m| {
            m.tags = inner.memory_tags.get(&memory_id).cloned().unwrap_or_default();
            m
        }))
    }

    async fn memories_by_session(&self, session_id: i64) -> StorageResult<Vec<MemoryRecord>> {
        self.check_fault("store_read_memory")?;

        let inner = self.read();
        let mut memories: Vec<MemoryRecord> = inner
            .memories
            .values()
            .filter(|m| m.session_id == Some(session_id))
            .cloned()
            .collect();
        memories.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(memories)
    }

    async fn create_core_memory(&self, record: &CoreMemoryRecord) -> StorageResult<i64> {
        self.check_fault("store_write_core_memory")?;

        let mut inner = self.write();
        let id = inner.allocate_id();
        let mut stored = record.clone();
        stored.id = id;
        inner.core_memories.insert(id, stored);
        Ok(id)
    }

    async fn deactivate_core_memory(&self, core_memory_id: i64) -> StorageResult<()> {
        self.check_fault("store_write_core_memory")?;

        let mut inner = self.write();
        let core = inner
            .core_memories
            .get_mut(&core_memory_id)
            .ok_or_else(|| StorageError::not_found("core_memory", core_memory_id))?;
        core.active = false;
        Ok(())
    }

    async fn active_core_memories(&self) -> StorageResult<Vec<CoreMemoryRecord>> {
        self.check_fault("store_read_core_memory")?;

        let inner = self.read();
        let mut cores: Vec<CoreMemoryRecord> = inner
            .core_memories
            .values()
            .filter(|c| c.active)
            .cloned()
            .collect();
        cores.sort_by(|a, b| b.importance.total_cmp(&a.importance).then(a.id.cmp(&b.id)));
        Ok(cores)
    }

    async fn create_lesson(&self, record: &LessonRecord) -> StorageResult<i64> {
        self.check_fault("store_write_lesson")?;

        let mut inner = self.write();
        let id = inner.allocate_id();
        let mut stored = record.clone();
        stored.id = id;
        inner.lessons.insert(id, stored);
        Ok(id)
    }

    async fn list_lessons(&self) -> StorageResult<Vec<LessonRecord>> {
        self.check_fault("store_read_lesson")?;

        let inner = self.read();
        let mut lessons: Vec<LessonRecord> = inner.lessons.values().cloned().collect();
        lessons.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(lessons)
    }

    async fn create_or_get_tag(&self, name: &str, category: TagCategory) -> StorageResult<i64> {
        self.check_fault("store_write_tag")?;

        let mut inner = self.write();
        let key = (name.to_string(), category);
        if let Some(&id) = inner.tags.get(&key) {
            return Ok(id);
        }
        let id = inner.allocate_id();
        inner.tags.insert(key, id);
        Ok(id)
    }

    async fn tag_memory(&self, memory_id: i64, tag_names: &[String]) -> StorageResult<()> {
        self.check_fault("store_write_tag")?;

        let mut inner = self.write();
        if !inner.memories.contains_key(&memory_id) {
            return Err(StorageError::not_found("memory", memory_id));
        }
        let assigned = inner.memory_tags.entry(memory_id).or_default();
        for name in tag_names {
            if !assigned.contains(name) {
                assigned.push(name.clone());
            }
        }
        Ok(())
    }

    async fn tag_core_memory(
        &self,
        core_memory_id: i64,
        tag_names: &[String],
    ) -> StorageResult<()> {
        self.check_fault("store_write_tag")?;

        let mut inner = self.write();
        if !inner.core_memories.contains_key(&core_memory_id) {
            return Err(StorageError::not_found("core_memory", core_memory_id));
        }
        let assigned = inner.core_memory_tags.entry(core_memory_id).or_default();
        for name in tag_names {
            if !assigned.contains(name) {
                assigned.push(name.clone());
            }
        }
        Ok(())
    }

    async fn tag_lesson(&self, lesson_id: i64, tag_names: &[String]) -> StorageResult<()> {
        self.check_fault("store_write_tag")?;

        let mut inner = self.write();
        if !inner.lessons.contains_key(&lesson_id) {
            return Err(StorageError::not_found("lesson", lesson_id));
        }
        let assigned = inner.lesson_tags.entry(lesson_id).or_default();
        for name in tag_names {
            if !assigned.contains(name) {
                assigned.push(name.clone());
            }
        }
        Ok(())
    }

    async fn memory_tags(&self, memory_id: i64) -> StorageResult<Vec<String>> {
        self.check_fault("store_read_tag")?;
        Ok(self.read().memory_tags.get(&memory_id).cloned().unwrap_or_default())
    }

    async fn memory_tag_count(&self, memory_id: i64) -> StorageResult<usize> {
        self.check_fault("store_read_tag")?;
        Ok(self
            .read()
            .memory_tags
            .get(&memory_id)
            .map_or(0, Vec::len))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dst::{DeterministicRng, FaultConfig, FaultType};
    use crate::storage::Role;

    #[tokio::test]
    async fn test_session_roundtrip() {
        let store = SimMemoryStore::new();
        let id = store.create_session("New Session", Some("infra")).await.unwrap();

        let session = store.get_session(id).await.unwrap().unwrap();
        assert_eq!(session.title, "New Session");
        assert_eq!(session.project.as_deref(), Some("infra"));
        assert_eq!(session.message_count, 0);
    }

    #[tokio::test]
    async fn test_session_patch() {
        let store = SimMemoryStore::new();
        let id = store.create_session("New Session", None).await.unwrap();

        store
            .update_session(
                id,
                SessionPatch::new().with_title("Renamed").with_message_count(12),
            )
            .await
            .unwrap();

        let session = store.get_session(id).await.unwrap().unwrap();
        assert_eq!(session.title, "Renamed");
        assert_eq!(session.message_count, 12);
        assert!(session.summary.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_session_fails() {
        let store = SimMemoryStore::new();
        let result = store.update_session(99, SessionPatch::new()).await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_sessions_project_filter() {
        let store = SimMemoryStore::new();
        store.create_session("a", Some("alpha")).await.unwrap();
        store.create_session("b", Some("beta")).await.unwrap();
        store.create_session("c", Some("alpha")).await.unwrap();

        let alpha = store.list_sessions(10, Some("alpha")).await.unwrap();
        assert_eq!(alpha.len(), 2);

        let all = store.list_sessions(2, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_roundtrip_and_patch() {
        let store = SimMemoryStore::new();
        let session_id = store.create_session("s", None).await.unwrap();
        let record =
            MemoryRecord::conversation(Some(session_id), Role::User, "content", "summary");
        let id = store.create_memory(&record).await.unwrap();

        store
            .update_memory(id, MemoryPatch::new().with_rank(4).with_importance(0.6))
            .await
            .unwrap();

        let memory = store.get_memory(id).await.unwrap().unwrap();
        assert_eq!(memory.rank, 4);
        assert!((memory.importance - 0.6).abs() < f32::EPSILON);
        assert_eq!(memory.content, "content");
    }

    #[tokio::test]
    async fn test_memories_by_session_ordered() {
        let store = SimMemoryStore::new();
        let session_id = store.create_session("s", None).await.unwrap();
        for i in 0..3 {
            let record = MemoryRecord::conversation(
                Some(session_id),
                Role::User,
                format!("message number {i}"),
                format!("summary {i}"),
            );
            store.create_memory(&record).await.unwrap();
        }

        let memories = store.memories_by_session(session_id).await.unwrap();
        assert_eq!(memories.len(), 3);
        assert!(memories[0].content.contains('0'));
        assert!(memories[2].content.contains('2'));
    }

    #[tokio::test]
    async fn test_core_memory_deactivation() {
        let store = SimMemoryStore::new();
        let id = store
            .create_core_memory(&CoreMemoryRecord::new("prefers terse answers", None))
            .await
            .unwrap();

        assert_eq!(store.active_core_memories().await.unwrap().len(), 1);
        store.deactivate_core_memory(id).await.unwrap();
        assert!(store.active_core_memories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tags_unique_per_name_and_category() {
        let store = SimMemoryStore::new();
        let a = store.create_or_get_tag("sql", TagCategory::Topic).await.unwrap();
        let b = store.create_or_get_tag("sql", TagCategory::Topic).await.unwrap();
        let c = store.create_or_get_tag("sql", TagCategory::Behavior).await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_tag_memory_and_count() {
        let store = SimMemoryStore::new();
        let record = MemoryRecord::conversation(None, Role::User, "content", "summary");
        let id = store.create_memory(&record).await.unwrap();

        let tags = vec!["sql".to_string(), "debug".to_string(), "sql".to_string()];
        store.tag_memory(id, &tags).await.unwrap();

        assert_eq!(store.memory_tag_count(id).await.unwrap(), 2);
        let loaded = store.get_memory(id).await.unwrap().unwrap();
        assert_eq!(loaded.tags, vec!["sql".to_string(), "debug".to_string()]);
    }

    #[tokio::test]
    async fn test_write_fault_injection() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::StoreWriteFail, 1.0).with_filter("write"));
        let store = SimMemoryStore::with_faults(Arc::new(injector));

        let record = MemoryRecord::conversation(None, Role::User, "content", "summary");
        let result = store.create_memory(&record).await;
        assert!(matches!(result, Err(StorageError::Write { .. })));
        assert_eq!(store.memory_count(), 0);
    }
}
