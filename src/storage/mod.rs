//! Durable Storage Interfaces
//!
//! `TigerStyle`: Trait seams consumed, not implemented; simulation-first.
//!
//! The engine depends on two narrow collaborator interfaces: a durable
//! relational store ([`MemoryStore`]) for Session/Memory/CoreMemory/Lesson/Tag
//! rows, and a vector store ([`VectorStore`]) for embedding upserts and
//! similarity queries. Persistence schema details belong to the
//! collaborators; this crate ships the traits, the record types, and
//! deterministic in-memory sims for testing.

mod backend;
mod error;
mod record;
mod sim;
mod vector;

pub use backend::MemoryStore;
pub use error::{StorageError, StorageResult, VectorError, VectorResult};
pub use record::{
    CoreMemoryRecord, LessonRecord, MemoryKind, MemoryPatch, MemoryRecord, Role, SessionPatch,
    SessionRecord, TagCategory,
};
pub use sim::SimMemoryStore;
pub use vector::{Collection, SimVectorStore, VectorHit, VectorStore};
