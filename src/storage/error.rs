//! Storage Errors
//!
//! `TigerStyle`: Explicit error types with context.

use thiserror::Error;

/// Errors from the durable relational store.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Row not found
    #[error("not found: {entity} {id}")]
    NotFound {
        /// Entity kind (session, memory, ...)
        entity: &'static str,
        /// Row id that was not found
        id: i64,
    },

    /// Write failed; inserts are all-or-nothing, no partial row remains
    #[error("write failed: {message}")]
    Write {
        /// Failure description
        message: String,
    },

    /// Read failed
    #[error("read failed: {message}")]
    Read {
        /// Failure description
        message: String,
    },

    /// Connection to the store lost
    #[error("connection error: {message}")]
    Connection {
        /// Failure description
        message: String,
    },
}

impl StorageError {
    /// Create a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create a write error.
    #[must_use]
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    /// Create a read error.
    #[must_use]
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Whether a retry could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Result type for relational store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from the vector store.
#[derive(Debug, Clone, Error)]
pub enum VectorError {
    /// Upsert failed
    #[error("vector upsert failed: {message}")]
    Upsert {
        /// Failure description
        message: String,
    },

    /// Query failed
    #[error("vector query failed: {message}")]
    Query {
        /// Failure description
        message: String,
    },

    /// Delete failed
    #[error("vector delete failed: {message}")]
    Delete {
        /// Failure description
        message: String,
    },
}

impl VectorError {
    /// Create an upsert error.
    #[must_use]
    pub fn upsert(message: impl Into<String>) -> Self {
        Self::Upsert {
            message: message.into(),
        }
    }

    /// Create a query error.
    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a delete error.
    #[must_use]
    pub fn delete(message: impl Into<String>) -> Self {
        Self::Delete {
            message: message.into(),
        }
    }
}

/// Result type for vector store operations.
pub type VectorResult<T> = Result<T, VectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("memory", 7);
        assert_eq!(err.to_string(), "not found: memory 7");
    }

    #[test]
    fn test_is_transient() {
        assert!(StorageError::connection("reset").is_transient());
        assert!(!StorageError::write("constraint").is_transient());
        assert!(!StorageError::not_found("session", 1).is_transient());
    }
}
