//! Durable record of finished sessions
//!
//! The stream core only ever calls `create_session`, at most once per id.
//! The read/delete operations back the HTTP retrieval endpoints.

mod memory;
mod sqlite;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Record handed to the store when a session finalizes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSessionRecord {
    pub id: String,
    pub transcript: String,
    pub word_count: usize,
    pub duration_secs: f64,
    /// Free-form JSON describing how the session ended
    pub session_metadata: Option<String>,
}

/// A stored session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: String,
    pub transcript: String,
    pub word_count: usize,
    pub duration_secs: f64,
    pub created_at: DateTime<Utc>,
    pub session_metadata: Option<String>,
}

impl StoredSession {
    fn from_new(record: NewSessionRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id: record.id,
            transcript: record.transcript,
            word_count: record.word_count,
            duration_secs: record.duration_secs,
            created_at,
            session_metadata: record.session_metadata,
        }
    }
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Append one finalized session. Duplicate ids are rejected by the store.
    async fn create_session(&self, record: NewSessionRecord) -> Result<StoredSession>;

    /// Stored sessions, newest first
    async fn list_sessions(&self, skip: usize, limit: usize) -> Result<Vec<StoredSession>>;

    async fn get_session(&self, id: &str) -> Result<Option<StoredSession>>;

    /// Returns false if nothing was stored under `id`
    async fn delete_session(&self, id: &str) -> Result<bool>;

    /// Store name for logging
    fn name(&self) -> &str;
}
