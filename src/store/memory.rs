use super::{NewSessionRecord, SessionStore, StoredSession};
use anyhow::{bail, Result};
use chrono::Utc;
use tokio::sync::Mutex;

/// In-process store, kept in insertion order
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<StoredSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record, oldest first
    pub async fn snapshot(&self) -> Vec<StoredSession> {
        self.sessions.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, record: NewSessionRecord) -> Result<StoredSession> {
        let mut sessions = self.sessions.lock().await;
        if sessions.iter().any(|s| s.id == record.id) {
            bail!("Session {} already stored", record.id);
        }

        let stored = StoredSession::from_new(record, Utc::now());
        sessions.push(stored.clone());
        Ok(stored)
    }

    async fn list_sessions(&self, skip: usize, limit: usize) -> Result<Vec<StoredSession>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.iter().rev().skip(skip).take(limit).cloned().collect())
    }

    async fn get_session(&self, id: &str) -> Result<Option<StoredSession>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn delete_session(&self, id: &str) -> Result<bool> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        Ok(sessions.len() != before)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> NewSessionRecord {
        NewSessionRecord {
            id: id.to_string(),
            transcript: "hello world".to_string(),
            word_count: 2,
            duration_secs: 1.5,
            session_metadata: None,
        }
    }

    #[tokio::test]
    async fn lists_newest_first_and_rejects_duplicates() {
        let store = MemoryStore::new();
        store.create_session(record("a")).await.unwrap();
        store.create_session(record("b")).await.unwrap();
        assert!(store.create_session(record("a")).await.is_err());

        let ids: Vec<String> = store
            .list_sessions(0, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert!(store.delete_session("a").await.unwrap());
        assert!(!store.delete_session("a").await.unwrap());
        assert!(store.get_session("a").await.unwrap().is_none());
    }
}
