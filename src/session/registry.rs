use super::stats::ActiveSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-wide bookkeeping of live sessions (session_id → info).
///
/// Only touched when a session is created and when it is removed; the
/// per-session state itself never lives here.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, ActiveSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. Returns false, leaving the existing entry alone,
    /// if the id is already live.
    pub async fn register(&self, session: ActiveSession) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.session_id) {
            return false;
        }
        debug!(session_id = %session.session_id, "Registered session");
        sessions.insert(session.session_id.clone(), session);
        true
    }

    /// Remove a session. Removing an absent id is a no-op.
    pub async fn remove(&self, session_id: &str) -> Option<ActiveSession> {
        let removed = self.sessions.write().await.remove(session_id);
        if removed.is_some() {
            debug!(session_id = %session_id, "Removed session");
        }
        removed
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of live sessions, oldest first
    pub async fn list(&self) -> Vec<ActiveSession> {
        let mut sessions: Vec<ActiveSession> =
            self.sessions.read().await.values().cloned().collect();
        sessions.sort_by_key(|s| s.started_at);
        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn active(id: &str) -> ActiveSession {
        ActiveSession {
            session_id: id.to_string(),
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn register_rejects_live_duplicate() {
        let registry = SessionRegistry::new();
        assert!(registry.register(active("a")).await);
        assert!(!registry.register(active("a")).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = SessionRegistry::new();
        registry.register(active("a")).await;

        assert!(registry.remove("a").await.is_some());
        assert!(registry.remove("a").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_sessions_register_and_remove() {
        let registry = SessionRegistry::new();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let id = format!("session-{}", i);
                    assert!(registry.register(active(&id)).await);
                    if i % 2 == 0 {
                        registry.remove(&id).await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(registry.len().await, 16);
        assert!(registry.contains("session-1").await);
        assert!(!registry.contains("session-2").await);
    }
}
