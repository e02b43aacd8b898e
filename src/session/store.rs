//! Session storage backends.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

/// Error type for session store operations
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Session backend error: {0}")]
    Backend(String),
}

/// Key/value storage scoped to a session id.
///
/// A session only occupies storage once a value is written to it.
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fresh, unguessable id; nothing is stored until the first `put`
    fn new_id(&self) -> String;

    /// Whether `id` names a live session
    async fn exists(&self, id: &str) -> Result<bool, SessionError>;

    async fn get(&self, id: &str, key: &str) -> Result<Option<String>, SessionError>;

    /// Store a value, starting the session if it does not exist or has expired
    async fn put(&self, id: &str, key: &str, value: String) -> Result<(), SessionError>;

    /// Read a value and remove it in one step
    async fn pop(&self, id: &str, key: &str) -> Result<Option<String>, SessionError>;

    /// Drop expired sessions, returning how many were removed
    async fn remove_expired(&self) -> Result<usize, SessionError>;
}

#[derive(Debug)]
struct SessionEntry {
    values: HashMap<String, String>,
    expires_at: DateTime<Utc>,
}

impl SessionEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-process session store
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionEntry>,
    lifetime: chrono::Duration,
}

impl MemorySessionStore {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            lifetime: chrono::Duration::from_std(lifetime)
                .unwrap_or_else(|_| chrono::Duration::days(1)),
        }
    }

    /// Number of sessions held, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn new_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    async fn exists(&self, id: &str) -> Result<bool, SessionError> {
        let now = Utc::now();
        Ok(self
            .sessions
            .get(id)
            .is_some_and(|entry| !entry.is_expired(now)))
    }

    async fn get(&self, id: &str, key: &str) -> Result<Option<String>, SessionError> {
        let now = Utc::now();
        Ok(self
            .sessions
            .get(id)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| entry.values.get(key).cloned()))
    }

    async fn put(&self, id: &str, key: &str, value: String) -> Result<(), SessionError> {
        let now = Utc::now();
        let mut entry = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionEntry {
                values: HashMap::new(),
                expires_at: now + self.lifetime,
            });
        if entry.is_expired(now) {
            entry.values.clear();
            entry.expires_at = now + self.lifetime;
        }
        entry.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn pop(&self, id: &str, key: &str) -> Result<Option<String>, SessionError> {
        let now = Utc::now();
        Ok(self
            .sessions
            .get_mut(id)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|mut entry| entry.values.remove(key)))
    }

    async fn remove_expired(&self) -> Result<usize, SessionError> {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !entry.is_expired(now));
        Ok(before.saturating_sub(self.sessions.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_pop() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let id = store.new_id();

        store.put(&id, "flash", "Saved".to_string()).await.unwrap();
        assert_eq!(store.get(&id, "flash").await.unwrap().as_deref(), Some("Saved"));

        assert_eq!(store.pop(&id, "flash").await.unwrap().as_deref(), Some("Saved"));
        assert_eq!(store.get(&id, "flash").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = MemorySessionStore::new(Duration::from_secs(60));

        assert!(!store.exists("missing").await.unwrap());
        assert_eq!(store.get("missing", "k").await.unwrap(), None);
        assert_eq!(store.pop("missing", "k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_session_stored_on_first_put() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let id = store.new_id();

        assert!(!store.exists(&id).await.unwrap());
        assert!(store.is_empty());

        store.put(&id, "remote_ip", "10.0.0.1".to_string()).await.unwrap();
        assert!(store.exists(&id).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_absent_and_swept() {
        let store = MemorySessionStore::new(Duration::ZERO);
        let id = store.new_id();
        store.put(&id, "remote_ip", "10.0.0.1".to_string()).await.unwrap();

        assert!(!store.exists(&id).await.unwrap());
        assert_eq!(store.get(&id, "remote_ip").await.unwrap(), None);
        assert_eq!(store.remove_expired().await.unwrap(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let a = store.new_id();
        let b = store.new_id();
        assert_ne!(a, b);

        store.put(&a, "remote_ip", "10.0.0.1".to_string()).await.unwrap();
        store.put(&b, "flash", "Saved".to_string()).await.unwrap();
        assert_eq!(store.get(&b, "remote_ip").await.unwrap(), None);
    }
}
