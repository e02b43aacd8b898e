//! Cookie-backed request sessions.
//!
//! The cookie only carries an opaque id; values live in a [`SessionStore`].
//! The session layer in [`crate::server`] attaches a [`Session`] handle to
//! every request, which handlers and the data merger read and write.

mod store;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};

pub use store::{MemorySessionStore, SessionError, SessionStore};

/// Handle to the current request's session.
///
/// A fresh session has an id but no storage until something is written,
/// and only then does it need a cookie.
#[derive(Clone)]
pub struct Session {
    id: String,
    store: Arc<dyn SessionStore>,
    is_new: bool,
    written: Arc<AtomicBool>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}

impl Session {
    /// Handle for a session the client already holds a cookie for
    pub fn resume(id: String, store: Arc<dyn SessionStore>) -> Self {
        Self {
            id,
            store,
            is_new: false,
            written: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for a session that does not exist yet
    pub fn start(store: Arc<dyn SessionStore>) -> Self {
        Self {
            id: store.new_id(),
            store,
            is_new: true,
            written: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// A new session that has stored something, so the client needs its id
    pub fn needs_cookie(&self) -> bool {
        self.is_new && self.written.load(Ordering::Acquire)
    }

    /// Value stored under `key`; backend failures read as absent
    pub async fn get_string(&self, key: &str) -> Option<String> {
        match self.store.get(&self.id, key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key = key, "Session read failed");
                None
            }
        }
    }

    pub async fn put(&self, key: &str, value: impl Into<String>) -> Result<(), SessionError> {
        self.store.put(&self.id, key, value.into()).await?;
        self.written.store(true, Ordering::Release);
        Ok(())
    }

    /// Read and remove `key`, for one-shot values such as flash messages
    pub async fn pop_string(&self, key: &str) -> Option<String> {
        match self.store.pop(&self.id, key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key = key, "Session pop failed");
                None
            }
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session layer is not installed",
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_handle_reads_and_pops() {
        let store: Arc<dyn SessionStore> =
            Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let session = Session::start(store);

        session.put("warning", "Check dates").await.unwrap();
        assert_eq!(session.get_string("warning").await.as_deref(), Some("Check dates"));
        assert_eq!(session.pop_string("warning").await.as_deref(), Some("Check dates"));
        assert_eq!(session.pop_string("warning").await, None);
    }

    #[tokio::test]
    async fn test_new_session_needs_cookie_only_after_write() {
        let memory = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let store: Arc<dyn SessionStore> = memory.clone();
        let session = Session::start(store.clone());
        let seen_by_middleware = session.clone();

        assert_eq!(session.get_string("flash").await, None);
        assert_eq!(session.pop_string("flash").await, None);
        assert!(!seen_by_middleware.needs_cookie());
        assert!(memory.is_empty());

        session.put("remote_ip", "10.0.0.1").await.unwrap();
        assert!(seen_by_middleware.needs_cookie());
        assert_eq!(memory.len(), 1);

        let resumed = Session::resume(session.id().to_string(), store);
        resumed.put("flash", "Saved").await.unwrap();
        assert!(!resumed.needs_cookie());
    }
}
