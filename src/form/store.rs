//! Session storage, keyed by user id.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

use super::session::SessionState;

/// Persistence seam for per-user sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<SessionState>, StoreError>;
    async fn put(&self, user_id: &str, session: SessionState) -> Result<(), StoreError>;
    async fn delete(&self, user_id: &str) -> Result<(), StoreError>;
}

/// Process-local store. Sessions are lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> Result<Option<SessionState>, StoreError> {
        Ok(self.sessions.read().await.get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, session: SessionState) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(user_id.to_string(), session);
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = InMemorySessionStore::new();
        assert!(store.get("u1").await.unwrap().is_none());

        let mut session = SessionState::new();
        session.start(3);
        store.put("u1", session.clone()).await.unwrap();
        assert_eq!(store.get("u1").await.unwrap(), Some(session));
        assert_eq!(store.len().await, 1);

        store.delete("u1").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_user() {
        let store = InMemorySessionStore::new();
        let mut a = SessionState::new();
        a.start(3);
        store.put("a", a).await.unwrap();
        store.put("b", SessionState::new()).await.unwrap();
        assert!(store.get("a").await.unwrap().unwrap().is_active());
        assert!(!store.get("b").await.unwrap().unwrap().is_active());
    }
}
