#![deny(missing_docs)]
//! In-memory implementation of [`layer0::SessionRepository`].
//!
//! Uses a `HashMap` behind a `RwLock`. Suitable for testing and
//! prototyping; nothing survives process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use layer0::{RepoError, Session, SessionId, SessionRepository, SessionSummary};
use tokio::sync::RwLock;

/// In-memory session store backed by a `HashMap` behind a `RwLock`.
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<SessionId, Session>>,
    last: RwLock<Option<SessionId>>,
}

impl MemorySessionRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self { sessions: RwLock::new(HashMap::new()), last: RwLock::new(None) }
    }
}

impl Default for MemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn save(&self, session: &Session) -> Result<(), RepoError> {
        let mut session = session.clone();
        session.updated_at = chrono::Utc::now();
        let id = session.id.clone();
        self.sessions.write().await.insert(id.clone(), session);
        *self.last.write().await = Some(id);
        Ok(())
    }

    async fn load(&self, id: &SessionId) -> Result<Session, RepoError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    async fn load_last(&self) -> Result<Option<Session>, RepoError> {
        let Some(id) = self.last.read().await.clone() else {
            return Ok(None);
        };
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, RepoError> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions.values().map(Session::summary).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer0::Mode;

    fn new_session(id: &str) -> Session {
        Session::new(SessionId::from(id), "what is rust?".to_string(), Mode::Fast)
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let repo = MemorySessionRepository::new();
        let session = new_session("s1");
        repo.save(&session).await.unwrap();
        let loaded = repo.load(&session.id).await.unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.query, session.query);
    }

    #[tokio::test]
    async fn load_missing_fails_with_not_found() {
        let repo = MemorySessionRepository::new();
        let err = repo.load(&SessionId::from("missing")).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn load_last_is_none_with_no_pointer() {
        let repo = MemorySessionRepository::new();
        assert!(repo.load_last().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_last_after_save_returns_saved_session() {
        let repo = MemorySessionRepository::new();
        let session = new_session("s1");
        repo.save(&session).await.unwrap();
        let last = repo.load_last().await.unwrap().unwrap();
        assert_eq!(last.id, session.id);
    }

    #[tokio::test]
    async fn list_is_sorted_by_created_at_descending() {
        let repo = MemorySessionRepository::new();
        let mut older = new_session("s1");
        older.created_at = chrono::Utc::now() - chrono::Duration::hours(1);
        let newer = new_session("s2");
        repo.save(&older).await.unwrap();
        repo.save(&newer).await.unwrap();
        let summaries = repo.list().await.unwrap();
        assert_eq!(summaries[0].id, newer.id);
        assert_eq!(summaries[1].id, older.id);
    }
}
