//! [`SessionService`]: thin facade over a [`SessionRepository`] backing the
//! `/sessions`, `/load`, and session-persistence parts of the CLI surface.

use std::sync::Arc;

use layer0::{RepoError, Session, SessionId, SessionRepository, SessionSummary};

/// Wraps a [`SessionRepository`] with the session operations the primary
/// adapter needs, newest-first where order matters.
pub struct SessionService {
    repo: Arc<dyn SessionRepository>,
}

impl SessionService {
    /// Build a service around `repo`.
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self { repo }
    }

    /// `/sessions`: every known session, newest first.
    pub async fn list(&self) -> Result<Vec<SessionSummary>, RepoError> {
        let mut summaries = self.repo.list().await?;
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// `/load <id>`.
    pub async fn load(&self, id: &SessionId) -> Result<Session, RepoError> {
        self.repo.load(id).await
    }

    /// Load whichever session was persisted most recently, if any — used
    /// to resume on startup.
    pub async fn load_last(&self) -> Result<Option<Session>, RepoError> {
        self.repo.load_last().await
    }

    /// Persist `session`, including after every mutating operation
    /// ([`crate::ResearchService::rerun_worker`], `/recompile`, `/expand`).
    pub async fn save(&self, session: &Session) -> Result<(), RepoError> {
        self.repo.save(session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer0::Mode;
    use research_session_memory::MemorySessionRepository;

    fn service() -> SessionService {
        SessionService::new(Arc::new(MemorySessionRepository::new()))
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let svc = service();
        let session = Session::new(SessionId::new("s1"), "query", Mode::Fast);
        svc.save(&session).await.unwrap();

        let loaded = svc.load(&SessionId::new("s1")).await.unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.query, "query");
    }

    #[tokio::test]
    async fn load_missing_session_errors() {
        let svc = service();
        let err = svc.load(&SessionId::new("missing")).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn load_last_tracks_most_recent_save() {
        let svc = service();
        svc.save(&Session::new(SessionId::new("s1"), "q1", Mode::Fast)).await.unwrap();
        svc.save(&Session::new(SessionId::new("s2"), "q2", Mode::Deep)).await.unwrap();

        let last = svc.load_last().await.unwrap().unwrap();
        assert_eq!(last.id, SessionId::new("s2"));
    }

    #[tokio::test]
    async fn list_is_sorted_newest_first() {
        let svc = service();
        let mut first = Session::new(SessionId::new("s1"), "q1", Mode::Fast);
        first.created_at = chrono::Utc::now() - chrono::Duration::seconds(60);
        let second = Session::new(SessionId::new("s2"), "q2", Mode::Fast);

        svc.save(&first).await.unwrap();
        svc.save(&second).await.unwrap();

        let listed = svc.list().await.unwrap();
        assert_eq!(listed[0].id, SessionId::new("s2"));
        assert_eq!(listed[1].id, SessionId::new("s1"));
    }

    #[tokio::test]
    async fn load_last_is_none_when_nothing_saved() {
        let svc = service();
        assert!(svc.load_last().await.unwrap().is_none());
    }
}
