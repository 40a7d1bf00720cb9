//! The session persistence port.

use crate::domain::{Session, SessionSummary};
use crate::error::RepoError;
use crate::id::SessionId;
use async_trait::async_trait;

/// Durable storage for [`Session`] records.
///
/// `save` is atomic per session: a reader never observes a torn write, and
/// a crash mid-write leaves the prior version (or nothing) intact, never a
/// corrupt partial one. `load`/`load_last` use "not found" as a normal
/// `Ok(None)` outcome, not an error — callers distinguish "doesn't exist"
/// from "storage is broken". `list` is sorted by `created_at` descending
/// and silently skips entries that fail to deserialize, so one corrupt
/// record doesn't take down the whole listing.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Atomically persist `session`, creating or overwriting its record.
    async fn save(&self, session: &Session) -> Result<(), RepoError>;

    /// Load the session with the given id. Fails with [`RepoError::NotFound`]
    /// if it does not exist.
    async fn load(&self, id: &SessionId) -> Result<Session, RepoError>;

    /// Load the most recently created session, if any exist.
    async fn load_last(&self) -> Result<Option<Session>, RepoError>;

    /// List every session as a summary, newest first.
    async fn list(&self) -> Result<Vec<SessionSummary>, RepoError>;
}
