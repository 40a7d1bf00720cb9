#![deny(missing_docs)]
//! Filesystem-backed implementation of [`layer0::SessionRepository`].
//!
//! Each session is a `<id>.json` file under the repository root. Saves are
//! durable: the new content is written to a temp file and renamed into place,
//! so readers never observe a partially written session. A `last` pointer
//! file (holding the most recently saved session id) is updated after the
//! session write completes, so it may lag the session save by at most one
//! call. Suitable for development and single-machine deployments where data
//! must survive process restarts without a database.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use layer0::{RepoError, Session, SessionId, SessionRepository, SessionSummary};

const LAST_POINTER_FILE: &str = "last";

/// Filesystem-backed session repository.
///
/// Directory layout:
/// ```text
/// root/
///   <session-id>.json
///   last             # contains the most recently saved session id
/// ```
pub struct FsSessionRepository {
    root: PathBuf,
}

impl FsSessionRepository {
    /// Create a new filesystem repository rooted at the given directory.
    ///
    /// The directory is created lazily on first save.
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }

    fn session_path(&self, id: &SessionId) -> PathBuf {
        self.root.join(format!("{}.json", id.as_str()))
    }

    fn last_pointer_path(&self) -> PathBuf {
        self.root.join(LAST_POINTER_FILE)
    }

    /// Write `contents` to `path` via a temp-file-then-rename, so concurrent
    /// readers never see a partial write.
    async fn write_atomic(path: &Path, contents: &str) -> Result<(), RepoError> {
        let dir = path.parent().unwrap_or(Path::new("."));
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| RepoError::WriteFailed(e.to_string()))?;

        let tmp_path = path.with_extension(format!("tmp-{}", std::process::id()));
        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(|e| RepoError::WriteFailed(e.to_string()))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| RepoError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn read_session(path: &Path) -> Result<Option<Session>, RepoError> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let session = serde_json::from_str(&contents)
                    .map_err(|e| RepoError::Serialization(e.to_string()))?;
                Ok(Some(session))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepoError::WriteFailed(e.to_string())),
        }
    }
}

#[async_trait]
impl SessionRepository for FsSessionRepository {
    async fn save(&self, session: &Session) -> Result<(), RepoError> {
        let mut session = session.clone();
        session.updated_at = chrono::Utc::now();

        let contents = serde_json::to_string_pretty(&session)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        Self::write_atomic(&self.session_path(&session.id), &contents).await?;

        // Best-effort: the pointer may lag the session save by one call.
        Self::write_atomic(&self.last_pointer_path(), session.id.as_str()).await?;
        Ok(())
    }

    async fn load(&self, id: &SessionId) -> Result<Session, RepoError> {
        Self::read_session(&self.session_path(id))
            .await?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    async fn load_last(&self) -> Result<Option<Session>, RepoError> {
        let pointer = match tokio::fs::read_to_string(self.last_pointer_path()).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::WriteFailed(e.to_string())),
        };
        let id = SessionId::from(pointer.trim());
        Self::read_session(&self.session_path(&id)).await
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, RepoError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(RepoError::WriteFailed(e.to_string())),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepoError::WriteFailed(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // Entries that fail to deserialize are skipped silently rather
            // than failing the whole listing.
            if let Ok(contents) = tokio::fs::read_to_string(&path).await {
                if let Ok(session) = serde_json::from_str::<Session>(&contents) {
                    summaries.push(session.summary());
                }
            }
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }
}
