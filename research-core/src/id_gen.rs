//! Session id minting.
//!
//! Root sessions get a fresh id from an in-process counter plus a
//! timestamp; child sessions (expansions) instead derive their id from the
//! parent via [`layer0::Session::new_version`], which this module does not
//! touch.

use std::sync::atomic::{AtomicU64, Ordering};

use layer0::SessionId;

/// Mints unique [`SessionId`]s for new root sessions.
pub struct SessionIdGenerator {
    counter: AtomicU64,
}

impl SessionIdGenerator {
    /// A generator starting at zero.
    pub fn new() -> Self {
        Self { counter: AtomicU64::new(0) }
    }

    /// Mint the next id: `sess-<unix millis>-<sequence>`.
    pub fn next(&self) -> SessionId {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        SessionId::new(format!("sess-{}-{sequence}", chrono::Utc::now().timestamp_millis()))
    }
}

impl Default for SessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_ids_are_distinct() {
        let gen = SessionIdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
    }
}
