//! Snapshot repository for sessions whose catalog file could not be opened.
//!
//! # Invariants
//! - Every load and save fails with `RepoError::Unavailable`; nothing is
//!   read or written, so the unreadable file is left as it was.

use crate::model::book::Book;
use crate::model::user::User;
use crate::repo::snapshot_repo::{RepoError, RepoResult, Snapshot, SnapshotRepository};

/// Stand-in repository that keeps the store in memory only.
#[derive(Debug, Clone)]
pub struct UnavailableSnapshotRepository {
    reason: String,
}

impl UnavailableSnapshotRepository {
    /// `reason` is reported by every failed load/save.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SnapshotRepository for UnavailableSnapshotRepository {
    fn save_snapshot(&mut self, _books: &[Book], _users: &[User]) -> RepoResult<()> {
        Err(RepoError::Unavailable(self.reason.clone()))
    }

    fn load_snapshot(&mut self) -> RepoResult<Option<Snapshot>> {
        Err(RepoError::Unavailable(self.reason.clone()))
    }
}
