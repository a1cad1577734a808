//! Core catalog logic for libcat.
//! This crate owns the record store and every borrow/return invariant.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::book::{Book, BookId};
pub use model::user::{User, UserId};
pub use repo::snapshot_repo::{
    RepoError, RepoResult, Snapshot, SnapshotRepository, SqliteSnapshotRepository,
};
pub use repo::unavailable_repo::UnavailableSnapshotRepository;
pub use service::library::{
    CirculationIssue, ErrorKind, Library, LibraryError, LibraryResult, LoadOutcome,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
