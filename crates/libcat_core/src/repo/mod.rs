//! Snapshot persistence contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Encode/decode whole-catalog snapshots.
//! - Keep SQL details out of the library store.
//!
//! # Invariants
//! - A snapshot is written in exactly one transaction.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod snapshot_repo;
pub mod unavailable_repo;
