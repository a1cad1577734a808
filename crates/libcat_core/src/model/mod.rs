//! Catalog record types.
//!
//! # Responsibility
//! - Define the plain data records owned by the library store.
//! - Keep self-mutation helpers unchecked; cross-record rules live in
//!   `service::library`.
//!
//! # Invariants
//! - Records carry no persistence behavior; encode/decode is owned by `repo`.
//! - The serde shape (`id`, `title`, `author`, `genre`, `available`, `name`,
//!   `contact_info`, `borrowed_book_ids`) is the record format handed to
//!   embedding callers. It is independent of the SQLite schema and must stay
//!   stable when storage columns change.

pub mod book;
pub mod user;
