//! Book record.
//!
//! # Responsibility
//! - Hold catalog metadata and the availability flag for one book.
//!
//! # Invariants
//! - `available` starts as `true` for every newly constructed book.
//! - `set_available` is the only mutation path used by the store.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Caller-assigned book identifier.
pub type BookId = i64;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    /// `false` while the book is on loan.
    pub available: bool,
}

impl Book {
    /// Creates an available book.
    pub fn new(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            available: true,
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Overwrites the availability flag without any validation.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }
}

impl Display for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Book ID: {}, Title: {}, Author: {}, Genre: {}, Available: {}",
            self.id, self.title, self.author, self.genre, self.available
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Book;

    #[test]
    fn display_matches_listing_format() {
        let mut book = Book::new(1, "Dune", "Herbert", "SciFi");
        assert_eq!(
            book.to_string(),
            "Book ID: 1, Title: Dune, Author: Herbert, Genre: SciFi, Available: true"
        );

        book.set_available(false);
        assert!(book.to_string().ends_with("Available: false"));
    }
}
