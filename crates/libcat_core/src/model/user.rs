//! Registered user record.
//!
//! # Responsibility
//! - Hold contact details and the ordered list of borrowed book ids.
//!
//! # Invariants
//! - `borrow` and `return_book` are unchecked; duplicates are structurally
//!   allowed and the store decides when they may be called.

use crate::model::book::BookId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Caller-assigned user identifier.
pub type UserId = i64;

/// One registered library user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub contact_info: String,
    /// Borrow order is preserved, oldest first.
    pub borrowed_book_ids: Vec<BookId>,
}

impl User {
    /// Creates a user with no borrowed books.
    pub fn new(id: UserId, name: impl Into<String>, contact_info: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            contact_info: contact_info.into(),
            borrowed_book_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact_info(&self) -> &str {
        &self.contact_info
    }

    pub fn borrowed_book_ids(&self) -> &[BookId] {
        &self.borrowed_book_ids
    }

    pub fn has_borrowed(&self, book_id: BookId) -> bool {
        self.borrowed_book_ids.contains(&book_id)
    }

    /// Appends `book_id` to the borrowed list.
    pub fn borrow(&mut self, book_id: BookId) {
        self.borrowed_book_ids.push(book_id);
    }

    /// Removes the first occurrence of `book_id`.
    ///
    /// Returns `false` (and changes nothing) when the id is not present.
    pub fn return_book(&mut self, book_id: BookId) -> bool {
        match self.borrowed_book_ids.iter().position(|id| *id == book_id) {
            Some(index) => {
                self.borrowed_book_ids.remove(index);
                true
            }
            None => false,
        }
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let borrowed = self
            .borrowed_book_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "User ID: {}, Name: {}, Contact Info: {}, Borrowed Books: [{}]",
            self.id, self.name, self.contact_info, borrowed
        )
    }
}
