//! Library record store.
//!
//! # Responsibility
//! - Own the book and user collections in insertion order.
//! - Provide first-match lookups.
//! - Run the borrow/return protocol so both affected records change together.
//! - Save and load whole-catalog snapshots through a `SnapshotRepository`.
//!
//! # Invariants
//! - Book ids and user ids are unique within their collection.
//! - A book is unavailable iff exactly one borrowed-list entry holds its id
//!   (lockstep). Borrow/return preserve it; `audit_circulation` reports drift.
//! - Every failed operation leaves the store unchanged.

use crate::model::book::{Book, BookId};
use crate::model::user::{User, UserId};
use crate::repo::snapshot_repo::{RepoError, SnapshotRepository};
use log::{error, info, warn};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Coarse failure category for store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A user id or book title/author did not match any record.
    NotFound,
    /// Both records exist but the borrow/return rule blocks the action.
    PreconditionViolated,
    /// Id already present in its collection.
    Duplicate,
    /// Durable read/write did not complete.
    Storage,
}

/// Store-level error returned to presentation callers.
#[derive(Debug)]
pub enum LibraryError {
    DuplicateBookId(BookId),
    DuplicateUserId(UserId),
    UserNotFound(UserId),
    BookNotFound(String),
    BookUnavailable(BookId),
    BookNotBorrowed { user_id: UserId, book_id: BookId },
    Storage(RepoError),
}

impl LibraryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateBookId(_) | Self::DuplicateUserId(_) => ErrorKind::Duplicate,
            Self::UserNotFound(_) | Self::BookNotFound(_) => ErrorKind::NotFound,
            Self::BookUnavailable(_) | Self::BookNotBorrowed { .. } => {
                ErrorKind::PreconditionViolated
            }
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateBookId(_) => "duplicate_book_id",
            Self::DuplicateUserId(_) => "duplicate_user_id",
            Self::UserNotFound(_) => "user_not_found",
            Self::BookNotFound(_) => "book_not_found",
            Self::BookUnavailable(_) => "book_unavailable",
            Self::BookNotBorrowed { .. } => "book_not_borrowed",
            Self::Storage(_) => "storage_failed",
        }
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateBookId(id) => write!(f, "a book with id {id} already exists"),
            Self::DuplicateUserId(id) => write!(f, "a user with id {id} already exists"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::BookNotFound(title) => write!(f, "book not found: `{title}`"),
            Self::BookUnavailable(id) => write!(f, "book {id} is not available"),
            Self::BookNotBorrowed { user_id, book_id } => {
                write!(f, "book {book_id} is not borrowed by user {user_id}")
            }
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for LibraryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LibraryError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Result of `Library::load_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The stored snapshot replaced the in-memory collections.
    Loaded { books: usize, users: usize },
    /// Nothing was ever saved; collections were left untouched.
    NoSnapshot,
}

/// One lockstep violation found by `Library::audit_circulation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CirculationIssue {
    /// Book is marked unavailable but nobody holds it.
    UnavailableWithoutBorrower { book_id: BookId },
    /// Book is marked available but still appears in borrowed lists.
    AvailableButBorrowed {
        book_id: BookId,
        user_ids: Vec<UserId>,
    },
    /// Book appears in more than one borrowed-list entry.
    MultipleBorrowers {
        book_id: BookId,
        user_ids: Vec<UserId>,
    },
    /// Borrowed list references a book id that is not in the catalog.
    UnknownBook { user_id: UserId, book_id: BookId },
}

impl Display for CirculationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnavailableWithoutBorrower { book_id } => {
                write!(f, "book {book_id} is marked unavailable but no user holds it")
            }
            Self::AvailableButBorrowed { book_id, user_ids } => write!(
                f,
                "book {book_id} is marked available but is held by users [{}]",
                join_ids(user_ids)
            ),
            Self::MultipleBorrowers { book_id, user_ids } => write!(
                f,
                "book {book_id} is held more than once, by users [{}]",
                join_ids(user_ids)
            ),
            Self::UnknownBook { user_id, book_id } => {
                write!(f, "user {user_id} holds book {book_id}, which is not in the catalog")
            }
        }
    }
}

/// In-memory record store backed by a snapshot repository.
pub struct Library<R: SnapshotRepository> {
    repo: R,
    books: Vec<Book>,
    users: Vec<User>,
}

impl<R: SnapshotRepository> Library<R> {
    /// Creates an empty store. Call `load_all` to restore saved state.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            books: Vec::new(),
            users: Vec::new(),
        }
    }

    /// Releases the store and returns its repository handle.
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Appends a book to the catalog.
    ///
    /// # Errors
    /// - `DuplicateBookId` when a book with the same id exists.
    pub fn add_book(&mut self, book: Book) -> LibraryResult<()> {
        if self.books.iter().any(|existing| existing.id == book.id) {
            let err = LibraryError::DuplicateBookId(book.id);
            warn!(
                "event=book_add module=library status=rejected book_id={} error_code={}",
                book.id,
                err.code()
            );
            return Err(err);
        }

        info!("event=book_add module=library status=ok book_id={}", book.id);
        self.books.push(book);
        Ok(())
    }

    /// Registers a user.
    ///
    /// # Errors
    /// - `DuplicateUserId` when a user with the same id exists.
    pub fn add_user(&mut self, user: User) -> LibraryResult<()> {
        if self.users.iter().any(|existing| existing.id == user.id) {
            let err = LibraryError::DuplicateUserId(user.id);
            warn!(
                "event=user_add module=library status=rejected user_id={} error_code={}",
                user.id,
                err.code()
            );
            return Err(err);
        }

        info!("event=user_add module=library status=ok user_id={}", user.id);
        self.users.push(user);
        Ok(())
    }

    /// First book whose title matches case-insensitively.
    pub fn find_book_by_title(&self, title: &str) -> Option<&Book> {
        self.books.iter().find(|book| eq_ignore_case(&book.title, title))
    }

    /// First book whose author matches case-insensitively.
    pub fn find_book_by_author(&self, author: &str) -> Option<&Book> {
        self.books
            .iter()
            .find(|book| eq_ignore_case(&book.author, author))
    }

    pub fn find_user_by_id(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    /// All books in insertion order.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// All users in insertion order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Lends the first book titled `title` to `user_id`.
    ///
    /// Returns the id of the lent book.
    ///
    /// # Errors
    /// - `UserNotFound` / `BookNotFound` when a lookup misses.
    /// - `BookUnavailable` when the matched book is already on loan.
    pub fn borrow_book(&mut self, user_id: UserId, title: &str) -> LibraryResult<BookId> {
        let Some(user) = self.users.iter_mut().find(|user| user.id == user_id) else {
            return Err(rejected("book_borrow", LibraryError::UserNotFound(user_id)));
        };
        let Some(book) = self
            .books
            .iter_mut()
            .find(|book| eq_ignore_case(&book.title, title))
        else {
            return Err(rejected(
                "book_borrow",
                LibraryError::BookNotFound(title.to_string()),
            ));
        };
        if !book.is_available() {
            return Err(rejected(
                "book_borrow",
                LibraryError::BookUnavailable(book.id),
            ));
        }

        user.borrow(book.id);
        book.set_available(false);
        info!(
            "event=book_borrow module=library status=ok user_id={} book_id={}",
            user_id, book.id
        );
        Ok(book.id)
    }

    /// Takes back the first book titled `title` from `user_id`.
    ///
    /// Returns the id of the returned book.
    ///
    /// # Errors
    /// - `UserNotFound` / `BookNotFound` when a lookup misses.
    /// - `BookNotBorrowed` when the user's list does not hold the book id.
    pub fn return_book(&mut self, user_id: UserId, title: &str) -> LibraryResult<BookId> {
        let Some(user) = self.users.iter_mut().find(|user| user.id == user_id) else {
            return Err(rejected("book_return", LibraryError::UserNotFound(user_id)));
        };
        let Some(book) = self
            .books
            .iter_mut()
            .find(|book| eq_ignore_case(&book.title, title))
        else {
            return Err(rejected(
                "book_return",
                LibraryError::BookNotFound(title.to_string()),
            ));
        };
        if !user.return_book(book.id) {
            return Err(rejected(
                "book_return",
                LibraryError::BookNotBorrowed {
                    user_id,
                    book_id: book.id,
                },
            ));
        }

        book.set_available(true);
        info!(
            "event=book_return module=library status=ok user_id={} book_id={}",
            user_id, book.id
        );
        Ok(book.id)
    }

    /// Writes both collections as one snapshot, replacing the previous one.
    ///
    /// # Errors
    /// - `Storage` when the snapshot transaction fails. Nothing is persisted
    ///   in that case and in-memory state is untouched.
    pub fn save_all(&mut self) -> LibraryResult<()> {
        let started_at = Instant::now();
        info!(
            "event=snapshot_save module=library status=start books={} users={}",
            self.books.len(),
            self.users.len()
        );

        match self.repo.save_snapshot(&self.books, &self.users) {
            Ok(()) => {
                info!(
                    "event=snapshot_save module=library status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=snapshot_save module=library status=error duration_ms={} error_code=storage_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Replaces the in-memory collections with the saved snapshot.
    ///
    /// # Errors
    /// - `Storage` when the snapshot cannot be read or decoded. The store is
    ///   left exactly as it was before the call.
    pub fn load_all(&mut self) -> LibraryResult<LoadOutcome> {
        let started_at = Instant::now();
        info!("event=snapshot_load module=library status=start");

        let snapshot = match self.repo.load_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(
                    "event=snapshot_load module=library status=error duration_ms={} error_code=storage_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        let Some(snapshot) = snapshot else {
            info!(
                "event=snapshot_load module=library status=ok outcome=no_snapshot duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Ok(LoadOutcome::NoSnapshot);
        };

        self.books = snapshot.books;
        self.users = snapshot.users;
        info!(
            "event=snapshot_load module=library status=ok outcome=loaded books={} users={} duration_ms={}",
            self.books.len(),
            self.users.len(),
            started_at.elapsed().as_millis()
        );
        Ok(LoadOutcome::Loaded {
            books: self.books.len(),
            users: self.users.len(),
        })
    }

    /// Reports every lockstep violation between availability flags and
    /// borrowed lists. Books are reported in catalog order, unknown ids in
    /// user order.
    pub fn audit_circulation(&self) -> Vec<CirculationIssue> {
        let mut holders: BTreeMap<BookId, Vec<UserId>> = BTreeMap::new();
        for user in &self.users {
            for book_id in &user.borrowed_book_ids {
                holders.entry(*book_id).or_default().push(user.id);
            }
        }

        let mut issues = Vec::new();
        for book in &self.books {
            let user_ids = holders.get(&book.id).cloned().unwrap_or_default();
            match (book.available, user_ids.len()) {
                (false, 0) => {
                    issues.push(CirculationIssue::UnavailableWithoutBorrower { book_id: book.id })
                }
                (false, 1) | (true, 0) => {}
                (false, _) => issues.push(CirculationIssue::MultipleBorrowers {
                    book_id: book.id,
                    user_ids,
                }),
                (true, _) => issues.push(CirculationIssue::AvailableButBorrowed {
                    book_id: book.id,
                    user_ids,
                }),
            }
        }

        let known: HashSet<BookId> = self.books.iter().map(|book| book.id).collect();
        for user in &self.users {
            for book_id in &user.borrowed_book_ids {
                if !known.contains(book_id) {
                    issues.push(CirculationIssue::UnknownBook {
                        user_id: user.id,
                        book_id: *book_id,
                    });
                }
            }
        }

        if !issues.is_empty() {
            warn!(
                "event=circulation_audit module=library status=drift issues={}",
                issues.len()
            );
        }
        issues
    }
}

fn rejected(event: &str, err: LibraryError) -> LibraryError {
    warn!(
        "event={event} module=library status=rejected error_code={}",
        err.code()
    );
    err
}

fn join_ids(ids: &[UserId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}
