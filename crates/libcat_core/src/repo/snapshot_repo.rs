//! Whole-catalog snapshot repository.
//!
//! # Responsibility
//! - Persist every book and user, in insertion order, as one atomic unit.
//! - Load the last saved snapshot or report that none exists.
//!
//! # Invariants
//! - `save_snapshot` fully replaces the previous snapshot or changes nothing.
//! - A snapshot exists iff the `snapshot_meta` row exists.
//! - Loaded row counts must match the counts recorded at save time.

use crate::db::DbError;
use crate::model::book::{Book, BookId};
use crate::model::user::{User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage error for snapshot persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
    /// The catalog store could not be opened for this session.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
            Self::Unavailable(reason) => write!(f, "catalog storage unavailable: {reason}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Full copy of both record collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub books: Vec<Book>,
    pub users: Vec<User>,
}

/// Repository interface for whole-catalog persistence.
pub trait SnapshotRepository {
    /// Replaces the stored snapshot with `books` and `users` atomically.
    fn save_snapshot(&mut self, books: &[Book], users: &[User]) -> RepoResult<()>;
    /// Returns the stored snapshot, or `None` when nothing was ever saved.
    fn load_snapshot(&mut self) -> RepoResult<Option<Snapshot>>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn save_snapshot(&mut self, books: &[Book], users: &[User]) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute_batch(
            "DELETE FROM user_borrowed_books;
             DELETE FROM users;
             DELETE FROM books;
             DELETE FROM snapshot_meta;",
        )?;

        write_books(&tx, books)?;
        write_users(&tx, users)?;

        tx.execute(
            "INSERT INTO snapshot_meta (singleton, saved_at_ms, book_count, user_count)
             VALUES (1, ?1, ?2, ?3);",
            params![
                now_epoch_ms(),
                to_sql_int(books.len())?,
                to_sql_int(users.len())?,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn load_snapshot(&mut self) -> RepoResult<Option<Snapshot>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Deferred)?;

        let counts = tx
            .query_row(
                "SELECT book_count, user_count FROM snapshot_meta WHERE singleton = 1;",
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        let Some((book_count, user_count)) = counts else {
            return Ok(None);
        };

        let books = read_books(&tx)?;
        let users = read_users(&tx)?;
        tx.commit()?;

        if to_sql_int(books.len())? != book_count {
            return Err(RepoError::InvalidData(format!(
                "snapshot records {book_count} books but {} were stored",
                books.len()
            )));
        }
        if to_sql_int(users.len())? != user_count {
            return Err(RepoError::InvalidData(format!(
                "snapshot records {user_count} users but {} were stored",
                users.len()
            )));
        }

        Ok(Some(Snapshot { books, users }))
    }
}

fn write_books(tx: &Transaction<'_>, books: &[Book]) -> RepoResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO books (position, id, title, author, genre, available)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
    )?;
    for (position, book) in books.iter().enumerate() {
        stmt.execute(params![
            to_sql_int(position)?,
            book.id,
            book.title.as_str(),
            book.author.as_str(),
            book.genre.as_str(),
            bool_to_int(book.available),
        ])?;
    }
    Ok(())
}

fn write_users(tx: &Transaction<'_>, users: &[User]) -> RepoResult<()> {
    let mut user_stmt = tx.prepare(
        "INSERT INTO users (position, id, name, contact_info)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    let mut borrowed_stmt = tx.prepare(
        "INSERT INTO user_borrowed_books (user_id, slot, book_id)
         VALUES (?1, ?2, ?3);",
    )?;
    for (position, user) in users.iter().enumerate() {
        user_stmt.execute(params![
            to_sql_int(position)?,
            user.id,
            user.name.as_str(),
            user.contact_info.as_str(),
        ])?;
        for (slot, book_id) in user.borrowed_book_ids.iter().enumerate() {
            borrowed_stmt.execute(params![user.id, to_sql_int(slot)?, book_id])?;
        }
    }
    Ok(())
}

fn read_books(conn: &Connection) -> RepoResult<Vec<Book>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, author, genre, available
         FROM books
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut books = Vec::new();

    while let Some(row) = rows.next()? {
        let id: BookId = row.get("id")?;
        let available = match row.get::<_, i64>("available")? {
            0 => false,
            1 => true,
            other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid available value `{other}` for book {id}"
                )));
            }
        };
        books.push(Book {
            id,
            title: row.get("title")?,
            author: row.get("author")?,
            genre: row.get("genre")?,
            available,
        });
    }

    Ok(books)
}

fn read_users(conn: &Connection) -> RepoResult<Vec<User>> {
    let mut borrowed = read_borrowed_lists(conn)?;

    let mut stmt = conn.prepare(
        "SELECT id, name, contact_info
         FROM users
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut users = Vec::new();

    while let Some(row) = rows.next()? {
        let id: UserId = row.get("id")?;
        users.push(User {
            id,
            name: row.get("name")?,
            contact_info: row.get("contact_info")?,
            borrowed_book_ids: borrowed.remove(&id).unwrap_or_default(),
        });
    }

    Ok(users)
}

fn read_borrowed_lists(conn: &Connection) -> RepoResult<HashMap<UserId, Vec<BookId>>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, book_id
         FROM user_borrowed_books
         ORDER BY user_id ASC, slot ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut lists: HashMap<UserId, Vec<BookId>> = HashMap::new();

    while let Some(row) = rows.next()? {
        lists
            .entry(row.get("user_id")?)
            .or_default()
            .push(row.get("book_id")?);
    }

    Ok(lists)
}

fn to_sql_int(value: usize) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value `{value}` exceeds SQLite integer range")))
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
