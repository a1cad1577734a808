//! Session bootstrap: open the catalog and run the menu on it.
//!
//! # Invariants
//! - A catalog that cannot be opened never ends the session; the menu runs on
//!   an empty store whose saves fail, and the file on disk is left untouched.

use crate::menu::{Menu, SessionEnd};
use libcat_core::db::open_db;
use libcat_core::{Library, SqliteSnapshotRepository, UnavailableSnapshotRepository};
use log::error;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Opens `db_path` and runs one interactive session over it.
pub fn run_session<In: BufRead, Out: Write>(
    db_path: &Path,
    input: In,
    mut output: Out,
) -> io::Result<SessionEnd> {
    match open_db(db_path) {
        Ok(mut conn) => {
            let library = Library::new(SqliteSnapshotRepository::new(&mut conn));
            Menu::new(library, input, output).run()
        }
        Err(err) => {
            error!(
                "event=session_start module=cli status=degraded error_code=catalog_open_failed error={}",
                err
            );
            writeln!(
                output,
                "Error opening catalog `{}`: {err}",
                db_path.display()
            )?;
            writeln!(
                output,
                "Continuing with an empty catalog; changes will not be saved."
            )?;
            let library = Library::new(UnavailableSnapshotRepository::new(err.to_string()));
            Menu::new(library, input, output).run()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::run_session;
    use crate::menu::SessionEnd;

    #[test]
    fn unreadable_catalog_still_reaches_menu_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.sqlite3");
        let garbage = b"not a catalog database ".repeat(200);
        std::fs::write(&path, &garbage).unwrap();

        let mut output = Vec::new();
        let script = "1\n1\nDune\nHerbert\nSciFi\n3\n8\n";
        let end = run_session(&path, script.as_bytes(), &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_eq!(end, SessionEnd::SaveFailed);
        assert!(output.contains("Error opening catalog"));
        assert!(output.contains("Error loading data"));
        assert!(output.contains("Library Management System Menu:"));
        assert!(output.contains("Book added successfully."));
        assert!(output.contains("Book ID: 1, Title: Dune"));
        assert!(output.contains("Error saving data"));
        assert_eq!(std::fs::read(&path).unwrap(), garbage);
    }

    #[test]
    fn catalog_file_is_created_and_reused_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.sqlite3");

        let mut first = Vec::new();
        let end = run_session(&path, "2\n100\nAnn\nann@example.com\n8\n".as_bytes(), &mut first)
            .unwrap();
        assert_eq!(end, SessionEnd::Saved);

        let mut second = Vec::new();
        run_session(&path, "7\n8\n".as_bytes(), &mut second).unwrap();
        let second = String::from_utf8(second).unwrap();
        assert!(second.contains("Data loaded successfully (0 books, 1 users)."));
        assert!(second.contains("User ID: 100, Name: Ann"));
    }
}
