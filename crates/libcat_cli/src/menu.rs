//! Interactive text menu over the library store.
//!
//! # Responsibility
//! - Collect every parameter of an action before calling the store.
//! - Map each menu entry to exactly one `Library` operation.
//! - Load at session start and save at session end.
//!
//! # Invariants
//! - Bad input re-prompts; it never aborts the session.
//! - End of input behaves like "Save and Exit".

use libcat_core::{Book, Library, LoadOutcome, SnapshotRepository, User};
use std::io::{self, BufRead, Write};

/// How a session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Saved,
    SaveFailed,
}

enum Flow {
    Continue,
    Exit,
}

/// Menu loop bound to one store and one terminal-like stream pair.
pub struct Menu<R: SnapshotRepository, In: BufRead, Out: Write> {
    library: Library<R>,
    input: In,
    output: Out,
}

impl<R: SnapshotRepository, In: BufRead, Out: Write> Menu<R, In, Out> {
    pub fn new(library: Library<R>, input: In, output: Out) -> Self {
        Self {
            library,
            input,
            output,
        }
    }

    /// Runs load, the menu loop, then save.
    pub fn run(mut self) -> io::Result<SessionEnd> {
        self.load()?;

        loop {
            self.print_menu()?;
            let Some(choice) = self.prompt("Enter your choice (1-8): ")? else {
                break;
            };
            let flow = match choice.trim() {
                "1" => self.add_book()?,
                "2" => self.add_user()?,
                "3" => self.display_books()?,
                "4" => self.borrow_book()?,
                "5" => self.return_book()?,
                "6" => self.search_books()?,
                "7" => self.display_users()?,
                "8" => Flow::Exit,
                _ => {
                    writeln!(
                        self.output,
                        "Invalid choice. Please enter a number between 1 and 8."
                    )?;
                    Flow::Continue
                }
            };
            if let Flow::Exit = flow {
                break;
            }
        }

        self.save()
    }

    fn load(&mut self) -> io::Result<()> {
        match self.library.load_all() {
            Ok(LoadOutcome::Loaded { books, users }) => {
                writeln!(
                    self.output,
                    "Data loaded successfully ({books} books, {users} users)."
                )?;
                for issue in self.library.audit_circulation() {
                    writeln!(self.output, "Warning: inconsistent loan record: {issue}")?;
                }
            }
            Ok(LoadOutcome::NoSnapshot) => {
                writeln!(self.output, "No saved data found; starting with an empty catalog.")?;
            }
            Err(err) => {
                writeln!(self.output, "Error loading data: {err}")?;
            }
        }
        Ok(())
    }

    fn save(&mut self) -> io::Result<SessionEnd> {
        match self.library.save_all() {
            Ok(()) => {
                writeln!(self.output, "Data saved successfully.")?;
                Ok(SessionEnd::Saved)
            }
            Err(err) => {
                writeln!(self.output, "Error saving data: {err}")?;
                Ok(SessionEnd::SaveFailed)
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "Library Management System Menu:")?;
        for entry in [
            "1. Add Book",
            "2. Add User",
            "3. Display Books",
            "4. Borrow Book",
            "5. Return Book",
            "6. Search Books by Title or Author",
            "7. Display Users",
            "8. Save and Exit",
        ] {
            writeln!(self.output, "{entry}")?;
        }
        Ok(())
    }

    fn add_book(&mut self) -> io::Result<Flow> {
        let Some(id) = self.prompt_id("Enter Book ID: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(title) = self.prompt("Enter Title: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(author) = self.prompt("Enter Author: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(genre) = self.prompt("Enter Genre: ")? else {
            return Ok(Flow::Exit);
        };

        match self.library.add_book(Book::new(id, title, author, genre)) {
            Ok(()) => writeln!(self.output, "Book added successfully.")?,
            Err(err) => writeln!(self.output, "Could not add book: {err}")?,
        }
        Ok(Flow::Continue)
    }

    fn add_user(&mut self) -> io::Result<Flow> {
        let Some(id) = self.prompt_id("Enter User ID: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(name) = self.prompt("Enter Name: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(contact_info) = self.prompt("Enter Contact Information: ")? else {
            return Ok(Flow::Exit);
        };

        match self.library.add_user(User::new(id, name, contact_info)) {
            Ok(()) => writeln!(self.output, "User added successfully.")?,
            Err(err) => writeln!(self.output, "Could not add user: {err}")?,
        }
        Ok(Flow::Continue)
    }

    fn display_books(&mut self) -> io::Result<Flow> {
        if self.library.books().is_empty() {
            writeln!(self.output, "No books registered.")?;
        }
        for book in self.library.books() {
            writeln!(self.output, "{book}")?;
        }
        Ok(Flow::Continue)
    }

    fn display_users(&mut self) -> io::Result<Flow> {
        if self.library.users().is_empty() {
            writeln!(self.output, "No users registered.")?;
        }
        for user in self.library.users() {
            writeln!(self.output, "{user}")?;
        }
        Ok(Flow::Continue)
    }

    fn borrow_book(&mut self) -> io::Result<Flow> {
        let Some(user_id) = self.prompt_id("Enter User ID: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(title) = self.prompt("Enter Book Title to Borrow: ")? else {
            return Ok(Flow::Exit);
        };

        match self.library.borrow_book(user_id, &title) {
            Ok(_) => writeln!(self.output, "Book borrowed successfully.")?,
            Err(err) => writeln!(self.output, "Could not borrow book: {err}")?,
        }
        Ok(Flow::Continue)
    }

    fn return_book(&mut self) -> io::Result<Flow> {
        let Some(user_id) = self.prompt_id("Enter User ID: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(title) = self.prompt("Enter Book Title to Return: ")? else {
            return Ok(Flow::Exit);
        };

        match self.library.return_book(user_id, &title) {
            Ok(_) => writeln!(self.output, "Book returned successfully.")?,
            Err(err) => writeln!(self.output, "Could not return book: {err}")?,
        }
        Ok(Flow::Continue)
    }

    fn search_books(&mut self) -> io::Result<Flow> {
        writeln!(self.output, "Search Books by:")?;
        writeln!(self.output, "1. Title")?;
        writeln!(self.output, "2. Author")?;
        let Some(choice) = self.prompt("Enter your choice (1 or 2): ")? else {
            return Ok(Flow::Exit);
        };

        let by_title = match choice.trim() {
            "1" => true,
            "2" => false,
            _ => {
                writeln!(self.output, "Invalid choice. Please enter 1 or 2.")?;
                return Ok(Flow::Continue);
            }
        };
        let label = if by_title {
            "Enter Title to Search: "
        } else {
            "Enter Author to Search: "
        };
        let Some(needle) = self.prompt(label)? else {
            return Ok(Flow::Exit);
        };

        let found = if by_title {
            self.library.find_book_by_title(&needle)
        } else {
            self.library.find_book_by_author(&needle)
        };
        match found {
            Some(book) => writeln!(self.output, "{book}")?,
            None => writeln!(self.output, "Book not found.")?,
        }
        Ok(Flow::Continue)
    }

    /// Prints `label` and reads one line. `None` means end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Re-prompts until a whole number is entered.
    fn prompt_id(&mut self, label: &str) -> io::Result<Option<i64>> {
        loop {
            let Some(raw) = self.prompt(label)? else {
                return Ok(None);
            };
            match raw.trim().parse::<i64>() {
                Ok(id) => return Ok(Some(id)),
                Err(_) => writeln!(self.output, "Please enter a whole number.")?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Menu, SessionEnd};
    use libcat_core::db::open_db_in_memory;
    use libcat_core::{Book, Library, SqliteSnapshotRepository};
    use rusqlite::Connection;

    fn run_script(conn: &mut Connection, script: &str) -> (SessionEnd, String) {
        let mut output = Vec::new();
        let library = Library::new(SqliteSnapshotRepository::new(conn));
        let end = Menu::new(library, script.as_bytes(), &mut output)
            .run()
            .unwrap();
        (end, String::from_utf8(output).unwrap())
    }

    #[test]
    fn borrow_flow_is_saved_on_exit() {
        let mut conn = open_db_in_memory().unwrap();
        let script = "1\n1\nDune\nHerbert\nSciFi\n\
                      2\n100\nAnn\nann@example.com\n\
                      4\n100\ndune\n\
                      3\n8\n";

        let (end, output) = run_script(&mut conn, script);
        assert_eq!(end, SessionEnd::Saved);
        assert!(output.contains("No saved data found"));
        assert!(output.contains("Book borrowed successfully."));
        assert!(output.contains("Title: Dune, Author: Herbert, Genre: SciFi, Available: false"));
        assert!(output.ends_with("Data saved successfully.\n"));

        let (_, output) = run_script(&mut conn, "7\n8\n");
        assert!(output.contains("Data loaded successfully (1 books, 1 users)."));
        assert!(output.contains("User ID: 100, Name: Ann, Contact Info: ann@example.com, Borrowed Books: [1]"));
    }

    #[test]
    fn invalid_input_reprompts_without_calling_store() {
        let mut conn = open_db_in_memory().unwrap();
        let script = "9\n1\nabc\n5\nEmma\nAusten\nClassic\n5\n1\nEmma\n";

        let (end, output) = run_script(&mut conn, script);
        assert_eq!(end, SessionEnd::Saved);
        assert!(output.contains("Invalid choice. Please enter a number between 1 and 8."));
        assert!(output.contains("Please enter a whole number."));
        assert!(output.contains("Book added successfully."));
        assert!(output.contains("Could not return book: user not found: 1"));
    }

    #[test]
    fn search_reports_first_match_or_not_found() {
        let mut conn = open_db_in_memory().unwrap();
        let script = "1\n1\nDune\nHerbert\nSciFi\n\
                      6\n2\nHERBERT\n\
                      6\n1\nSolaris\n\
                      6\n3\n8\n";

        let (_, output) = run_script(&mut conn, script);
        assert!(output.contains("Book ID: 1, Title: Dune"));
        assert!(output.contains("Book not found."));
        assert!(output.contains("Invalid choice. Please enter 1 or 2."));
    }

    #[test]
    fn unreadable_snapshot_is_reported_and_session_continues() {
        let mut conn = open_db_in_memory().unwrap();
        run_script(&mut conn, "1\n1\nDune\nHerbert\nSciFi\n8\n");
        conn.execute("UPDATE books SET available = 7 WHERE id = 1;", [])
            .unwrap();

        let (end, output) = run_script(&mut conn, "3\n8\n");
        assert_eq!(end, SessionEnd::Saved);
        assert!(output.contains("Error loading data: storage failure"));
        assert!(output.contains("Library Management System Menu:"));
        assert!(output.contains("No books registered."));
        assert!(output.ends_with("Data saved successfully.\n"));
    }

    #[test]
    fn loaded_drift_is_reported_as_warning() {
        let mut conn = open_db_in_memory().unwrap();
        {
            let mut library = Library::new(SqliteSnapshotRepository::new(&mut conn));
            let mut lost = Book::new(1, "Lost", "Nobody", "Mystery");
            lost.set_available(false);
            library.add_book(lost).unwrap();
            library.save_all().unwrap();
        }

        let (_, output) = run_script(&mut conn, "8\n");
        assert!(output.contains(
            "Warning: inconsistent loan record: book 1 is marked unavailable but no user holds it"
        ));
        assert!(!output.contains("UnavailableWithoutBorrower"));
    }
}
