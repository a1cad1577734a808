use libcat_core::{Book, User};

#[test]
fn book_new_starts_available() {
    let book = Book::new(1, "Dune", "Herbert", "SciFi");

    assert_eq!(book.id(), 1);
    assert_eq!(book.title(), "Dune");
    assert_eq!(book.author(), "Herbert");
    assert_eq!(book.genre(), "SciFi");
    assert!(book.is_available());
}

#[test]
fn set_available_overwrites_flag_unconditionally() {
    let mut book = Book::new(1, "Dune", "Herbert", "SciFi");

    book.set_available(false);
    book.set_available(false);
    assert!(!book.is_available());

    book.set_available(true);
    assert!(book.is_available());
}

#[test]
fn user_borrow_appends_without_dedup() {
    let mut user = User::new(100, "Ann", "ann@example.com");

    user.borrow(1);
    user.borrow(2);
    user.borrow(1);

    assert_eq!(user.borrowed_book_ids(), &[1, 2, 1]);
    assert!(user.has_borrowed(2));
}

#[test]
fn user_return_removes_first_occurrence_only() {
    let mut user = User::new(100, "Ann", "ann@example.com");
    user.borrow(1);
    user.borrow(2);
    user.borrow(1);

    assert!(user.return_book(1));
    assert_eq!(user.borrowed_book_ids(), &[2, 1]);
}

#[test]
fn user_return_of_missing_id_is_noop() {
    let mut user = User::new(100, "Ann", "ann@example.com");
    user.borrow(7);

    assert!(!user.return_book(8));
    assert_eq!(user.borrowed_book_ids(), &[7]);
}

#[test]
fn records_serialize_with_expected_wire_fields() {
    let mut book = Book::new(1, "Dune", "Herbert", "SciFi");
    book.set_available(false);
    let mut user = User::new(100, "Ann", "555-0100");
    user.borrow(1);

    let book_json = serde_json::to_value(&book).unwrap();
    assert_eq!(book_json["id"], 1);
    assert_eq!(book_json["title"], "Dune");
    assert_eq!(book_json["available"], false);

    let user_json = serde_json::to_value(&user).unwrap();
    assert_eq!(user_json["contact_info"], "555-0100");
    assert_eq!(user_json["borrowed_book_ids"], serde_json::json!([1]));

    let decoded: User = serde_json::from_value(user_json).unwrap();
    assert_eq!(decoded, user);
}
