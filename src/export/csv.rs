//! CSV Export functionality
//!
//! Exports readers, books and loans to spreadsheet-friendly CSV. Deleted
//! records are left out; loans carry the reader name and book title so the
//! sheet reads on its own.

use std::collections::HashMap;
use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ShelfResult;
use crate::storage::Storage;

#[derive(Serialize)]
struct ReaderRow<'a> {
    id: String,
    name: &'a str,
    email: &'a str,
    favorite_genres: &'a str,
    registered_at: String,
}

#[derive(Serialize)]
struct BookRow<'a> {
    id: String,
    title: &'a str,
    author: &'a str,
    genre: &'a str,
    donor: &'a str,
    notes: &'a str,
}

#[derive(Serialize)]
struct LoanRow<'a> {
    id: String,
    book: &'a str,
    reader: &'a str,
    lent_on: NaiveDate,
    due_on: NaiveDate,
    returned_on: Option<NaiveDate>,
    times_extended: u32,
}

/// Export live readers to CSV
pub fn export_readers_csv<W: Write>(storage: &Storage, writer: W) -> ShelfResult<usize> {
    let readers = storage.library.all_readers()?;
    let mut wtr = csv::Writer::from_writer(writer);
    let mut count = 0;

    for reader in readers.iter().filter(|r| !r.lifecycle.is_deleted()) {
        wtr.serialize(ReaderRow {
            id: reader.id.to_string(),
            name: &reader.name,
            email: &reader.email,
            favorite_genres: &reader.favorite_genres,
            registered_at: reader.registered_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })?;
        count += 1;
    }

    wtr.flush()?;
    Ok(count)
}

/// Export live books to CSV
pub fn export_books_csv<W: Write>(storage: &Storage, writer: W) -> ShelfResult<usize> {
    let readers = storage.library.all_readers()?;
    let reader_names: HashMap<_, _> = readers.iter().map(|r| (r.id, r.name.as_str())).collect();

    let books = storage.library.all_books()?;
    let mut wtr = csv::Writer::from_writer(writer);
    let mut count = 0;

    for book in books.iter().filter(|b| !b.lifecycle.is_deleted()) {
        wtr.serialize(BookRow {
            id: book.id.to_string(),
            title: &book.title,
            author: &book.author,
            genre: &book.genre,
            donor: reader_names.get(&book.donor_id).copied().unwrap_or("Unknown"),
            notes: book.notes.as_deref().unwrap_or(""),
        })?;
        count += 1;
    }

    wtr.flush()?;
    Ok(count)
}

/// Export live loans to CSV, open and returned alike
pub fn export_loans_csv<W: Write>(storage: &Storage, writer: W) -> ShelfResult<usize> {
    let readers = storage.library.all_readers()?;
    let reader_names: HashMap<_, _> = readers.iter().map(|r| (r.id, r.name.as_str())).collect();
    let books = storage.library.all_books()?;
    let book_titles: HashMap<_, _> = books.iter().map(|b| (b.id, b.title.as_str())).collect();

    let loans = storage.library.all_loans()?;
    let mut wtr = csv::Writer::from_writer(writer);
    let mut count = 0;

    for loan in loans.iter().filter(|l| !l.lifecycle.is_deleted()) {
        wtr.serialize(LoanRow {
            id: loan.id.to_string(),
            book: book_titles.get(&loan.book_id).copied().unwrap_or("Unknown"),
            reader: reader_names.get(&loan.reader_id).copied().unwrap_or("Unknown"),
            lent_on: loan.lent_on,
            due_on: loan.due_on,
            returned_on: loan.returned_on,
            times_extended: loan.times_extended,
        })?;
        count += 1;
    }

    wtr.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ShelfPaths;
    use crate::services::LendingService;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ShelfPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_export_readers_skips_deleted() {
        let (_temp_dir, storage) = create_test_storage();
        let service = LendingService::new(&storage);
        service
            .register_reader("Ana, the Reader", "ana@example.com", Some("fantasy"), Utc::now())
            .unwrap();
        let bruno = service
            .register_reader("Bruno", "bruno@example.com", None, Utc::now())
            .unwrap();
        service.delete_reader(bruno.id, Utc::now()).unwrap();

        let mut output = Vec::new();
        let count = export_readers_csv(&storage, &mut output).unwrap();
        let csv_string = String::from_utf8(output).unwrap();

        assert_eq!(count, 1);
        assert!(csv_string.starts_with("id,name,email,favorite_genres,registered_at"));
        assert!(csv_string.contains("\"Ana, the Reader\""));
        assert!(!csv_string.contains("Bruno"));
    }

    #[test]
    fn test_export_loans_with_names() {
        let (_temp_dir, storage) = create_test_storage();
        let service = LendingService::new(&storage);
        let ana = service
            .register_reader("Ana", "ana@example.com", None, Utc::now())
            .unwrap();
        let book = service
            .donate_book("Dune", "Frank Herbert", "sci-fi", ana.id, Some("shelf 2"), Utc::now())
            .unwrap();
        let lent_on = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        service.lend(book.id, ana.id, 7, lent_on, Utc::now()).unwrap();

        let mut output = Vec::new();
        export_loans_csv(&storage, &mut output).unwrap();
        let csv_string = String::from_utf8(output).unwrap();
        assert!(csv_string.contains("Dune,Ana,2024-03-10,2024-03-17,,0"));

        let mut output = Vec::new();
        export_books_csv(&storage, &mut output).unwrap();
        let csv_string = String::from_utf8(output).unwrap();
        assert!(csv_string.contains("Dune,Frank Herbert,sci-fi,Ana,shelf 2"));
    }
}
