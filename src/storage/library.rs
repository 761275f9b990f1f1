//! Library repository for JSON storage
//!
//! Manages loading and saving readers, books and loans to library.json.
//! This single file is the database file that backups copy off-site.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::ShelfError;
use crate::models::{Book, BookId, Loan, LoanId, Reader, ReaderId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable library data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryData {
    #[serde(default)]
    pub readers: Vec<Reader>,
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub loans: Vec<Loan>,
}

#[derive(Default)]
struct Tables {
    readers: HashMap<ReaderId, Reader>,
    books: HashMap<BookId, Book>,
    loans: HashMap<LoanId, Loan>,
}

/// Repository for library persistence
pub struct LibraryRepository {
    path: PathBuf,
    tables: RwLock<Tables>,
}

fn lock_error(e: impl std::fmt::Display) -> ShelfError {
    ShelfError::Storage(format!("Failed to acquire lock: {}", e))
}

impl LibraryRepository {
    /// Create a new library repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the library from disk
    pub fn load(&self) -> Result<(), ShelfError> {
        let file_data: LibraryData = read_json(&self.path)?;
        let mut tables = self.tables.write().map_err(lock_error)?;

        tables.readers = file_data.readers.into_iter().map(|r| (r.id, r)).collect();
        tables.books = file_data.books.into_iter().map(|b| (b.id, b)).collect();
        tables.loans = file_data.loans.into_iter().map(|l| (l.id, l)).collect();

        Ok(())
    }

    /// Save the library to disk
    pub fn save(&self) -> Result<(), ShelfError> {
        let snapshot = self.snapshot()?;
        write_json_atomic(&self.path, &snapshot)
    }

    /// Copy of everything in the repository, in stable order
    pub fn snapshot(&self) -> Result<LibraryData, ShelfError> {
        let tables = self.tables.read().map_err(lock_error)?;

        let mut readers: Vec<_> = tables.readers.values().cloned().collect();
        readers.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });

        let mut books: Vec<_> = tables.books.values().cloned().collect();
        books.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });

        let mut loans: Vec<_> = tables.loans.values().cloned().collect();
        loans.sort_by(|a, b| {
            a.lent_on
                .cmp(&b.lent_on)
                .then_with(|| a.registered_at.cmp(&b.registered_at))
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });

        Ok(LibraryData {
            readers,
            books,
            loans,
        })
    }

    /// Get a reader by ID
    pub fn get_reader(&self, id: ReaderId) -> Result<Option<Reader>, ShelfError> {
        let tables = self.tables.read().map_err(lock_error)?;
        Ok(tables.readers.get(&id).cloned())
    }

    /// Get all readers, deleted ones included, in registration order
    pub fn all_readers(&self) -> Result<Vec<Reader>, ShelfError> {
        Ok(self.snapshot()?.readers)
    }

    /// Insert or update a reader
    pub fn upsert_reader(&self, reader: Reader) -> Result<(), ShelfError> {
        let mut tables = self.tables.write().map_err(lock_error)?;
        tables.readers.insert(reader.id, reader);
        Ok(())
    }

    /// Get a book by ID
    pub fn get_book(&self, id: BookId) -> Result<Option<Book>, ShelfError> {
        let tables = self.tables.read().map_err(lock_error)?;
        Ok(tables.books.get(&id).cloned())
    }

    /// Get all books, deleted ones included, in registration order
    pub fn all_books(&self) -> Result<Vec<Book>, ShelfError> {
        Ok(self.snapshot()?.books)
    }

    /// Insert or update a book
    pub fn upsert_book(&self, book: Book) -> Result<(), ShelfError> {
        let mut tables = self.tables.write().map_err(lock_error)?;
        tables.books.insert(book.id, book);
        Ok(())
    }

    /// Get a loan by ID
    pub fn get_loan(&self, id: LoanId) -> Result<Option<Loan>, ShelfError> {
        let tables = self.tables.read().map_err(lock_error)?;
        Ok(tables.loans.get(&id).cloned())
    }

    /// Get all loans, deleted ones included, ordered by lending date
    pub fn all_loans(&self) -> Result<Vec<Loan>, ShelfError> {
        Ok(self.snapshot()?.loans)
    }

    /// Get the loans of one book
    pub fn loans_for_book(&self, book_id: BookId) -> Result<Vec<Loan>, ShelfError> {
        Ok(self
            .all_loans()?
            .into_iter()
            .filter(|l| l.book_id == book_id)
            .collect())
    }

    /// Get the loans of one reader
    pub fn loans_for_reader(&self, reader_id: ReaderId) -> Result<Vec<Loan>, ShelfError> {
        Ok(self
            .all_loans()?
            .into_iter()
            .filter(|l| l.reader_id == reader_id)
            .collect())
    }

    /// Insert or update a loan
    pub fn upsert_loan(&self, loan: Loan) -> Result<(), ShelfError> {
        let mut tables = self.tables.write().map_err(lock_error)?;
        tables.loans.insert(loan.id, loan);
        Ok(())
    }

    /// Number of (readers, books, loans), deleted records included
    pub fn counts(&self) -> Result<(usize, usize, usize), ShelfError> {
        let tables = self.tables.read().map_err(lock_error)?;
        Ok((tables.readers.len(), tables.books.len(), tables.loans.len()))
    }
}
