//! Lending service
//!
//! Business logic for readers, donated books and loans: registration,
//! lending, returns, extensions and soft deletion.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::error::{ShelfError, ShelfResult};
use crate::models::{Book, BookId, Loan, LoanId, Reader, ReaderId};
use crate::storage::Storage;

/// Default number of days an extension adds
pub const DEFAULT_EXTENSION_DAYS: u32 = 1;

/// Service for the lending records
pub struct LendingService<'a> {
    storage: &'a Storage,
}

impl<'a> LendingService<'a> {
    /// Create a new lending service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Register a new reader
    pub fn register_reader(
        &self,
        name: &str,
        email: &str,
        favorite_genres: Option<&str>,
        at: DateTime<Utc>,
    ) -> ShelfResult<Reader> {
        let mut reader = Reader::new(name.trim(), email.trim(), at);
        if let Some(genres) = favorite_genres {
            reader = reader.with_genres(genres.trim());
        }
        reader
            .validate()
            .map_err(|e| ShelfError::Validation(e.to_string()))?;

        self.storage.library.upsert_reader(reader.clone())?;
        self.storage.library.save()?;
        info!(id = %reader.id, "registered reader");

        Ok(reader)
    }

    /// List readers that have not been deleted
    pub fn list_readers(&self) -> ShelfResult<Vec<Reader>> {
        let mut readers: Vec<_> = self
            .storage
            .library
            .all_readers()?
            .into_iter()
            .filter(|r| !r.lifecycle.is_deleted())
            .collect();
        readers.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(readers)
    }

    /// Find a live reader by ID, short ID or exact name
    pub fn find_reader(&self, identifier: &str) -> ShelfResult<Option<Reader>> {
        let readers = self.list_readers()?;

        if let Ok(id) = identifier.parse::<ReaderId>() {
            if let Some(reader) = readers.iter().find(|r| r.id == id) {
                return Ok(Some(reader.clone()));
            }
        }

        Ok(readers
            .into_iter()
            .find(|r| r.id.matches_short(identifier) || r.matches_name(identifier)))
    }

    /// Find a live reader, failing if there is none
    pub fn get_reader(&self, identifier: &str) -> ShelfResult<Reader> {
        self.find_reader(identifier)?
            .ok_or_else(|| ShelfError::reader_not_found(identifier))
    }

    /// Change a reader's details
    pub fn update_reader(
        &self,
        id: ReaderId,
        name: Option<&str>,
        email: Option<&str>,
        favorite_genres: Option<&str>,
        at: DateTime<Utc>,
    ) -> ShelfResult<Reader> {
        let mut reader = self.live_reader(id)?;

        if let Some(name) = name {
            reader.name = name.trim().to_string();
        }
        if let Some(email) = email {
            reader.email = email.trim().to_string();
        }
        if let Some(genres) = favorite_genres {
            reader.favorite_genres = genres.trim().to_string();
        }
        reader
            .validate()
            .map_err(|e| ShelfError::Validation(e.to_string()))?;
        reader.lifecycle.touch(at);

        self.storage.library.upsert_reader(reader.clone())?;
        self.storage.library.save()?;
        Ok(reader)
    }

    /// Soft-delete a reader
    ///
    /// A reader still holding books cannot be deleted.
    pub fn delete_reader(&self, id: ReaderId, at: DateTime<Utc>) -> ShelfResult<Reader> {
        let mut reader = self.live_reader(id)?;

        let open = self.active_loan_count(id)?;
        if open > 0 {
            return Err(ShelfError::Validation(format!(
                "{} still has {} book(s) on loan",
                reader.name, open
            )));
        }

        reader.lifecycle.delete(at);
        self.storage.library.upsert_reader(reader.clone())?;
        self.storage.library.save()?;
        info!(id = %reader.id, "deleted reader");
        Ok(reader)
    }

    fn live_reader(&self, id: ReaderId) -> ShelfResult<Reader> {
        self.storage
            .library
            .get_reader(id)?
            .filter(|r| !r.lifecycle.is_deleted())
            .ok_or_else(|| ShelfError::reader_not_found(id.to_string()))
    }

    /// Register a book donated by a reader
    pub fn donate_book(
        &self,
        title: &str,
        author: &str,
        genre: &str,
        donor_id: ReaderId,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> ShelfResult<Book> {
        self.live_reader(donor_id)?;

        let mut book = Book::new(title.trim(), author.trim(), genre.trim(), donor_id, at);
        book.notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        book.validate()
            .map_err(|e| ShelfError::Validation(e.to_string()))?;

        self.storage.library.upsert_book(book.clone())?;
        self.storage.library.save()?;
        info!(id = %book.id, donor = %donor_id, "registered donated book");

        Ok(book)
    }

    /// List books that have not been deleted
    pub fn list_books(&self) -> ShelfResult<Vec<Book>> {
        let mut books: Vec<_> = self
            .storage
            .library
            .all_books()?
            .into_iter()
            .filter(|b| !b.lifecycle.is_deleted())
            .collect();
        books.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(books)
    }

    /// List books with no open loan
    pub fn available_books(&self) -> ShelfResult<Vec<Book>> {
        let open = self.open_loans()?;
        Ok(self
            .list_books()?
            .into_iter()
            .filter(|b| !open.iter().any(|l| l.book_id == b.id))
            .collect())
    }

    /// Whether a book can be lent right now
    pub fn is_available(&self, id: BookId) -> ShelfResult<bool> {
        Ok(self.open_loan_for_book(id)?.is_none())
    }

    /// Find a live book by ID, short ID or exact title
    pub fn find_book(&self, identifier: &str) -> ShelfResult<Option<Book>> {
        let books = self.list_books()?;

        if let Ok(id) = identifier.parse::<BookId>() {
            if let Some(book) = books.iter().find(|b| b.id == id) {
                return Ok(Some(book.clone()));
            }
        }

        Ok(books
            .into_iter()
            .find(|b| b.id.matches_short(identifier) || b.matches_title(identifier)))
    }

    /// Find a live book, failing if there is none
    pub fn get_book(&self, identifier: &str) -> ShelfResult<Book> {
        self.find_book(identifier)?
            .ok_or_else(|| ShelfError::book_not_found(identifier))
    }

    /// Soft-delete a book that is on the shelf
    pub fn delete_book(&self, id: BookId, at: DateTime<Utc>) -> ShelfResult<Book> {
        let mut book = self.live_book(id)?;

        if self.open_loan_for_book(id)?.is_some() {
            return Err(ShelfError::OnLoan(book.title));
        }

        book.lifecycle.delete(at);
        self.storage.library.upsert_book(book.clone())?;
        self.storage.library.save()?;
        info!(id = %book.id, "deleted book");
        Ok(book)
    }

    fn live_book(&self, id: BookId) -> ShelfResult<Book> {
        self.storage
            .library
            .get_book(id)?
            .filter(|b| !b.lifecycle.is_deleted())
            .ok_or_else(|| ShelfError::book_not_found(id.to_string()))
    }

    /// Lend a book to a reader for `days` days starting `today`
    pub fn lend(
        &self,
        book_id: BookId,
        reader_id: ReaderId,
        days: u32,
        today: NaiveDate,
        at: DateTime<Utc>,
    ) -> ShelfResult<Loan> {
        let book = self.live_book(book_id)?;
        self.live_reader(reader_id)?;

        if self.open_loan_for_book(book_id)?.is_some() {
            return Err(ShelfError::OnLoan(book.title));
        }

        let loan = Loan::new(reader_id, book_id, today, days, at)
            .map_err(|e| ShelfError::Validation(e.to_string()))?;
        self.storage.library.upsert_loan(loan.clone())?;
        self.storage.library.save()?;
        info!(id = %loan.id, book = %book_id, reader = %reader_id, due = %loan.due_on, "lent book");

        Ok(loan)
    }

    /// Record the return of a lent book
    pub fn return_loan(
        &self,
        id: LoanId,
        today: NaiveDate,
        at: DateTime<Utc>,
    ) -> ShelfResult<Loan> {
        let mut loan = self.open_loan(id)?;
        loan.mark_returned(today, at);

        self.storage.library.upsert_loan(loan.clone())?;
        self.storage.library.save()?;
        info!(id = %loan.id, "returned book");
        Ok(loan)
    }

    /// Push an open loan's due date back by `days` (default one day)
    pub fn extend_loan(
        &self,
        id: LoanId,
        days: Option<u32>,
        at: DateTime<Utc>,
    ) -> ShelfResult<Loan> {
        let days = days.unwrap_or(DEFAULT_EXTENSION_DAYS);
        let mut loan = self.open_loan(id)?;
        loan.extend(days, at).map_err(|e| ShelfError::Validation(e.to_string()))?;

        self.storage.library.upsert_loan(loan.clone())?;
        self.storage.library.save()?;
        info!(id = %loan.id, due = %loan.due_on, "extended loan");
        Ok(loan)
    }

    /// Soft-delete a loan record, e.g. one entered by mistake
    pub fn delete_loan(&self, id: LoanId, at: DateTime<Utc>) -> ShelfResult<Loan> {
        let mut loan = self
            .storage
            .library
            .get_loan(id)?
            .filter(|l| !l.lifecycle.is_deleted())
            .ok_or_else(|| ShelfError::loan_not_found(id.to_string()))?;

        loan.lifecycle.delete(at);
        self.storage.library.upsert_loan(loan.clone())?;
        self.storage.library.save()?;
        Ok(loan)
    }

    /// Open loans, soonest due first
    pub fn open_loans(&self) -> ShelfResult<Vec<Loan>> {
        let mut loans: Vec<_> = self
            .storage
            .library
            .all_loans()?
            .into_iter()
            .filter(Loan::is_open)
            .collect();
        loans.sort_by(|a, b| a.due_on.cmp(&b.due_on).then(a.lent_on.cmp(&b.lent_on)));
        Ok(loans)
    }

    /// Returned loans, most recent return first
    pub fn closed_loans(&self) -> ShelfResult<Vec<Loan>> {
        let mut loans: Vec<_> = self
            .storage
            .library
            .all_loans()?
            .into_iter()
            .filter(|l| l.is_returned() && !l.lifecycle.is_deleted())
            .collect();
        loans.sort_by(|a, b| b.returned_on.cmp(&a.returned_on));
        Ok(loans)
    }

    /// Open loans that are past due on `today`
    pub fn overdue_loans(&self, today: NaiveDate) -> ShelfResult<Vec<Loan>> {
        Ok(self
            .open_loans()?
            .into_iter()
            .filter(|l| l.is_overdue(today))
            .collect())
    }

    /// Number of books a reader currently holds
    pub fn active_loan_count(&self, reader_id: ReaderId) -> ShelfResult<usize> {
        Ok(self
            .storage
            .library
            .loans_for_reader(reader_id)?
            .iter()
            .filter(|l| l.is_open())
            .count())
    }

    /// Find a live loan by ID or short ID
    pub fn find_loan(&self, identifier: &str) -> ShelfResult<Option<Loan>> {
        let loans: Vec<_> = self
            .storage
            .library
            .all_loans()?
            .into_iter()
            .filter(|l| !l.lifecycle.is_deleted())
            .collect();

        if let Ok(id) = identifier.parse::<LoanId>() {
            if let Some(loan) = loans.iter().find(|l| l.id == id) {
                return Ok(Some(loan.clone()));
            }
        }

        Ok(loans.into_iter().find(|l| l.id.matches_short(identifier)))
    }

    /// Find a live loan, failing if there is none
    pub fn get_loan(&self, identifier: &str) -> ShelfResult<Loan> {
        self.find_loan(identifier)?
            .ok_or_else(|| ShelfError::loan_not_found(identifier))
    }

    fn open_loan(&self, id: LoanId) -> ShelfResult<Loan> {
        let loan = self
            .storage
            .library
            .get_loan(id)?
            .filter(|l| !l.lifecycle.is_deleted())
            .ok_or_else(|| ShelfError::loan_not_found(id.to_string()))?;

        if loan.is_returned() {
            return Err(ShelfError::Validation(format!(
                "Loan {} was already returned",
                loan.id
            )));
        }
        Ok(loan)
    }

    fn open_loan_for_book(&self, book_id: BookId) -> ShelfResult<Option<Loan>> {
        Ok(self
            .storage
            .library
            .loans_for_book(book_id)?
            .into_iter()
            .find(Loan::is_open))
    }
}
