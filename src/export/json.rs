//! JSON Export functionality
//!
//! Exports the complete library to JSON with schema versioning.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ShelfError, ShelfResult};
use crate::models::{Book, Loan, Reader};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full library export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// All readers, deleted ones included
    pub readers: Vec<Reader>,

    /// All books, deleted ones included
    pub books: Vec<Book>,

    /// All loans, deleted ones included
    pub loans: Vec<Loan>,

    /// Export metadata
    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub reader_count: usize,
    pub book_count: usize,
    pub loan_count: usize,
    /// Loans not yet returned
    pub open_loan_count: usize,
}

impl FullExport {
    /// Create a new full export from storage
    pub fn from_storage(storage: &Storage, exported_at: DateTime<Utc>) -> ShelfResult<Self> {
        let data = storage.library.snapshot()?;

        let metadata = ExportMetadata {
            reader_count: data.readers.len(),
            book_count: data.books.len(),
            loan_count: data.loans.len(),
            open_loan_count: data.loans.iter().filter(|l| l.is_open()).count(),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            readers: data.readers,
            books: data.books,
            loans: data.loans,
            metadata,
        })
    }

    /// Validate the export structure
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let reader_ids: HashSet<_> = self.readers.iter().map(|r| r.id).collect();
        let book_ids: HashSet<_> = self.books.iter().map(|b| b.id).collect();

        for book in &self.books {
            if !reader_ids.contains(&book.donor_id) {
                return Err(format!(
                    "Book {} references unknown donor {}",
                    book.id, book.donor_id
                ));
            }
        }

        for loan in &self.loans {
            if !reader_ids.contains(&loan.reader_id) {
                return Err(format!(
                    "Loan {} references unknown reader {}",
                    loan.id, loan.reader_id
                ));
            }
            if !book_ids.contains(&loan.book_id) {
                return Err(format!(
                    "Loan {} references unknown book {}",
                    loan.id, loan.book_id
                ));
            }
        }

        Ok(())
    }
}

/// Export the full library to JSON
pub fn export_full_json<W: Write>(
    storage: &Storage,
    writer: &mut W,
    exported_at: DateTime<Utc>,
) -> ShelfResult<FullExport> {
    let export = FullExport::from_storage(storage, exported_at)?;

    serde_json::to_writer_pretty(writer, &export)
        .map_err(|e| ShelfError::Export(e.to_string()))?;

    Ok(export)
}
