//! Export module for shelf
//!
//! Provides offline copies of the library:
//! - CSV: one sheet each for readers, books and loans
//! - JSON: machine-readable full export with metadata
//! - Raw: a byte-for-byte copy of the library file

pub mod csv;
pub mod json;

pub use self::csv::{export_books_csv, export_loans_csv, export_readers_csv};
pub use json::{export_full_json, FullExport, EXPORT_SCHEMA_VERSION};

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{ShelfError, ShelfResult};
use crate::storage::Storage;

/// Files written by [`export_all`]
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub readers: usize,
    pub books: usize,
    pub loans: usize,
}

/// Write every export format into `dir`
///
/// File names carry the export timestamp so repeated exports don't clobber
/// each other.
pub fn export_all(storage: &Storage, dir: &Path, now: DateTime<Utc>) -> ShelfResult<ExportSummary> {
    fs::create_dir_all(dir).map_err(|e| {
        ShelfError::Export(format!("Failed to create {}: {}", dir.display(), e))
    })?;

    let stamp = now.format("%Y%m%d_%H%M%S").to_string();
    let mut summary = ExportSummary::default();

    let path = dir.join(format!("readers_{}.csv", stamp));
    summary.readers = export_readers_csv(storage, create(&path)?)?;
    summary.files.push(path);

    let path = dir.join(format!("books_{}.csv", stamp));
    summary.books = export_books_csv(storage, create(&path)?)?;
    summary.files.push(path);

    let path = dir.join(format!("loans_{}.csv", stamp));
    summary.loans = export_loans_csv(storage, create(&path)?)?;
    summary.files.push(path);

    let path = dir.join(format!("library_{}.json", stamp));
    export_full_json(storage, &mut create(&path)?, now)?;
    summary.files.push(path);

    if let Some(path) = copy_database_file(storage, dir, &stamp)? {
        summary.files.push(path);
    }

    info!(dir = %dir.display(), files = summary.files.len(), "exported library");
    Ok(summary)
}

/// Copy the raw library file into `dir`, if it exists yet
pub fn copy_database_file(
    storage: &Storage,
    dir: &Path,
    stamp: &str,
) -> ShelfResult<Option<PathBuf>> {
    let source = storage.library.path();
    if !source.exists() {
        return Ok(None);
    }

    let target = dir.join(format!("library_{}.raw.json", stamp));
    fs::copy(source, &target)
        .map_err(|e| ShelfError::Export(format!("Failed to copy library file: {}", e)))?;
    Ok(Some(target))
}

fn create(path: &Path) -> ShelfResult<BufWriter<File>> {
    let file = File::create(path)
        .map_err(|e| ShelfError::Export(format!("Failed to create {}: {}", path.display(), e)))?;
    Ok(BufWriter::new(file))
}
