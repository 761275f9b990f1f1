//! Backup restoration for shelf
//!
//! Downloads a snapshot and writes it over the local database file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::lister::SnapshotLister;
use super::snapshot::{Snapshot, SNAPSHOT_EXTENSION};
use super::store::RemoteStore;
use crate::error::{ShelfError, ShelfResult};
use crate::storage::file_io::{json_bytes_valid, write_bytes_atomic};

/// Suffix of the copy of the database file taken before a restore
pub const PRE_RESTORE_SUFFIX: &str = "pre-restore";

/// Handles restoring the database file from remote snapshots
pub struct RestoreManager<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    database_file: PathBuf,
}

/// Result of a restore operation
#[derive(Debug, Clone)]
pub struct RestoreResult {
    /// Snapshot that was restored
    pub snapshot: Snapshot,
    /// Bytes written to the database file
    pub bytes_written: usize,
    /// Where the replaced database file was copied, if there was one
    pub previous_copy: Option<PathBuf>,
}

impl RestoreResult {
    /// Get a summary of the restore
    pub fn summary(&self) -> String {
        match &self.previous_copy {
            Some(copy) => format!(
                "Restored {} ({} bytes); previous data kept at {}",
                self.snapshot.name,
                self.bytes_written,
                copy.display()
            ),
            None => format!(
                "Restored {} ({} bytes)",
                self.snapshot.name, self.bytes_written
            ),
        }
    }
}

impl<'a, S: RemoteStore + ?Sized> RestoreManager<'a, S> {
    /// Create a new RestoreManager
    pub fn new(store: &'a S, database_file: impl Into<PathBuf>) -> Self {
        Self {
            store,
            database_file: database_file.into(),
        }
    }

    /// Resolve a user-supplied identifier to a snapshot
    ///
    /// Accepts `latest`, an exact snapshot name, or a name without the
    /// `.db` extension.
    pub fn resolve(&self, identifier: &str) -> ShelfResult<Snapshot> {
        let snapshots = SnapshotLister::new(self.store).list()?;

        if identifier.eq_ignore_ascii_case("latest") {
            return snapshots
                .into_iter()
                .next()
                .ok_or_else(|| ShelfError::snapshot_not_found("latest"));
        }

        let with_ext = format!("{}{}", identifier, SNAPSHOT_EXTENSION);
        snapshots
            .into_iter()
            .find(|s| s.name == identifier || s.name == with_ext)
            .ok_or_else(|| ShelfError::snapshot_not_found(identifier))
    }

    /// Download a snapshot and validate it without touching local data
    pub fn fetch(&self, identifier: &str) -> ShelfResult<(Snapshot, Vec<u8>)> {
        let snapshot = self.resolve(identifier)?;
        let bytes = self.store.download(&snapshot.name)?;

        if !json_bytes_valid(&bytes) {
            return Err(ShelfError::Validation(format!(
                "Snapshot {} does not contain a valid library file",
                snapshot.name
            )));
        }

        Ok((snapshot, bytes))
    }

    /// Replace the database file with the given snapshot
    ///
    /// The current file, if any, is copied next to it first.
    pub fn restore(&self, identifier: &str) -> ShelfResult<RestoreResult> {
        let (snapshot, bytes) = self.fetch(identifier)?;

        let previous_copy = if self.database_file.exists() {
            let copy = pre_restore_path(&self.database_file);
            fs::copy(&self.database_file, &copy).map_err(|e| {
                ShelfError::Io(format!("Failed to keep a copy of current data: {}", e))
            })?;
            Some(copy)
        } else {
            None
        };

        write_bytes_atomic(&self.database_file, &bytes)?;
        info!(name = %snapshot.name, bytes = bytes.len(), "restored database file from snapshot");

        Ok(RestoreResult {
            snapshot,
            bytes_written: bytes.len(),
            previous_copy,
        })
    }
}

fn pre_restore_path(database_file: &Path) -> PathBuf {
    let mut name = database_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(PRE_RESTORE_SUFFIX);
    database_file.with_file_name(name)
}
