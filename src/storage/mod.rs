//! Storage layer for shelf
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation.

pub mod file_io;
pub mod init;
pub mod library;

pub use file_io::{read_json, write_bytes_atomic, write_json_atomic};
pub use init::initialize_storage;
pub use library::{LibraryData, LibraryRepository};

use crate::config::paths::ShelfPaths;
use crate::error::ShelfError;

/// Main storage coordinator that provides access to the library
pub struct Storage {
    paths: ShelfPaths,
    pub library: LibraryRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: ShelfPaths) -> Result<Self, ShelfError> {
        paths.ensure_directories()?;

        Ok(Self {
            library: LibraryRepository::new(paths.library_file()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &ShelfPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), ShelfError> {
        self.library.load()
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), ShelfError> {
        self.library.save()
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.settings_file().exists()
    }
}
