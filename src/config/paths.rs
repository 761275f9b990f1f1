//! Path management for shelf
//!
//! Provides XDG-compliant path resolution for configuration, data, and exports.
//!
//! ## Path Resolution Order
//!
//! 1. `SHELF_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/shelf` or `~/.config/shelf`
//! 3. Windows: `%APPDATA%\shelf`

use std::path::PathBuf;

use crate::error::ShelfError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "SHELF_DATA_DIR";

/// Manages all paths used by shelf
#[derive(Debug, Clone)]
pub struct ShelfPaths {
    /// Base directory for all shelf data
    base_dir: PathBuf,
}

impl ShelfPaths {
    /// Create a new ShelfPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, ShelfError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create ShelfPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/shelf/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (~/.config/shelf/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the default export directory (~/.config/shelf/exports/)
    pub fn export_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to library.json, the database file that gets backed up
    pub fn library_file(&self) -> PathBuf {
        self.data_dir().join("library.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), ShelfError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ShelfError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| ShelfError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if shelf has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

/// Resolve the default data directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, ShelfError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME").map_err(|_| {
                ShelfError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("shelf"))
}

/// Resolve the default data directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, ShelfError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| ShelfError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("shelf"))
}
