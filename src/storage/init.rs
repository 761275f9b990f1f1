//! Storage initialization
//!
//! Handles first-run setup: directories, default settings and an empty
//! library file.

use tracing::info;

use crate::config::paths::ShelfPaths;
use crate::config::settings::Settings;
use crate::error::ShelfError;

use super::file_io::write_json_atomic;
use super::library::LibraryData;

/// Initialize storage for a fresh installation
///
/// Existing settings and library data are left untouched.
pub fn initialize_storage(paths: &ShelfPaths) -> Result<Settings, ShelfError> {
    paths.ensure_directories()?;

    let settings = Settings::load_or_create(paths)?;
    if !paths.settings_file().exists() {
        settings.save(paths)?;
    }

    let library = paths.library_file();
    if !library.exists() {
        write_json_atomic(&library, &LibraryData::default())?;
        info!(path = %library.display(), "created empty library file");
    }

    Ok(settings)
}
