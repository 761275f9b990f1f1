//! Configuration module for shelf
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence
//! - Backup retention policy

pub mod paths;
pub mod settings;

pub use paths::ShelfPaths;
pub use settings::{BackupSettings, RetentionPolicy, Settings};
