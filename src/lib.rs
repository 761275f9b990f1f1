//! shelf - lending records for a small community library, with off-site
//! backups
//!
//! Readers donate books, borrow them and bring them back. All records live in
//! one JSON file, and once a day that file is copied to an off-site folder as
//! a dated snapshot. Old snapshots are pruned by a keep-last / monthly / daily
//! retention policy.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `logging`: Tracing subscriber setup
//! - `models`: Core data models (readers, books, loans)
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer
//! - `backup`: Off-site snapshots, retention and restore
//! - `export`: CSV and JSON export
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use shelf::config::{paths::ShelfPaths, settings::Settings};
//!
//! let paths = ShelfPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{ShelfError, ShelfResult};
