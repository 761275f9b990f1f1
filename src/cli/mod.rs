//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod backup;
pub mod book;
pub mod export;
pub mod loan;
pub mod reader;

pub use backup::{handle_backup_command, run_startup_sync, BackupCommands};
pub use book::{handle_book_command, BookCommands};
pub use export::{handle_export_command, ExportCommands};
pub use loan::{handle_loan_command, LoanCommands};
pub use reader::{handle_reader_command, ReaderCommands};
