//! Display formatting for terminal output
//!
//! Provides utilities for formatting records and backup state as plain-text
//! tables.

pub mod backup;
pub mod library;

pub use backup::{format_duration, format_size, format_snapshot_list};
pub use library::{
    format_book_list, format_loan_list, format_reader_details, format_reader_list, loan_status,
};
