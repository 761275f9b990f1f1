//! Core data models for shelf
//!
//! This module contains the records of the lending domain: readers, donated
//! books and loans, plus the lifecycle state they share.

pub mod book;
pub mod ids;
pub mod lifecycle;
pub mod loan;
pub mod reader;

pub use book::{Book, BookValidationError};
pub use ids::{BookId, LoanId, ReaderId};
pub use lifecycle::Lifecycle;
pub use loan::{Loan, LoanValidationError, MAX_LOAN_DAYS};
pub use reader::{Reader, ReaderValidationError};
