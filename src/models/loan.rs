//! Loan model
//!
//! A book lent to a reader, with its due date and return state.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BookId, LoanId, ReaderId};
use super::lifecycle::Lifecycle;

/// Longest loan, or single extension, in days
pub const MAX_LOAN_DAYS: u32 = 3650;

/// A loan of one book to one reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Unique identifier
    pub id: LoanId,

    /// Borrowing reader
    pub reader_id: ReaderId,

    /// Borrowed book
    pub book_id: BookId,

    /// Day the book left the shelf
    pub lent_on: NaiveDate,

    /// Day the book is due back
    pub due_on: NaiveDate,

    /// Day the book came back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returned_on: Option<NaiveDate>,

    /// How many times the due date was pushed back
    #[serde(default)]
    pub times_extended: u32,

    /// When the loan was registered
    pub registered_at: DateTime<Utc>,

    /// Edit / delete state
    #[serde(default)]
    pub lifecycle: Lifecycle,
}

impl Loan {
    /// Create a loan of `days` days starting on `lent_on`
    pub fn new(
        reader_id: ReaderId,
        book_id: BookId,
        lent_on: NaiveDate,
        days: u32,
        at: DateTime<Utc>,
    ) -> Result<Self, LoanValidationError> {
        Ok(Self {
            id: LoanId::new(),
            reader_id,
            book_id,
            lent_on,
            due_on: add_days(lent_on, days)?,
            returned_on: None,
            times_extended: 0,
            registered_at: at,
            lifecycle: Lifecycle::Active,
        })
    }

    /// Whether the book has come back
    pub fn is_returned(&self) -> bool {
        self.returned_on.is_some()
    }

    /// Whether the loan still holds the book (not returned, not deleted)
    pub fn is_open(&self) -> bool {
        !self.is_returned() && !self.lifecycle.is_deleted()
    }

    /// Days left until the due date; negative once overdue
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_on - today).num_days()
    }

    /// Whether the loan is open and past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.days_until_due(today) < 0
    }

    /// Push the due date back by `days`
    ///
    /// The loan is left untouched when the new due date is out of range.
    pub fn extend(&mut self, days: u32, at: DateTime<Utc>) -> Result<(), LoanValidationError> {
        self.due_on = add_days(self.due_on, days)?;
        self.times_extended += 1;
        self.lifecycle.touch(at);
        Ok(())
    }

    /// Record the return of the book
    pub fn mark_returned(&mut self, today: NaiveDate, at: DateTime<Utc>) {
        self.returned_on = Some(today);
        self.lifecycle.touch(at);
    }
}

fn add_days(from: NaiveDate, days: u32) -> Result<NaiveDate, LoanValidationError> {
    if days == 0 {
        return Err(LoanValidationError::ZeroDays);
    }
    if days > MAX_LOAN_DAYS {
        return Err(LoanValidationError::TooLong(days));
    }
    from.checked_add_days(Days::new(u64::from(days)))
        .ok_or(LoanValidationError::DateOutOfRange(from))
}

/// Validation errors for loans
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanValidationError {
    ZeroDays,
    TooLong(u32),
    DateOutOfRange(NaiveDate),
}

impl fmt::Display for LoanValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDays => write!(f, "Loan length must be at least one day"),
            Self::TooLong(days) => write!(
                f,
                "{} days is too long; at most {} days at a time",
                days, MAX_LOAN_DAYS
            ),
            Self::DateOutOfRange(from) => {
                write!(f, "Due date out of range when counting from {}", from)
            }
        }
    }
}

impl std::error::Error for LoanValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn loan() -> Loan {
        Loan::new(ReaderId::new(), BookId::new(), day(10), 7, Utc::now()).unwrap()
    }

    #[test]
    fn test_new_loan_due_date() {
        let loan = loan();
        assert_eq!(loan.due_on, day(17));
        assert!(loan.is_open());
        assert_eq!(loan.days_until_due(day(15)), 2);
    }

    #[test]
    fn test_overdue() {
        let loan = loan();
        assert!(!loan.is_overdue(day(17)));
        assert!(loan.is_overdue(day(18)));
        assert_eq!(loan.days_until_due(day(20)), -3);
    }

    #[test]
    fn test_extend() {
        let mut loan = loan();
        loan.extend(1, Utc::now()).unwrap();
        loan.extend(1, Utc::now()).unwrap();
        assert_eq!(loan.due_on, day(19));
        assert_eq!(loan.times_extended, 2);
        assert!(loan.lifecycle.is_edited());
    }

    #[test]
    fn test_return() {
        let mut loan = loan();
        loan.mark_returned(day(12), Utc::now());
        assert!(loan.is_returned());
        assert!(!loan.is_open());
        assert!(!loan.is_overdue(day(30)));
    }

    #[test]
    fn test_huge_loan_length_is_rejected() {
        let result = Loan::new(ReaderId::new(), BookId::new(), day(10), 200_000_000, Utc::now());
        assert_eq!(result.unwrap_err(), LoanValidationError::TooLong(200_000_000));

        let zero = Loan::new(ReaderId::new(), BookId::new(), day(10), 0, Utc::now());
        assert_eq!(zero.unwrap_err(), LoanValidationError::ZeroDays);
    }

    #[test]
    fn test_extend_past_calendar_end_leaves_loan_alone() {
        let mut loan = loan();
        loan.due_on = NaiveDate::MAX;

        let err = loan.extend(1, Utc::now()).unwrap_err();
        assert_eq!(err, LoanValidationError::DateOutOfRange(NaiveDate::MAX));
        assert_eq!(loan.due_on, NaiveDate::MAX);
        assert_eq!(loan.times_extended, 0);
        assert!(!loan.lifecycle.is_edited());
    }
}
