//! Loan CLI commands
//!
//! Implements CLI commands for lending, returns and extensions.

use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;

use crate::display::{format_loan_list, loan_status};
use crate::error::ShelfResult;
use crate::services::LendingService;
use crate::storage::Storage;

/// Loan subcommands
#[derive(Subcommand)]
pub enum LoanCommands {
    /// Lend a book to a reader
    Lend {
        /// Book title or ID
        book: String,
        /// Reader name or ID
        reader: String,
        /// Loan length in days (defaults to the configured loan length)
        #[arg(short, long)]
        days: Option<u32>,
    },
    /// Record a returned book
    Return {
        /// Loan ID
        loan: String,
    },
    /// Push a loan's due date back
    Extend {
        /// Loan ID
        loan: String,
        /// Days to add
        #[arg(short, long)]
        days: Option<u32>,
    },
    /// List loans
    List {
        /// Include returned loans
        #[arg(short, long)]
        all: bool,
        /// Only overdue loans
        #[arg(short, long, conflicts_with = "all")]
        overdue: bool,
    },
    /// Delete a loan entered by mistake
    Delete {
        /// Loan ID
        loan: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a loan command
pub fn handle_loan_command(
    storage: &Storage,
    default_days: u32,
    now: DateTime<Utc>,
    today: NaiveDate,
    cmd: LoanCommands,
) -> ShelfResult<()> {
    let service = LendingService::new(storage);

    match cmd {
        LoanCommands::Lend { book, reader, days } => {
            let book = service.get_book(&book)?;
            let reader = service.get_reader(&reader)?;
            let loan = service.lend(
                book.id,
                reader.id,
                days.unwrap_or(default_days),
                today,
                now,
            )?;
            println!("Lent '{}' to {}", book.title, reader.name);
            println!("  Loan: {}", loan.id);
            println!("  Due:  {}", loan.due_on);
        }

        LoanCommands::Return { loan } => {
            let loan = service.get_loan(&loan)?;
            let returned = service.return_loan(loan.id, today, now)?;
            let overdue_by = -loan.days_until_due(today);
            println!("Returned loan {} on {}", returned.id, today);
            if overdue_by > 0 {
                println!("  Came back {} day(s) late", overdue_by);
            }
        }

        LoanCommands::Extend { loan, days } => {
            let loan = service.get_loan(&loan)?;
            let extended = service.extend_loan(loan.id, days, now)?;
            println!(
                "Extended loan {}: due {} ({})",
                extended.id,
                extended.due_on,
                loan_status(&extended, today)
            );
        }

        LoanCommands::List { all, overdue } => {
            let mut loans = if overdue {
                service.overdue_loans(today)?
            } else {
                service.open_loans()?
            };
            if all {
                loans.extend(service.closed_loans()?);
            }

            let books = storage.library.all_books()?;
            let readers = storage.library.all_readers()?;
            print!("{}", format_loan_list(&loans, &books, &readers, today));
            if !loans.is_empty() {
                println!("\nTotal: {} loan(s)", loans.len());
            } else {
                println!();
            }
        }

        LoanCommands::Delete { loan, force } => {
            let loan = service.get_loan(&loan)?;

            if !force {
                println!("About to delete loan {}.", loan.id);
                println!("Use --force to confirm.");
                return Ok(());
            }

            service.delete_loan(loan.id, now)?;
            println!("Deleted loan {}", loan.id);
        }
    }

    Ok(())
}
