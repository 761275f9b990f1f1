//! Book CLI commands
//!
//! Implements CLI commands for the donated book catalogue.

use chrono::{DateTime, Utc};
use clap::Subcommand;

use crate::display::format_book_list;
use crate::error::ShelfResult;
use crate::services::LendingService;
use crate::storage::Storage;

/// Book subcommands
#[derive(Subcommand)]
pub enum BookCommands {
    /// Register a donated book
    Donate {
        /// Title
        title: String,
        /// Author
        author: String,
        /// Donating reader (name or ID)
        #[arg(short, long)]
        donor: String,
        /// Genre
        #[arg(short, long, default_value = "general")]
        genre: String,
        /// Condition or location notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List books
    List {
        /// Only books on the shelf right now
        #[arg(short, long)]
        available: bool,
    },
    /// Delete a book
    Delete {
        /// Book title or ID
        book: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a book command
pub fn handle_book_command(
    storage: &Storage,
    now: DateTime<Utc>,
    cmd: BookCommands,
) -> ShelfResult<()> {
    let service = LendingService::new(storage);

    match cmd {
        BookCommands::Donate {
            title,
            author,
            donor,
            genre,
            notes,
        } => {
            let donor = service.get_reader(&donor)?;
            let book =
                service.donate_book(&title, &author, &genre, donor.id, notes.as_deref(), now)?;
            println!("Registered book: {}", book.title);
            println!("  ID:    {}", book.id);
            println!("  Donor: {}", donor.name);
        }

        BookCommands::List { available } => {
            let on_shelf = service.available_books()?;
            let books = if available {
                on_shelf.clone()
            } else {
                service.list_books()?
            };
            let available_ids: Vec<_> = on_shelf.iter().map(|b| b.id).collect();
            let readers = storage.library.all_readers()?;

            print!("{}", format_book_list(&books, &available_ids, &readers));
            if !books.is_empty() {
                println!(
                    "\nTotal: {} book(s), {} available",
                    books.len(),
                    available_ids.len()
                );
            } else {
                println!();
            }
        }

        BookCommands::Delete { book, force } => {
            let book = service.get_book(&book)?;

            if !force {
                println!("About to delete book '{}'.", book.title);
                println!("Use --force to confirm.");
                return Ok(());
            }

            service.delete_book(book.id, now)?;
            println!("Deleted book: {}", book.title);
        }
    }

    Ok(())
}
