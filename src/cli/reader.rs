//! Reader CLI commands
//!
//! Implements CLI commands for reader management.

use chrono::{DateTime, Utc};
use clap::Subcommand;

use crate::display::{format_reader_details, format_reader_list};
use crate::error::ShelfResult;
use crate::services::LendingService;
use crate::storage::Storage;

/// Reader subcommands
#[derive(Subcommand)]
pub enum ReaderCommands {
    /// Register a new reader
    Add {
        /// Full name
        name: String,
        /// Contact e-mail
        email: String,
        /// Preferred genres
        #[arg(short, long)]
        genres: Option<String>,
    },
    /// List all readers
    List,
    /// Show reader details and loan history
    Show {
        /// Reader name or ID
        reader: String,
    },
    /// Edit a reader
    Edit {
        /// Reader name or ID
        reader: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New e-mail
        #[arg(short, long)]
        email: Option<String>,
        /// New preferred genres
        #[arg(short, long)]
        genres: Option<String>,
    },
    /// Delete a reader
    Delete {
        /// Reader name or ID
        reader: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a reader command
pub fn handle_reader_command(
    storage: &Storage,
    now: DateTime<Utc>,
    cmd: ReaderCommands,
) -> ShelfResult<()> {
    let service = LendingService::new(storage);

    match cmd {
        ReaderCommands::Add {
            name,
            email,
            genres,
        } => {
            let reader = service.register_reader(&name, &email, genres.as_deref(), now)?;
            println!("Registered reader: {}", reader.name);
            println!("  ID: {}", reader.id);
        }

        ReaderCommands::List => {
            let readers = service.list_readers()?;
            let mut rows = Vec::with_capacity(readers.len());
            for reader in readers {
                let open = service.active_loan_count(reader.id)?;
                rows.push((reader, open));
            }

            print!("{}", format_reader_list(&rows));
            if !rows.is_empty() {
                println!("\nTotal: {} reader(s)", rows.len());
            } else {
                println!();
            }
        }

        ReaderCommands::Show { reader } => {
            let reader = service.get_reader(&reader)?;
            let loans = storage.library.loans_for_reader(reader.id)?;
            let books = storage.library.all_books()?;
            print!("{}", format_reader_details(&reader, &loans, &books));
        }

        ReaderCommands::Edit {
            reader,
            name,
            email,
            genres,
        } => {
            if name.is_none() && email.is_none() && genres.is_none() {
                println!("Nothing to change. Use --name, --email or --genres.");
                return Ok(());
            }

            let reader = service.get_reader(&reader)?;
            let updated = service.update_reader(
                reader.id,
                name.as_deref(),
                email.as_deref(),
                genres.as_deref(),
                now,
            )?;
            println!("Updated reader: {}", updated.name);
        }

        ReaderCommands::Delete { reader, force } => {
            let reader = service.get_reader(&reader)?;

            if !force {
                println!("About to delete reader '{}'.", reader.name);
                println!("Their loan history is kept. Use --force to confirm.");
                return Ok(());
            }

            service.delete_reader(reader.id, now)?;
            println!("Deleted reader: {}", reader.name);
        }
    }

    Ok(())
}
