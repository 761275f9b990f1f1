//! CLI commands for data export
//!
//! Provides commands for exporting library data in various formats.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Subcommand;

use crate::error::{ShelfError, ShelfResult};
use crate::export::{self, csv, json};
use crate::storage::Storage;

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export everything (CSV sheets, JSON and a raw library copy) to a folder
    All {
        /// Output folder (defaults to the exports folder)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Export the full library to a JSON file
    Json {
        /// Output file path
        output: PathBuf,
    },

    /// Export readers to CSV
    Readers {
        /// Output file path
        output: PathBuf,
    },

    /// Export books to CSV
    Books {
        /// Output file path
        output: PathBuf,
    },

    /// Export loans to CSV
    Loans {
        /// Output file path
        output: PathBuf,
    },
}

/// Handle export commands
pub fn handle_export_command(
    storage: &Storage,
    now: DateTime<Utc>,
    cmd: ExportCommands,
) -> ShelfResult<()> {
    match cmd {
        ExportCommands::All { dir } => {
            let dir = dir.unwrap_or_else(|| storage.paths().export_dir());
            let summary = export::export_all(storage, &dir, now)?;
            println!(
                "Exported {} reader(s), {} book(s), {} loan(s) to {}",
                summary.readers,
                summary.books,
                summary.loans,
                dir.display()
            );
            for file in &summary.files {
                println!("  {}", file.display());
            }
        }
        ExportCommands::Json { output } => {
            let export = json::export_full_json(storage, &mut create_file(&output)?, now)?;
            println!(
                "Full library exported to: {} ({} readers, {} books, {} loans)",
                output.display(),
                export.metadata.reader_count,
                export.metadata.book_count,
                export.metadata.loan_count
            );
        }
        ExportCommands::Readers { output } => {
            let count = csv::export_readers_csv(storage, create_file(&output)?)?;
            println!("Exported {} readers to: {}", count, output.display());
        }
        ExportCommands::Books { output } => {
            let count = csv::export_books_csv(storage, create_file(&output)?)?;
            println!("Exported {} books to: {}", count, output.display());
        }
        ExportCommands::Loans { output } => {
            let count = csv::export_loans_csv(storage, create_file(&output)?)?;
            println!("Exported {} loans to: {}", count, output.display());
        }
    }

    Ok(())
}

fn create_file(output: &PathBuf) -> ShelfResult<BufWriter<File>> {
    let file = File::create(output).map_err(|e| {
        ShelfError::Export(format!(
            "Failed to create file {}: {}",
            output.display(),
            e
        ))
    })?;
    Ok(BufWriter::new(file))
}
