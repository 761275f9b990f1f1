use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};

use shelf::cli::{
    handle_backup_command, handle_book_command, handle_export_command, handle_loan_command,
    handle_reader_command, run_startup_sync,
};
use shelf::config::{paths::ShelfPaths, settings::Settings};
use shelf::storage::Storage;

#[derive(Parser)]
#[command(
    name = "shelf",
    version,
    about = "Lending records for a community library, with off-site backups",
    long_about = "shelf keeps track of the readers of a small community library, \
                  the books they donate and the loans between them. Once a day \
                  the library file is copied to an off-site folder, and old \
                  copies are pruned by a retention policy."
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Skip the automatic backup sync before record commands
    #[arg(long, global = true)]
    no_sync: bool,

    /// Off-site folder for snapshots (overrides backup.remote_dir)
    #[arg(long, global = true, env = "SHELF_REMOTE_DIR")]
    remote_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reader management commands
    #[command(subcommand)]
    Reader(shelf::cli::ReaderCommands),

    /// Book management commands
    #[command(subcommand)]
    Book(shelf::cli::BookCommands),

    /// Lending commands
    #[command(subcommand)]
    Loan(shelf::cli::LoanCommands),

    /// Off-site backup commands
    #[command(subcommand)]
    Backup(shelf::cli::BackupCommands),

    /// Export library data
    #[command(subcommand)]
    Export(shelf::cli::ExportCommands),

    /// Initialize a new library
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    shelf::logging::init(cli.verbose);

    // Settings are validated here, before anything talks to the remote store
    let paths = ShelfPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    if let Some(dir) = cli.remote_dir {
        settings.backup.remote_dir = Some(dir);
        settings.validate()?;
    }

    let now = Utc::now();
    let today = now.with_timezone(&settings.backup.tz()?).date_naive();

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("shelf - lending records for a community library");
            println!();
            println!("Run 'shelf --help' for usage information.");
            println!("Run 'shelf init' to set up a new library.");
            return Ok(());
        }
    };

    let is_record_command = matches!(
        command,
        Commands::Reader(_) | Commands::Book(_) | Commands::Loan(_)
    );
    if is_record_command && !cli.no_sync {
        run_startup_sync(&paths, &settings, now);
    }

    match command {
        Commands::Reader(cmd) => {
            let storage = open_storage(&paths)?;
            handle_reader_command(&storage, now, cmd)?;
        }
        Commands::Book(cmd) => {
            let storage = open_storage(&paths)?;
            handle_book_command(&storage, now, cmd)?;
        }
        Commands::Loan(cmd) => {
            let storage = open_storage(&paths)?;
            handle_loan_command(&storage, settings.default_loan_days, now, today, cmd)?;
        }
        Commands::Backup(cmd) => {
            handle_backup_command(&paths, &settings, now, cmd)?;
        }
        Commands::Export(cmd) => {
            let storage = open_storage(&paths)?;
            handle_export_command(&storage, now, cmd)?;
        }
        Commands::Init => {
            println!("Initializing shelf at: {}", paths.base_dir().display());
            shelf::storage::initialize_storage(&paths)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            match &settings.backup.remote_dir {
                Some(dir) => println!("Snapshots will be kept in: {}", dir.display()),
                None => {
                    println!("No off-site folder configured yet. Set backup.remote_dir in");
                    println!("  {}", paths.settings_file().display());
                }
            }
        }
        Commands::Config => {
            println!("shelf Configuration");
            println!("===================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Library file:     {}", paths.library_file().display());
            println!("Export directory: {}", paths.export_dir().display());
            println!();
            println!("Settings:");
            println!("  Default loan length: {} day(s)", settings.default_loan_days);
            println!("  Date format:         {}", settings.date_format);
            println!();
            println!("Backup:");
            match &settings.backup.remote_dir {
                Some(dir) => println!("  Remote directory: {}", dir.display()),
                None => println!("  Remote directory: (not configured)"),
            }
            println!("  Time zone:        {}", settings.backup.timezone);
            println!("  Automatic sync:   {}", settings.backup.auto_sync);
            let policy = settings.backup.retention;
            println!(
                "  Retention:        last {}, monthly for {} month(s), daily for {} day(s)",
                policy.keep_last_n, policy.keep_monthly_for, policy.keep_daily_for
            );
        }
    }

    Ok(())
}

fn open_storage(paths: &ShelfPaths) -> Result<Storage> {
    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;
    Ok(storage)
}
