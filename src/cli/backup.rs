//! Backup CLI commands
//!
//! Implements CLI commands for the off-site snapshot store, plus the
//! automatic sync run performed when a record command starts.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use tracing::warn;

use crate::backup::{
    BackupSynchronizer, DirectoryStore, RemoteStore, RestoreManager, SnapshotLister, SyncOptions,
    SyncReport,
};
use crate::config::paths::ShelfPaths;
use crate::config::settings::Settings;
use crate::display::{format_size, format_snapshot_list};
use crate::error::{ShelfError, ShelfResult};

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create today's snapshot if needed, then prune
    Sync {
        /// Show what would happen without uploading or deleting
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Upload a snapshot even if one exists for today
        #[arg(long)]
        force_create: bool,
    },

    /// Upload a snapshot now, whatever the date
    Create,

    /// List all snapshots in the remote store
    List,

    /// List the snapshots the retention policy keeps
    Relevant,

    /// Delete snapshots the retention policy no longer needs
    Prune {
        /// Delete instead of only showing what would go
        #[arg(short, long)]
        force: bool,
    },

    /// Replace local data with a snapshot
    Restore {
        /// Snapshot name (use 'latest' for most recent)
        snapshot: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Open the configured remote store
pub fn open_store(settings: &Settings) -> ShelfResult<DirectoryStore> {
    settings
        .backup
        .remote_dir
        .as_ref()
        .map(|dir| DirectoryStore::new(dir.clone()))
        .ok_or_else(|| {
            ShelfError::Config(
                "No remote directory configured. Set backup.remote_dir in config.json \
                 or pass --remote-dir"
                    .into(),
            )
        })
}

fn synchronizer<'a>(
    store: &'a DirectoryStore,
    paths: &ShelfPaths,
    settings: &Settings,
) -> ShelfResult<BackupSynchronizer<'a, DirectoryStore>> {
    Ok(BackupSynchronizer::new(
        store,
        settings.backup.retention,
        settings.backup.tz()?,
        paths.library_file(),
    ))
}

/// Handle a backup command
pub fn handle_backup_command(
    paths: &ShelfPaths,
    settings: &Settings,
    now: DateTime<Utc>,
    cmd: BackupCommands,
) -> ShelfResult<()> {
    let store = open_store(settings)?;
    let tz = settings.backup.tz()?;
    let sync = synchronizer(&store, paths, settings)?;

    match cmd {
        BackupCommands::Sync {
            dry_run,
            force_create,
        } => {
            let report = sync.run(
                now,
                SyncOptions {
                    dry_run,
                    force_create,
                },
            )?;
            print_report(&report);

            if report.has_failures() {
                return Err(ShelfError::RemoteUnavailable(format!(
                    "some backup operations failed against {}",
                    store.location()
                )));
            }
        }

        BackupCommands::Create => {
            println!("Uploading snapshot to {}...", store.location());
            let snapshot = sync.create_snapshot(now)?;
            println!("Snapshot created: {}", snapshot.name);
        }

        BackupCommands::List => {
            let snapshots = SnapshotLister::new(&store).list()?;
            let plan = sync.plan(now)?;

            println!("Snapshots in {}", store.location());
            println!();
            print!("{}", format_snapshot_list(&snapshots, Some(&plan), now, &tz));
            println!();
            println!(
                "Total: {} snapshot(s), {} kept by policy",
                snapshots.len(),
                plan.relevant.len()
            );
        }

        BackupCommands::Relevant => {
            let plan = sync.plan(now)?;
            print!("{}", format_snapshot_list(&plan.relevant, None, now, &tz));
            println!();
        }

        BackupCommands::Prune { force } => {
            let report = sync.prune_irrelevant(now, !force)?;

            if report.pruned.is_empty() {
                println!("No snapshots to prune.");
                println!("Keeping {} snapshot(s).", report.kept.len());
                return Ok(());
            }

            print_report(&report);
            if !force {
                println!();
                println!("To delete these snapshots, run again with --force flag:");
                println!("  shelf backup prune --force");
            } else if report.has_failures() {
                return Err(ShelfError::RemoteUnavailable(format!(
                    "some snapshots could not be deleted from {}",
                    store.location()
                )));
            }
        }

        BackupCommands::Restore { snapshot, force } => {
            let manager = RestoreManager::new(&store, paths.library_file());

            if !force {
                let (found, bytes) = manager.fetch(&snapshot)?;
                println!("Snapshot Information");
                println!("====================");
                println!("Name:     {}", found.name);
                println!(
                    "Modified: {}",
                    found
                        .modified_at
                        .with_timezone(&tz)
                        .format("%Y-%m-%d %H:%M:%S %Z")
                );
                println!("Size:     {}", format_size(bytes.len() as u64));
                println!();
                println!("WARNING: This will overwrite ALL current data!");
                println!("To proceed, run again with --force flag:");
                println!("  shelf backup restore {} --force", snapshot);
                return Ok(());
            }

            println!("Restoring from snapshot...");
            let result = manager.restore(&snapshot)?;
            println!("Restore complete!");
            println!("{}", result.summary());
        }
    }

    Ok(())
}

/// Run the sync once at start-up of a record command
///
/// Does nothing unless a remote directory is configured and `auto_sync` is
/// on. Never fails: problems are logged and reported on stderr.
pub fn run_startup_sync(
    paths: &ShelfPaths,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Option<SyncReport> {
    if !settings.backup.is_enabled() || !settings.backup.auto_sync {
        return None;
    }

    let result = open_store(settings).and_then(|store| {
        let report = synchronizer(&store, paths, settings)?.run(now, SyncOptions::default());
        report
    });

    match result {
        Ok(report) => {
            if report.has_failures() {
                for line in report.summary_lines() {
                    eprintln!("backup: {}", line);
                }
            }
            Some(report)
        }
        Err(e) => {
            warn!(error = %e, "automatic backup sync skipped");
            eprintln!("backup: skipped ({})", e);
            None
        }
    }
}

fn print_report(report: &SyncReport) {
    if report.dry_run {
        println!("Dry run: nothing was uploaded or deleted.");
    }
    for line in report.summary_lines() {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::initialize_storage;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn setup(remote: bool) -> (TempDir, ShelfPaths, Settings) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ShelfPaths::with_base_dir(temp_dir.path().join("home"));
        let mut settings = initialize_storage(&paths).unwrap();
        if remote {
            let remote_dir = temp_dir.path().join("remote");
            std::fs::create_dir_all(&remote_dir).unwrap();
            settings.backup.remote_dir = Some(remote_dir);
        }
        (temp_dir, paths, settings)
    }

    #[test]
    fn test_backup_without_remote_is_config_error() {
        let (_temp_dir, paths, settings) = setup(false);
        let err = handle_backup_command(&paths, &settings, Utc::now(), BackupCommands::List)
            .unwrap_err();
        assert!(matches!(err, ShelfError::Config(_)));
    }

    #[test]
    fn test_startup_sync_creates_snapshot() {
        let (temp_dir, paths, settings) = setup(true);
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 9, 0, 0).unwrap();

        let report = run_startup_sync(&paths, &settings, now).unwrap();
        assert!(!report.has_failures());
        assert!(temp_dir
            .path()
            .join("remote")
            .join("backup_2024_03_20_09_00_00.db")
            .exists());
    }

    #[test]
    fn test_startup_sync_disabled() {
        let (_temp_dir, paths, mut settings) = setup(true);
        settings.backup.auto_sync = false;
        assert!(run_startup_sync(&paths, &settings, Utc::now()).is_none());

        let (_temp_dir, paths, settings) = setup(false);
        assert!(run_startup_sync(&paths, &settings, Utc::now()).is_none());
    }

    #[test]
    fn test_startup_sync_unreachable_remote_does_not_fail() {
        let (temp_dir, paths, mut settings) = setup(false);
        settings.backup.remote_dir = Some(temp_dir.path().join("not-mounted"));
        assert!(run_startup_sync(&paths, &settings, Utc::now()).is_none());
    }

    #[test]
    fn test_prune_without_force_keeps_everything() {
        let (temp_dir, paths, mut settings) = setup(true);
        settings.backup.retention = crate::config::RetentionPolicy::new(1, 0, 0);
        let remote = temp_dir.path().join("remote");
        std::fs::write(remote.join("backup_2024_03_18_09_00_00.db"), b"{}").unwrap();
        std::fs::write(remote.join("backup_2024_03_19_09_00_00.db"), b"{}").unwrap();

        let now = Utc::now();
        handle_backup_command(&paths, &settings, now, BackupCommands::Prune { force: false })
            .unwrap();
        assert_eq!(std::fs::read_dir(&remote).unwrap().count(), 2);
    }

    #[test]
    fn test_forced_prune_does_not_upload() {
        let (temp_dir, paths, settings) = setup(true);
        let remote = temp_dir.path().join("remote");
        std::fs::write(remote.join("backup_2024_03_18_09_00_00.db"), b"{}").unwrap();

        let now = Utc.with_ymd_and_hms(2030, 3, 20, 9, 0, 0).unwrap();
        handle_backup_command(&paths, &settings, now, BackupCommands::Prune { force: true })
            .unwrap();

        let names: Vec<_> = std::fs::read_dir(&remote)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["backup_2024_03_18_09_00_00.db"]);
    }
}
