//! Off-site backup system for shelf
//!
//! Keeps dated copies of the library file in a remote store and prunes
//! the ones the retention policy no longer needs.
//!
//! # Architecture
//!
//! - `RemoteStore`: upload / download / delete / list against the remote
//!   namespace (`DirectoryStore` for a mounted or synced folder,
//!   `MemoryStore` for tests)
//! - `SnapshotLister`: remote listing filtered to snapshots, newest first
//! - `retention::evaluate`: pure keep-last / keep-monthly / keep-daily
//!   evaluation against a caller-supplied instant
//! - `BackupSynchronizer`: the once-per-start routine that creates today's
//!   snapshot and prunes the rest
//! - `RestoreManager`: pulls a snapshot back over the library file
//!
//! # Example
//!
//! ```rust,ignore
//! use shelf::backup::{BackupSynchronizer, DirectoryStore, SyncOptions};
//!
//! let store = DirectoryStore::new("/mnt/offsite/shelf");
//! let sync = BackupSynchronizer::new(&store, settings.backup.retention, tz, paths.library_file());
//! let report = sync.run(chrono::Utc::now(), SyncOptions::default())?;
//! for line in report.summary_lines() {
//!     println!("{}", line);
//! }
//! ```

pub mod lister;
pub mod restore;
pub mod retention;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use lister::SnapshotLister;
pub use restore::{RestoreManager, RestoreResult};
pub use retention::{evaluate, RetentionPlan};
pub use snapshot::{snapshot_name, Snapshot};
pub use store::{DirectoryStore, MemoryStore, RemoteStore};
pub use sync::{
    needs_snapshot, BackupSynchronizer, CreateOutcome, PruneOutcome, PruneResult, SyncOptions,
    SyncReport, SyncState,
};
pub use crate::config::settings::RetentionPolicy;
