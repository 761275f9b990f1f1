//! Snapshot listing
//!
//! Wraps a [`RemoteStore`] listing: keeps only files named like snapshots and
//! orders them newest first.

use tracing::debug;

use super::snapshot::{is_snapshot_name, Snapshot};
use super::store::RemoteStore;
use crate::error::{ShelfError, ShelfResult};

/// Lists the backup snapshots held by a remote store
pub struct SnapshotLister<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RemoteStore + ?Sized> SnapshotLister<'a, S> {
    /// Create a lister over `store`
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All snapshots, newest `modified_at` first
    ///
    /// A reachable but empty store gives an empty list. Any failure to list
    /// is reported as `RemoteUnavailable`.
    pub fn list(&self) -> ShelfResult<Vec<Snapshot>> {
        let entries = self.store.list().map_err(|e| match e {
            ShelfError::RemoteUnavailable(_) => e,
            other => ShelfError::RemoteUnavailable(other.to_string()),
        })?;

        let total = entries.len();
        let mut snapshots: Vec<Snapshot> = entries
            .into_iter()
            .filter(|entry| {
                let keep = is_snapshot_name(&entry.name);
                if !keep {
                    debug!(name = %entry.name, "ignoring non-snapshot file in remote store");
                }
                keep
            })
            .collect();

        snapshots.sort_by(Snapshot::newest_first);

        debug!(
            location = %self.store.location(),
            total,
            snapshots = snapshots.len(),
            "listed remote snapshots"
        );

        Ok(snapshots)
    }

    /// The newest snapshot, if any
    pub fn latest(&self) -> ShelfResult<Option<Snapshot>> {
        Ok(self.list()?.into_iter().next())
    }

    /// Find a snapshot by exact name
    pub fn find(&self, name: &str) -> ShelfResult<Option<Snapshot>> {
        Ok(self.list()?.into_iter().find(|s| s.name == name))
    }
}
