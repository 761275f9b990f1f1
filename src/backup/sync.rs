//! Backup synchronization
//!
//! One run walks `Idle -> Listing -> (Creating) -> Evaluating -> (Pruning) -> Idle`:
//!
//! 1. List the remote snapshots. An unreachable store aborts the run.
//! 2. If the newest snapshot is from an earlier local day than `now` (or
//!    there is none), upload the database file as today's snapshot and list
//!    again so the new snapshot takes part in the evaluation.
//! 3. Evaluate the retention policy.
//! 4. Delete every irrelevant snapshot. Each delete stands alone.
//!
//! A dry run evaluates the listing plus a stand-in for the snapshot it would
//! upload, so it reports the deletions a real run makes.
//!
//! Create and delete failures are recorded in the [`SyncReport`], never
//! raised. There is no locking: two processes starting on the same day can
//! both upload a snapshot.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::lister::SnapshotLister;
use super::retention::{evaluate, RetentionPlan};
use super::snapshot::{snapshot_name, Snapshot};
use super::store::RemoteStore;
use crate::config::settings::RetentionPolicy;
use crate::error::{ShelfError, ShelfResult};

/// Phase of a synchronization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Listing,
    Creating,
    Evaluating,
    Pruning,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Listing => "listing",
            Self::Creating => "creating",
            Self::Evaluating => "evaluating",
            Self::Pruning => "pruning",
        };
        write!(f, "{}", name)
    }
}

/// Knobs for a single run
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Report what would happen without uploading or deleting
    pub dry_run: bool,
    /// Upload a snapshot even if one exists for today
    pub force_create: bool,
}

/// What happened to today's snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CreateOutcome {
    /// Uploaded
    Created { snapshot: Snapshot },
    /// Dry run: would have uploaded under this name
    Planned { name: String },
    /// Upload failed; the run carried on
    Failed { name: String, error: String },
}

impl CreateOutcome {
    /// Name of the snapshot this outcome is about
    pub fn name(&self) -> &str {
        match self {
            Self::Created { snapshot } => &snapshot.name,
            Self::Planned { name } | Self::Failed { name, .. } => name,
        }
    }

    /// Whether the upload failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of deleting one irrelevant snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PruneResult {
    Deleted,
    /// Dry run
    Planned,
    Failed { error: String },
}

/// Outcome of pruning one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct PruneOutcome {
    pub snapshot: Snapshot,
    pub result: PruneResult,
}

impl PruneOutcome {
    /// Whether the delete failed
    pub fn is_failure(&self) -> bool {
        matches!(self.result, PruneResult::Failed { .. })
    }
}

/// Full account of a synchronization run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// States entered, in order, ending with `Idle`
    pub states: Vec<SyncState>,
    /// Snapshots found by the first listing
    pub listed: usize,
    /// Whether the run checked for today's snapshot
    pub create_checked: bool,
    /// Snapshot creation, if one was attempted
    pub created: Option<CreateOutcome>,
    /// Snapshots the policy keeps
    pub kept: Vec<Snapshot>,
    /// One entry per irrelevant snapshot
    pub pruned: Vec<PruneOutcome>,
    /// Whether nothing was written to the store
    pub dry_run: bool,
}

impl SyncReport {
    fn new(dry_run: bool) -> Self {
        Self {
            states: vec![SyncState::Idle],
            listed: 0,
            create_checked: false,
            created: None,
            kept: Vec::new(),
            pruned: Vec::new(),
            dry_run,
        }
    }

    fn enter(&mut self, state: SyncState) {
        debug!(%state, "backup sync state");
        self.states.push(state);
    }

    /// Whether any create or delete failed
    pub fn has_failures(&self) -> bool {
        self.created.as_ref().is_some_and(CreateOutcome::is_failure)
            || self.pruned.iter().any(PruneOutcome::is_failure)
    }

    /// Number of snapshots actually deleted
    pub fn deleted_count(&self) -> usize {
        self.pruned
            .iter()
            .filter(|p| p.result == PruneResult::Deleted)
            .count()
    }

    /// One line per operation, for terminal output
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        match &self.created {
            Some(CreateOutcome::Created { snapshot }) => {
                lines.push(format!("Created snapshot {}", snapshot.name))
            }
            Some(CreateOutcome::Planned { name }) => {
                lines.push(format!("Would create snapshot {}", name))
            }
            Some(CreateOutcome::Failed { name, error }) => {
                lines.push(format!("Failed to create snapshot {}: {}", name, error))
            }
            None if self.create_checked => {
                lines.push("Today's snapshot already exists".to_string())
            }
            None => {}
        }

        for outcome in &self.pruned {
            let line = match &outcome.result {
                PruneResult::Deleted => format!("Pruned {}", outcome.snapshot.name),
                PruneResult::Planned => format!("Would prune {}", outcome.snapshot.name),
                PruneResult::Failed { error } => {
                    format!("Failed to prune {}: {}", outcome.snapshot.name, error)
                }
            };
            lines.push(line);
        }

        lines.push(format!("Keeping {} snapshot(s)", self.kept.len()));
        lines
    }
}

/// Whether a new snapshot is due at `now`
///
/// True when there is no snapshot yet, or when the newest one was taken on
/// an earlier calendar day in `tz`.
pub fn needs_snapshot(latest: Option<&Snapshot>, now: DateTime<Utc>, tz: &Tz) -> bool {
    match latest {
        None => true,
        Some(snapshot) => snapshot.local_date(tz) < now.with_timezone(tz).date_naive(),
    }
}

/// `snapshots` with `added` in place of any same-named entry, newest first
fn with_snapshot(mut snapshots: Vec<Snapshot>, added: &Snapshot) -> Vec<Snapshot> {
    snapshots.retain(|s| s.name != added.name);
    snapshots.push(added.clone());
    snapshots.sort_by(Snapshot::newest_first);
    snapshots
}

/// Creates the daily snapshot and prunes what the policy no longer needs
pub struct BackupSynchronizer<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    policy: RetentionPolicy,
    tz: Tz,
    database_file: PathBuf,
}

impl<'a, S: RemoteStore + ?Sized> BackupSynchronizer<'a, S> {
    /// Create a synchronizer
    ///
    /// `database_file` is the file uploaded as a snapshot; `tz` decides
    /// where one calendar day ends and the next begins.
    pub fn new(
        store: &'a S,
        policy: RetentionPolicy,
        tz: Tz,
        database_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            policy,
            tz,
            database_file: database_file.into(),
        }
    }

    /// The file uploaded as a snapshot
    pub fn database_file(&self) -> &Path {
        &self.database_file
    }

    /// Snapshot name for a creation at `now`, in local time
    pub fn name_for(&self, now: DateTime<Utc>) -> String {
        snapshot_name(now.with_timezone(&self.tz).naive_local())
    }

    /// Upload the database file as a snapshot taken at `now`
    pub fn create_snapshot(&self, now: DateTime<Utc>) -> ShelfResult<Snapshot> {
        let name = self.name_for(now);
        let bytes = std::fs::read(&self.database_file).map_err(|e| {
            ShelfError::Io(format!(
                "Failed to read database file {}: {}",
                self.database_file.display(),
                e
            ))
        })?;

        self.store.upload(&bytes, &name)
    }

    /// Evaluate the policy against the current remote listing
    pub fn plan(&self, now: DateTime<Utc>) -> ShelfResult<RetentionPlan> {
        let snapshots = SnapshotLister::new(self.store).list()?;
        Ok(evaluate(&snapshots, &self.policy, now))
    }

    /// Run one synchronization
    ///
    /// Fails only when the initial listing fails.
    pub fn run(&self, now: DateTime<Utc>, options: SyncOptions) -> ShelfResult<SyncReport> {
        let lister = SnapshotLister::new(self.store);
        let mut report = SyncReport::new(options.dry_run);

        let mut snapshots = self.list(&lister, &mut report)?;
        let mut pending = None;

        report.create_checked = true;
        if options.force_create || needs_snapshot(snapshots.first(), now, &self.tz) {
            report.enter(SyncState::Creating);
            let outcome = self.create(now, options.dry_run);

            match &outcome {
                CreateOutcome::Created { snapshot } => {
                    snapshots = self.relist(&lister, snapshots, snapshot);
                }
                CreateOutcome::Planned { name } => {
                    // Stand-in for the upload, modified at `now` like a real one
                    let stand_in = Snapshot::new(name.clone(), String::new(), now);
                    snapshots = with_snapshot(snapshots, &stand_in);
                    pending = Some(stand_in.name);
                }
                CreateOutcome::Failed { .. } => {}
            }
            report.created = Some(outcome);
        }

        self.evaluate_and_prune(&mut report, &snapshots, now, pending.as_deref());
        Ok(report)
    }

    /// Delete what the policy no longer keeps, without creating a snapshot
    ///
    /// With `dry_run` nothing is deleted; the report lists the same
    /// snapshots a real call would delete against the same listing.
    pub fn prune_irrelevant(&self, now: DateTime<Utc>, dry_run: bool) -> ShelfResult<SyncReport> {
        let lister = SnapshotLister::new(self.store);
        let mut report = SyncReport::new(dry_run);

        let snapshots = self.list(&lister, &mut report)?;
        self.evaluate_and_prune(&mut report, &snapshots, now, None);
        Ok(report)
    }

    fn list(
        &self,
        lister: &SnapshotLister<'_, S>,
        report: &mut SyncReport,
    ) -> ShelfResult<Vec<Snapshot>> {
        report.enter(SyncState::Listing);
        let snapshots = lister.list().map_err(|e| {
            warn!(location = %self.store.location(), error = %e, "cannot list backups");
            e
        })?;
        report.listed = snapshots.len();
        Ok(snapshots)
    }

    /// Evaluate `snapshots` and prune the irrelevant ones
    ///
    /// `pending` names a dry-run stand-in; it takes part in the evaluation
    /// but is neither kept nor pruned.
    fn evaluate_and_prune(
        &self,
        report: &mut SyncReport,
        snapshots: &[Snapshot],
        now: DateTime<Utc>,
        pending: Option<&str>,
    ) {
        report.enter(SyncState::Evaluating);
        let plan = evaluate(snapshots, &self.policy, now);
        debug!(
            relevant = plan.relevant.len(),
            irrelevant = plan.irrelevant.len(),
            "evaluated retention policy"
        );

        let is_real = |s: &Snapshot| Some(s.name.as_str()) != pending;
        let irrelevant: Vec<Snapshot> = plan.irrelevant.into_iter().filter(is_real).collect();

        if !irrelevant.is_empty() {
            report.enter(SyncState::Pruning);
        }
        for snapshot in irrelevant {
            let result = self.prune(&snapshot, report.dry_run);
            report.pruned.push(PruneOutcome { snapshot, result });
        }

        report.kept = plan.relevant.into_iter().filter(is_real).collect();
        report.enter(SyncState::Idle);

        info!(
            created = report.created.as_ref().map(CreateOutcome::name),
            deleted = report.deleted_count(),
            kept = report.kept.len(),
            failures = report.has_failures(),
            dry_run = report.dry_run,
            "backup sync finished"
        );
    }

    fn create(&self, now: DateTime<Utc>, dry_run: bool) -> CreateOutcome {
        let name = self.name_for(now);
        if dry_run {
            return CreateOutcome::Planned { name };
        }

        match self.create_snapshot(now) {
            Ok(snapshot) => {
                info!(name = %snapshot.name, "created today's backup snapshot");
                CreateOutcome::Created { snapshot }
            }
            Err(e) => {
                warn!(%name, error = %e, "failed to create backup snapshot");
                CreateOutcome::Failed {
                    name,
                    error: e.to_string(),
                }
            }
        }
    }

    /// List again after an upload
    ///
    /// If that fails, the earlier listing plus the new snapshot is used.
    fn relist(
        &self,
        lister: &SnapshotLister<'_, S>,
        mut previous: Vec<Snapshot>,
        created: &Snapshot,
    ) -> Vec<Snapshot> {
        match lister.list() {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!(
                    error = %e,
                    created = %created.name,
                    "re-listing after upload failed; evaluating the earlier listing"
                );
                with_snapshot(previous, created)
            }
        }
    }

    fn prune(&self, snapshot: &Snapshot, dry_run: bool) -> PruneResult {
        if dry_run {
            return PruneResult::Planned;
        }

        match self.store.delete(&snapshot.name) {
            Ok(()) => {
                info!(name = %snapshot.name, "pruned backup snapshot no longer kept by policy");
                PruneResult::Deleted
            }
            Err(e) => {
                warn!(name = %snapshot.name, error = %e, "failed to prune backup snapshot");
                PruneResult::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::store::MemoryStore;
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct Fixture {
        store: MemoryStore,
        database: PathBuf,
        _temp: TempDir,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let database = temp.path().join("library.json");
        std::fs::write(&database, br#"{"readers":[],"books":[],"loans":[]}"#).unwrap();
        Fixture {
            store: MemoryStore::new(),
            database,
            _temp: temp,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn seed_day(store: &MemoryStore, when: DateTime<Utc>) -> String {
        let name = format!("backup_{}.db", when.format("%Y_%m_%d_%H_%M_%S"));
        store.insert(&name, b"old", when);
        name
    }

    #[test]
    fn test_needs_snapshot() {
        let now = utc(2024, 3, 20, 12);
        assert!(needs_snapshot(None, now, &chrono_tz::UTC));

        let today = Snapshot::new("backup_2024_03_20_08_00_00.db", "h", utc(2024, 3, 20, 8));
        assert!(!needs_snapshot(Some(&today), now, &chrono_tz::UTC));

        let yesterday = Snapshot::new("backup_2024_03_19_08_00_00.db", "h", utc(2024, 3, 19, 8));
        assert!(needs_snapshot(Some(&yesterday), now, &chrono_tz::UTC));
    }

    #[test]
    fn test_needs_snapshot_uses_local_day() {
        // 02:00 UTC on the 20th is 23:00 on the 19th in Sao Paulo
        let tz = chrono_tz::America::Sao_Paulo;
        let now = utc(2024, 3, 20, 2);
        let evening = Snapshot::new("backup_2024_03_19_20_00_00.db", "h", utc(2024, 3, 19, 23));

        assert!(!needs_snapshot(Some(&evening), now, &tz));
        assert!(needs_snapshot(Some(&evening), now, &chrono_tz::UTC));
    }

    #[test]
    fn test_first_run_creates_snapshot() {
        let fx = fixture();
        let now = utc(2024, 3, 20, 12);
        fx.store.set_upload_time(now);

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::new(3, 1, 7),
            chrono_tz::UTC,
            &fx.database,
        );
        let report = sync.run(now, SyncOptions::default()).unwrap();

        assert_eq!(report.listed, 0);
        assert!(matches!(report.created, Some(CreateOutcome::Created { .. })));
        assert_eq!(fx.store.names(), vec!["backup_2024_03_20_12_00_00.db"]);
        assert_eq!(report.kept.len(), 1);
        assert!(report.pruned.is_empty());
        assert_eq!(
            report.states,
            vec![
                SyncState::Idle,
                SyncState::Listing,
                SyncState::Creating,
                SyncState::Evaluating,
                SyncState::Idle,
            ]
        );
    }

    #[test]
    fn test_snapshot_name_uses_local_time() {
        let fx = fixture();
        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::default(),
            chrono_tz::America::Sao_Paulo,
            &fx.database,
        );
        assert_eq!(
            sync.name_for(utc(2024, 3, 20, 12)),
            "backup_2024_03_20_09_00_00.db"
        );
    }

    #[test]
    fn test_no_create_when_today_exists() {
        let fx = fixture();
        let now = utc(2024, 3, 20, 12);
        seed_day(&fx.store, utc(2024, 3, 20, 8));

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::new(1, 0, 1),
            chrono_tz::UTC,
            &fx.database,
        );
        let report = sync.run(now, SyncOptions::default()).unwrap();

        assert!(report.created.is_none());
        assert_eq!(fx.store.names().len(), 1);
        assert_eq!(
            report.states,
            vec![
                SyncState::Idle,
                SyncState::Listing,
                SyncState::Evaluating,
                SyncState::Idle,
            ]
        );
    }

    #[test]
    fn test_prunes_after_create_against_fresh_listing() {
        let fx = fixture();
        let now = utc(2024, 3, 20, 12);
        fx.store.set_upload_time(now);
        let oldest = seed_day(&fx.store, utc(2024, 3, 17, 8));
        let middle = seed_day(&fx.store, utc(2024, 3, 18, 8));
        let newest_old = seed_day(&fx.store, utc(2024, 3, 19, 8));

        // Keep only the last two snapshots
        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::new(2, 0, 0),
            chrono_tz::UTC,
            &fx.database,
        );
        let report = sync.run(now, SyncOptions::default()).unwrap();

        // Evaluated with today's snapshot included, so two old ones go
        assert_eq!(report.deleted_count(), 2);
        assert!(!fx.store.contains(&oldest));
        assert!(!fx.store.contains(&middle));
        assert!(fx.store.contains(&newest_old));
        assert!(fx.store.contains("backup_2024_03_20_12_00_00.db"));
        assert!(!report.has_failures());
        assert_eq!(report.states.last(), Some(&SyncState::Idle));
        assert!(report.states.contains(&SyncState::Pruning));
    }

    #[test]
    fn test_create_failure_is_reported_and_pruning_continues() {
        let fx = fixture();
        let now = utc(2024, 3, 20, 12);
        fx.store.set_fail_uploads(true);
        let old = seed_day(&fx.store, utc(2024, 1, 10, 8));
        let recent = seed_day(&fx.store, utc(2024, 3, 19, 8));

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::new(1, 0, 1),
            chrono_tz::UTC,
            &fx.database,
        );
        let report = sync.run(now, SyncOptions::default()).unwrap();

        assert!(report.created.as_ref().unwrap().is_failure());
        assert!(report.has_failures());
        assert!(!fx.store.contains(&old));
        assert!(fx.store.contains(&recent));
    }

    #[test]
    fn test_missing_database_file_is_a_create_failure() {
        let fx = fixture();
        let now = utc(2024, 3, 20, 12);
        std::fs::remove_file(&fx.database).unwrap();

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::default(),
            chrono_tz::UTC,
            &fx.database,
        );
        let report = sync.run(now, SyncOptions::default()).unwrap();

        match report.created {
            Some(CreateOutcome::Failed { error, .. }) => assert!(error.contains("database file")),
            other => panic!("expected failed creation, got {:?}", other),
        }
    }

    #[test]
    fn test_one_failed_delete_does_not_block_others() {
        let fx = fixture();
        let now = utc(2024, 3, 20, 12);
        seed_day(&fx.store, utc(2024, 3, 20, 8));
        let stuck = seed_day(&fx.store, utc(2024, 3, 18, 8));
        let gone = seed_day(&fx.store, utc(2024, 3, 17, 8));
        fx.store.fail_delete_of(&stuck);

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::new(1, 0, 1),
            chrono_tz::UTC,
            &fx.database,
        );
        let report = sync.run(now, SyncOptions::default()).unwrap();

        assert_eq!(report.pruned.len(), 2);
        assert_eq!(report.deleted_count(), 1);
        assert!(report.has_failures());
        assert!(fx.store.contains(&stuck));
        assert!(!fx.store.contains(&gone));
        assert!(report
            .summary_lines()
            .iter()
            .any(|line| line.starts_with("Failed to prune")));
    }

    #[test]
    fn test_unreachable_store_aborts() {
        let fx = fixture();
        fx.store.set_offline(true);

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::default(),
            chrono_tz::UTC,
            &fx.database,
        );
        let err = sync
            .run(utc(2024, 3, 20, 12), SyncOptions::default())
            .unwrap_err();

        assert!(err.is_remote_unavailable());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let fx = fixture();
        let now = utc(2024, 3, 20, 12);
        fx.store.set_upload_time(now);
        let old = seed_day(&fx.store, utc(2024, 1, 1, 8));
        let yesterday = seed_day(&fx.store, utc(2024, 3, 19, 8));

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::new(1, 0, 1),
            chrono_tz::UTC,
            &fx.database,
        );
        let dry_run = SyncOptions {
            dry_run: true,
            force_create: false,
        };
        let preview = sync.run(now, dry_run).unwrap();

        assert!(matches!(preview.created, Some(CreateOutcome::Planned { .. })));
        assert!(preview
            .pruned
            .iter()
            .all(|p| p.result == PruneResult::Planned));
        assert!(preview.kept.is_empty());
        assert_eq!(fx.store.names(), vec![old.clone(), yesterday.clone()]);

        // Today's snapshot displaces yesterday's, in the preview as for real
        let real = sync.run(now, SyncOptions::default()).unwrap();
        let names = |report: &SyncReport| -> Vec<String> {
            let mut names: Vec<_> = report.pruned.iter().map(|p| p.snapshot.name.clone()).collect();
            names.sort();
            names
        };
        assert_eq!(names(&preview), vec![old.clone(), yesterday.clone()]);
        assert_eq!(names(&preview), names(&real));
        assert_eq!(real.deleted_count(), 2);
        assert_eq!(fx.store.names(), vec!["backup_2024_03_20_12_00_00.db"]);
    }

    #[test]
    fn test_dry_run_stand_in_is_never_reported_as_kept() {
        let fx = fixture();
        let now = utc(2024, 3, 20, 12);
        let yesterday = seed_day(&fx.store, utc(2024, 3, 19, 8));

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::new(2, 0, 0),
            chrono_tz::UTC,
            &fx.database,
        );
        let preview = sync
            .run(
                now,
                SyncOptions {
                    dry_run: true,
                    force_create: false,
                },
            )
            .unwrap();

        assert!(preview.pruned.is_empty());
        let kept: Vec<_> = preview.kept.iter().map(|s| s.name.clone()).collect();
        assert_eq!(kept, vec![yesterday]);
    }

    #[test]
    fn test_prune_irrelevant_never_creates() {
        let fx = fixture();
        let now = utc(2030, 3, 20, 9);
        fx.store.set_upload_time(now);
        let only = seed_day(&fx.store, utc(2024, 3, 18, 9));

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::default(),
            chrono_tz::UTC,
            &fx.database,
        );
        let report = sync.prune_irrelevant(now, false).unwrap();

        assert!(report.created.is_none());
        assert!(report.pruned.is_empty());
        assert_eq!(fx.store.names(), vec![only]);
        assert!(!report.states.contains(&SyncState::Creating));
        assert!(!report
            .summary_lines()
            .iter()
            .any(|line| line.contains("snapshot already exists")));
    }

    #[test]
    fn test_prune_preview_matches_forced_prune() {
        let fx = fixture();
        let now = utc(2024, 3, 20, 12);
        let keep = seed_day(&fx.store, utc(2024, 3, 19, 8));
        seed_day(&fx.store, utc(2024, 3, 18, 8));
        seed_day(&fx.store, utc(2024, 2, 1, 8));

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::new(1, 0, 1),
            chrono_tz::UTC,
            &fx.database,
        );
        let preview = sync.prune_irrelevant(now, true).unwrap();
        assert_eq!(fx.store.names().len(), 3);

        let forced = sync.prune_irrelevant(now, false).unwrap();
        let preview_names: Vec<_> = preview.pruned.iter().map(|p| &p.snapshot.name).collect();
        let forced_names: Vec<_> = forced.pruned.iter().map(|p| &p.snapshot.name).collect();
        assert_eq!(preview_names, forced_names);
        assert_eq!(forced.deleted_count(), 2);
        assert_eq!(fx.store.names(), vec![keep]);
    }

    #[test]
    fn test_force_create_uploads_second_snapshot_same_day() {
        let fx = fixture();
        let now = utc(2024, 3, 20, 12);
        fx.store.set_upload_time(now);
        seed_day(&fx.store, utc(2024, 3, 20, 8));

        let sync = BackupSynchronizer::new(
            &fx.store,
            RetentionPolicy::new(5, 0, 0),
            chrono_tz::UTC,
            &fx.database,
        );
        let report = sync
            .run(
                now,
                SyncOptions {
                    dry_run: false,
                    force_create: true,
                },
            )
            .unwrap();

        assert!(matches!(report.created, Some(CreateOutcome::Created { .. })));
        assert_eq!(fx.store.names().len(), 2);
    }

    // Two processes starting on the same day can both see "no snapshot for
    // today" and both upload. Nothing here prevents that; the next run's
    // daily rule folds the duplicates back down to one per day.
    #[test]
    fn test_concurrent_same_day_runs_are_not_coordinated() {
        let fx = fixture();
        let first = utc(2024, 3, 20, 12);
        let second = first + chrono::Duration::seconds(1);
        seed_day(&fx.store, utc(2024, 3, 19, 8));

        let policy = RetentionPolicy::new(0, 0, 2);
        let sync = BackupSynchronizer::new(&fx.store, policy, chrono_tz::UTC, &fx.database);

        // Both "processes" listed before either uploaded
        let listing = SnapshotLister::new(&fx.store).list().unwrap();
        assert!(needs_snapshot(listing.first(), first, &chrono_tz::UTC));
        fx.store.set_upload_time(first);
        sync.create_snapshot(first).unwrap();
        fx.store.set_upload_time(second);
        sync.create_snapshot(second).unwrap();

        let report = sync.run(second, SyncOptions::default()).unwrap();
        assert!(report.created.is_none());
        assert_eq!(report.kept.len(), 2);
    }
}
