//! Remote store clients
//!
//! The synchronizer only needs four operations from the off-site store:
//! upload, download, delete and list. Authentication, token refresh and
//! timeouts belong to the implementation behind [`RemoteStore`].

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::snapshot::{content_hash, is_snapshot_name, Snapshot};
use crate::error::{ShelfError, ShelfResult};

/// Suffix of in-flight uploads in a [`DirectoryStore`]
const PARTIAL_SUFFIX: &str = ".part";

/// Operations the backup engine consumes from a remote blob store
pub trait RemoteStore {
    /// Store `bytes` under `name`, replacing any existing blob
    fn upload(&self, bytes: &[u8], name: &str) -> ShelfResult<Snapshot>;

    /// Fetch the blob stored under `name`
    fn download(&self, name: &str) -> ShelfResult<Vec<u8>>;

    /// Remove the blob stored under `name`
    fn delete(&self, name: &str) -> ShelfResult<()>;

    /// Blobs in the namespace, in no particular order
    ///
    /// A store may leave out blobs whose names are not snapshot names.
    fn list(&self) -> ShelfResult<Vec<Snapshot>>;

    /// Human-readable location, for logs and CLI output
    fn location(&self) -> String;
}

/// Reject names that would escape the store namespace
fn validate_blob_name(name: &str) -> ShelfResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.ends_with(PARTIAL_SUFFIX)
    {
        return Err(ShelfError::Validation(format!(
            "Invalid backup name: '{}'",
            name
        )));
    }
    Ok(())
}

/// A folder used as the remote namespace
///
/// Typically a network share or a folder kept in sync by a cloud client.
/// A missing root directory means the remote is unreachable.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root folder of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_reachable(&self) -> ShelfResult<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(ShelfError::RemoteUnavailable(format!(
                "{} is not an accessible directory",
                self.root.display()
            )))
        }
    }

    fn blob_path(&self, name: &str) -> ShelfResult<PathBuf> {
        validate_blob_name(name)?;
        Ok(self.root.join(name))
    }

    fn describe_file(&self, path: &Path, name: &str) -> ShelfResult<Snapshot> {
        let bytes = fs::read(path).map_err(|e| io_to_remote(e, name))?;
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| io_to_remote(e, name))?;

        Ok(Snapshot::new(
            name,
            content_hash(&bytes),
            DateTime::<Utc>::from(modified),
        ))
    }
}

/// Map an I/O error on a named blob to the store's error taxonomy
fn io_to_remote(err: std::io::Error, name: &str) -> ShelfError {
    if err.kind() == ErrorKind::NotFound {
        ShelfError::snapshot_not_found(name)
    } else {
        ShelfError::RemoteUnavailable(format!("{}: {}", name, err))
    }
}

impl RemoteStore for DirectoryStore {
    fn upload(&self, bytes: &[u8], name: &str) -> ShelfResult<Snapshot> {
        self.ensure_reachable()?;
        let path = self.blob_path(name)?;
        let partial = self.root.join(format!("{}{}", name, PARTIAL_SUFFIX));

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&partial)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&partial, &path)
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&partial);
            return Err(ShelfError::RemoteUnavailable(format!(
                "Failed to upload {}: {}",
                name, e
            )));
        }

        debug!(name, bytes = bytes.len(), "uploaded blob");
        self.describe_file(&path, name)
    }

    fn download(&self, name: &str) -> ShelfResult<Vec<u8>> {
        self.ensure_reachable()?;
        let path = self.blob_path(name)?;
        fs::read(&path).map_err(|e| io_to_remote(e, name))
    }

    fn delete(&self, name: &str) -> ShelfResult<()> {
        self.ensure_reachable()?;
        let path = self.blob_path(name)?;
        fs::remove_file(&path).map_err(|e| io_to_remote(e, name))?;
        debug!(name, "deleted blob");
        Ok(())
    }

    fn list(&self) -> ShelfResult<Vec<Snapshot>> {
        self.ensure_reachable()?;

        let entries = fs::read_dir(&self.root).map_err(|e| {
            ShelfError::RemoteUnavailable(format!(
                "Failed to list {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                ShelfError::RemoteUnavailable(format!("Failed to read directory entry: {}", e))
            })?;

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if !is_snapshot_name(&name) {
                continue;
            }

            match self.describe_file(&path, &name) {
                Ok(snapshot) => snapshots.push(snapshot),
                // Removed between read_dir and read
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(snapshots)
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// Blob held by a [`MemoryStore`]
#[derive(Debug, Clone)]
struct MemoryBlob {
    bytes: Vec<u8>,
    modified_at: DateTime<Utc>,
}

/// In-memory store with switchable failures, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<BTreeMap<String, MemoryBlob>>,
    /// Timestamp given to uploads; wall clock when unset
    upload_time: RwLock<Option<DateTime<Utc>>>,
    offline: AtomicBool,
    fail_uploads: AtomicBool,
    failing_deletes: RwLock<HashSet<String>>,
}

impl MemoryStore {
    /// Create an empty, reachable store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob with an explicit modification time
    pub fn insert(&self, name: &str, bytes: &[u8], modified_at: DateTime<Utc>) {
        if let Ok(mut blobs) = self.blobs.write() {
            blobs.insert(
                name.to_string(),
                MemoryBlob {
                    bytes: bytes.to_vec(),
                    modified_at,
                },
            );
        }
    }

    /// Pin the timestamp used for subsequent uploads
    pub fn set_upload_time(&self, at: DateTime<Utc>) {
        if let Ok(mut time) = self.upload_time.write() {
            *time = Some(at);
        }
    }

    /// Make every operation fail with `RemoteUnavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make uploads fail while listing keeps working
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Make deleting `name` fail
    pub fn fail_delete_of(&self, name: &str) {
        if let Ok(mut failing) = self.failing_deletes.write() {
            failing.insert(name.to_string());
        }
    }

    /// Names currently stored, sorted
    pub fn names(&self) -> Vec<String> {
        self.blobs
            .read()
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `name` is stored
    pub fn contains(&self, name: &str) -> bool {
        self.blobs
            .read()
            .map(|blobs| blobs.contains_key(name))
            .unwrap_or(false)
    }

    fn ensure_online(&self) -> ShelfResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ShelfError::RemoteUnavailable("memory store is offline".into()))
        } else {
            Ok(())
        }
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> ShelfError {
        ShelfError::RemoteUnavailable(format!("memory store lock poisoned: {}", e))
    }
}

impl RemoteStore for MemoryStore {
    fn upload(&self, bytes: &[u8], name: &str) -> ShelfResult<Snapshot> {
        self.ensure_online()?;
        validate_blob_name(name)?;
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ShelfError::RemoteUnavailable(format!(
                "upload of {} rejected",
                name
            )));
        }

        let pinned = *self.upload_time.read().map_err(Self::lock_error)?;
        let modified_at = pinned.unwrap_or_else(Utc::now);

        let mut blobs = self.blobs.write().map_err(Self::lock_error)?;
        blobs.insert(
            name.to_string(),
            MemoryBlob {
                bytes: bytes.to_vec(),
                modified_at,
            },
        );

        Ok(Snapshot::new(name, content_hash(bytes), modified_at))
    }

    fn download(&self, name: &str) -> ShelfResult<Vec<u8>> {
        self.ensure_online()?;
        let blobs = self.blobs.read().map_err(Self::lock_error)?;
        blobs
            .get(name)
            .map(|blob| blob.bytes.clone())
            .ok_or_else(|| ShelfError::snapshot_not_found(name))
    }

    fn delete(&self, name: &str) -> ShelfResult<()> {
        self.ensure_online()?;
        let failing = self.failing_deletes.read().map_err(Self::lock_error)?;
        if failing.contains(name) {
            return Err(ShelfError::RemoteUnavailable(format!(
                "delete of {} rejected",
                name
            )));
        }

        let mut blobs = self.blobs.write().map_err(Self::lock_error)?;
        blobs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ShelfError::snapshot_not_found(name))
    }

    fn list(&self) -> ShelfResult<Vec<Snapshot>> {
        self.ensure_online()?;
        let blobs = self.blobs.read().map_err(Self::lock_error)?;
        Ok(blobs
            .iter()
            .map(|(name, blob)| Snapshot::new(name, content_hash(&blob.bytes), blob.modified_at))
            .collect())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
