//! Backup snapshot metadata and naming
//!
//! Snapshots are named `backup_YYYY_MM_DD_HH_MM_SS.db`. The fields are
//! zero-padded so lexicographic order of names matches chronological order.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Prefix shared by every snapshot name
pub const SNAPSHOT_PREFIX: &str = "backup_";

/// Extension shared by every snapshot name
pub const SNAPSHOT_EXTENSION: &str = ".db";

const NAME_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// A backup file held by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unique file name, encodes the creation timestamp
    pub name: String,
    /// Hash of the file content as reported by the store
    pub content_hash: String,
    /// When the store last modified the file
    pub modified_at: DateTime<Utc>,
}

impl Snapshot {
    /// Create a snapshot record
    pub fn new(
        name: impl Into<String>,
        content_hash: impl Into<String>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            content_hash: content_hash.into(),
            modified_at,
        }
    }

    /// Calendar date of `modified_at` in the given time zone
    pub fn local_date<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.modified_at.with_timezone(tz).date_naive()
    }

    /// Creation timestamp encoded in the name, if the name is well-formed
    pub fn name_timestamp(&self) -> Option<NaiveDateTime> {
        parse_snapshot_name(&self.name)
    }

    /// Ordering with the newest snapshot first
    ///
    /// Equal `modified_at` values fall back to the greater name.
    pub fn newest_first(a: &Snapshot, b: &Snapshot) -> Ordering {
        b.modified_at
            .cmp(&a.modified_at)
            .then_with(|| b.name.cmp(&a.name))
    }

    /// Whether `self` ranks newer than `other` under [`Snapshot::newest_first`]
    pub fn is_newer_than(&self, other: &Snapshot) -> bool {
        Self::newest_first(self, other) == Ordering::Less
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Build the snapshot name for a local creation time (second precision)
pub fn snapshot_name(created_at: NaiveDateTime) -> String {
    format!(
        "{}{}{}",
        SNAPSHOT_PREFIX,
        created_at.format(NAME_TIMESTAMP_FORMAT),
        SNAPSHOT_EXTENSION
    )
}

/// Parse the creation time out of a snapshot name
pub fn parse_snapshot_name(name: &str) -> Option<NaiveDateTime> {
    let stamp = name
        .strip_prefix(SNAPSHOT_PREFIX)?
        .strip_suffix(SNAPSHOT_EXTENSION)?;

    // Reject anything chrono would accept without padding
    if stamp.len() != 19 {
        return None;
    }

    NaiveDateTime::parse_from_str(stamp, NAME_TIMESTAMP_FORMAT).ok()
}

/// Check whether a remote file name looks like one of ours
pub fn is_snapshot_name(name: &str) -> bool {
    parse_snapshot_name(name).is_some()
}

/// Lowercase hex SHA-256 of a file body
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
