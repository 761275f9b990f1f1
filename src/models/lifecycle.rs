//! Record lifecycle
//!
//! Records are never removed from the library file. Deleting one moves it to
//! `Deleted`, which hides it from listings but keeps loan history intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state shared by readers, books and loans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Lifecycle {
    /// Never changed since registration
    #[default]
    Active,
    /// Changed at least once
    Edited { edited_at: DateTime<Utc> },
    /// Soft-deleted
    Deleted { deleted_at: DateTime<Utc> },
}

impl Lifecycle {
    /// Whether the record has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }

    /// Whether the record has been changed since registration
    ///
    /// Deletion counts as a change.
    pub fn is_edited(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// When the record was last changed
    pub fn edited_at(&self) -> Option<DateTime<Utc>> {
        match *self {
            Self::Active => None,
            Self::Edited { edited_at } => Some(edited_at),
            Self::Deleted { deleted_at } => Some(deleted_at),
        }
    }

    /// When the record was deleted
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match *self {
            Self::Deleted { deleted_at } => Some(deleted_at),
            _ => None,
        }
    }

    /// Record a change. Deleted records stay deleted.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if !self.is_deleted() {
            *self = Self::Edited { edited_at: at };
        }
    }

    /// Soft-delete. A second delete keeps the original timestamp.
    pub fn delete(&mut self, at: DateTime<Utc>) {
        if !self.is_deleted() {
            *self = Self::Deleted { deleted_at: at };
        }
    }
}
