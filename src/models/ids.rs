//! Typed identifiers for readers, books and loans
//!
//! All three share one `Id<K>` over a UUID; the kind parameter keeps a
//! `BookId` from being passed where a `ReaderId` is expected.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an [`Id`] identifies
pub trait IdKind {
    /// Prefix of the short display form, e.g. `bk-`
    const PREFIX: &'static str;
}

/// Reader identifiers
#[derive(Debug)]
pub enum ReaderKind {}

/// Book identifiers
#[derive(Debug)]
pub enum BookKind {}

/// Loan identifiers
#[derive(Debug)]
pub enum LoanKind {}

impl IdKind for ReaderKind {
    const PREFIX: &'static str = "rdr-";
}

impl IdKind for BookKind {
    const PREFIX: &'static str = "bk-";
}

impl IdKind for LoanKind {
    const PREFIX: &'static str = "loan-";
}

pub type ReaderId = Id<ReaderKind>;
pub type BookId = Id<BookKind>;
pub type LoanId = Id<LoanKind>;

/// A UUID tagged with the kind of record it names
///
/// Serialized as the bare UUID string.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Id<K> {
    uuid: Uuid,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

impl<K> Id<K> {
    /// A fresh random ID
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            kind: PhantomData,
        }
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.uuid
    }
}

impl<K: IdKind> Id<K> {
    /// Parse a full UUID, with or without the display prefix
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        let s = s.strip_prefix(K::PREFIX).unwrap_or(s);
        Uuid::parse_str(s).map(Self::from_uuid)
    }

    /// Whether `s` is a prefix of this ID as typed by a user: the short
    /// display form, with or without the kind prefix, at least 4 hex digits
    pub fn matches_short(&self, s: &str) -> bool {
        let s = s.strip_prefix(K::PREFIX).unwrap_or(s);
        s.len() >= 4 && self.uuid.to_string().starts_with(&s.to_lowercase())
    }
}

impl<K> Clone for Id<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Id<K> {}

impl<K> PartialEq for Id<K> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl<K> Eq for Id<K> {}

impl<K> Hash for Id<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<K> Default for Id<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> From<Uuid> for Id<K> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<K: IdKind> fmt::Debug for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", K::PREFIX, self.uuid)
    }
}

impl<K: IdKind> fmt::Display for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", K::PREFIX, &self.uuid.to_string()[..8])
    }
}

impl<K: IdKind> FromStr for Id<K> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_display_is_prefixed_short_form() {
        let id = BookId::new();
        let display = id.to_string();
        assert!(display.starts_with("bk-"));
        assert_eq!(display.len(), "bk-".len() + 8);
    }

    #[test]
    fn test_serializes_as_bare_uuid() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let id = ReaderId::from_uuid(uuid);

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
        assert_eq!(serde_json::from_str::<ReaderId>(&json).unwrap(), id);
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let with: LoanId = format!("loan-{}", uuid_str).parse().unwrap();
        let without: LoanId = uuid_str.parse().unwrap();
        assert_eq!(with, without);
        assert_eq!(with.as_uuid().to_string(), uuid_str);
        assert!(LoanId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_short_form_matches() {
        let id = ReaderId::new();
        let short = id.to_string();
        assert!(id.matches_short(&short));
        assert!(id.matches_short(&short["rdr-".len()..]));
        assert!(!id.matches_short("rdr-"));
    }

    #[test]
    fn test_usable_as_map_key() {
        let id = BookId::new();
        let copy = id;
        let set: HashSet<_> = [id, copy, BookId::new()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
