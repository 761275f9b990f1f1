//! Reader model
//!
//! A person who borrows (and often donates) books.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ReaderId;
use super::lifecycle::Lifecycle;

/// A registered reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reader {
    /// Unique identifier
    pub id: ReaderId,

    /// Full name
    pub name: String,

    /// Contact e-mail
    pub email: String,

    /// Free-text list of preferred genres
    #[serde(default)]
    pub favorite_genres: String,

    /// When the reader was registered
    pub registered_at: DateTime<Utc>,

    /// Edit / delete state
    #[serde(default)]
    pub lifecycle: Lifecycle,
}

impl Reader {
    /// Create a new reader
    pub fn new(name: impl Into<String>, email: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: ReaderId::new(),
            name: name.into(),
            email: email.into(),
            favorite_genres: String::new(),
            registered_at: at,
            lifecycle: Lifecycle::Active,
        }
    }

    /// Set preferred genres
    pub fn with_genres(mut self, genres: impl Into<String>) -> Self {
        self.favorite_genres = genres.into();
        self
    }

    /// Check if this reader matches a name (case-insensitive)
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }

    /// Validate the reader
    pub fn validate(&self) -> Result<(), ReaderValidationError> {
        if self.name.trim().is_empty() {
            return Err(ReaderValidationError::EmptyName);
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
            _ => Err(ReaderValidationError::InvalidEmail(email.to_string())),
        }
    }
}

impl fmt::Display for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", self.id, self.name)
    }
}

/// Validation errors for readers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderValidationError {
    EmptyName,
    InvalidEmail(String),
}

impl fmt::Display for ReaderValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Reader name cannot be empty"),
            Self::InvalidEmail(email) => write!(f, "Invalid e-mail address: '{}'", email),
        }
    }
}

impl std::error::Error for ReaderValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reader() {
        let reader = Reader::new("Ana Souza", "ana@example.com", Utc::now()).with_genres("fantasy");
        assert_eq!(reader.name, "Ana Souza");
        assert_eq!(reader.favorite_genres, "fantasy");
        assert!(reader.validate().is_ok());
        assert!(!reader.lifecycle.is_edited());
    }

    #[test]
    fn test_validation() {
        let reader = Reader::new("  ", "ana@example.com", Utc::now());
        assert_eq!(reader.validate(), Err(ReaderValidationError::EmptyName));

        let reader = Reader::new("Ana", "ana.example.com", Utc::now());
        assert!(matches!(
            reader.validate(),
            Err(ReaderValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_matches_name() {
        let reader = Reader::new("Ana Souza", "ana@example.com", Utc::now());
        assert!(reader.matches_name("ana souza"));
        assert!(!reader.matches_name("ana"));
    }
}
