//! Book model
//!
//! A donated book on the shelf.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BookId, ReaderId};
use super::lifecycle::Lifecycle;

/// A book on the shelf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier
    pub id: BookId,

    /// Title
    pub title: String,

    /// Author
    pub author: String,

    /// Genre
    pub genre: String,

    /// Reader who donated the book
    pub donor_id: ReaderId,

    /// Condition notes, shelf location, etc.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the book was registered
    pub registered_at: DateTime<Utc>,

    /// Edit / delete state
    #[serde(default)]
    pub lifecycle: Lifecycle,
}

impl Book {
    /// Create a new book
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        donor_id: ReaderId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookId::new(),
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            donor_id,
            notes: None,
            registered_at: at,
            lifecycle: Lifecycle::Active,
        }
    }

    /// Check if this book matches a title (case-insensitive)
    pub fn matches_title(&self, title: &str) -> bool {
        self.title.trim().eq_ignore_ascii_case(title.trim())
    }

    /// Validate the book
    pub fn validate(&self) -> Result<(), BookValidationError> {
        if self.title.trim().is_empty() {
            return Err(BookValidationError::EmptyTitle);
        }
        if self.author.trim().is_empty() {
            return Err(BookValidationError::EmptyAuthor);
        }
        if self.genre.trim().is_empty() {
            return Err(BookValidationError::EmptyGenre);
        }
        Ok(())
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {} ({})", self.id, self.title, self.author)
    }
}

/// Validation errors for books
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    EmptyTitle,
    EmptyAuthor,
    EmptyGenre,
}

impl fmt::Display for BookValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Book title cannot be empty"),
            Self::EmptyAuthor => write!(f, "Book author cannot be empty"),
            Self::EmptyGenre => write!(f, "Book genre cannot be empty"),
        }
    }
}

impl std::error::Error for BookValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book() {
        let book = Book::new(
            "Dom Casmurro",
            "Machado de Assis",
            "novel",
            ReaderId::new(),
            Utc::now(),
        );
        assert!(book.validate().is_ok());
        assert!(book.matches_title("dom casmurro"));
        assert!(book.to_string().contains("Dom Casmurro (Machado de Assis)"));
    }

    #[test]
    fn test_validation() {
        let book = Book::new("Dom Casmurro", "", "novel", ReaderId::new(), Utc::now());
        assert_eq!(book.validate(), Err(BookValidationError::EmptyAuthor));
    }
}
