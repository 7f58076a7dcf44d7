//! Error types for the Smart Notes core library.

use crate::core::generation::GenerationError;
use crate::core::suggestion::SuggestionKind;
use thiserror::Error;

/// All errors that can occur within the Smart Notes core library.
#[derive(Debug, Error)]
pub enum SmartnotesError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The generation endpoint could not produce a suggestion.
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Writing a note to the document store failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// `accept` was called for a kind with no pending suggestion.
    #[error("No pending {0} suggestion")]
    NoSuchSuggestion(SuggestionKind),

    /// An operation required a signed-in user and there was none.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The opened file is not a valid Smart Notes store.
    #[error("Invalid store: {0}")]
    InvalidStore(String),

    /// Settings could not be read, written or applied.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or note data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`SmartnotesError`].
pub type Result<T> = std::result::Result<T, SmartnotesError>;

impl SmartnotesError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Storage error: {e}"),
            Self::Generation(e) => format!("AI Error: {e}"),
            Self::Persistence(_) => "Failed to save note.".to_string(),
            Self::NoSuchSuggestion(kind) => format!("There is no {kind} suggestion to accept"),
            Self::NotAuthenticated => "You must be logged in to save a note.".to_string(),
            Self::InvalidStore(_) => "Could not open notes database".to_string(),
            Self::Config(msg) => format!("Settings error: {msg}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}
