use serde::{Deserialize, Serialize};

/// Title stored when a note is saved with an empty title.
pub const UNTITLED_NOTE: &str = "Untitled Note";

/// A saved note as returned by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    /// Rich-text markup as produced by the editor.
    pub content: String,
    /// Store-assigned creation time, Unix milliseconds.
    pub created_at: i64,
}

/// The caller-supplied part of a note. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub owner_id: String,
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    /// Builds a draft, substituting [`UNTITLED_NOTE`] for a blank title.
    pub fn new(owner_id: impl Into<String>, title: &str, content: impl Into<String>) -> Self {
        let title = if title.trim().is_empty() {
            UNTITLED_NOTE.to_string()
        } else {
            title.to_string()
        };
        Self {
            owner_id: owner_id.into(),
            title,
            content: content.into(),
        }
    }
}
