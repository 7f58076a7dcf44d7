//! Pending AI suggestions awaiting accept or decline.

use crate::{Result, SmartnotesError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The two AI-assist tasks. Each one targets a single editor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    /// Rewrite the note body; targets `content`.
    RefineText,
    /// Propose a title; targets `title`.
    GenerateTitle,
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefineText => f.write_str("refinement"),
            Self::GenerateTitle => f.write_str("title"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub text: String,
}

/// At most one pending suggestion per kind. A newer proposal replaces the
/// older one outright.
#[derive(Debug, Default, Clone)]
pub struct SuggestionReview {
    pending: HashMap<SuggestionKind, Suggestion>,
}

impl SuggestionReview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn propose(&mut self, kind: SuggestionKind, text: impl Into<String>) {
        self.pending.insert(
            kind,
            Suggestion {
                kind,
                text: text.into(),
            },
        );
    }

    /// Removes and returns the pending text for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`SmartnotesError::NoSuchSuggestion`] when nothing of that kind
    /// is pending; the review state is left untouched.
    pub fn accept(&mut self, kind: SuggestionKind) -> Result<String> {
        self.pending
            .remove(&kind)
            .map(|s| s.text)
            .ok_or(SmartnotesError::NoSuchSuggestion(kind))
    }

    /// Discards the pending suggestion for `kind`, if any.
    pub fn decline(&mut self, kind: SuggestionKind) {
        self.pending.remove(&kind);
    }

    pub fn pending(&self, kind: SuggestionKind) -> Option<&str> {
        self.pending.get(&kind).map(|s| s.text.as_str())
    }

    pub fn has_pending(&self, kind: SuggestionKind) -> bool {
        self.pending.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
