//! Note persistence client: turns an editor save into one new store record.

use crate::core::note::NoteDraft;
use crate::core::storage::NoteStore;
use crate::{Result, SmartnotesError};
use std::sync::Arc;

/// Writes notes on behalf of an owner. Every call creates a new record;
/// there is no update path.
#[derive(Clone)]
pub struct NotePersistence {
    store: Arc<dyn NoteStore>,
}

impl NotePersistence {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    /// Saves a note and returns the store-generated id.
    ///
    /// A blank `title` is stored as [`crate::UNTITLED_NOTE`]. `content` is
    /// taken as-is.
    ///
    /// # Errors
    ///
    /// Any store failure is returned as [`SmartnotesError::Persistence`];
    /// nothing is retried.
    pub fn save(&self, owner_id: &str, title: &str, content: &str) -> Result<String> {
        let draft = NoteDraft::new(owner_id, title, content);
        match self.store.insert_note(draft) {
            Ok(note) => {
                log::info!("saved note {} for {}", note.id, owner_id);
                Ok(note.id)
            }
            Err(e) => {
                log::warn!("failed to save note for {owner_id}: {e}");
                let message = match e {
                    SmartnotesError::Persistence(msg) => msg,
                    other => other.to_string(),
                };
                Err(SmartnotesError::Persistence(message))
            }
        }
    }
}
