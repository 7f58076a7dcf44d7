//! Note editor controller.
//!
//! [`NoteEditor`] owns the title and content being edited, the pending AI
//! suggestions, and a small state machine:
//!
//! ```text
//! Idle --begin_generation(GenerateTitle)--> GeneratingTitle      --complete--> Idle
//! Idle --begin_generation(RefineText)-----> GeneratingRefinement --complete--> Idle
//! Idle --begin_save-----------------------> Saving               --complete--> Idle
//! ```
//!
//! Requests are two-phase so a host can run the slow part elsewhere: `begin_*`
//! checks the guard and hands out a ticket, the host runs the ticket against
//! the collaborator, and `complete_*` applies the outcome. The one-shot
//! helpers ([`NoteEditor::request_title`], [`NoteEditor::request_refinement`],
//! [`NoteEditor::save`]) do all three steps on the calling thread.
//!
//! While a request is outstanding, new generation and save requests are
//! ignored rather than queued. Accepting or declining a suggestion is always
//! allowed and never changes the state.

use crate::core::generation::{GenerationError, SuggestionEngine};
use crate::core::identity::{IdentityProvider, User};
use crate::core::markup;
use crate::core::persistence::NotePersistence;
use crate::core::storage::NoteStore;
use crate::core::suggestion::{SuggestionKind, SuggestionReview};
use crate::{Result, SmartnotesError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Toast text shown after a successful save.
pub const SAVE_SUCCESS_MESSAGE: &str = "Note saved successfully!";
/// Toast text shown after a failed save.
pub const SAVE_FAILURE_MESSAGE: &str = "Failed to save note.";
/// Toast text shown when a save is attempted without a signed-in owner.
pub const SIGNED_OUT_MESSAGE: &str = "You must be logged in to save a note.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorState {
    Idle,
    GeneratingTitle,
    GeneratingRefinement,
    Saving,
}

impl EditorState {
    fn generating(kind: SuggestionKind) -> Self {
        match kind {
            SuggestionKind::GenerateTitle => Self::GeneratingTitle,
            SuggestionKind::RefineText => Self::GeneratingRefinement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// An outstanding generation request.
///
/// Carries the content as it was when the request began; later edits do not
/// change the prompt.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    session: Uuid,
    kind: SuggestionKind,
    content: String,
}

impl GenerationTicket {
    pub fn kind(&self) -> SuggestionKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Performs the request. Safe to call from any thread.
    pub fn run(&self, engine: &dyn SuggestionEngine) -> std::result::Result<String, GenerationError> {
        engine.generate(self.kind, &self.content)
    }
}

/// An outstanding save request.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    session: Uuid,
    owner_id: String,
    title: String,
    content: String,
}

impl SaveTicket {
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Performs the write. Safe to call from any thread.
    pub fn run(&self, persistence: &NotePersistence) -> Result<String> {
        persistence.save(&self.owner_id, &self.title, &self.content)
    }
}

/// Editing session for one signed-in user.
pub struct NoteEditor {
    session: Uuid,
    owner: User,
    identity: Arc<dyn IdentityProvider>,
    engine: Arc<dyn SuggestionEngine>,
    persistence: NotePersistence,
    title: String,
    content: String,
    review: SuggestionReview,
    state: EditorState,
    last_error: Option<String>,
    last_saved_id: Option<String>,
    notifications: Vec<Notification>,
    closed: bool,
}

impl NoteEditor {
    /// Opens an editing session for the currently signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`SmartnotesError::NotAuthenticated`] if nobody is signed in.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        engine: Arc<dyn SuggestionEngine>,
        store: Arc<dyn NoteStore>,
    ) -> Result<Self> {
        let owner = identity
            .current_user()
            .ok_or(SmartnotesError::NotAuthenticated)?;
        log::debug!("editor session opened for {}", owner.uid);

        Ok(Self {
            session: Uuid::new_v4(),
            owner,
            identity,
            engine,
            persistence: NotePersistence::new(store),
            title: String::new(),
            content: String::new(),
            review: SuggestionReview::new(),
            state: EditorState::Idle,
            last_error: None,
            last_saved_id: None,
            notifications: Vec::new(),
            closed: false,
        })
    }

    pub fn owner(&self) -> &User {
        &self.owner
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    /// True while a generation or save request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.state != EditorState::Idle
    }

    /// Message of the most recent failed generation, cleared by the next request.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_saved_note_id(&self) -> Option<&str> {
        self.last_saved_id.as_deref()
    }

    pub fn pending_suggestion(&self, kind: SuggestionKind) -> Option<&str> {
        self.review.pending(kind)
    }

    /// Whether generate and save actions are currently enabled.
    pub fn can_submit(&self) -> bool {
        !self.closed && self.state == EditorState::Idle && !markup::is_blank(&self.content)
    }

    /// Drains queued notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Ends the session. Results of requests still in flight are discarded.
    pub fn close(&mut self) {
        if !self.closed {
            log::debug!("editor session closed for {}", self.owner.uid);
        }
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn is_current(&self, session: Uuid, expected: EditorState) -> bool {
        !self.closed && session == self.session && self.state == expected
    }

    // ── Suggestions ──────────────────────────────────────────────

    /// Starts a generation request, or returns `None` when the action is disabled.
    pub fn begin_generation(&mut self, kind: SuggestionKind) -> Option<GenerationTicket> {
        if !self.can_submit() {
            return None;
        }
        self.state = EditorState::generating(kind);
        self.last_error = None;
        Some(GenerationTicket {
            session: self.session,
            kind,
            content: self.content.clone(),
        })
    }

    /// Applies the outcome of `ticket`. Returns `false` if the ticket was stale
    /// and nothing was applied.
    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        result: std::result::Result<String, GenerationError>,
    ) -> bool {
        if !self.is_current(ticket.session, EditorState::generating(ticket.kind)) {
            log::warn!("discarding stale {} suggestion", ticket.kind);
            return false;
        }
        self.state = EditorState::Idle;

        let outcome = result.and_then(|text| {
            let text = match ticket.kind {
                SuggestionKind::RefineText => markup::sanitize_markup(&text),
                SuggestionKind::GenerateTitle => text.trim().to_string(),
            };
            if markup::is_blank(&text) {
                Err(GenerationError::MissingCandidate)
            } else {
                Ok(text)
            }
        });

        match outcome {
            Ok(text) => self.review.propose(ticket.kind, text),
            Err(e) => {
                let message = e.to_string();
                log::warn!("{} suggestion failed: {message}", ticket.kind);
                self.notifications
                    .push(Notification::error(format!("AI Error: {message}")));
                self.last_error = Some(message);
            }
        }
        true
    }

    /// Runs a generation request to completion on the calling thread.
    /// Returns whether the request was dispatched.
    pub fn request_suggestion(&mut self, kind: SuggestionKind) -> bool {
        let Some(ticket) = self.begin_generation(kind) else {
            return false;
        };
        let result = ticket.run(self.engine.as_ref());
        self.complete_generation(ticket, result);
        true
    }

    pub fn request_title(&mut self) -> bool {
        self.request_suggestion(SuggestionKind::GenerateTitle)
    }

    pub fn request_refinement(&mut self) -> bool {
        self.request_suggestion(SuggestionKind::RefineText)
    }

    /// Moves the pending suggestion of `kind` into its field.
    ///
    /// # Errors
    ///
    /// Returns [`SmartnotesError::NoSuchSuggestion`] if nothing is pending;
    /// title and content are left as they were.
    pub fn accept_suggestion(&mut self, kind: SuggestionKind) -> Result<()> {
        let text = self.review.accept(kind).map_err(|e| {
            log::warn!("{e}");
            e
        })?;
        match kind {
            SuggestionKind::GenerateTitle => self.title = text,
            SuggestionKind::RefineText => self.content = text,
        }
        Ok(())
    }

    pub fn decline_suggestion(&mut self, kind: SuggestionKind) {
        self.review.decline(kind);
    }

    // ── Saving ───────────────────────────────────────────────────

    /// Starts a save, or returns `None` when the action is disabled or the
    /// owner is no longer signed in.
    pub fn begin_save(&mut self) -> Option<SaveTicket> {
        if !self.can_submit() {
            return None;
        }
        if self.identity.current_user().as_ref() != Some(&self.owner) {
            log::warn!("save refused: {} is no longer signed in", self.owner.uid);
            self.notifications.push(Notification::error(SIGNED_OUT_MESSAGE));
            return None;
        }
        self.state = EditorState::Saving;
        Some(SaveTicket {
            session: self.session,
            owner_id: self.owner.uid.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
        })
    }

    /// Applies the outcome of `ticket`. Title and content are never cleared,
    /// so a failed save can be retried as-is.
    pub fn complete_save(&mut self, ticket: SaveTicket, result: Result<String>) -> bool {
        if !self.is_current(ticket.session, EditorState::Saving) {
            log::warn!("discarding stale save result");
            return false;
        }
        self.state = EditorState::Idle;

        match result {
            Ok(id) => {
                self.last_saved_id = Some(id);
                self.notifications.push(Notification::success(SAVE_SUCCESS_MESSAGE));
            }
            Err(e) => {
                log::warn!("save failed: {e}");
                self.notifications.push(Notification::error(SAVE_FAILURE_MESSAGE));
            }
        }
        true
    }

    /// Saves on the calling thread. Returns whether the save was dispatched.
    pub fn save(&mut self) -> bool {
        let Some(ticket) = self.begin_save() else {
            return false;
        };
        let result = ticket.run(&self.persistence);
        self.complete_save(ticket, result);
        true
    }

    /// The persistence client this editor saves through.
    pub fn persistence(&self) -> &NotePersistence {
        &self.persistence
    }

    /// The engine this editor generates suggestions with.
    pub fn engine(&self) -> Arc<dyn SuggestionEngine> {
        Arc::clone(&self.engine)
    }
}
