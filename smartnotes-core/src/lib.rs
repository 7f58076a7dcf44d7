//! Core library for Smart Notes — an AI-assisted note editor.
//!
//! The primary entry point is [`NoteEditor`], an editing session for one
//! signed-in user. It asks a [`SuggestionEngine`] for title and refinement
//! suggestions, holds them for review, and saves notes through a
//! [`NoteStore`]. [`NotesListing`] is the read side: a live view of the
//! user's notes that updates whenever a matching note is saved.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    editor::{
        EditorState, GenerationTicket, NoteEditor, Notification, NotificationLevel, SaveTicket,
        SAVE_FAILURE_MESSAGE, SAVE_SUCCESS_MESSAGE, SIGNED_OUT_MESSAGE,
    },
    error::{Result, SmartnotesError},
    generation::{
        build_prompt, interpret_response, GeminiClient, GenerationError, PromptOptions,
        SuggestionEngine,
    },
    identity::{AuthListener, AuthSession, AuthState, IdentityProvider, User},
    listing::{ListingView, NoteCard, NotesListing, LOAD_FAILED_MESSAGE, PREVIEW_CHARS},
    markup::{is_blank, preview, sanitize_markup, strip_tags},
    note::{Note, NoteDraft, UNTITLED_NOTE},
    persistence::NotePersistence,
    settings::{
        load_settings, load_settings_from, save_settings, save_settings_to, AppSettings,
        GenerationSettings, API_KEY_ENV,
    },
    storage::{NoteQuery, NoteStore, Snapshot, SnapshotListener, Storage},
    subscription::Subscription,
    suggestion::{Suggestion, SuggestionKind, SuggestionReview},
};
