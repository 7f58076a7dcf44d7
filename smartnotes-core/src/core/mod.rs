//! Internal domain modules for the Smart Notes core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod editor;
pub mod error;
pub mod generation;
pub mod identity;
pub mod listing;
pub mod markup;
pub mod note;
pub mod persistence;
pub mod settings;
pub mod storage;
pub mod subscription;
pub mod suggestion;

#[doc(inline)]
pub use editor::{EditorState, GenerationTicket, NoteEditor, Notification, NotificationLevel, SaveTicket};
#[doc(inline)]
pub use error::{Result, SmartnotesError};
#[doc(inline)]
pub use generation::{GeminiClient, GenerationError, PromptOptions, SuggestionEngine};
#[doc(inline)]
pub use identity::{AuthSession, AuthState, IdentityProvider, User};
#[doc(inline)]
pub use listing::{ListingView, NoteCard, NotesListing};
#[doc(inline)]
pub use note::{Note, NoteDraft, UNTITLED_NOTE};
#[doc(inline)]
pub use persistence::NotePersistence;
#[doc(inline)]
pub use settings::{AppSettings, GenerationSettings};
#[doc(inline)]
pub use storage::{NoteQuery, NoteStore, Snapshot, SnapshotListener, Storage};
#[doc(inline)]
pub use subscription::Subscription;
#[doc(inline)]
pub use suggestion::{Suggestion, SuggestionKind, SuggestionReview};
