//! Read-only listing of the signed-in user's notes, kept current by a live query.

use crate::core::identity::{IdentityProvider, User};
use crate::core::markup;
use crate::core::note::Note;
use crate::core::storage::{NoteQuery, NoteStore, Snapshot};
use crate::core::subscription::Subscription;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Length of the plain-text excerpt shown on a card.
pub const PREVIEW_CHARS: usize = 160;

/// Shown instead of the list when the live query fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load notes. Please try again.";

/// One note as the listing displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCard {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub created_at: i64,
}

impl From<&Note> for NoteCard {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.clone(),
            title: note.title.clone(),
            preview: markup::preview(&note.content, PREVIEW_CHARS),
            created_at: note.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingView {
    /// Subscribed, first result set not delivered yet.
    Loading,
    /// Nobody is signed in; nothing is fetched.
    SignedOut,
    Empty,
    /// Newest first.
    Notes(Vec<NoteCard>),
    Failed(String),
}

fn project(snapshot: &Snapshot) -> ListingView {
    match snapshot {
        Ok(notes) if notes.is_empty() => ListingView::Empty,
        Ok(notes) => ListingView::Notes(notes.iter().map(NoteCard::from).collect()),
        Err(e) => {
            log::warn!("notes listing query failed: {e}");
            ListingView::Failed(LOAD_FAILED_MESSAGE.to_string())
        }
    }
}

/// A live view over one owner's notes. Dropping it (or calling
/// [`NotesListing::close`]) releases the store subscription.
pub struct NotesListing {
    store: Arc<dyn NoteStore>,
    view: Arc<Mutex<ListingView>>,
    owner_id: Option<String>,
    subscription: Option<Subscription>,
}

impl NotesListing {
    /// Opens a listing for whoever is currently signed in.
    pub fn open(store: Arc<dyn NoteStore>, identity: &dyn IdentityProvider) -> Self {
        let mut listing = Self {
            store,
            view: Arc::new(Mutex::new(ListingView::Loading)),
            owner_id: None,
            subscription: None,
        };
        listing.rebind(identity.current_user().as_ref());
        listing
    }

    /// Keeps `listing` bound to the signed-in user across sign-in and sign-out.
    ///
    /// Auth changes lock `listing` on the thread that signs in or out. That
    /// thread must not already hold `listing`'s lock, or it deadlocks.
    pub fn follow_identity(
        listing: &Arc<Mutex<NotesListing>>,
        identity: &dyn IdentityProvider,
    ) -> Subscription {
        let listing = Arc::clone(listing);
        identity.subscribe(Box::new(move |state| {
            listing
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .rebind(state.user());
        }))
    }

    /// Drops the current subscription and, if `user` is set, subscribes to
    /// their notes instead.
    pub fn rebind(&mut self, user: Option<&User>) {
        if self.owner_id.as_deref() == user.map(|u| u.uid.as_str()) && self.subscription.is_some() {
            return;
        }
        self.subscription = None;

        let Some(user) = user else {
            self.owner_id = None;
            self.set_view(ListingView::SignedOut);
            return;
        };

        self.owner_id = Some(user.uid.clone());
        self.set_view(ListingView::Loading);

        let view = Arc::clone(&self.view);
        let subscription = self.store.subscribe(
            NoteQuery::owned_by(user.uid.clone()),
            Box::new(move |snapshot: &Snapshot| {
                *view.lock().unwrap_or_else(PoisonError::into_inner) = project(snapshot);
            }),
        );
        self.subscription = Some(subscription);
    }

    fn set_view(&self, next: ListingView) {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// The current projection.
    pub fn view(&self) -> ListingView {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    /// Whether a live query is attached.
    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Releases the live query.
    pub fn close(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
