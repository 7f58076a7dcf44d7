//! Signed-in user context.
//!
//! Identity itself is owned by an external auth provider. The core only needs
//! to ask who is signed in and to hear about sign-in / sign-out, which is what
//! [`IdentityProvider`] exposes. [`AuthSession`] is the in-process
//! implementation a host updates from its provider's callbacks.

use crate::core::subscription::{ListenerRegistry, Subscription};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// The authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier assigned by the auth provider.
    pub uid: String,
    pub email: String,
}

impl User {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedIn(User),
    SignedOut,
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::SignedIn(user) => Some(user),
            Self::SignedOut => None,
        }
    }
}

/// Callback invoked with every auth state change.
pub type AuthListener = Box<dyn FnMut(&AuthState) + Send>;

/// Read access to the current identity plus a change stream.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;

    /// Registers `listener`; it is called once with the current state and
    /// then on every change until the returned handle is dropped.
    fn subscribe(&self, listener: AuthListener) -> Subscription;
}

/// Shared, cloneable auth state.
#[derive(Clone)]
pub struct AuthSession {
    state: Arc<Mutex<AuthState>>,
    listeners: Arc<ListenerRegistry<AuthListener>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(AuthState::SignedOut)),
            listeners: Arc::new(ListenerRegistry::new()),
        }
    }

    /// A session that starts out signed in as `user`.
    pub fn signed_in(user: User) -> Self {
        let session = Self::new();
        session.set(AuthState::SignedIn(user));
        session
    }

    /// Records `user` as signed in and notifies listeners on this thread.
    ///
    /// Listeners run before this returns, so do not call it while holding a
    /// lock that a listener takes (e.g. a listing passed to
    /// [`crate::NotesListing::follow_identity`]). The same holds for
    /// [`AuthSession::sign_out`].
    pub fn sign_in(&self, user: User) {
        log::info!("user {} signed in", user.uid);
        self.set(AuthState::SignedIn(user));
    }

    pub fn sign_out(&self) {
        log::info!("user signed out");
        self.set(AuthState::SignedOut);
    }

    pub fn state(&self) -> AuthState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, next: AuthState) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == next {
                return;
            }
            *state = next.clone();
        }
        self.listeners.for_each(|listener| listener(&next));
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for AuthSession {
    fn current_user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    fn subscribe(&self, mut listener: AuthListener) -> Subscription {
        listener(&self.state());
        self.listeners.register(listener)
    }
}
