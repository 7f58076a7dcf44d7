//! Listener registration with disposable handles.
//!
//! Both the document store's live queries and the identity provider's
//! state-change stream hand out a [`Subscription`]. Delivery stops as soon as
//! the handle is dropped or [`Subscription::unsubscribe`] is called, so a view
//! that is torn down cannot keep receiving updates.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Handle for an active listener. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription immediately unregisters its listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to release.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Explicitly releases the listener.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct Entries<L> {
    next_id: u64,
    listeners: Vec<(u64, L)>,
}

/// A shared list of listeners keyed by registration id.
pub(crate) struct ListenerRegistry<L> {
    inner: Arc<Mutex<Entries<L>>>,
}

impl<L: Send + 'static> ListenerRegistry<L> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Entries {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Adds `listener` and returns the handle that removes it again.
    pub(crate) fn register(&self, listener: L) -> Subscription {
        self.register_with(listener, |_| {})
    }

    /// Like [`ListenerRegistry::register`], but runs `prime` on the listener
    /// first, under the same lock that [`ListenerRegistry::for_each`] takes.
    /// Nothing delivered through `for_each` can fall between the two.
    pub(crate) fn register_with(&self, mut listener: L, prime: impl FnOnce(&mut L)) -> Subscription {
        let id = {
            let mut entries = lock(&self.inner);
            prime(&mut listener);
            let id = entries.next_id;
            entries.next_id += 1;
            entries.listeners.push((id, listener));
            id
        };
        let weak: Weak<Mutex<Entries<L>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner).listeners.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Calls `f` on every registered listener, in registration order.
    ///
    /// The registry stays locked while `f` runs: a listener must not register
    /// or unregister on the same registry from inside its callback, and the
    /// caller must not hold any lock that a listener takes.
    pub(crate) fn for_each(&self, mut f: impl FnMut(&mut L)) {
        let mut entries = lock(&self.inner);
        for (_, listener) in entries.listeners.iter_mut() {
            f(listener);
        }
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Counter = Box<dyn FnMut() + Send>;

    fn counting(hits: &Arc<AtomicUsize>) -> Counter {
        let hits = Arc::clone(hits);
        Box::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_drop_unregisters() {
        let registry: ListenerRegistry<Counter> = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let sub = registry.register(counting(&hits));
        registry.for_each(|l| l());
        drop(sub);
        registry.for_each(|l| l());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_unsubscribe_only_removes_own_listener() {
        let registry: ListenerRegistry<Counter> = ListenerRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let a = registry.register(counting(&first));
        let _b = registry.register(counting(&second));
        a.unsubscribe();
        registry.for_each(|l| l());

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_with_primes_before_delivery() {
        let registry: ListenerRegistry<Counter> = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _sub = registry.register_with(counting(&hits), |l| l());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        registry.for_each(|l| l());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_handle_outliving_registry_is_harmless() {
        let registry: ListenerRegistry<Counter> = ListenerRegistry::new();
        let sub = registry.register(Box::new(|| {}));
        drop(registry);
        drop(sub);
    }
}
