//! Listeners of [`AuthEvent`]s applied by an [`Account`].
//!
//! [`Account`]: super::Account

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use derive_more::Debug;

use crate::infra::auth::AuthEvent;

/// Callback of a listener.
type Callback = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

/// Registered listeners.
#[derive(Debug, Default)]
pub(super) struct Registry(Arc<Mutex<Listeners>>);

/// Listeners by their registration order.
#[derive(Debug, Default)]
struct Listeners {
    /// ID of the last registered listener.
    last_id: u64,

    /// Callbacks of the listeners.
    #[debug("{} listeners", callbacks.len())]
    callbacks: BTreeMap<u64, Callback>,
}

impl Registry {
    /// Registers the provided `callback`.
    pub(super) fn add(
        &self,
        callback: impl Fn(&AuthEvent) + Send + Sync + 'static,
    ) -> Unsubscribe {
        let mut listeners =
            self.0.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.last_id += 1;
        let id = listeners.last_id;
        drop(listeners.callbacks.insert(id, Arc::new(callback)));

        Unsubscribe {
            id,
            listeners: Arc::downgrade(&self.0),
        }
    }

    /// Calls every registered listener with the provided [`AuthEvent`].
    pub(super) fn notify(&self, event: &AuthEvent) {
        // Listeners may unsubscribe themselves, so the lock is released first.
        let callbacks = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .values()
            .cloned()
            .collect::<Vec<_>>();
        for callback in callbacks {
            callback(event);
        }
    }
}

/// Handle of a listener registered via [`Account::on_auth_change()`].
///
/// The listener is removed once this handle is dropped.
///
/// [`Account::on_auth_change()`]: super::Account::on_auth_change
#[derive(Debug)]
#[must_use = "listener is removed once the handle is dropped"]
pub struct Unsubscribe {
    /// ID of the listener.
    id: u64,

    /// Listeners the listener is registered in.
    listeners: Weak<Mutex<Listeners>>,
}

impl Unsubscribe {
    /// Removes the listener.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            drop(
                listeners
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .callbacks
                    .remove(&self.id),
            );
        }
    }
}

#[cfg(test)]
mod spec {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use crate::infra::auth::AuthEvent;

    use super::Registry;

    #[test]
    fn stops_calling_after_unsubscribe() {
        let registry = Registry::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let handle = registry.add({
            let calls = Arc::clone(&calls);
            move |_| {
                _ = calls.fetch_add(1, Ordering::SeqCst);
            }
        });
        registry.notify(&AuthEvent::SignedOut);
        handle.unsubscribe();
        registry.notify(&AuthEvent::SignedOut);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_handle_unsubscribes() {
        let registry = Registry::default();
        let calls = Arc::new(AtomicUsize::new(0));

        {
            let _handle = registry.add({
                let calls = Arc::clone(&calls);
                move |_| {
                    _ = calls.fetch_add(1, Ordering::SeqCst);
                }
            });
            registry.notify(&AuthEvent::SignedOut);
        }
        registry.notify(&AuthEvent::SignedOut);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
