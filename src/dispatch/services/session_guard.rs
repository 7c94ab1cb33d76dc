//! Re-entrancy guard over in-flight sessions.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dispatch::domain::SessionKey;

/// Set of session keys with an invocation in flight.
///
/// Set semantics: a key is either present or not, and re-admission after a
/// release always succeeds. Each dispatcher owns its own guard.
#[derive(Debug, Clone, Default)]
pub struct SessionGuard {
    active: Arc<Mutex<HashSet<SessionKey>>>,
}

impl SessionGuard {
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<SessionKey>> {
        // The set stays consistent even if a holder panicked.
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `key` active; returns `false` when it already was.
    #[must_use]
    pub fn admit(&self, key: &SessionKey) -> bool {
        self.lock().insert(key.clone())
    }

    /// Marks `key` inactive.
    pub fn release(&self, key: &SessionKey) {
        self.lock().remove(key);
    }

    /// Returns whether `key` is active.
    #[must_use]
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.lock().contains(key)
    }

    /// Returns the number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether no session is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Admits `key` and returns a permit releasing it on drop.
    ///
    /// Returns `None` when the key is already active.
    #[must_use]
    pub fn acquire(&self, key: &SessionKey) -> Option<SessionPermit> {
        self.admit(key).then(|| SessionPermit {
            guard: self.clone(),
            key: key.clone(),
        })
    }
}

/// Scoped admission of one session key.
///
/// Dropping the permit releases the key on every exit path, including
/// unwinding and task abort.
#[derive(Debug)]
pub struct SessionPermit {
    guard: SessionGuard,
    key: SessionKey,
}

impl SessionPermit {
    /// Returns the held key.
    #[must_use]
    pub const fn key(&self) -> &SessionKey {
        &self.key
    }
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        self.guard.release(&self.key);
    }
}
