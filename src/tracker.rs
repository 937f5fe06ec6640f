//! The table of in-flight requests, keyed by identity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

/// Tracks the single in-flight request of every identity.
///
/// A `Tracker` is cheap to clone; clones share the same table. Pass one to
/// [`SupersedeLayer::with_tracker`](crate::SupersedeLayer::with_tracker) to
/// make several services supersede each other's requests.
#[derive(Clone, Debug, Default)]
pub struct Tracker {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    next_id: u64,
}

#[derive(Debug)]
struct Entry {
    canonical_key: String,
    cancel: CancellationToken,
    id: u64,
}

/// Ownership of a tracked entry, held by the response future of the request
/// that created it. Dropping it removes the entry unless a newer request
/// already replaced it.
#[derive(Debug)]
pub(crate) struct Registration {
    tracker: Tracker,
    identity: String,
    id: u64,
    cancel: CancellationToken,
}

// ===== impl Tracker =====

impl Tracker {
    /// Creates an empty table.
    pub fn new() -> Self {
        Tracker::default()
    }

    /// Number of identities with a request in flight.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if no request is being tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Returns `true` if a request for `identity` is in flight.
    pub fn contains(&self, identity: &str) -> bool {
        self.lock().entries.contains_key(identity)
    }

    /// The canonical key of the in-flight request for `identity`.
    pub fn canonical_key(&self, identity: &str) -> Option<String> {
        self.lock()
            .entries
            .get(identity)
            .map(|entry| entry.canonical_key.clone())
    }

    /// Registers a request for `identity`, superseding the one in flight.
    ///
    /// Returns `None` when the in-flight request has the same canonical key
    /// and `cache_eligible` is set; that request is left alone and the new
    /// one goes through untracked.
    pub(crate) fn register(
        &self,
        identity: &str,
        canonical_key: String,
        cache_eligible: bool,
    ) -> Option<Registration> {
        let mut state = self.lock();

        if let Some(entry) = state.entries.get(identity) {
            if cache_eligible && entry.canonical_key == canonical_key {
                tracing::trace!(identity, key = %canonical_key, "duplicate in flight; passing through");
                return None;
            }
        }

        let superseded = state.entries.remove(identity);
        if let Some(prev) = &superseded {
            tracing::debug!(
                identity,
                superseded = %prev.canonical_key,
                key = %canonical_key,
                "superseding in-flight request"
            );
        }

        let id = state.next_id;
        state.next_id += 1;

        let cancel = CancellationToken::new();
        state.entries.insert(
            identity.to_owned(),
            Entry {
                canonical_key,
                cancel: cancel.clone(),
                id,
            },
        );
        tracing::trace!(identity, id, "registered request");
        drop(state);

        // Cancelling wakes waiters, which may re-enter the table.
        if let Some(prev) = superseded {
            prev.cancel.cancel();
        }

        Some(Registration {
            tracker: self.clone(),
            identity: identity.to_owned(),
            id,
            cancel,
        })
    }

    /// Removes the entry for `identity` if it is still registration `id`.
    fn release(&self, identity: &str, id: u64) -> bool {
        let mut state = self.lock();

        match state.entries.get(identity) {
            Some(entry) if entry.id == id => {
                state.entries.remove(identity);
                tracing::trace!(identity, id, "released request");
                true
            }
            _ => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ===== impl Registration =====

impl Registration {
    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.tracker.release(&self.identity, self.id);
    }
}
