//! Shared, observable state container

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::reducer::Reduction;

/// Holds the single current state value of a pipeline.
///
/// The state is never mutated in place: every commit replaces the whole
/// value, and readers get an `Arc` snapshot that stays valid after later
/// commits. Observers subscribe through a `tokio::sync::watch` channel and
/// see each committed state before the dispatch that produced it returns.
///
/// `Store` is a cheap handle; clones share the same state.
///
/// # Example
/// ```
/// use redux_pipeline_core::Store;
///
/// let store = Store::new(0_i32);
/// let mut updates = store.subscribe();
///
/// store.reset(5);
/// assert!(updates.has_changed().unwrap());
/// assert_eq!(**updates.borrow_and_update(), 5);
/// assert_eq!(*store.state(), 5);
/// ```
pub struct Store<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    // Serializes read-modify-write of the current state
    commit: Mutex<()>,
    tx: watch::Sender<Arc<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.tx.borrow())
            .field("observers", &self.inner.tx.receiver_count())
            .finish()
    }
}

impl<S: Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Store<S> {
    /// Create a new store holding the initial state
    pub fn new(state: S) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(state));
        Self {
            inner: Arc::new(Inner {
                commit: Mutex::new(()),
                tx,
            }),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> Arc<S> {
        Arc::clone(&self.inner.tx.borrow())
    }

    /// Subscribe to state replacements.
    ///
    /// The receiver starts with the current state marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Arc<S>> {
        self.inner.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn observer_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }

    /// Replace the state wholesale, e.g. when a scoped session is torn down.
    ///
    /// Observers are notified like for any other commit.
    pub fn reset(&self, state: S) {
        let _guard = self.inner.commit.lock();
        self.inner.tx.send_replace(Arc::new(state));
        tracing::trace!("Store reset");
    }

    /// Run `reduce` against the current state and commit the result.
    ///
    /// The commit lock is held while `reduce` runs, so concurrent commits
    /// never lose updates. `reduce` must not commit to the same store.
    /// Returns whether a new state was committed.
    pub(crate) fn commit<E>(
        &self,
        reduce: impl FnOnce(S) -> Result<Reduction<S>, E>,
    ) -> Result<bool, E>
    where
        S: Clone,
    {
        let _guard = self.inner.commit.lock();
        let current = S::clone(&self.inner.tx.borrow());
        let reduction = reduce(current)?;
        if !reduction.is_applied() {
            return Ok(false);
        }
        self.inner.tx.send_replace(Arc::new(reduction.state));
        tracing::trace!(applied = reduction.applied, "State committed");
        Ok(true)
    }
}

#[cfg(feature = "stream")]
impl<S: Send + Sync + 'static> Store<S> {
    /// State replacements as a `Stream`, starting with the current state.
    pub fn stream(&self) -> tokio_stream::wrappers::WatchStream<Arc<S>> {
        tokio_stream::wrappers::WatchStream::new(self.subscribe())
    }
}
