//! Weak entry: a non-owning handle to an indexed entity.

use std::fmt;
use std::sync::{Arc, Weak};

/// A holder that references an entity without extending its lifetime.
///
/// Entities are owned elsewhere as `Arc<T>`; the entry keeps only a
/// [`Weak`] and resolving it fails once the last `Arc` is dropped. A dead
/// entry is a tombstone the enclosing index removes lazily.
pub struct WeakEntry<T> {
    target: Weak<T>,
}

impl<T> WeakEntry<T> {
    /// Creates an entry pointing at a live entity.
    #[must_use]
    pub fn new(target: &Arc<T>) -> Self {
        Self {
            target: Arc::downgrade(target),
        }
    }

    /// Returns the entity if it is still alive.
    #[must_use]
    pub fn try_resolve(&self) -> Option<Arc<T>> {
        self.target.upgrade()
    }

    /// Repoints the entry at a new live entity.
    ///
    /// Used when an `add` updates an existing key.
    pub fn retarget(&mut self, target: &Arc<T>) {
        self.target = Arc::downgrade(target);
    }

    /// Returns true if the target is still alive, without resolving it.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl<T> fmt::Debug for WeakEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEntry")
            .field("live", &self.is_live())
            .finish()
    }
}
