//! Index registry: one owner for every concrete index over an entity type.
//!
//! The registry is an explicit value passed to collaborators; there is no
//! global index state. Two kinds of callers meet here:
//!
//! - The entity lifecycle/change source calls [`add`](IndexRegistry::add)
//!   (or [`apply`](IndexRegistry::apply) with an [`EntityChange`]) whenever
//!   an entity is created or an indexed field changes; the registry fans the
//!   call out to every registered index.
//! - Query callers reach a specific index through
//!   [`with_index`](IndexRegistry::with_index), which hands them a typed
//!   mutable reference under the registry lock (reads prune, so even
//!   lookups need mutable access).
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = IndexRegistry::with_defaults();
//! registry.register(WeakSortedIndex::new(IndexSpec::new("by_name"), |s: &Sensor| {
//!     Some(s.name.clone())
//! }))?;
//!
//! registry.add(&sensor)?;
//!
//! let found = registry.with_index("by_name", |idx: &mut WeakSortedIndex<String, Sensor>| {
//!     idx.get_by_key(&"pier-7".to_string())
//! })?;
//! ```

use crate::config::RegistryConfig;
use crate::error::{IndexError, IndexResult};
use crate::index::EntityIndex;
use crate::stats::{RegistryStats, StatsSnapshot};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// A change-notification event for one entity.
///
/// The vocabulary the external change source speaks when it prefers
/// [`IndexRegistry::apply`] over calling `add`/`remove` directly.
pub enum EntityChange<T> {
    /// The entity was created.
    Created(Arc<T>),
    /// An indexed field of the entity changed.
    Updated(Arc<T>),
    /// The entity is being removed and wants its entries dropped eagerly
    /// rather than waiting for lazy eviction.
    Removed(Arc<T>),
}

impl<T> EntityChange<T> {
    /// Returns the entity this change concerns.
    #[must_use]
    pub fn entity(&self) -> &Arc<T> {
        match self {
            Self::Created(entity) | Self::Updated(entity) | Self::Removed(entity) => entity,
        }
    }
}

impl<T> Clone for EntityChange<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Created(entity) => Self::Created(Arc::clone(entity)),
            Self::Updated(entity) => Self::Updated(Arc::clone(entity)),
            Self::Removed(entity) => Self::Removed(Arc::clone(entity)),
        }
    }
}

/// Owns one instance of every concrete index over `T`.
///
/// All indexes live behind one `RwLock`; every operation that touches
/// entries (including reads, which prune) takes the write lock, so access
/// to the indexes is serialized. Stats counters are readable without the
/// lock.
pub struct IndexRegistry<T> {
    config: RegistryConfig,
    indexes: RwLock<BTreeMap<String, Box<dyn EntityIndex<T>>>>,
    stats: RegistryStats,
    adds_since_prune: AtomicU64,
}

impl<T: Send + Sync + 'static> IndexRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            indexes: RwLock::new(BTreeMap::new()),
            stats: RegistryStats::new(),
            adds_since_prune: AtomicU64::new(0),
        }
    }

    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RegistryConfig::default())
    }

    /// Registers an index under its spec name.
    ///
    /// Names are unique within a registry.
    pub fn register<I>(&self, index: I) -> IndexResult<()>
    where
        I: EntityIndex<T> + 'static,
    {
        let name = index.spec().name.clone();
        let mut indexes = self.indexes.write();
        if indexes.contains_key(&name) {
            return Err(IndexError::duplicate_index(name));
        }
        debug!(index = %name, "registered index");
        indexes.insert(name, Box::new(index));
        Ok(())
    }

    /// Returns the registered index names in ascending order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.indexes.read().keys().cloned().collect()
    }

    /// Returns true if an index is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.indexes.read().contains_key(name)
    }

    /// Number of registered indexes.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indexes.read().len()
    }

    /// Indexes an entity in every registered index.
    ///
    /// With `fail_fast` off (the default) every index is visited and the
    /// first fault is reported after the fan-out; with it on, fan-out stops
    /// at the first fault. Indexes updated before a fault stay updated.
    pub fn add(&self, entity: &Arc<T>) -> IndexResult<()> {
        self.stats.record_add();
        let first_err = {
            let mut indexes = self.indexes.write();
            let mut first_err = None;
            for (name, index) in indexes.iter_mut() {
                if let Err(err) = index.add(entity) {
                    warn!(index = %name, error = %err, "index add failed");
                    self.stats.record_error();
                    if self.config.fail_fast {
                        return Err(err);
                    }
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
            first_err
        };
        self.maybe_auto_prune();
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Removes an entity's entries from every registered index.
    ///
    /// Returns true if any index held an entry that still targeted this
    /// entity. Fault policy matches [`add`](Self::add).
    pub fn remove(&self, entity: &Arc<T>) -> IndexResult<bool> {
        let mut indexes = self.indexes.write();
        let mut removed = false;
        let mut first_err = None;
        for (name, index) in indexes.iter_mut() {
            match index.remove_entity(entity) {
                Ok(hit) => removed |= hit,
                Err(err) => {
                    warn!(index = %name, error = %err, "index remove failed");
                    self.stats.record_error();
                    if self.config.fail_fast {
                        return Err(err);
                    }
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(removed),
        }
    }

    /// Applies a change-notification event.
    ///
    /// `Created` and `Updated` both index the entity (an update may move it
    /// to a new key; the stale entry under the old key is left to lazy
    /// eviction once the old entity version is dropped). `Removed` drops
    /// its entries eagerly.
    pub fn apply(&self, change: &EntityChange<T>) -> IndexResult<()> {
        match change {
            EntityChange::Created(entity) | EntityChange::Updated(entity) => self.add(entity),
            EntityChange::Removed(entity) => self.remove(entity).map(|_| ()),
        }
    }

    /// Runs `f` against the index registered under `name`, downcast to its
    /// concrete type `I`.
    ///
    /// The closure runs under the registry write lock; keep it short.
    pub fn with_index<I, R>(&self, name: &str, f: impl FnOnce(&mut I) -> R) -> IndexResult<R>
    where
        I: EntityIndex<T> + 'static,
    {
        let mut indexes = self.indexes.write();
        let index = indexes
            .get_mut(name)
            .ok_or_else(|| IndexError::index_not_found(name))?;
        let index = index
            .as_any_mut()
            .downcast_mut::<I>()
            .ok_or_else(|| IndexError::type_mismatch(name, std::any::type_name::<I>()))?;
        self.stats.record_access();
        Ok(f(index))
    }

    /// Sweeps dead entries in every index, returning how many were removed.
    pub fn prune(&self) -> usize {
        let removed: usize = {
            let mut indexes = self.indexes.write();
            indexes.values_mut().map(|index| index.prune()).sum()
        };
        if removed > 0 {
            debug!(removed, "registry prune sweep");
        }
        removed
    }

    /// Clears every index. The indexes themselves stay registered.
    pub fn clear(&self) {
        let mut indexes = self.indexes.write();
        for index in indexes.values_mut() {
            index.clear();
        }
    }

    /// Returns a snapshot of registry statistics.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        let indexes = self.indexes.read();
        let entries = indexes.values().map(|index| index.len()).sum::<usize>() as u64;
        let evicted = indexes.values().map(|index| index.evicted()).sum();
        StatsSnapshot {
            adds: self.stats.adds(),
            accesses: self.stats.accesses(),
            errors: self.stats.errors(),
            entries,
            evicted,
        }
    }

    fn maybe_auto_prune(&self) {
        let Some(interval) = self.config.auto_prune_interval else {
            return;
        };
        if interval == 0 {
            return;
        }
        let adds = self.adds_since_prune.fetch_add(1, Ordering::Relaxed) + 1;
        if adds >= interval {
            self.adds_since_prune.store(0, Ordering::Relaxed);
            let removed = self.prune();
            debug!(removed, "auto-prune sweep");
        }
    }
}

impl<T: Send + Sync + 'static> Default for IndexRegistry<T> {
    fn default() -> Self {
        Self::with_defaults()
    }
}
