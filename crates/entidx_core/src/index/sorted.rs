//! Weak sorted index: at most one live entity per key, sorted by key.
//!
//! The index holds `(key, WeakEntry)` pairs in an [`OrderedMap`] and
//! tolerates silent entity disposal: a dead entry discovered during a
//! lookup or scan is treated as "not currently indexed" and removed as a
//! side effect of the read. Range scans return live entities only.
//!
//! Lookup and range methods therefore take `&mut self`: reading can shrink
//! the index.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut index = WeakSortedIndex::new(IndexSpec::new("by_name"), |s: &Sensor| {
//!     Some(s.name.clone())
//! });
//!
//! index.add(&sensor)?;
//! let found = index.get_by_key(&"pier-7".to_string());
//! ```

use crate::entry::WeakEntry;
use crate::error::{IndexError, IndexResult};
use crate::index::traits::{EntityIndex, IndexKey, IndexSpec, KeyFn};
use crate::map::OrderedMap;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, trace};

/// A single-key index over weakly-referenced entities.
///
/// Invariants:
/// - At most one entry per key value; `add` with an existing key retargets
///   the entry rather than duplicating it (last writer wins).
/// - Full enumeration is strictly ascending by key.
/// - The index never extends an entity's lifetime.
pub struct WeakSortedIndex<K: IndexKey, T> {
    spec: IndexSpec,
    key_fn: KeyFn<K, T>,
    entries: OrderedMap<K, WeakEntry<T>>,
    evicted: u64,
}

impl<K: IndexKey, T: Send + Sync + 'static> WeakSortedIndex<K, T> {
    /// Creates an index with the given key extractor.
    ///
    /// The extractor returns `None` when the entity has no value for the
    /// indexed field; `add` reports that as [`IndexError::MissingKey`].
    pub fn new(
        spec: IndexSpec,
        key_fn: impl Fn(&T) -> Option<K> + Send + Sync + 'static,
    ) -> Self {
        Self::from_key_fn(spec, Arc::new(key_fn))
    }

    /// Creates an index from an already-shared key extractor.
    #[must_use]
    pub fn from_key_fn(spec: IndexSpec, key_fn: KeyFn<K, T>) -> Self {
        Self {
            spec,
            key_fn,
            entries: OrderedMap::new(),
            evicted: 0,
        }
    }

    /// Returns the index specification.
    #[must_use]
    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Indexes an entity under its extracted key.
    ///
    /// An existing entry for the same key is retargeted at this entity;
    /// otherwise a new entry is inserted. The previous target, live or not,
    /// is simply no longer referenced.
    pub fn add(&mut self, entity: &Arc<T>) -> IndexResult<()> {
        let key = self.extract_key(entity)?;
        match self.entries.get_mut(&key) {
            Some(entry) => entry.retarget(entity),
            None => {
                self.entries.upsert(key, WeakEntry::new(entity));
            }
        }
        Ok(())
    }

    /// Looks up the live entity for `key`.
    ///
    /// Returns whether this specific key resolved to a live entity. A dead
    /// entry found under `key` is removed and reported as `None`.
    pub fn get_by_key(&mut self, key: &K) -> Option<Arc<T>> {
        match self.entries.try_get(key) {
            None => None,
            Some(entry) => match entry.try_resolve() {
                Some(entity) => Some(entity),
                None => {
                    self.entries.remove(key);
                    self.evicted += 1;
                    trace!(index = %self.spec.name, "evicted stale entry on lookup");
                    None
                }
            },
        }
    }

    /// Live entities with key ≥ `key`, ascending.
    pub fn get_from(&mut self, key: &K) -> Vec<Arc<T>> {
        let (live, dead) = Self::split_live(self.entries.range_from(key));
        self.evict(dead);
        live
    }

    /// Live entities with key < `key`, ascending.
    ///
    /// The bound is exclusive, matching [`OrderedMap::range_until`].
    pub fn get_until(&mut self, key: &K) -> Vec<Arc<T>> {
        let (live, dead) = Self::split_live(self.entries.range_until(key));
        self.evict(dead);
        live
    }

    /// Live entities with `first` ≤ key ≤ `last`, ascending.
    ///
    /// Empty when `first > last` or no keys match.
    pub fn get_over(&mut self, first: &K, last: &K) -> Vec<Arc<T>> {
        let (live, dead) = Self::split_live(self.entries.range_over(first, last));
        self.evict(dead);
        live
    }

    /// All live entities, ascending by key.
    pub fn get_all(&mut self) -> Vec<Arc<T>> {
        let (live, dead) = Self::split_live(self.entries.all());
        self.evict(dead);
        live
    }

    /// Explicitly removes the entry for `key`, live or stale.
    ///
    /// Returns true if an entry was removed.
    pub fn remove(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes the entry for this entity's key iff it still targets this
    /// entity.
    ///
    /// For callers that do receive removal notifications; an entry that was
    /// since retargeted at a different entity is left alone. A stale entry
    /// found under the key is evicted, but that does not count as removing
    /// this entity.
    pub fn remove_entity(&mut self, entity: &Arc<T>) -> IndexResult<bool> {
        let key = self.extract_key(entity)?;
        match self.entries.try_get(&key) {
            None => Ok(false),
            Some(entry) => match entry.try_resolve() {
                Some(target) if Arc::ptr_eq(&target, entity) => {
                    self.entries.remove(&key);
                    Ok(true)
                }
                Some(_) => Ok(false),
                None => {
                    self.entries.remove(&key);
                    self.evicted += 1;
                    trace!(index = %self.spec.name, "evicted stale entry on remove");
                    Ok(false)
                }
            },
        }
    }

    /// Sweeps every dead entry now, returning how many were removed.
    pub fn prune(&mut self) -> usize {
        let dead: Vec<K> = self
            .entries
            .all()
            .into_iter()
            .filter(|(_, entry)| !entry.is_live())
            .map(|(key, _)| key.clone())
            .collect();
        let removed = dead.len();
        self.evict(dead);
        if removed > 0 {
            debug!(index = %self.spec.name, removed, "pruned stale entries");
        }
        removed
    }

    /// Returns true if the map holds an entry for `key`, live or stale.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries, live or stale.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total stale entries evicted over the index's lifetime.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn extract_key(&self, entity: &T) -> IndexResult<K> {
        (self.key_fn)(entity).ok_or_else(|| IndexError::missing_key(&self.spec.name))
    }

    fn split_live(pairs: Vec<(&K, &WeakEntry<T>)>) -> (Vec<Arc<T>>, Vec<K>) {
        let mut live = Vec::new();
        let mut dead = Vec::new();
        for (key, entry) in pairs {
            match entry.try_resolve() {
                Some(entity) => live.push(entity),
                None => dead.push(key.clone()),
            }
        }
        (live, dead)
    }

    fn evict(&mut self, dead: Vec<K>) {
        for key in &dead {
            self.entries.remove(key);
            self.evicted += 1;
            trace!(index = %self.spec.name, "evicted stale entry on scan");
        }
    }
}

impl<K: IndexKey, T: Send + Sync + 'static> EntityIndex<T> for WeakSortedIndex<K, T> {
    fn spec(&self) -> &IndexSpec {
        WeakSortedIndex::spec(self)
    }

    fn add(&mut self, entity: &Arc<T>) -> IndexResult<()> {
        WeakSortedIndex::add(self, entity)
    }

    fn remove_entity(&mut self, entity: &Arc<T>) -> IndexResult<bool> {
        WeakSortedIndex::remove_entity(self, entity)
    }

    fn len(&self) -> usize {
        WeakSortedIndex::len(self)
    }

    fn prune(&mut self) -> usize {
        WeakSortedIndex::prune(self)
    }

    fn evicted(&self) -> u64 {
        WeakSortedIndex::evicted(self)
    }

    fn clear(&mut self) {
        WeakSortedIndex::clear(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
