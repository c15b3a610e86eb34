//! Composite index: group by an outer key, then index within each group.
//!
//! A composite index keeps an outer [`OrderedMap`] whose values are nested
//! indexes rather than entities: a [`WeakSortedIndex`] for the common
//! two-level shape, or a further composite for deeper key paths. `add`
//! extracts the outer key, creates the group on first use, and delegates.
//!
//! Outer-level range queries return `(outer key, nested index)` handles;
//! a query "through" both levels is composed by the caller chaining the two
//! range calls.
//!
//! A group whose inner entries have all died persists as an empty nested
//! index — groups are never garbage-collected, not even by `prune`. This is
//! a deliberate memory-growth tradeoff; `clear` is the only way to drop
//! group shells.
//!
//! [`WeakSortedIndex`]: crate::index::WeakSortedIndex

use crate::error::{IndexError, IndexResult};
use crate::index::sorted::WeakSortedIndex;
use crate::index::traits::{EntityIndex, IndexKey, IndexSpec, KeyFn};
use crate::map::OrderedMap;
use std::any::Any;
use std::sync::Arc;

/// A multi-level index: outer key to nested index over `T`.
pub struct CompositeIndex<K: IndexKey, I, T> {
    spec: IndexSpec,
    group_fn: KeyFn<K, T>,
    make_group: Arc<dyn Fn(&K) -> I + Send + Sync>,
    groups: OrderedMap<K, I>,
}

impl<K, I, T> CompositeIndex<K, I, T>
where
    K: IndexKey,
    I: EntityIndex<T> + 'static,
    T: Send + Sync + 'static,
{
    /// Creates a composite index.
    ///
    /// `group_fn` extracts the outer key; `make_group` builds the nested
    /// index for an outer key the first time an entity maps to it.
    pub fn new(
        spec: IndexSpec,
        group_fn: impl Fn(&T) -> Option<K> + Send + Sync + 'static,
        make_group: impl Fn(&K) -> I + Send + Sync + 'static,
    ) -> Self {
        Self {
            spec,
            group_fn: Arc::new(group_fn),
            make_group: Arc::new(make_group),
            groups: OrderedMap::new(),
        }
    }

    /// Returns the index specification.
    #[must_use]
    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Indexes an entity in the group for its outer key, creating the group
    /// on first use.
    pub fn add(&mut self, entity: &Arc<T>) -> IndexResult<()> {
        let key = self.extract_group_key(entity)?;
        let make_group = &self.make_group;
        let group = self
            .groups
            .get_or_insert_with(key.clone(), || make_group(&key));
        group.add(entity)
    }

    /// Removes the entity from the group for its outer key.
    ///
    /// Returns false when no group exists for the key or the group's entry
    /// no longer targets this entity. The group itself persists even when
    /// it becomes empty.
    pub fn remove_entity(&mut self, entity: &Arc<T>) -> IndexResult<bool> {
        let key = self.extract_group_key(entity)?;
        match self.groups.get_mut(&key) {
            Some(group) => group.remove_entity(entity),
            None => Ok(false),
        }
    }

    /// Returns the nested index for `key`, if any entity ever mapped to it.
    #[must_use]
    pub fn group(&self, key: &K) -> Option<&I> {
        self.groups.try_get(key)
    }

    /// Mutable handle to the nested index for `key`.
    ///
    /// Query methods on nested indexes prune as they read, so handles for
    /// querying are mutable.
    pub fn group_mut(&mut self, key: &K) -> Option<&mut I> {
        self.groups.get_mut(key)
    }

    /// All `(outer key, nested index)` handles, ascending by outer key.
    pub fn groups(&mut self) -> Vec<(&K, &mut I)> {
        self.groups.all_mut()
    }

    /// Handles for outer keys ≥ `key`, ascending.
    pub fn groups_from(&mut self, key: &K) -> Vec<(&K, &mut I)> {
        self.groups.range_from_mut(key)
    }

    /// Handles for outer keys < `key`, ascending. Exclusive bound.
    pub fn groups_until(&mut self, key: &K) -> Vec<(&K, &mut I)> {
        self.groups.range_until_mut(key)
    }

    /// Handles for outer keys in the closed interval `first..=last`,
    /// ascending. Empty when `first > last`.
    pub fn groups_over(&mut self, first: &K, last: &K) -> Vec<(&K, &mut I)> {
        self.groups.range_over_mut(first, last)
    }

    /// Outer keys in ascending order, including keys of empty groups.
    #[must_use]
    pub fn group_keys(&self) -> Vec<&K> {
        self.groups.all().into_iter().map(|(key, _)| key).collect()
    }

    /// Number of groups, empty ones included.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total entries across all groups, live or stale.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.all().iter().map(|(_, group)| group.len()).sum()
    }

    /// Returns true if no group holds any entry. Empty group shells may
    /// still exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sweeps dead entries inside every group. Empty groups persist.
    pub fn prune(&mut self) -> usize {
        self.groups
            .all_mut()
            .into_iter()
            .map(|(_, group)| group.prune())
            .sum()
    }

    /// Total stale entries evicted across all groups.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.groups
            .all()
            .iter()
            .map(|(_, group)| group.evicted())
            .sum()
    }

    /// Drops every group, shells included.
    pub fn clear(&mut self) {
        self.groups.clear();
    }

    fn extract_group_key(&self, entity: &T) -> IndexResult<K> {
        (self.group_fn)(entity).ok_or_else(|| IndexError::missing_key(&self.spec.name))
    }
}

impl<O, K, T> CompositeIndex<O, WeakSortedIndex<K, T>, T>
where
    O: IndexKey,
    K: IndexKey,
    T: Send + Sync + 'static,
{
    /// Creates the common two-level shape: group by `group_fn`, sort within
    /// each group by `inner_fn`.
    pub fn two_level(
        spec: IndexSpec,
        group_fn: impl Fn(&T) -> Option<O> + Send + Sync + 'static,
        inner_fn: impl Fn(&T) -> Option<K> + Send + Sync + 'static,
    ) -> Self {
        let inner_fn: KeyFn<K, T> = Arc::new(inner_fn);
        let inner_spec = IndexSpec::new(format!("{}.group", spec.name));
        Self::new(spec, group_fn, move |_| {
            WeakSortedIndex::from_key_fn(inner_spec.clone(), Arc::clone(&inner_fn))
        })
    }
}

impl<K, I, T> EntityIndex<T> for CompositeIndex<K, I, T>
where
    K: IndexKey,
    I: EntityIndex<T> + 'static,
    T: Send + Sync + 'static,
{
    fn spec(&self) -> &IndexSpec {
        CompositeIndex::spec(self)
    }

    fn add(&mut self, entity: &Arc<T>) -> IndexResult<()> {
        CompositeIndex::add(self, entity)
    }

    fn remove_entity(&mut self, entity: &Arc<T>) -> IndexResult<bool> {
        CompositeIndex::remove_entity(self, entity)
    }

    fn len(&self) -> usize {
        CompositeIndex::len(self)
    }

    fn prune(&mut self) -> usize {
        CompositeIndex::prune(self)
    }

    fn evicted(&self) -> u64 {
        CompositeIndex::evicted(self)
    }

    fn clear(&mut self) {
        CompositeIndex::clear(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reading {
        station: Option<String>,
        at: u64,
    }

    fn reading(station: &str, at: u64) -> Arc<Reading> {
        Arc::new(Reading {
            station: Some(station.to_string()),
            at,
        })
    }

    fn by_station_then_time() -> CompositeIndex<String, WeakSortedIndex<u64, Reading>, Reading> {
        CompositeIndex::two_level(
            IndexSpec::new("by_station_time"),
            |r: &Reading| r.station.clone(),
            |r: &Reading| Some(r.at),
        )
    }

    #[test]
    fn groups_are_created_on_demand_and_sorted() {
        let mut index = by_station_then_time();
        let held = vec![
            reading("south", 10),
            reading("north", 5),
            reading("north", 7),
        ];
        for entity in &held {
            index.add(entity).unwrap();
        }

        assert_eq!(index.group_count(), 2);
        let keys: Vec<_> = index.group_keys().into_iter().cloned().collect();
        assert_eq!(keys, ["north", "south"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn chained_range_query_through_both_levels() {
        let mut index = by_station_then_time();
        let held = vec![
            reading("north", 5),
            reading("north", 7),
            reading("north", 9),
            reading("south", 6),
        ];
        for entity in &held {
            index.add(entity).unwrap();
        }

        let mut times = Vec::new();
        for (_, group) in index.groups_over(&"north".to_string(), &"north".to_string()) {
            for entity in group.get_over(&6, &9) {
                times.push(entity.at);
            }
        }
        assert_eq!(times, [7, 9]);
    }

    #[test]
    fn inner_lookup_through_group_handle() {
        let mut index = by_station_then_time();
        let held = vec![reading("north", 5), reading("south", 6)];
        for entity in &held {
            index.add(entity).unwrap();
        }

        let group = index.group_mut(&"north".to_string()).unwrap();
        assert_eq!(group.get_by_key(&5).unwrap().at, 5);
        assert!(group.get_by_key(&6).is_none());
    }

    #[test]
    fn empty_group_persists_after_entities_die() {
        let mut index = by_station_then_time();
        let entity = reading("north", 5);
        index.add(&entity).unwrap();
        drop(entity);

        assert_eq!(index.prune(), 1);
        assert_eq!(index.group_count(), 1);
        assert!(index.is_empty());
        assert!(index.group(&"north".to_string()).is_some());
    }

    #[test]
    fn missing_outer_key_is_a_fault() {
        let mut index = by_station_then_time();
        let keyless = Arc::new(Reading {
            station: None,
            at: 1,
        });
        let err = index.add(&keyless).unwrap_err();
        assert!(matches!(err, IndexError::MissingKey { .. }));
        assert_eq!(index.group_count(), 0);
    }

    #[test]
    fn remove_entity_delegates_into_group() {
        let mut index = by_station_then_time();
        let entity = reading("north", 5);
        index.add(&entity).unwrap();

        assert!(index.remove_entity(&entity).unwrap());
        assert!(index.is_empty());
        // Group shell survives the removal.
        assert_eq!(index.group_count(), 1);
    }

    #[test]
    fn groups_until_is_exclusive() {
        let mut index = by_station_then_time();
        let held = vec![reading("a", 1), reading("b", 2), reading("c", 3)];
        for entity in &held {
            index.add(entity).unwrap();
        }

        let keys: Vec<String> = index
            .groups_until(&"c".to_string())
            .into_iter()
            .map(|(key, _)| key.clone())
            .collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn three_level_nesting() {
        // station -> day -> time
        struct Fix {
            station: Option<String>,
            day: u32,
            at: u64,
        }
        let mut index: CompositeIndex<
            String,
            CompositeIndex<u32, WeakSortedIndex<u64, Fix>, Fix>,
            Fix,
        > = CompositeIndex::new(
            IndexSpec::new("by_station_day_time"),
            |f: &Fix| f.station.clone(),
            |_| {
                CompositeIndex::two_level(
                    IndexSpec::new("by_station_day_time.group"),
                    |f: &Fix| Some(f.day),
                    |f: &Fix| Some(f.at),
                )
            },
        );

        let held = vec![
            Arc::new(Fix {
                station: Some("north".to_string()),
                day: 1,
                at: 10,
            }),
            Arc::new(Fix {
                station: Some("north".to_string()),
                day: 2,
                at: 20,
            }),
        ];
        for entity in &held {
            index.add(entity).unwrap();
        }

        assert_eq!(index.group_count(), 1);
        let station = index.group_mut(&"north".to_string()).unwrap();
        assert_eq!(station.group_count(), 2);
        let day = station.group_mut(&2).unwrap();
        assert_eq!(day.get_all()[0].at, 20);
    }
}
