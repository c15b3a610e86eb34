//! Ordered map: the sorted container underneath every index.
//!
//! `OrderedMap` wraps a `BTreeMap` and exposes exactly the operations the
//! index layer needs:
//!
//! - Upsert, point lookup, removal
//! - Three range-query forms: from-key (inclusive), until-key (exclusive),
//!   and closed interval
//! - Full ascending enumeration
//!
//! Range queries return materialized vectors of references rather than lazy
//! iterators: results are finite, restartable, and cannot observe a mutation
//! made after the call returned.

use std::collections::BTreeMap;
use std::ops::Bound;

/// A sorted associative container with unique keys.
///
/// Iteration order is always ascending key order.
#[derive(Debug, Clone, Default)]
pub struct OrderedMap<K, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord + Clone, V> OrderedMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Inserts or replaces the value for `key`.
    ///
    /// Returns the displaced value if the key was already present.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Point lookup.
    #[must_use]
    pub fn try_get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Mutable point lookup.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Removes the entry for `key` if present, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    /// Returns the value for `key`, inserting one built by `make` first if
    /// the key is absent.
    pub fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> &mut V {
        self.entries.entry(key).or_insert_with(make)
    }

    /// Returns true if the map holds an entry for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries with key ≥ `key`, ascending.
    #[must_use]
    pub fn range_from(&self, key: &K) -> Vec<(&K, &V)> {
        self.entries
            .range((Bound::Included(key.clone()), Bound::Unbounded))
            .collect()
    }

    /// Entries with key < `key`, ascending.
    ///
    /// The bound is exclusive: an entry whose key equals `key` is not
    /// returned. Use [`range_over`](Self::range_over) for a closed interval.
    #[must_use]
    pub fn range_until(&self, key: &K) -> Vec<(&K, &V)> {
        self.entries
            .range((Bound::Unbounded, Bound::Excluded(key.clone())))
            .collect()
    }

    /// Entries with `first` ≤ key ≤ `last`, ascending.
    ///
    /// Returns an empty vector when `first > last`.
    #[must_use]
    pub fn range_over(&self, first: &K, last: &K) -> Vec<(&K, &V)> {
        if first > last {
            return Vec::new();
        }
        self.entries
            .range(first.clone()..=last.clone())
            .collect()
    }

    /// All entries, ascending.
    #[must_use]
    pub fn all(&self) -> Vec<(&K, &V)> {
        self.entries.iter().collect()
    }

    /// Mutable variant of [`range_from`](Self::range_from).
    pub fn range_from_mut(&mut self, key: &K) -> Vec<(&K, &mut V)> {
        self.entries
            .range_mut((Bound::Included(key.clone()), Bound::Unbounded))
            .collect()
    }

    /// Mutable variant of [`range_until`](Self::range_until).
    pub fn range_until_mut(&mut self, key: &K) -> Vec<(&K, &mut V)> {
        self.entries
            .range_mut((Bound::Unbounded, Bound::Excluded(key.clone())))
            .collect()
    }

    /// Mutable variant of [`range_over`](Self::range_over).
    pub fn range_over_mut(&mut self, first: &K, last: &K) -> Vec<(&K, &mut V)> {
        if first > last {
            return Vec::new();
        }
        self.entries
            .range_mut(first.clone()..=last.clone())
            .collect()
    }

    /// Mutable variant of [`all`](Self::all).
    pub fn all_mut(&mut self) -> Vec<(&K, &mut V)> {
        self.entries.iter_mut().collect()
    }

    /// Returns the smallest key.
    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        self.entries.keys().next()
    }

    /// Returns the largest key.
    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        self.entries.keys().next_back()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> OrderedMap<String, u32> {
        let mut map = OrderedMap::new();
        for (k, v) in [("C", 3), ("A", 1), ("D", 4), ("B", 2)] {
            map.upsert(k.to_string(), v);
        }
        map
    }

    #[test]
    fn upsert_replaces_and_returns_displaced() {
        let mut map = OrderedMap::new();
        assert_eq!(map.upsert("A".to_string(), 1), None);
        assert_eq!(map.upsert("A".to_string(), 2), Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map.try_get(&"A".to_string()), Some(&2));
    }

    #[test]
    fn all_is_ascending() {
        let map = populated();
        let keys: Vec<_> = map.all().into_iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, ["A", "B", "C", "D"]);
    }

    #[test]
    fn range_from_is_inclusive() {
        let map = populated();
        let keys: Vec<_> = map
            .range_from(&"B".to_string())
            .into_iter()
            .map(|(k, _)| k.clone())
            .collect();
        assert_eq!(keys, ["B", "C", "D"]);
    }

    #[test]
    fn range_until_is_exclusive() {
        let map = populated();
        let keys: Vec<_> = map
            .range_until(&"C".to_string())
            .into_iter()
            .map(|(k, _)| k.clone())
            .collect();
        assert_eq!(keys, ["A", "B"]);
    }

    #[test]
    fn range_over_is_closed() {
        let map = populated();
        let keys: Vec<_> = map
            .range_over(&"B".to_string(), &"C".to_string())
            .into_iter()
            .map(|(k, _)| k.clone())
            .collect();
        assert_eq!(keys, ["B", "C"]);
    }

    #[test]
    fn range_over_inverted_bounds_is_empty() {
        let map = populated();
        assert!(map
            .range_over(&"C".to_string(), &"B".to_string())
            .is_empty());
    }

    #[test]
    fn range_with_no_matches_is_empty() {
        let map = populated();
        assert!(map.range_from(&"E".to_string()).is_empty());
        assert!(map.range_until(&"A".to_string()).is_empty());
    }

    #[test]
    fn remove_and_contains() {
        let mut map = populated();
        assert!(map.contains_key(&"B".to_string()));
        assert_eq!(map.remove(&"B".to_string()), Some(2));
        assert!(!map.contains_key(&"B".to_string()));
        assert_eq!(map.remove(&"B".to_string()), None);
    }

    #[test]
    fn first_and_last_key() {
        let map = populated();
        assert_eq!(map.first_key().map(String::as_str), Some("A"));
        assert_eq!(map.last_key().map(String::as_str), Some("D"));
    }

    #[test]
    fn get_or_insert_with_creates_once() {
        let mut map: OrderedMap<String, Vec<u32>> = OrderedMap::new();
        map.get_or_insert_with("A".to_string(), Vec::new).push(1);
        map.get_or_insert_with("A".to_string(), Vec::new).push(2);
        assert_eq!(map.try_get(&"A".to_string()), Some(&vec![1, 2]));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn range_over_mut_allows_in_place_update() {
        let mut map = populated();
        for (_, v) in map.range_over_mut(&"A".to_string(), &"B".to_string()) {
            *v += 10;
        }
        assert_eq!(map.try_get(&"A".to_string()), Some(&11));
        assert_eq!(map.try_get(&"C".to_string()), Some(&3));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn all_is_ascending_for_any_input(keys in prop::collection::vec(0u32..500, 0..64)) {
                let mut map = OrderedMap::new();
                for key in &keys {
                    map.upsert(*key, ());
                }

                let sorted: Vec<u32> = map.all().into_iter().map(|(k, _)| *k).collect();
                for pair in sorted.windows(2) {
                    prop_assert!(pair[0] < pair[1]);
                }
            }

            #[test]
            fn range_over_equals_filtered_all(
                keys in prop::collection::vec(0u32..500, 0..64),
                first in 0u32..500,
                last in 0u32..500,
            ) {
                let mut map = OrderedMap::new();
                for key in &keys {
                    map.upsert(*key, ());
                }

                let expected: Vec<u32> = map
                    .all()
                    .into_iter()
                    .map(|(k, _)| *k)
                    .filter(|k| *k >= first && *k <= last)
                    .collect();
                let got: Vec<u32> = map
                    .range_over(&first, &last)
                    .into_iter()
                    .map(|(k, _)| *k)
                    .collect();
                prop_assert_eq!(got, expected);
            }
        }
    }
}
