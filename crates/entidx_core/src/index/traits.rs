//! Index traits and key types.

use crate::error::IndexResult;
use std::any::Any;
use std::sync::Arc;

/// A key that can be indexed.
///
/// Keys must be orderable (entries are held sorted) and cheap to clone.
pub trait IndexKey: Clone + Ord + Send + Sync + 'static {}

impl<T: Clone + Ord + Send + Sync + 'static> IndexKey for T {}

/// A stored key extractor.
///
/// Returns `None` when the entity has no value for the indexed field,
/// which an `add` surfaces as [`IndexError::MissingKey`].
///
/// [`IndexError::MissingKey`]: crate::error::IndexError::MissingKey
pub type KeyFn<K, T> = Arc<dyn Fn(&T) -> Option<K> + Send + Sync>;

/// Specification for an index.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    /// Name of the index, unique within a registry.
    pub name: String,
}

impl IndexSpec {
    /// Creates a new index specification.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Core index trait.
///
/// Every index over an entity type `T` supports the write path (`add`,
/// `remove_entity`), maintenance (`prune`, `clear`), and introspection.
/// Typed read operations live on the concrete index types; the registry
/// reaches them through [`as_any_mut`](Self::as_any_mut).
pub trait EntityIndex<T>: Send + Sync {
    /// Returns the index specification.
    fn spec(&self) -> &IndexSpec;

    /// Indexes an entity, replacing the target of an existing entry with
    /// the same key.
    fn add(&mut self, entity: &Arc<T>) -> IndexResult<()>;

    /// Removes the entry for this entity's key, if that entry still targets
    /// this entity. Returns true if an entry was removed.
    fn remove_entity(&mut self, entity: &Arc<T>) -> IndexResult<bool>;

    /// Number of entries, live or stale.
    fn len(&self) -> usize;

    /// Returns true if the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every dead entry now, returning how many were removed.
    fn prune(&mut self) -> usize;

    /// Total stale entries evicted over the index's lifetime.
    fn evicted(&self) -> u64;

    /// Removes all entries.
    fn clear(&mut self);

    /// Upcast for typed registry access.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed registry access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_spec_holds_name() {
        let spec = IndexSpec::new("by_name");
        assert_eq!(spec.name, "by_name");
    }

    #[test]
    fn key_fn_extracts_optional_key() {
        let key_fn: KeyFn<String, (u32, Option<String>)> =
            Arc::new(|entity| entity.1.clone());
        assert_eq!(key_fn(&(1, Some("A".into()))), Some("A".to_string()));
        assert_eq!(key_fn(&(2, None)), None);
    }
}
