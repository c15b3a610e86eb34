//! Error types for entidx core.

use thiserror::Error;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur in entidx index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The entity has no value for the field the index keys on.
    #[error("missing key: entity has no value for index '{index}'")]
    MissingKey {
        /// Name of the index whose key extractor returned nothing.
        index: String,
    },

    /// No index is registered under the given name.
    #[error("index not found: {name}")]
    IndexNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// The registered index has a different concrete type than requested.
    #[error("index type mismatch: '{name}' is not a {expected}")]
    IndexTypeMismatch {
        /// Name of the index.
        name: String,
        /// The concrete type the caller asked for.
        expected: &'static str,
    },

    /// An index with this name is already registered.
    #[error("index already registered: {name}")]
    DuplicateIndex {
        /// The conflicting name.
        name: String,
    },
}

impl IndexError {
    /// Creates a missing key error.
    pub fn missing_key(index: impl Into<String>) -> Self {
        Self::MissingKey {
            index: index.into(),
        }
    }

    /// Creates an index not found error.
    pub fn index_not_found(name: impl Into<String>) -> Self {
        Self::IndexNotFound { name: name.into() }
    }

    /// Creates an index type mismatch error.
    pub fn type_mismatch(name: impl Into<String>, expected: &'static str) -> Self {
        Self::IndexTypeMismatch {
            name: name.into(),
            expected,
        }
    }

    /// Creates a duplicate index error.
    pub fn duplicate_index(name: impl Into<String>) -> Self {
        Self::DuplicateIndex { name: name.into() }
    }
}
