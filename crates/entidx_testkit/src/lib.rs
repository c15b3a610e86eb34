//! # entidx Testkit
//!
//! Test utilities for entidx.
//!
//! This crate provides:
//! - A small sample entity model (sensors and observations) with
//!   ready-made indexes and registries
//! - Property-based test generators using proptest
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use entidx_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_registry() {
//!     let registry = sensor_registry();
//!     let held = vec![sensor("pier-7")];
//!     registry.add(&held[0]).unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
