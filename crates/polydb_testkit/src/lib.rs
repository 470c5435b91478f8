//! # PolyDB Testkit
//!
//! Test utilities for PolyDB.
//!
//! This crate provides:
//! - Store fixtures with automatic cleanup, for every registered backend
//! - Property-based test generators using proptest
//! - The conformance suite every backend must pass
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use polydb_testkit::prelude::*;
//!
//! with_each_backend(|_backend, store| {
//!     assert_get_set_delete(store);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::contract::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use contract::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
