//! Benchmark support for PolyDB.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
