//! Domain types shared across fitting, IO, and reporting.
//!
//! This module intentionally contains **data types only** (no numerical fitting logic).

pub mod types;

pub use types::*;
