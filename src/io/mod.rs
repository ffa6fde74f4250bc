//! Input/output helpers.
//!
//! - fitted parameter JSON read/write (`params`)
//! - per-sample CSV exports (`export`)

pub mod export;
pub mod params;

pub use export::*;
pub use params::*;
