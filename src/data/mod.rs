//! Sample sources.

pub mod synth;

pub use synth::*;
