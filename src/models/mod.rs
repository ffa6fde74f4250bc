//! Sensor response models.
//!
//! Models are implemented as small, pure functions so that the fitting code can
//! stay generic over parameter vectors.

pub mod activation;
pub mod ray;

pub use activation::*;
pub use ray::*;
