//! Parameter estimation.
//!
//! Responsibilities:
//!
//! - run the shared multi-start minimizer (parallel restarts, deterministic reduction)
//! - fit the activation-vs-distance model
//! - fit the three-ray combination model given a fitted activation model

pub mod activation;
pub mod multistart;
pub mod ray_weights;

pub use activation::*;
pub use multistart::*;
pub use ray_weights::*;
