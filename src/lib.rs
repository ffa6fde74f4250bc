//! `ir-calib` library crate.
//!
//! Calibration of infrared distance sensors in two stages:
//!
//! 1. fit the activation-vs-distance function `F(x) = a / (x² + b·x + c)`
//! 2. with `F` fixed, fit the three-ray combination model `(θ, w0, w1)` to
//!    wall-sliding measurements
//!
//! The binary (`ircal`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - both stages share one multi-start minimizer

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
