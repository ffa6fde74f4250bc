//! Reporting utilities: per-sample residuals, replays, and formatted terminal output.

use tracing::warn;

use crate::domain::{ActivationParams, RayWeightParams, SampleSet};
use crate::models::{RayBranch, RayModel, activation_checked};

pub mod format;

pub use format::*;

/// Observed vs fitted activation for one `(distance, activation)` sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationRow {
    pub distance: f64,
    pub observed: f64,
    pub fitted: f64,
    pub residual: f64,
    /// The denominator guard was applied for this sample.
    pub clamped: bool,
}

/// Measured vs simulated activation for one `(angle, distance)` sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayRow {
    pub angle: f64,
    pub distance: f64,
    /// `F(distance)`.
    pub true_activation: f64,
    pub simulated: f64,
    pub branch: RayBranch,
}

impl ReplayRow {
    pub fn residual(&self) -> f64 {
        self.true_activation - self.simulated
    }
}

/// Recompute per-sample residuals with the same guarded function used for fitting.
pub fn activation_rows(params: &ActivationParams, samples: &SampleSet) -> Vec<ActivationRow> {
    let rows: Vec<ActivationRow> = samples
        .pairs()
        .map(|(distance, observed)| {
            let (fitted, clamped) = activation_checked(params, distance);
            ActivationRow {
                distance,
                observed,
                fitted,
                residual: observed - fitted,
                clamped,
            }
        })
        .collect();

    let clamped = rows.iter().filter(|r| r.clamped).count();
    if clamped > 0 {
        warn!(clamped, "activation denominator near zero; values were clamped");
    }
    rows
}

/// Replay the ray-weight objective sample by sample.
pub fn replay_rows(model: &RayModel, params: RayWeightParams, samples: &SampleSet) -> Vec<ReplayRow> {
    let sim = model.with_params(params);
    samples
        .pairs()
        .map(|(angle, distance)| ReplayRow {
            angle,
            distance,
            true_activation: model.true_activation(distance),
            simulated: sim.simulate(angle),
            branch: sim.branch(angle),
        })
        .collect()
}
