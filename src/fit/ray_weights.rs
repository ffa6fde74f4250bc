//! Fit `(θ, w0, w1)` of the three-ray model with a fixed activation function.
//!
//! Objective: for each `(angle_i, distance_i)` sample, compare the measured activation
//! `F(distance_i)` against the simulated combination at `angle_i`; sum the squared
//! differences.
//!
//! Starting points: `θ = max|angle| / 3` (deterministic), `w0, w1 = |normal(0, 1)|`.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, info};

use crate::domain::{ActivationParams, RayGeometry, RayWeightFitConfig, RayWeightParams, SampleSet};
use crate::error::{CalibError, CalibResult};
use crate::fit::multistart::{InitialGuess, MultiStartOutcome, minimize};
use crate::models::RayModel;

/// Initial guesses for the ray-weight search.
#[derive(Debug, Clone)]
pub struct RayWeightGuess {
    theta0: f64,
    normal: Normal<f64>,
}

impl RayWeightGuess {
    /// Guesses for samples whose largest absolute angle is `max_abs_angle`.
    pub fn new(max_abs_angle: f64) -> CalibResult<Self> {
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| CalibError::InvalidArgument(format!("initial guess distribution: {e}")))?;
        Ok(Self {
            theta0: max_abs_angle / 3.0,
            normal,
        })
    }

    pub fn theta0(&self) -> f64 {
        self.theta0
    }
}

impl InitialGuess for RayWeightGuess {
    fn dim(&self) -> usize {
        3
    }

    fn sample(&self, rng: &mut StdRng) -> DVector<f64> {
        let w0 = self.normal.sample(rng).abs();
        let w1 = self.normal.sample(rng).abs();
        DVector::from_vec(vec![self.theta0, w0, w1])
    }
}

/// Best-fit ray parameters plus search diagnostics.
#[derive(Debug, Clone)]
pub struct RayWeightFit {
    pub params: RayWeightParams,
    /// Residual sum of squares at `params`.
    pub residual: f64,
    pub search: MultiStartOutcome,
}

#[derive(Debug, Clone)]
pub struct RayWeightFitter {
    model: RayModel,
    config: RayWeightFitConfig,
}

impl RayWeightFitter {
    pub fn new(activation: ActivationParams, geometry: RayGeometry, config: RayWeightFitConfig) -> Self {
        Self {
            model: RayModel::new(activation, geometry),
            config,
        }
    }

    pub fn model(&self) -> &RayModel {
        &self.model
    }

    pub fn fit(&self, samples: &SampleSet) -> CalibResult<RayWeightFit> {
        let guess = RayWeightGuess::new(samples.max_abs_x())?;
        debug!(
            theta0 = guess.theta0(),
            non_negative = self.config.non_negative_weights,
            "initial ray angle"
        );
        let objective = |v: &DVector<f64>| self.model.sum_squared_error(self.candidate(v), samples);

        let search = minimize(objective, &guess, &self.config.multistart)?;
        let params = self.candidate(&search.best.params);
        let residual = self.model.sum_squared_error(params, samples);

        info!(
            angle_deg = params.angle_deg,
            w0 = params.w0,
            w1 = params.w1,
            residual,
            seed = search.seed,
            "ray weight fit finished"
        );
        if params.w0 < 0.0 || params.w1 < 0.0 {
            tracing::warn!(w0 = params.w0, w1 = params.w1, "fitted weights are negative; see --non-negative");
        }

        Ok(RayWeightFit {
            params,
            residual,
            search,
        })
    }

    fn candidate(&self, v: &DVector<f64>) -> RayWeightParams {
        let p = RayWeightParams::from_vector(v);
        if self.config.non_negative_weights {
            RayWeightParams::new(p.angle_deg, p.w0.abs(), p.w1.abs())
        } else {
            p
        }
    }
}
