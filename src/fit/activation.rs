//! Fit `(a, b, c)` of the activation function to `(distance, activation)` samples.
//!
//! Objective: `Σ (y_i - a / (x_i² + b·x_i + c))²` with the guarded denominator.
//! Starting points: `normal(0, spread)` for each coordinate.
//!
//! The model is not uniquely parameterized in general: with fewer than three
//! distinct distances, or noisy samples, several `(a, b, c)` reproduce the data
//! equally well. Callers should judge a fit by its residual, not by comparing the
//! parameters against a reference triple.

use nalgebra::DVector;
use tracing::info;

use crate::domain::{ActivationFitConfig, ActivationParams, SampleSet};
use crate::error::CalibResult;
use crate::fit::multistart::{MultiStartOutcome, NormalGuess, minimize};
use crate::models::sum_squared_error;

/// Best-fit activation parameters plus search diagnostics.
#[derive(Debug, Clone)]
pub struct ActivationFit {
    pub params: ActivationParams,
    /// Residual sum of squares at `params`.
    pub residual: f64,
    pub search: MultiStartOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct ActivationModelFitter {
    config: ActivationFitConfig,
}

impl ActivationModelFitter {
    pub fn new(config: ActivationFitConfig) -> Self {
        Self { config }
    }

    pub fn fit(&self, samples: &SampleSet) -> CalibResult<ActivationFit> {
        let guess = NormalGuess::new(ActivationParams::ARITY, self.config.spread)?;
        let objective = |v: &DVector<f64>| sum_squared_error(&params_from(v), samples);

        let search = minimize(objective, &guess, &self.config.multistart)?;
        let params = params_from(&search.best.params);
        let residual = sum_squared_error(&params, samples);

        info!(
            a = params.a,
            b = params.b,
            c = params.c,
            residual,
            seed = search.seed,
            "activation fit finished"
        );

        Ok(ActivationFit {
            params,
            residual,
            search,
        })
    }
}

fn params_from(v: &DVector<f64>) -> ActivationParams {
    ActivationParams::new(v[0], v[1], v[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MultiStartConfig;
    use crate::models::activation;

    fn config(restarts: usize, seed: u64) -> ActivationFitConfig {
        ActivationFitConfig {
            multistart: MultiStartConfig {
                seed: Some(seed),
                ..MultiStartConfig::with_restarts(restarts)
            },
            ..ActivationFitConfig::default()
        }
    }

    #[test]
    fn residual_matches_recomputed_objective() {
        let truth = ActivationParams::new(1000.0, 2.0, 50.0);
        let xs = vec![5.0, 10.0, 20.0];
        let ys: Vec<f64> = xs.iter().map(|&x| activation(&truth, x)).collect();
        let samples = SampleSet::new("distances/activations", xs, ys).unwrap();
        let fit = ActivationModelFitter::new(config(20, 5)).fit(&samples).unwrap();
        assert_eq!(fit.residual, fit.search.best.residual);
        assert_eq!(fit.residual, sum_squared_error(&fit.params, &samples));
    }

    #[test]
    fn identical_samples_still_terminate() {
        // Degenerate input: a single repeated point admits infinitely many fits.
        let samples = SampleSet::new("distances/activations", vec![10.0; 4], vec![3.0; 4]).unwrap();
        let fit = ActivationModelFitter::new(config(25, 9)).fit(&samples).unwrap();
        assert!(fit.residual.is_finite());
        assert!(fit.residual < 1e-6);
        assert_eq!(fit.search.restarts, 25);
    }

    #[test]
    fn same_seed_gives_identical_fit() {
        let xs = vec![2.0, 4.0, 8.0, 16.0];
        let ys = vec![30.0, 14.0, 5.0, 1.5];
        let samples = SampleSet::new("distances/activations", xs, ys).unwrap();
        let a = ActivationModelFitter::new(config(30, 1234)).fit(&samples).unwrap();
        let b = ActivationModelFitter::new(config(30, 1234)).fit(&samples).unwrap();
        assert_eq!(a.params.to_array().map(f64::to_bits), b.params.to_array().map(f64::to_bits));
        assert_eq!(a.residual.to_bits(), b.residual.to_bits());
    }
}
