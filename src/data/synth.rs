//! Synthetic activation samples from a known `(a, b, c)`.
//!
//! Useful to check that a fit recovers a curve before pointing the tools at real
//! sensor measurements.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ActivationParams, SampleSet};
use crate::error::{CalibError, CalibResult};
use crate::models::activation;

/// Settings for synthetic sample generation.
#[derive(Debug, Clone, Default)]
pub struct SynthConfig {
    /// Standard deviation of additive Gaussian noise (0 disables noise).
    pub noise: f64,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SyntheticSamples {
    /// `x` = distances, `y` = activations.
    pub samples: SampleSet,
    pub seed: u64,
}

/// Evaluate `F` at each distance and optionally add noise.
pub fn generate_activations(
    params: &ActivationParams,
    distances: &[f64],
    config: &SynthConfig,
) -> CalibResult<SyntheticSamples> {
    if distances.is_empty() {
        return Err(CalibError::EmptyInput { what: "distances" });
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(CalibError::InvalidArgument(format!(
            "noise must be a non-negative real, got {}",
            config.noise
        )));
    }

    let seed = config.seed.unwrap_or_else(|| thread_rng().r#gen());
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = if config.noise > 0.0 {
        Some(
            Normal::new(0.0, config.noise)
                .map_err(|e| CalibError::InvalidArgument(format!("noise distribution: {e}")))?,
        )
    } else {
        None
    };

    let activations: Vec<f64> = distances
        .iter()
        .map(|&x| {
            let clean = activation(params, x);
            match &normal {
                Some(n) => clean + n.sample(&mut rng),
                None => clean,
            }
        })
        .collect();

    let samples = SampleSet::new("distances/activations", distances.to_vec(), activations)?;
    Ok(SyntheticSamples { samples, seed })
}
