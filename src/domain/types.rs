//! Shared domain types.
//!
//! These types are intentionally small value types so they can be:
//!
//! - passed by value through the fitters
//! - exported to JSON (activation fits are reloaded for plotting and for the
//!   ray-weight stage)
//! - validated once at construction (arity, paired lengths) instead of at every use

use chrono::{DateTime, Utc};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{CalibError, CalibResult};
use crate::math::NelderMeadOptions;

/// Parameters `(a, b, c)` of the activation function `F(x) = a / (x² + b·x + c)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivationParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl ActivationParams {
    pub const ARITY: usize = 3;

    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    /// Comma-separated form accepted by `ircal ray-weights <params>`.
    pub fn to_arg_string(self) -> String {
        format!("{},{},{}", self.a, self.b, self.c)
    }
}

impl TryFrom<&[f64]> for ActivationParams {
    type Error = CalibError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        match values {
            [a, b, c] => Ok(Self::new(*a, *b, *c)),
            _ => Err(CalibError::ParamArity {
                expected: Self::ARITY,
                got: values.len(),
            }),
        }
    }
}

/// Parameters of the three-ray combination model.
///
/// A center ray with weight `w0` and two flanking rays at `±angle_deg`, each with
/// weight `w1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayWeightParams {
    /// Half-aperture between the center ray and a side ray, in degrees.
    pub angle_deg: f64,
    pub w0: f64,
    pub w1: f64,
}

impl RayWeightParams {
    pub fn new(angle_deg: f64, w0: f64, w1: f64) -> Self {
        Self { angle_deg, w0, w1 }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.angle_deg, self.w0, self.w1]
    }

    pub(crate) fn from_vector(v: &DVector<f64>) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Paired samples `(x_i, y_i)` with matching lengths (at least one pair).
///
/// The independent variable is a distance or an incidence angle depending on the
/// tool; the dependent one an activation or a perceived distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl SampleSet {
    /// Validate and pair two sequences.
    ///
    /// `what` names the pair in error messages (e.g. `"distances/activations"`).
    pub fn new(what: &'static str, x: Vec<f64>, y: Vec<f64>) -> CalibResult<Self> {
        if x.len() != y.len() {
            return Err(CalibError::InputShape {
                what,
                left: x.len(),
                right: y.len(),
            });
        }
        if x.is_empty() {
            return Err(CalibError::EmptyInput { what });
        }
        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn xs(&self) -> &[f64] {
        &self.x
    }

    pub fn ys(&self) -> &[f64] {
        &self.y
    }

    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Largest `|x_i|`.
    pub fn max_abs_x(&self) -> f64 {
        self.x.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}

/// Fixed wall geometry used by the wall-sliding calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayGeometry {
    /// Distance from the sensor to the wall.
    pub dist: f64,
    /// Distance reported when nothing is detected.
    pub dmax: f64,
}

impl RayGeometry {
    pub fn new(dist: f64, dmax: f64) -> CalibResult<Self> {
        if !(dist.is_finite() && dist > 0.0) {
            return Err(CalibError::InvalidArgument(format!(
                "dist must be a positive real, got {dist}"
            )));
        }
        if !(dmax.is_finite() && dmax > 0.0) {
            return Err(CalibError::InvalidArgument(format!(
                "dmax must be a positive real, got {dmax}"
            )));
        }
        if dmax <= dist {
            tracing::warn!(dist, dmax, "dmax does not exceed dist; the no-detection branch is not distinguishable");
        }
        Ok(Self { dist, dmax })
    }
}

/// Output of the multi-start minimizer: best parameter vector and its residual.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub params: DVector<f64>,
    /// Residual sum of squares at `params`.
    pub residual: f64,
}

/// Settings for the shared multi-start minimizer.
#[derive(Debug, Clone)]
pub struct MultiStartConfig {
    /// Number of independent local minimizations.
    pub restarts: usize,
    /// Seed for the initial-guess generator. `None` draws one from entropy.
    pub seed: Option<u64>,
    /// Run local minimizations on the rayon thread pool.
    pub parallel: bool,
    /// Local minimizer settings.
    pub local: NelderMeadOptions,
}

impl MultiStartConfig {
    pub fn with_restarts(restarts: usize) -> Self {
        Self {
            restarts,
            seed: None,
            parallel: true,
            local: NelderMeadOptions::default(),
        }
    }

    pub fn validate(&self) -> CalibResult<()> {
        if self.restarts == 0 {
            return Err(CalibError::InvalidArgument("restarts must be >= 1".to_string()));
        }
        self.local.validate()
    }
}

/// Configuration for fitting [`ActivationParams`].
#[derive(Debug, Clone)]
pub struct ActivationFitConfig {
    pub multistart: MultiStartConfig,
    /// Standard deviation of the normal distribution initial guesses are drawn from.
    pub spread: f64,
}

impl ActivationFitConfig {
    pub const DEFAULT_RESTARTS: usize = 1000;
    pub const DEFAULT_SPREAD: f64 = 1000.0;
}

impl Default for ActivationFitConfig {
    fn default() -> Self {
        Self {
            multistart: MultiStartConfig::with_restarts(Self::DEFAULT_RESTARTS),
            spread: Self::DEFAULT_SPREAD,
        }
    }
}

/// Configuration for fitting [`RayWeightParams`].
#[derive(Debug, Clone)]
pub struct RayWeightFitConfig {
    pub multistart: MultiStartConfig,
    /// Evaluate and report `|w0|`, `|w1|` so weights can never go negative.
    ///
    /// When off, weights are non-negative only at initialization.
    pub non_negative_weights: bool,
}

impl RayWeightFitConfig {
    pub const DEFAULT_RESTARTS: usize = 100;
}

impl Default for RayWeightFitConfig {
    fn default() -> Self {
        Self {
            multistart: MultiStartConfig::with_restarts(Self::DEFAULT_RESTARTS),
            non_negative_weights: false,
        }
    }
}

/// Recorded samples inside an exported file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplesRecord {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl From<&SampleSet> for SamplesRecord {
    fn from(samples: &SampleSet) -> Self {
        Self {
            x: samples.xs().to_vec(),
            y: samples.ys().to_vec(),
        }
    }
}

/// Provenance shared by every exported fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub restarts: usize,
    pub residual: f64,
}

/// Saved activation fit (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationFile {
    pub run: RunInfo,
    pub params: ActivationParams,
    /// `x` = distances, `y` = activations.
    pub samples: SamplesRecord,
}

/// Saved ray-weight fit (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RayWeightFile {
    pub run: RunInfo,
    pub activation: ActivationParams,
    pub geometry: RayGeometry,
    pub params: RayWeightParams,
    /// `x` = incidence angles (degrees), `y` = perceived distances.
    pub samples: SamplesRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_set_rejects_mismatched_lengths() {
        let err = SampleSet::new("distances/activations", vec![1.0, 2.0, 3.0], vec![1.0]).unwrap_err();
        match err {
            CalibError::InputShape { left, right, .. } => {
                assert_eq!(left, 3);
                assert_eq!(right, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sample_set_rejects_empty_input() {
        let err = SampleSet::new("angles/distances", vec![], vec![]).unwrap_err();
        assert!(matches!(err, CalibError::EmptyInput { .. }));
    }

    #[test]
    fn activation_params_require_three_values() {
        let err = ActivationParams::try_from(&[1.0, 2.0][..]).unwrap_err();
        assert!(matches!(err, CalibError::ParamArity { expected: 3, got: 2 }));

        let p = ActivationParams::try_from(&[1000.0, 2.0, 50.0][..]).unwrap();
        assert_eq!(p, ActivationParams::new(1000.0, 2.0, 50.0));
        assert_eq!(p.to_arg_string(), "1000,2,50");
    }

    #[test]
    fn geometry_rejects_non_positive_distances() {
        assert!(RayGeometry::new(0.0, 10.0).is_err());
        assert!(RayGeometry::new(5.0, f64::NAN).is_err());
        assert!(RayGeometry::new(5.0, 10.0).is_ok());
    }

    #[test]
    fn max_abs_x_uses_magnitude() {
        let s = SampleSet::new("angles/distances", vec![-45.0, 10.0, 30.0], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.max_abs_x(), 45.0);
    }

    #[test]
    fn multistart_config_rejects_zero_restarts() {
        let cfg = MultiStartConfig::with_restarts(0);
        assert!(cfg.validate().is_err());
    }
}
