//! Activation-vs-distance model `F(x) = a / (x² + b·x + c)`.
//!
//! Every evaluation goes through the denominator guard so fitting and later
//! residual replays see exactly the same function.

use crate::domain::{ActivationParams, SampleSet};
use crate::math::{DENOM_EPS, clamp_magnitude, needs_clamp};

/// Raw denominator `x² + b·x + c`.
pub fn denominator(p: &ActivationParams, x: f64) -> f64 {
    x * x + p.b * x + p.c
}

/// Evaluate `F(x)` with the sign-preserving denominator clamp.
pub fn activation(p: &ActivationParams, x: f64) -> f64 {
    p.a / clamp_magnitude(denominator(p, x), DENOM_EPS)
}

/// Evaluate `F(x)` and report whether the denominator had to be clamped.
pub fn activation_checked(p: &ActivationParams, x: f64) -> (f64, bool) {
    let d = denominator(p, x);
    (p.a / clamp_magnitude(d, DENOM_EPS), needs_clamp(d, DENOM_EPS))
}

/// Residual sum of squares `Σ (y_i - F(x_i))²` over `(distance, activation)` samples.
pub fn sum_squared_error(p: &ActivationParams, samples: &SampleSet) -> f64 {
    samples
        .pairs()
        .map(|(x, y)| {
            let r = y - activation(p, x);
            r * r
        })
        .sum()
}

/// Invert `F` on the decreasing branch: the largest `x` with `F(x) = value`.
///
/// Returns `None` when `value` is zero, non-finite, or never reached.
pub fn distance_for_activation(p: &ActivationParams, value: f64) -> Option<f64> {
    if !(value.is_finite() && value != 0.0 && p.a.is_finite()) {
        return None;
    }
    // x² + b·x + (c - a/value) = 0
    let k = p.c - p.a / value;
    let disc = p.b * p.b - 4.0 * k;
    if !(disc.is_finite() && disc >= 0.0) {
        return None;
    }
    Some((-p.b + disc.sqrt()) / 2.0)
}
