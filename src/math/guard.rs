//! Sign-preserving magnitude clamps.
//!
//! Rational models blow up when a denominator crosses zero. Instead of dividing by a
//! (near-)zero value we replace it with `±eps`, keeping the sign the raw value had.
//! The clamp is used identically during fitting and when residuals are recomputed
//! for reporting, so reported residuals always match the minimized objective.

/// Minimum magnitude for the activation-function denominator.
pub const DENOM_EPS: f64 = 1e-30;

/// Minimum magnitude for `cos θ` in the side-ray geometry `d / cos θ`.
pub const COS_EPS: f64 = 1e-12;

/// Clamp `value` so that `|value| >= eps`, preserving its sign.
///
/// `+0.0` maps to `+eps` and `-0.0` to `-eps`. NaN passes through unchanged.
pub fn clamp_magnitude(value: f64, eps: f64) -> f64 {
    if value.abs() < eps {
        eps.copysign(value)
    } else {
        value
    }
}

/// `true` when [`clamp_magnitude`] would modify `value`.
pub fn needs_clamp(value: f64, eps: f64) -> bool {
    value.abs() < eps
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_maps_to_signed_eps() {
        assert_eq!(clamp_magnitude(0.0, DENOM_EPS), DENOM_EPS);
        assert_eq!(clamp_magnitude(-0.0, DENOM_EPS), -DENOM_EPS);
    }

    #[test]
    fn large_values_are_untouched() {
        assert_eq!(clamp_magnitude(3.5, DENOM_EPS), 3.5);
        assert_eq!(clamp_magnitude(-2.0, COS_EPS), -2.0);
        assert!(!needs_clamp(1e-20, DENOM_EPS));
        assert!(needs_clamp(1e-31, DENOM_EPS));
    }

    proptest! {
        #[test]
        fn clamp_keeps_sign_and_floor(v in -1e-29f64..1e-29f64) {
            let c = clamp_magnitude(v, DENOM_EPS);
            prop_assert!(c.abs() >= DENOM_EPS);
            prop_assert_eq!(c.is_sign_negative(), v.is_sign_negative());
        }
    }
}
