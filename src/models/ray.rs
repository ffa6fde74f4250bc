//! Three-ray "wall-sliding" combination model.
//!
//! A rigid sensor with a center ray (weight `w0`) and two side rays at `±θ`
//! (weight `w1` each) faces a flat wall at distance `d`. As the wall edge slides
//! past, the incidence angle `α` decides which rays still hit the wall:
//!
//! | branch | condition | simulated activation |
//! |---|---|---|
//! | [`RayBranch::Full`] | `α < -θ` | `w1·F(d1) + w0·F(d) + w1·F(d1)` |
//! | [`RayBranch::CenterAndSide`] | `-θ <= α < 0` | `w1·F(dmax) + w0·F(d) + w1·F(d1)` |
//! | [`RayBranch::SideOnly`] | `0 <= α < θ` | `w1·F(dmax) + w0·F(dmax) + w1·F(d1)` |
//! | [`RayBranch::Clear`] | `α >= θ` | `(w1 + w0 + w1)·F(dmax)` |
//!
//! with `d1 = d / cos θ`. Boundaries belong to the branch reached through strict `<`
//! tests, evaluated in table order.

use crate::domain::{ActivationParams, RayGeometry, RayWeightParams, SampleSet};
use crate::math::{COS_EPS, clamp_magnitude};
use crate::models::activation::activation;

/// Which rays see the wall at a given incidence angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayBranch {
    Full,
    CenterAndSide,
    SideOnly,
    Clear,
}

/// Select the branch for incidence angle `alpha` and ray angle `theta` (same units).
pub fn classify(alpha: f64, theta: f64) -> RayBranch {
    if alpha < -theta {
        RayBranch::Full
    } else if alpha < 0.0 {
        RayBranch::CenterAndSide
    } else if alpha < theta {
        RayBranch::SideOnly
    } else {
        RayBranch::Clear
    }
}

/// Fixed part of the model: activation function and wall geometry.
#[derive(Debug, Clone, Copy)]
pub struct RayModel {
    activation: ActivationParams,
    geometry: RayGeometry,
    f_d0: f64,
    f_dmax: f64,
}

impl RayModel {
    pub fn new(params: ActivationParams, geometry: RayGeometry) -> Self {
        Self {
            activation: params,
            geometry,
            f_d0: activation(&params, geometry.dist),
            f_dmax: activation(&params, geometry.dmax),
        }
    }

    pub fn activation_params(&self) -> &ActivationParams {
        &self.activation
    }

    pub fn geometry(&self) -> &RayGeometry {
        &self.geometry
    }

    /// `F(d)`: activation of a ray hitting the wall head-on.
    pub fn f_d0(&self) -> f64 {
        self.f_d0
    }

    /// `F(dmax)`: activation of a ray that sees nothing.
    pub fn f_dmax(&self) -> f64 {
        self.f_dmax
    }

    /// `F(d / cos θ)` for a side ray at `theta_deg`, with `cos θ` guarded away from zero.
    pub fn side_activation(&self, theta_deg: f64) -> f64 {
        let cos = clamp_magnitude(theta_deg.to_radians().cos(), COS_EPS);
        activation(&self.activation, self.geometry.dist / cos)
    }

    /// Measured activation `F(distance)` for a perceived distance.
    pub fn true_activation(&self, distance: f64) -> f64 {
        activation(&self.activation, distance)
    }

    /// Bind candidate ray parameters, precomputing the side-ray activation.
    pub fn with_params(&self, params: RayWeightParams) -> RaySimulator<'_> {
        RaySimulator {
            model: self,
            params,
            f_d1: self.side_activation(params.angle_deg),
        }
    }

    /// Residual sum of squares `Σ (F(distance_i) - F_sim(angle_i))²`.
    pub fn sum_squared_error(&self, params: RayWeightParams, samples: &SampleSet) -> f64 {
        let sim = self.with_params(params);
        samples
            .pairs()
            .map(|(angle, distance)| {
                let r = self.true_activation(distance) - sim.simulate(angle);
                r * r
            })
            .sum()
    }
}

/// A [`RayModel`] with fixed candidate parameters.
#[derive(Debug, Clone, Copy)]
pub struct RaySimulator<'a> {
    model: &'a RayModel,
    params: RayWeightParams,
    f_d1: f64,
}

impl RaySimulator<'_> {
    pub fn f_d1(&self) -> f64 {
        self.f_d1
    }

    pub fn branch(&self, alpha_deg: f64) -> RayBranch {
        classify(alpha_deg, self.params.angle_deg)
    }

    /// Simulated combined activation at incidence angle `alpha_deg`.
    pub fn simulate(&self, alpha_deg: f64) -> f64 {
        let RayWeightParams { w0, w1, .. } = self.params;
        let (f_d0, f_dmax, f_d1) = (self.model.f_d0, self.model.f_dmax, self.f_d1);
        match self.branch(alpha_deg) {
            RayBranch::Full => w1 * f_d1 + w0 * f_d0 + w1 * f_d1,
            RayBranch::CenterAndSide => w1 * f_dmax + w0 * f_d0 + w1 * f_d1,
            RayBranch::SideOnly => w1 * f_dmax + w0 * f_dmax + w1 * f_d1,
            RayBranch::Clear => w1 * f_dmax + w0 * f_dmax + w1 * f_dmax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model() -> RayModel {
        RayModel::new(
            ActivationParams::new(1000.0, 2.0, 50.0),
            RayGeometry::new(10.0, 40.0).unwrap(),
        )
    }

    #[test]
    fn boundaries_use_strict_inequalities() {
        let theta = 15.0;
        assert_eq!(classify(-15.0 - 1e-9, theta), RayBranch::Full);
        assert_eq!(classify(-theta, theta), RayBranch::CenterAndSide);
        assert_eq!(classify(-0.0, theta), RayBranch::SideOnly);
        assert_eq!(classify(0.0, theta), RayBranch::SideOnly);
        assert_eq!(classify(theta - 1e-9, theta), RayBranch::SideOnly);
        assert_eq!(classify(theta, theta), RayBranch::Clear);
    }

    #[test]
    fn boundary_values_match_branch_formulas() {
        let m = model();
        let params = RayWeightParams::new(20.0, 0.5, 0.25);
        let sim = m.with_params(params);
        let (f_d0, f_dmax, f_d1) = (m.f_d0(), m.f_dmax(), sim.f_d1());

        // F_dsim(-θ) takes the `-θ <= α < 0` branch.
        assert_relative_eq!(sim.simulate(-20.0), 0.25 * f_dmax + 0.5 * f_d0 + 0.25 * f_d1);
        // F_dsim(θ) takes the `α >= θ` branch.
        assert_relative_eq!(sim.simulate(20.0), (0.25 + 0.5 + 0.25) * f_dmax);
        assert_relative_eq!(sim.simulate(-30.0), 0.5 * f_d1 + 0.5 * f_d0);
        assert_relative_eq!(sim.simulate(5.0), 0.25 * f_dmax + 0.5 * f_dmax + 0.25 * f_d1);
    }

    #[test]
    fn side_ray_distance_grows_with_angle() {
        let m = model();
        assert_relative_eq!(m.side_activation(0.0), m.f_d0());
        let expected = crate::models::activation::activation(
            m.activation_params(),
            10.0 / 60.0_f64.to_radians().cos(),
        );
        assert_relative_eq!(m.side_activation(60.0), expected);
    }

    #[test]
    fn side_ray_at_right_angle_stays_finite() {
        let m = model();
        assert!(m.side_activation(90.0).is_finite());
        assert!(m.side_activation(-90.0).is_finite());
    }

    #[test]
    fn sse_is_zero_for_self_consistent_samples() {
        let m = model();
        let params = RayWeightParams::new(12.0, 0.5, 0.25);
        let sim = m.with_params(params);
        let angles = vec![-30.0, -5.0, 0.0, 5.0, 30.0];
        let distances: Vec<f64> = angles
            .iter()
            .map(|&a| {
                crate::models::activation::distance_for_activation(m.activation_params(), sim.simulate(a))
                    .unwrap()
            })
            .collect();
        let samples = SampleSet::new("angles/distances", angles, distances).unwrap();
        assert!(m.sum_squared_error(params, &samples) < 1e-18);
    }
}
