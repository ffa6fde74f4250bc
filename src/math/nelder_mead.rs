//! Derivative-free local minimization (Nelder–Mead simplex).
//!
//! Standard coefficients: reflection `ρ = 1`, expansion `χ = 2`, contraction
//! `ψ = 0.5`, shrink `σ = 0.5`. The initial simplex perturbs each coordinate of the
//! starting point by 5 % (or sets it to `0.00025` when it is exactly zero).
//!
//! Termination: the simplex is considered converged when both
//!
//! - `max_i ‖x_i - x_best‖∞ <= xatol`
//! - `max_i |f_i - f_best| <= fatol`
//!
//! hold. Otherwise the run stops after `max_iter` iterations and is reported as
//! unconverged; callers keep the best vertex anyway.
//!
//! Non-finite objective values are treated as `+∞`, so poles and overflow simply
//! make a vertex lose every comparison.

use nalgebra::DVector;

use crate::error::{CalibError, CalibResult};

const RHO: f64 = 1.0;
const CHI: f64 = 2.0;
const PSI: f64 = 0.5;
const SIGMA: f64 = 0.5;

const NONZERO_DELTA: f64 = 0.05;
const ZERO_DELTA: f64 = 0.00025;

/// Local minimizer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct NelderMeadOptions {
    /// Iteration cap. `None` uses `iters_per_dim * n`.
    pub max_iter: Option<usize>,
    /// Per-dimension iteration budget when `max_iter` is `None`.
    pub iters_per_dim: usize,
    /// Absolute tolerance on simplex vertex spread.
    pub xatol: f64,
    /// Absolute tolerance on objective spread across vertices.
    pub fatol: f64,
    /// After convergence, rebuild the simplex around the best vertex and continue,
    /// at most this many times, while the objective keeps improving.
    pub reinit: usize,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iter: None,
            iters_per_dim: 1000,
            xatol: 1e-8,
            fatol: 1e-12,
            reinit: 2,
        }
    }
}

impl NelderMeadOptions {
    pub fn iteration_cap(&self, n: usize) -> usize {
        self.max_iter.unwrap_or(self.iters_per_dim.saturating_mul(n.max(1)))
    }

    pub fn validate(&self) -> CalibResult<()> {
        if !(self.xatol.is_finite() && self.xatol >= 0.0) {
            return Err(CalibError::InvalidArgument(format!("xatol must be >= 0, got {}", self.xatol)));
        }
        if !(self.fatol.is_finite() && self.fatol >= 0.0) {
            return Err(CalibError::InvalidArgument(format!("fatol must be >= 0, got {}", self.fatol)));
        }
        if self.max_iter == Some(0) || (self.max_iter.is_none() && self.iters_per_dim == 0) {
            return Err(CalibError::InvalidArgument("max_iter must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Result of one local minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMinimum {
    pub x: DVector<f64>,
    pub fx: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// Minimize `f` starting from `x0`.
///
/// Always terminates within the iteration cap (summed over re-initializations).
pub fn nelder_mead<F>(f: F, x0: &DVector<f64>, opts: &NelderMeadOptions) -> LocalMinimum
where
    F: Fn(&DVector<f64>) -> f64,
{
    let cap = opts.iteration_cap(x0.len());
    let mut evaluations = 0usize;
    let mut eval = |x: &DVector<f64>| {
        evaluations += 1;
        let v = f(x);
        if v.is_finite() { v } else { f64::INFINITY }
    };

    let mut best = run_simplex(&mut eval, x0, opts, cap);
    let mut iterations = best.iterations;

    for _ in 0..opts.reinit {
        if !best.converged || iterations >= cap {
            break;
        }
        let again = run_simplex(&mut eval, &best.x, opts, cap - iterations);
        iterations += again.iterations;
        if !(again.fx < best.fx) {
            break;
        }
        let gain = best.fx - again.fx;
        best = again;
        if gain <= opts.fatol {
            break;
        }
    }

    best.iterations = iterations;
    best.evaluations = evaluations;
    best
}

fn run_simplex<E>(eval: &mut E, x0: &DVector<f64>, opts: &NelderMeadOptions, cap: usize) -> LocalMinimum
where
    E: FnMut(&DVector<f64>) -> f64,
{
    let n = x0.len();
    if n == 0 {
        let fx = eval(x0);
        return LocalMinimum {
            x: x0.clone(),
            fx,
            iterations: 0,
            evaluations: 0,
            converged: true,
        };
    }

    let mut sim: Vec<DVector<f64>> = Vec::with_capacity(n + 1);
    sim.push(x0.clone());
    for k in 0..n {
        let mut y = x0.clone();
        if y[k] != 0.0 {
            y[k] *= 1.0 + NONZERO_DELTA;
        } else {
            y[k] = ZERO_DELTA;
        }
        sim.push(y);
    }
    let mut fsim: Vec<f64> = sim.iter().map(|x| eval(x)).collect();
    sort_simplex(&mut sim, &mut fsim);

    let mut iterations = 0usize;
    let mut converged = false;

    while iterations < cap {
        if simplex_converged(&sim, &fsim, opts) {
            converged = true;
            break;
        }

        let worst = n;
        let mut xbar = DVector::<f64>::zeros(n);
        for v in &sim[..n] {
            xbar += v;
        }
        xbar /= n as f64;

        let xr = &xbar * (1.0 + RHO) - &sim[worst] * RHO;
        let fxr = eval(&xr);
        let mut shrink = false;

        if fxr < fsim[0] {
            let xe = &xbar * (1.0 + RHO * CHI) - &sim[worst] * (RHO * CHI);
            let fxe = eval(&xe);
            if fxe < fxr {
                sim[worst] = xe;
                fsim[worst] = fxe;
            } else {
                sim[worst] = xr;
                fsim[worst] = fxr;
            }
        } else if fxr < fsim[n - 1] {
            sim[worst] = xr;
            fsim[worst] = fxr;
        } else if fxr < fsim[worst] {
            // Outside contraction.
            let xc = &xbar * (1.0 + PSI * RHO) - &sim[worst] * (PSI * RHO);
            let fxc = eval(&xc);
            if fxc <= fxr {
                sim[worst] = xc;
                fsim[worst] = fxc;
            } else {
                shrink = true;
            }
        } else {
            // Inside contraction.
            let xcc = &xbar * (1.0 - PSI) + &sim[worst] * PSI;
            let fxcc = eval(&xcc);
            if fxcc < fsim[worst] {
                sim[worst] = xcc;
                fsim[worst] = fxcc;
            } else {
                shrink = true;
            }
        }

        if shrink {
            let x_best = sim[0].clone();
            for j in 1..=n {
                sim[j] = &x_best + (&sim[j] - &x_best) * SIGMA;
                fsim[j] = eval(&sim[j]);
            }
        }

        sort_simplex(&mut sim, &mut fsim);
        iterations += 1;
    }

    LocalMinimum {
        x: sim[0].clone(),
        fx: fsim[0],
        iterations,
        evaluations: 0,
        converged,
    }
}

fn simplex_converged(sim: &[DVector<f64>], fsim: &[f64], opts: &NelderMeadOptions) -> bool {
    let x_spread = sim[1..]
        .iter()
        .map(|v| (v - &sim[0]).amax())
        .fold(0.0_f64, f64::max);
    let f_spread = fsim[1..]
        .iter()
        .map(|v| (v - fsim[0]).abs())
        .fold(0.0_f64, |acc, d| if d.is_nan() { f64::INFINITY } else { acc.max(d) });
    x_spread <= opts.xatol && f_spread <= opts.fatol
}

/// Sort vertices by objective value (stable, so earlier vertices win ties).
fn sort_simplex(sim: &mut Vec<DVector<f64>>, fsim: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..fsim.len()).collect();
    order.sort_by(|&a, &b| fsim[a].total_cmp(&fsim[b]));
    let sorted_sim: Vec<DVector<f64>> = order.iter().map(|&i| sim[i].clone()).collect();
    let sorted_f: Vec<f64> = order.iter().map(|&i| fsim[i]).collect();
    *sim = sorted_sim;
    *fsim = sorted_f;
}
