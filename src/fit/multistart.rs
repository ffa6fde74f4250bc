//! Multi-start nonlinear least squares.
//!
//! Runs the Nelder–Mead local minimizer from many random starting points and keeps
//! the best result.
//!
//! Determinism:
//! - all starting points are drawn up front, in restart order, from a single
//!   `StdRng` seeded with the configured (or reported) seed
//! - local runs are independent and may execute on the rayon pool
//! - the reduction walks results in restart order with a strict `<`, so the lowest
//!   restart index wins ties no matter which thread finished first
//!
//! A restart that fails to converge is not an error; it simply competes with its
//! final objective value.

use nalgebra::DVector;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{FitResult, MultiStartConfig};
use crate::error::{CalibError, CalibResult};
use crate::math::{LocalMinimum, nelder_mead};

/// Strategy producing randomized initial guesses.
pub trait InitialGuess: Sync {
    /// Dimension of the parameter vector.
    fn dim(&self) -> usize;

    fn sample(&self, rng: &mut StdRng) -> DVector<f64>;
}

/// Independent `normal(0, spread)` draws for every coordinate.
#[derive(Debug, Clone)]
pub struct NormalGuess {
    dim: usize,
    normal: Normal<f64>,
}

impl NormalGuess {
    pub fn new(dim: usize, spread: f64) -> CalibResult<Self> {
        if !(spread.is_finite() && spread > 0.0) {
            return Err(CalibError::InvalidArgument(format!(
                "spread must be a positive real, got {spread}"
            )));
        }
        let normal = Normal::new(0.0, spread)
            .map_err(|e| CalibError::InvalidArgument(format!("initial guess distribution: {e}")))?;
        Ok(Self { dim, normal })
    }
}

impl InitialGuess for NormalGuess {
    fn dim(&self) -> usize {
        self.dim
    }

    fn sample(&self, rng: &mut StdRng) -> DVector<f64> {
        DVector::from_fn(self.dim, |_, _| self.normal.sample(&mut *rng))
    }
}

/// A strict improvement of the best-so-far objective, in restart order.
#[derive(Debug, Clone, PartialEq)]
pub struct Improvement {
    pub restart: usize,
    pub residual: f64,
}

/// Everything the multi-start search produced.
#[derive(Debug, Clone)]
pub struct MultiStartOutcome {
    pub best: FitResult,
    /// Restart index that produced `best`.
    pub best_restart: usize,
    /// Seed actually used (drawn from entropy when none was configured).
    pub seed: u64,
    pub restarts: usize,
    /// Restarts that hit the iteration cap before meeting tolerances.
    pub unconverged: usize,
    pub improvements: Vec<Improvement>,
}

/// Minimize `objective` from `config.restarts` starting points drawn from `guess`.
pub fn minimize<F, G>(objective: F, guess: &G, config: &MultiStartConfig) -> CalibResult<MultiStartOutcome>
where
    F: Fn(&DVector<f64>) -> f64 + Sync,
    G: InitialGuess + ?Sized,
{
    config.validate()?;

    let seed = config.seed.unwrap_or_else(|| thread_rng().r#gen());
    let mut rng = StdRng::seed_from_u64(seed);
    let starts: Vec<DVector<f64>> = (0..config.restarts).map(|_| guess.sample(&mut rng)).collect();
    debug!(seed, restarts = config.restarts, dim = guess.dim(), "starting multi-start search");

    let run = |(idx, x0): (usize, &DVector<f64>)| {
        let local = nelder_mead(&objective, x0, &config.local);
        debug!(
            restart = idx,
            residual = local.fx,
            iterations = local.iterations,
            converged = local.converged,
            "local minimization finished"
        );
        local
    };

    let locals: Vec<LocalMinimum> = if config.parallel {
        starts.par_iter().enumerate().map(run).collect()
    } else {
        starts.iter().enumerate().map(run).collect()
    };

    let reduced = locals
        .into_iter()
        .enumerate()
        .fold(Reduction::default(), Reduction::push);

    let Some((best_restart, best)) = reduced.best else {
        return Err(CalibError::NoFiniteFit {
            restarts: config.restarts,
        });
    };

    Ok(MultiStartOutcome {
        best: FitResult {
            params: best.x,
            residual: best.fx,
        },
        best_restart,
        seed,
        restarts: config.restarts,
        unconverged: reduced.unconverged,
        improvements: reduced.improvements,
    })
}

#[derive(Default)]
struct Reduction {
    best: Option<(usize, LocalMinimum)>,
    unconverged: usize,
    improvements: Vec<Improvement>,
}

impl Reduction {
    fn push(mut self, (idx, local): (usize, LocalMinimum)) -> Self {
        if !local.converged {
            self.unconverged += 1;
        }
        let better = match &self.best {
            None => local.fx.is_finite(),
            Some((_, b)) => local.fx < b.fx,
        };
        if better {
            info!(
                restart = idx,
                residual = local.fx,
                previous = self.best.as_ref().map(|(_, b)| b.fx),
                "new best"
            );
            self.improvements.push(Improvement {
                restart: idx,
                residual: local.fx,
            });
            self.best = Some((idx, local));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Fixed starting points, cycling.
    struct ListGuess(Vec<DVector<f64>>);

    impl InitialGuess for ListGuess {
        fn dim(&self) -> usize {
            self.0[0].len()
        }

        fn sample(&self, rng: &mut StdRng) -> DVector<f64> {
            let i = rng.gen_range(0..self.0.len());
            self.0[i].clone()
        }
    }

    fn config(restarts: usize, seed: u64) -> MultiStartConfig {
        MultiStartConfig {
            seed: Some(seed),
            ..MultiStartConfig::with_restarts(restarts)
        }
    }

    // Local minimum at x = +1 (f = 1), global at x = -1 (f = 0).
    fn double_well(x: &DVector<f64>) -> f64 {
        let v = x[0];
        let penalty = if v > 0.0 { 1.0 } else { 0.0 };
        (v * v - 1.0).powi(2) + penalty
    }

    #[test]
    fn finds_global_minimum_across_restarts() {
        let guess = NormalGuess::new(1, 3.0).unwrap();
        let out = minimize(double_well, &guess, &config(50, 7)).unwrap();
        assert_abs_diff_eq!(out.best.params[0], -1.0, epsilon = 1e-4);
        assert!(out.best.residual < 1e-8);
        assert_eq!(out.restarts, 50);
        assert_eq!(out.seed, 7);
    }

    #[test]
    fn improvements_are_strictly_decreasing() {
        let guess = NormalGuess::new(1, 3.0).unwrap();
        let out = minimize(double_well, &guess, &config(40, 11)).unwrap();
        assert!(!out.improvements.is_empty());
        for w in out.improvements.windows(2) {
            assert!(w[1].residual < w[0].residual);
            assert!(w[1].restart > w[0].restart);
        }
        assert_eq!(out.improvements.last().unwrap().restart, out.best_restart);
    }

    #[test]
    fn parallel_and_sequential_agree_bit_for_bit() {
        let f = |x: &DVector<f64>| (x[0] - 2.0).powi(2) + (x[1] * x[0] - 1.0).powi(2);
        let guess = NormalGuess::new(2, 10.0).unwrap();
        let par = minimize(f, &guess, &config(64, 99)).unwrap();
        let seq_cfg = MultiStartConfig {
            parallel: false,
            ..config(64, 99)
        };
        let seq = minimize(f, &guess, &seq_cfg).unwrap();
        assert_eq!(par.best, seq.best);
        assert_eq!(par.best_restart, seq.best_restart);
        assert_eq!(par.improvements, seq.improvements);
    }

    #[test]
    fn ties_keep_the_first_restart() {
        // Every start is the same point: all restarts tie, restart 0 must win.
        let guess = ListGuess(vec![DVector::from_vec(vec![0.5, 0.5])]);
        let f = |x: &DVector<f64>| x[0] * x[0] + x[1] * x[1];
        let out = minimize(f, &guess, &config(8, 3)).unwrap();
        assert_eq!(out.best_restart, 0);
        assert_eq!(out.improvements.len(), 1);
    }

    #[test]
    fn all_non_finite_is_reported() {
        let guess = NormalGuess::new(2, 1.0).unwrap();
        let cfg = MultiStartConfig {
            local: crate::math::NelderMeadOptions {
                max_iter: Some(10),
                ..Default::default()
            },
            ..config(3, 1)
        };
        let err = minimize(|_: &DVector<f64>| f64::NAN, &guess, &cfg).unwrap_err();
        assert!(matches!(err, CalibError::NoFiniteFit { restarts: 3 }));
    }

    #[test]
    fn rejects_non_positive_spread() {
        assert!(NormalGuess::new(3, 0.0).is_err());
        assert!(NormalGuess::new(3, -1.0).is_err());
    }
}
