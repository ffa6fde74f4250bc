//! Shared calibration workflows used by the CLI front-end.
//!
//! Keeping this in one place avoids mixing the core workflow with printing:
//! parse inputs -> validate -> fit -> per-sample rows -> exportable file
//!
//! The CLI can then focus on presentation and exports.

use chrono::Utc;
use tracing::info;

use crate::domain::{
    ActivationFile, ActivationFitConfig, ActivationParams, RayGeometry, RayWeightFile,
    RayWeightFitConfig, RunInfo, SampleSet, SamplesRecord,
};
use crate::error::CalibResult;
use crate::fit::{ActivationFit, ActivationModelFitter, RayWeightFit, RayWeightFitter};
use crate::models::RayModel;
use crate::report::{ActivationRow, ReplayRow, activation_rows, replay_rows};

/// All computed outputs of a single activation fit.
#[derive(Debug, Clone)]
pub struct ActivationRun {
    pub samples: SampleSet,
    pub fit: ActivationFit,
    pub rows: Vec<ActivationRow>,
}

impl ActivationRun {
    pub fn to_file(&self) -> ActivationFile {
        ActivationFile {
            run: RunInfo {
                tool: "activation".to_string(),
                generated_at: Utc::now(),
                seed: self.fit.search.seed,
                restarts: self.fit.search.restarts,
                residual: self.fit.residual,
            },
            params: self.fit.params,
            samples: SamplesRecord::from(&self.samples),
        }
    }
}

/// All computed outputs of a single ray-weight fit.
#[derive(Debug, Clone)]
pub struct RayWeightRun {
    pub samples: SampleSet,
    pub model: RayModel,
    pub fit: RayWeightFit,
    pub replay: Vec<ReplayRow>,
}

impl RayWeightRun {
    pub fn to_file(&self) -> RayWeightFile {
        RayWeightFile {
            run: RunInfo {
                tool: "ray-weights".to_string(),
                generated_at: Utc::now(),
                seed: self.fit.search.seed,
                restarts: self.fit.search.restarts,
                residual: self.fit.residual,
            },
            activation: *self.model.activation_params(),
            geometry: *self.model.geometry(),
            params: self.fit.params,
            samples: SamplesRecord::from(&self.samples),
        }
    }
}

/// Validate `(distance, activation)` samples and fit the activation function.
///
/// Shape errors are returned before any minimization work starts.
pub fn run_activation(
    distances: Vec<f64>,
    activations: Vec<f64>,
    config: ActivationFitConfig,
) -> CalibResult<ActivationRun> {
    let samples = SampleSet::new("distances/activations", distances, activations)?;
    info!(
        distances = ?samples.xs(),
        activations = ?samples.ys(),
        restarts = config.multistart.restarts,
        spread = config.spread,
        "activation fit input"
    );

    let fit = ActivationModelFitter::new(config).fit(&samples)?;
    let rows = activation_rows(&fit.params, &samples);

    Ok(ActivationRun { samples, fit, rows })
}

/// Validate `(angle, distance)` samples and fit the three-ray model.
///
/// Shape errors are returned before any minimization work starts.
pub fn run_ray_weights(
    activation: ActivationParams,
    geometry: RayGeometry,
    angles: Vec<f64>,
    distances: Vec<f64>,
    config: RayWeightFitConfig,
) -> CalibResult<RayWeightRun> {
    let samples = SampleSet::new("angles/distances", angles, distances)?;
    info!(
        a = activation.a,
        b = activation.b,
        c = activation.c,
        dist = geometry.dist,
        dmax = geometry.dmax,
        angles = ?samples.xs(),
        distances = ?samples.ys(),
        restarts = config.multistart.restarts,
        "ray weight fit input"
    );

    let fitter = RayWeightFitter::new(activation, geometry, config);
    let fit = fitter.fit(&samples)?;
    let model = *fitter.model();
    let replay = replay_rows(&model, fit.params, &samples);

    Ok(RayWeightRun {
        samples,
        model,
        fit,
        replay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MultiStartConfig;
    use crate::error::CalibError;

    #[test]
    fn activation_run_rows_match_samples() {
        let config = ActivationFitConfig {
            multistart: MultiStartConfig {
                seed: Some(11),
                ..MultiStartConfig::with_restarts(20)
            },
            ..ActivationFitConfig::default()
        };
        let run = run_activation(vec![5.0, 10.0, 20.0], vec![12.0, 6.0, 2.0], config).unwrap();
        assert_eq!(run.rows.len(), 3);

        let file = run.to_file();
        assert_eq!(file.run.seed, 11);
        assert_eq!(file.run.restarts, 20);
        assert_eq!(file.samples.x, vec![5.0, 10.0, 20.0]);
    }

    #[test]
    fn activation_shape_error_comes_before_any_search() {
        // A restart count this large would never finish if any search started.
        let config = ActivationFitConfig {
            multistart: MultiStartConfig::with_restarts(usize::MAX),
            ..ActivationFitConfig::default()
        };
        let err = run_activation(vec![5.0, 10.0, 20.0], vec![1.0, 2.0], config).unwrap_err();
        match err {
            CalibError::InputShape { left, right, .. } => assert_eq!((left, right), (3, 2)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ray_weight_shape_error_comes_before_any_search() {
        let config = RayWeightFitConfig {
            multistart: MultiStartConfig::with_restarts(usize::MAX),
            ..RayWeightFitConfig::default()
        };
        let err = run_ray_weights(
            ActivationParams::new(1000.0, 2.0, 50.0),
            RayGeometry::new(10.0, 40.0).unwrap(),
            vec![-10.0, 0.0],
            vec![12.0],
            config,
        )
        .unwrap_err();
        assert!(matches!(err, CalibError::InputShape { left: 2, right: 1, .. }));
    }
}
