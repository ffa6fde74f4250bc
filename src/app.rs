//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - converts comma-separated inputs into validated samples
//! - runs the selected calibration stage
//! - prints reports/plots
//! - writes optional exports

use std::io::{ErrorKind, Write};
use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{ActivationArgs, Cli, Command, PlotArgs, RayWeightArgs, SearchArgs, SynthArgs, parse_reals};
use crate::data::{SynthConfig, generate_activations};
use crate::domain::{
    ActivationFitConfig, ActivationParams, MultiStartConfig, RayGeometry, RayWeightFitConfig,
};
use crate::error::{AppError, EXIT_IO};
use crate::math::NelderMeadOptions;

pub mod pipeline;

/// Entry point for the `ircal` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Command::Activation(args) => handle_activation(args),
        Command::RayWeights(args) => handle_ray_weights(args),
        Command::Synth(args) => handle_synth(args),
        Command::Plot(args) => handle_plot(args),
    }
}

/// Logs go to stderr so stdout stays paste-ready.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_activation(args: ActivationArgs) -> Result<(), AppError> {
    let distances = parse_reals("distances", &args.distances)?;
    let activations = parse_reals("activations", &args.activations)?;
    let config = activation_config_from_args(&args);

    let run = pipeline::run_activation(distances, activations, config)?;

    emit(&crate::report::format_activation_summary(&run.fit, &run.rows))?;

    if args.plot {
        let plot = crate::plot::render_activation_plot(
            &run.fit.params,
            run.samples.xs(),
            run.samples.ys(),
            args.width,
            args.height,
        );
        emit(&plot)?;
    }

    if let Some(path) = &args.export {
        crate::io::write_activation_json(path, &run.to_file())?;
    }
    if let Some(path) = &args.export_csv {
        crate::io::write_activation_csv(path, &run.rows)?;
    }

    Ok(())
}

fn handle_ray_weights(args: RayWeightArgs) -> Result<(), AppError> {
    let params = resolve_activation_params(&args.params)?;
    let geometry = RayGeometry::new(args.dist, args.dmax)?;
    let angles = parse_reals("angles", &args.angles)?;
    let distances = parse_reals("distances", &args.distances)?;
    let config = ray_weight_config_from_args(&args);

    let run = pipeline::run_ray_weights(params, geometry, angles, distances, config)?;

    emit(&crate::report::format_ray_summary(&run.fit, &run.model))?;
    if args.verbose {
        emit(&crate::report::format_replay(&run.replay))?;
    }

    if let Some(path) = &args.export {
        crate::io::write_ray_weight_json(path, &run.to_file())?;
    }
    if let Some(path) = &args.export_csv {
        crate::io::write_replay_csv(path, &run.replay)?;
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let params = parse_activation_params(&args.params)?;
    let distances = parse_reals("distances", &args.distances)?;
    let config = SynthConfig {
        noise: args.noise,
        seed: args.seed,
    };

    let out = generate_activations(&params, &distances, &config)?;
    tracing::info!(seed = out.seed, noise = config.noise, "generated synthetic activations");

    let values: Vec<String> = out.samples.ys().iter().map(|v| v.to_string()).collect();
    emit(&values.join(","))
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::read_activation_json(&args.file)?;
    let plot = crate::plot::render_activation_file(&file, args.width, args.height);
    emit(&plot)
}

/// Print a report block to stdout.
fn emit(text: &str) -> Result<(), AppError> {
    write_block(&mut std::io::stdout().lock(), text)
}

/// A closed pipe (`ircal ... | head`) ends output quietly.
fn write_block<W: Write>(out: &mut W, text: &str) -> Result<(), AppError> {
    match writeln!(out, "{text}").and_then(|()| out.flush()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(AppError::new(EXIT_IO, format!("failed to write output: {e}"))),
    }
}

/// `a,b,c`, or `@FILE` naming an exported activation fit.
fn resolve_activation_params(input: &str) -> Result<ActivationParams, AppError> {
    match input.strip_prefix('@') {
        Some(path) => {
            let file = crate::io::read_activation_json(Path::new(path))?;
            tracing::info!(path, residual = file.run.residual, "loaded activation params");
            Ok(file.params)
        }
        None => parse_activation_params(input),
    }
}

fn parse_activation_params(input: &str) -> Result<ActivationParams, AppError> {
    let values = parse_reals("params", input)?;
    Ok(ActivationParams::try_from(values.as_slice())?)
}

fn multistart_from_args(restarts: usize, search: &SearchArgs) -> MultiStartConfig {
    MultiStartConfig {
        restarts,
        seed: search.seed,
        parallel: !search.sequential,
        local: NelderMeadOptions {
            max_iter: search.max_iter,
            ..NelderMeadOptions::default()
        },
    }
}

pub fn activation_config_from_args(args: &ActivationArgs) -> ActivationFitConfig {
    ActivationFitConfig {
        multistart: multistart_from_args(args.restarts, &args.search),
        spread: args.spread,
    }
}

pub fn ray_weight_config_from_args(args: &RayWeightArgs) -> RayWeightFitConfig {
    RayWeightFitConfig {
        multistart: multistart_from_args(args.restarts, &args.search),
        non_negative_weights: args.non_negative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_follows_flags() {
        let cli = Cli::parse_from([
            "ircal",
            "ray-weights",
            "1000,2,50",
            "10",
            "40",
            "-30,0,30",
            "10,40,40",
            "--restarts",
            "7",
            "--max-iter",
            "50",
            "--sequential",
            "--non-negative",
        ]);
        let Command::RayWeights(args) = cli.command else {
            panic!("expected ray-weights");
        };
        let config = ray_weight_config_from_args(&args);
        assert_eq!(config.multistart.restarts, 7);
        assert_eq!(config.multistart.local.max_iter, Some(50));
        assert!(!config.multistart.parallel);
        assert!(config.non_negative_weights);
    }

    #[test]
    fn activation_params_load_from_exported_file() {
        use crate::domain::{ActivationFile, RunInfo, SamplesRecord};

        let path = std::env::temp_dir().join(format!("ircal-{}-stage1.json", std::process::id()));
        let file = ActivationFile {
            run: RunInfo {
                tool: "activation".to_string(),
                generated_at: chrono::Utc::now(),
                seed: 1,
                restarts: 10,
                residual: 0.0,
            },
            params: ActivationParams::new(1000.0, -2.5, 50.0),
            samples: SamplesRecord {
                x: vec![5.0],
                y: vec![11.0],
            },
        };
        crate::io::write_activation_json(&path, &file).unwrap();
        let loaded = resolve_activation_params(&format!("@{}", path.display()));
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.unwrap(), file.params);
        assert_eq!(
            resolve_activation_params("1000,-2.5,50").unwrap(),
            ActivationParams::new(1000.0, -2.5, 50.0)
        );
    }

    #[test]
    fn missing_params_file_is_an_io_error() {
        let err = resolve_activation_params("@/nonexistent/ircal/stage1.json").unwrap_err();
        assert_eq!(err.exit_code(), EXIT_IO);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Full;

    impl Write for Full {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn closed_pipe_is_not_an_error() {
        assert!(write_block(&mut ClosedPipe, "1,2,3").is_ok());
        let err = write_block(&mut Full, "1,2,3").unwrap_err();
        assert_eq!(err.exit_code(), EXIT_IO);

        let mut buf = Vec::new();
        write_block(&mut buf, "1,2,3").unwrap();
        assert_eq!(buf, b"1,2,3\n");
    }

    #[test]
    fn activation_params_need_three_values() {
        let err = parse_activation_params("1,2").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(parse_activation_params("1000,2,50").is_ok());
    }
}
