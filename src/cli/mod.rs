//! Command-line parsing for the `ircal` calibration tools.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{ActivationFitConfig, RayWeightFitConfig};

pub mod parse;

pub use parse::*;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ircal", version, about = "IR distance sensor calibration")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short = 'v', long = "verbose-log", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit F(x) = a / (x^2 + b*x + c) to distance/activation samples.
    Activation(ActivationArgs),
    /// Fit the three-ray model (angle, w0, w1) to wall-sliding measurements.
    RayWeights(RayWeightArgs),
    /// Generate activations from known (a, b, c) for the given distances.
    Synth(SynthArgs),
    /// Plot a previously exported activation fit.
    Plot(PlotArgs),
}

/// Options shared by both fitters.
#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    /// Seed for the initial guesses (drawn from entropy and reported when omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Iteration cap for each local minimization (default: 1000 per parameter).
    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Run restarts on the current thread instead of the thread pool.
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ActivationArgs {
    /// Comma-separated distances, e.g. `5,10,20`.
    #[arg(allow_hyphen_values = true)]
    pub distances: String,

    /// Comma-separated activations, one per distance.
    #[arg(allow_hyphen_values = true)]
    pub activations: String,

    /// Number of random restarts.
    #[arg(long, default_value_t = ActivationFitConfig::DEFAULT_RESTARTS)]
    pub restarts: usize,

    /// Standard deviation of the normal distribution for initial guesses.
    #[arg(long, default_value_t = ActivationFitConfig::DEFAULT_SPREAD)]
    pub spread: f64,

    #[command(flatten)]
    pub search: SearchArgs,

    /// Render an ASCII plot of the samples and the fitted curve.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the fit (params + samples + run info) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export per-sample observed/fitted activations to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RayWeightArgs {
    /// Activation parameters `a,b,c` (as printed by `ircal activation`), or `@FILE`
    /// to load them from a JSON file written by `ircal activation --export`.
    #[arg(allow_hyphen_values = true)]
    pub params: String,

    /// Distance from the sensor to the wall.
    pub dist: f64,

    /// Distance reported when nothing is detected.
    pub dmax: f64,

    /// Comma-separated incidence angles in degrees.
    #[arg(allow_hyphen_values = true)]
    pub angles: String,

    /// Comma-separated perceived distances, one per angle.
    #[arg(allow_hyphen_values = true)]
    pub distances: String,

    /// Number of random restarts.
    #[arg(long, default_value_t = RayWeightFitConfig::DEFAULT_RESTARTS)]
    pub restarts: usize,

    /// Keep weights non-negative during the search (evaluates |w0| and |w1|).
    #[arg(long)]
    pub non_negative: bool,

    /// Print the per-sample replay of the best solution.
    #[arg(long)]
    pub verbose: bool,

    #[command(flatten)]
    pub search: SearchArgs,

    /// Export the fit (params + geometry + samples + run info) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export the per-sample replay to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Activation parameters `a,b,c`.
    #[arg(allow_hyphen_values = true)]
    pub params: String,

    /// Comma-separated distances.
    #[arg(allow_hyphen_values = true)]
    pub distances: String,

    /// Standard deviation of additive Gaussian noise.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Noise seed (drawn from entropy when omitted).
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Options for plotting a saved fit.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// JSON file produced by `ircal activation --export`.
    #[arg(value_name = "JSON")]
    pub file: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_angle_lists_are_accepted() {
        let cli = Cli::parse_from([
            "ircal",
            "ray-weights",
            "1000,2,50",
            "10",
            "40",
            "-30,-10,0,10",
            "11,12,40,40",
            "--seed",
            "3",
        ]);
        match cli.command {
            Command::RayWeights(args) => {
                assert_eq!(args.angles, "-30,-10,0,10");
                assert_eq!(args.search.seed, Some(3));
                assert_eq!(args.restarts, RayWeightFitConfig::DEFAULT_RESTARTS);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn verbosity_counts_and_is_global() {
        let cli = Cli::parse_from(["ircal", "activation", "5,10", "1,2", "-vv"]);
        assert_eq!(cli.verbosity, 2);
    }
}
