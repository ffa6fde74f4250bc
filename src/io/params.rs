//! Read/write fitted parameter JSON files.
//!
//! A params file is the portable result of one calibration stage:
//! - run metadata (tool, timestamp, seed, restarts, residual)
//! - the fitted parameters
//! - the samples they were fitted to, so a fit can be re-plotted later
//!
//! Activation files are read back by `ircal plot` and by `ircal ray-weights @FILE`.
//!
//! The schemas are defined by `domain::ActivationFile` and `domain::RayWeightFile`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::domain::{ActivationFile, RayWeightFile};
use crate::error::{CalibError, CalibResult};

/// Write an activation fit to JSON.
pub fn write_activation_json(path: &Path, file: &ActivationFile) -> CalibResult<()> {
    write_json(path, file, "activation params")
}

/// Read an activation fit written by [`write_activation_json`].
pub fn read_activation_json(path: &Path) -> CalibResult<ActivationFile> {
    read_json(path, "activation params")
}

/// Write a ray-weight fit to JSON.
pub fn write_ray_weight_json(path: &Path, file: &RayWeightFile) -> CalibResult<()> {
    write_json(path, file, "ray weight params")
}

fn write_json<T: Serialize>(path: &Path, value: &T, kind: &str) -> CalibResult<()> {
    let file = File::create(path).map_err(|source| CalibError::Io {
        context: format!("failed to create {kind} JSON '{}'", path.display()),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).map_err(|source| CalibError::Json {
        context: format!("failed to write {kind} JSON '{}'", path.display()),
        source,
    })?;
    info!(path = %path.display(), "wrote {kind} JSON");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, kind: &str) -> CalibResult<T> {
    let file = File::open(path).map_err(|source| CalibError::Io {
        context: format!("failed to open {kind} JSON '{}'", path.display()),
        source,
    })?;
    serde_json::from_reader(file).map_err(|source| CalibError::Json {
        context: format!("invalid {kind} JSON '{}'", path.display()),
        source,
    })
}
