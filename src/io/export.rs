//! Export per-sample results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{CalibError, CalibResult};
use crate::report::{ActivationRow, ReplayRow};

/// Write observed vs fitted activations to a CSV file.
pub fn write_activation_csv(path: &Path, rows: &[ActivationRow]) -> CalibResult<()> {
    let mut out = create(path)?;
    write_line(&mut out, path, "distance,observed,fitted,residual,clamped")?;
    for r in rows {
        write_line(
            &mut out,
            path,
            &format!(
                "{:.10},{:.10},{:.10},{:.10e},{}",
                r.distance, r.observed, r.fitted, r.residual, r.clamped
            ),
        )?;
    }
    flush(out, path)
}

/// Write the per-sample ray-weight replay to a CSV file.
pub fn write_replay_csv(path: &Path, rows: &[ReplayRow]) -> CalibResult<()> {
    let mut out = create(path)?;
    write_line(
        &mut out,
        path,
        "angle_deg,distance,true_activation,simulated,residual,branch",
    )?;
    for r in rows {
        write_line(
            &mut out,
            path,
            &format!(
                "{:.10},{:.10},{:.10},{:.10},{:.10e},{:?}",
                r.angle,
                r.distance,
                r.true_activation,
                r.simulated,
                r.residual(),
                r.branch
            ),
        )?;
    }
    flush(out, path)
}

fn create(path: &Path) -> CalibResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| CalibError::Io {
            context: format!("failed to create export CSV '{}'", path.display()),
            source,
        })
}

fn write_line(out: &mut BufWriter<File>, path: &Path, line: &str) -> CalibResult<()> {
    writeln!(out, "{line}").map_err(|source| CalibError::Io {
        context: format!("failed to write export CSV '{}'", path.display()),
        source,
    })
}

fn flush(mut out: BufWriter<File>, path: &Path) -> CalibResult<()> {
    out.flush().map_err(|source| CalibError::Io {
        context: format!("failed to flush export CSV '{}'", path.display()),
        source,
    })
}
