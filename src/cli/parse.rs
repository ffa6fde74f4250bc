//! Comma-separated real sequences as given on the command line.

use crate::error::{CalibError, CalibResult};

/// Parse `"1.5, -2,3e2"` into reals.
///
/// Whitespace around tokens is ignored. Every token must be a finite real.
pub fn parse_reals(what: &'static str, input: &str) -> CalibResult<Vec<f64>> {
    if input.trim().is_empty() {
        return Err(CalibError::EmptyInput { what });
    }
    input
        .split(',')
        .map(str::trim)
        .map(|token| match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(CalibError::InvalidNumber {
                token: token.to_string(),
            }),
        })
        .collect()
}
