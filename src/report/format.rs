//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays free of presentation concerns
//! - output changes are localized (important for snapshot-style tests)
//!
//! Everything here goes to stdout; diagnostics go through `tracing` to stderr.

use crate::fit::{ActivationFit, MultiStartOutcome, RayWeightFit};
use crate::models::{RayBranch, RayModel};
use crate::report::{ActivationRow, ReplayRow};

/// Summary of an activation fit: parameters, residual, per-sample table.
pub fn format_activation_summary(fit: &ActivationFit, rows: &[ActivationRow]) -> String {
    let mut out = String::new();

    out.push_str("=== ircal - activation model fit ===\n");
    out.push_str("Model: F(x) = a / (x^2 + b*x + c)\n");
    out.push_str(&format_search(&fit.search));

    out.push_str("\nBest fit:\n");
    out.push_str(&format!(
        "- params  : {}\n",
        fmt_vec(&fit.params.to_array())
    ));
    out.push_str(&format!("- residual: {:.6e}\n", fit.residual));
    out.push_str(&format!("- as arg  : {}\n", fit.params.to_arg_string()));

    out.push('\n');
    out.push_str(&format_activation_table(rows));
    out
}

fn format_activation_table(rows: &[ActivationRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>12} {:>14} {:>14} {:>14}\n",
        "distance", "observed", "fitted", "residual"
    ));
    out.push_str(&format!("{:-<12} {:-<14} {:-<14} {:-<14}\n", "", "", "", ""));
    for r in rows {
        let flag = if r.clamped { " (clamped)" } else { "" };
        out.push_str(&format!(
            "{:>12.4} {:>14.6} {:>14.6} {:>14.6e}{flag}\n",
            r.distance, r.observed, r.fitted, r.residual
        ));
    }
    out
}

/// Summary of a ray-weight fit.
pub fn format_ray_summary(fit: &RayWeightFit, model: &RayModel) -> String {
    let mut out = String::new();

    out.push_str("=== ircal - ray weight fit (wall sliding) ===\n");
    let g = model.geometry();
    out.push_str(&format!(
        "Activation: {} | dist={} dmax={}\n",
        fmt_vec(&model.activation_params().to_array()),
        g.dist,
        g.dmax
    ));
    out.push_str(&format!(
        "F(dist)={:.6} F(dmax)={:.6}\n",
        model.f_d0(),
        model.f_dmax()
    ));
    out.push_str(&format_search(&fit.search));

    out.push_str("\nBest fit:\n");
    out.push_str(&format!("- angle   : {:.6} deg\n", fit.params.angle_deg));
    out.push_str(&format!("- w0      : {:.6}\n", fit.params.w0));
    out.push_str(&format!("- w1      : {:.6}\n", fit.params.w1));
    out.push_str(&format!("- residual: {:.6e}\n", fit.residual));
    out
}

/// Per-sample replay of the ray-weight objective.
pub fn format_replay(rows: &[ReplayRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>10} {:>12} {:>14} {:>14} {:<16}\n",
        "angle", "dist", "F(dist)", "F_dsim", "branch"
    ));
    out.push_str(&format!("{:-<10} {:-<12} {:-<14} {:-<14} {:-<16}\n", "", "", "", "", ""));
    for r in rows {
        out.push_str(&format!(
            "{:>10.3} {:>12.4} {:>14.6} {:>14.6} {:<16}\n",
            r.angle,
            r.distance,
            r.true_activation,
            r.simulated,
            branch_label(r.branch)
        ));
    }
    out
}

fn format_search(search: &MultiStartOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Search: restarts={} seed={} unconverged={} improvements={} (best from restart {})\n",
        search.restarts,
        search.seed,
        search.unconverged,
        search.improvements.len(),
        search.best_restart
    ));
    for imp in &search.improvements {
        out.push_str(&format!(
            "  new best at restart {:>6}: residual {:.6e}\n",
            imp.restart, imp.residual
        ));
    }
    out
}

fn branch_label(branch: RayBranch) -> &'static str {
    match branch {
        RayBranch::Full => "all rays",
        RayBranch::CenterAndSide => "center + side",
        RayBranch::SideOnly => "side only",
        RayBranch::Clear => "none",
    }
}

pub(crate) fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_table_has_one_line_per_row() {
        let rows = vec![
            ReplayRow {
                angle: -10.0,
                distance: 12.0,
                true_activation: 5.0,
                simulated: 4.5,
                branch: RayBranch::CenterAndSide,
            },
            ReplayRow {
                angle: 30.0,
                distance: 40.0,
                true_activation: 0.6,
                simulated: 0.6,
                branch: RayBranch::Clear,
            },
        ];
        let text = format_replay(&rows);
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("center + side"));
    }

    #[test]
    fn search_summary_lists_improvements_in_order() {
        use crate::domain::FitResult;
        use crate::fit::Improvement;
        use nalgebra::DVector;

        let search = MultiStartOutcome {
            best: FitResult {
                params: DVector::from_vec(vec![1.0, 2.0, 3.0]),
                residual: 1e-9,
            },
            best_restart: 4,
            seed: 42,
            restarts: 10,
            unconverged: 1,
            improvements: vec![
                Improvement { restart: 0, residual: 3.5 },
                Improvement { restart: 4, residual: 1e-9 },
            ],
        };
        let text = format_search(&search);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("seed=42"));
        assert_eq!(lines[1], "  new best at restart      0: residual 3.500000e0");
        assert_eq!(lines[2], "  new best at restart      4: residual 1.000000e-9");
    }

    #[test]
    fn fmt_vec_uses_fixed_precision() {
        assert_eq!(fmt_vec(&[1.0, -2.5]), "[1.000000, -2.500000]");
    }
}
