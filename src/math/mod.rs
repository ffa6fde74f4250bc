//! Mathematical utilities: denominator guards and the local simplex minimizer.

pub mod guard;
pub mod nelder_mead;

pub use guard::*;
pub use nelder_mead::*;
