//! Error types.
//!
//! Two layers:
//!
//! - [`CalibError`]: typed errors produced by the library (input validation, I/O).
//! - [`AppError`]: what the `ircal` binary reports, carrying a process exit code.
//!
//! Numeric degeneracies (near-zero denominators) and unconverged restarts are *not*
//! errors: the first is clamped, the second loses the multi-start reduction.

use thiserror::Error;

/// Exit code for malformed inputs or arguments.
pub const EXIT_INPUT: u8 = 2;
/// Exit code for file I/O and serialization failures.
pub const EXIT_IO: u8 = 3;
/// Exit code for numeric failures (no finite result at all).
pub const EXIT_NUMERIC: u8 = 4;

/// Errors produced by the calibration library.
#[derive(Debug, Error)]
pub enum CalibError {
    /// Two paired sequences have different lengths.
    #[error("{what}: array size {left} is different than array size {right}")]
    InputShape {
        /// Which pair was mismatched (e.g. `distances/activations`).
        what: &'static str,
        /// Length of the first sequence.
        left: usize,
        /// Length of the second sequence.
        right: usize,
    },

    /// A parameter vector has the wrong number of values.
    #[error("expected {expected} parameters for activation function F, got {got}")]
    ParamArity {
        /// Required arity.
        expected: usize,
        /// Provided arity.
        got: usize,
    },

    /// A required sequence is empty.
    #[error("{what} must contain at least one value")]
    EmptyInput {
        /// Name of the empty sequence.
        what: &'static str,
    },

    /// A token in a comma-separated list is not a finite real.
    #[error("invalid number '{token}'")]
    InvalidNumber {
        /// The offending token.
        token: String,
    },

    /// Any other invalid argument or configuration value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Every restart produced a non-finite objective.
    #[error("no finite fit found after {restarts} restarts")]
    NoFiniteFit {
        /// Number of restarts attempted.
        restarts: usize,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CalibError {
    /// Exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            CalibError::InputShape { .. }
            | CalibError::ParamArity { .. }
            | CalibError::EmptyInput { .. }
            | CalibError::InvalidNumber { .. }
            | CalibError::InvalidArgument(_) => EXIT_INPUT,
            CalibError::Io { .. } | CalibError::Json { .. } => EXIT_IO,
            CalibError::NoFiniteFit { .. } => EXIT_NUMERIC,
        }
    }
}

/// Result type for library operations.
pub type CalibResult<T> = Result<T, CalibError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<CalibError> for AppError {
    fn from(err: CalibError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
