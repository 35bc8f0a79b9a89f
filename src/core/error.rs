//! Library-wide error and result types.
//!
//! Validation failures (`TypeMismatch`, `NonFiniteValue`, `OutOfRange`) are the
//! caller's responsibility and are raised before any sampling starts.
//! `InsufficientSamples` and `NonConvergentResult` are computation-side:
//! the first rejects degenerate sample sizes, the second signals that a
//! non-finite value appeared *after* computation, which is always an internal
//! defect rather than a user-input outcome. `Cancelled` is the terminal state
//! of a run that exceeded its wall-clock budget mid-sampling; no partial
//! result accompanies it.

use crate::core::validate::Bounds;

/// Errors surfaced by the simulation API.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A value in an untyped payload was not of numeric kind.
    TypeMismatch { name: &'static str, actual: String },
    /// A numeric input was NaN or infinite.
    NonFiniteValue { name: &'static str, value: f64 },
    /// A finite numeric input fell outside its domain bounds.
    OutOfRange {
        name: &'static str,
        value: f64,
        bounds: Bounds,
    },
    /// Too few sample values for the requested statistic.
    InsufficientSamples { required: usize, actual: usize },
    /// A computed result failed its finiteness post-condition.
    NonConvergentResult { what: &'static str },
    /// The run exceeded its wall-clock budget during sampling.
    Cancelled { completed_trials: usize },
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch { name, actual } => {
                write!(f, "type mismatch: `{name}` must be numeric, got {actual}")
            }
            Self::NonFiniteValue { name, value } => {
                write!(f, "non-finite value: `{name}` = {value}")
            }
            Self::OutOfRange {
                name,
                value,
                bounds,
            } => {
                write!(f, "out of range: `{name}` = {value}, expected {bounds}")
            }
            Self::InsufficientSamples { required, actual } => {
                write!(
                    f,
                    "insufficient samples: required {required}, got {actual}"
                )
            }
            Self::NonConvergentResult { what } => {
                write!(f, "non-convergent result: {what} is not finite")
            }
            Self::Cancelled { completed_trials } => {
                write!(
                    f,
                    "cancelled: wall-clock budget exceeded after {completed_trials} trials"
                )
            }
        }
    }
}

impl std::error::Error for SimError {}

pub type SimResult<T> = Result<T, SimError>;
