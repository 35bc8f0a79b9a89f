//! Input validation gate applied at every public entry point.
//!
//! Validation runs in three tiers, in order, before any computation starts:
//! 1. type: the value must be of numeric kind (observable only on untyped
//!    JSON payloads; native callers get this tier from the type system),
//! 2. finiteness: not NaN, not infinite,
//! 3. domain: caller-supplied bounds.
//!
//! A doomed input never triggers partial work: each helper returns a typed
//! error and has no side effects. Post-computation finiteness checks live
//! here too (`require_finite_result`), mapping to `NonConvergentResult`
//! instead of an input-validation kind.

use crate::core::error::{SimError, SimResult};

/// Domain bounds for a scalar parameter.
///
/// `min_exclusive` turns the lower bound into a strict inequality; the upper
/// bound is always inclusive (no current parameter needs a strict maximum).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub min_exclusive: bool,
}

impl Bounds {
    /// Closed interval `[min, max]`.
    pub const fn closed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
        }
    }

    /// Half-open interval `(min, max]`.
    pub const fn open_min(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: true,
        }
    }

    /// Unbounded above: `[min, +inf)`.
    pub const fn at_least(min: f64) -> Self {
        Self::closed(min, f64::INFINITY)
    }

    /// Strictly positive: `(0, +inf)`.
    pub const fn positive() -> Self {
        Self::open_min(0.0, f64::INFINITY)
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        let above_min = if self.min_exclusive {
            value > self.min
        } else {
            value >= self.min
        };
        above_min && value <= self.max
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = if self.min_exclusive { '(' } else { '[' };
        write!(f, "{open}{}, {}]", self.min, self.max)
    }
}

/// Tier 2: rejects NaN and infinities.
pub fn require_finite(name: &'static str, value: f64) -> SimResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::NonFiniteValue { name, value })
    }
}

/// Tiers 2 and 3: finiteness first, then domain bounds.
pub fn require_in_range(name: &'static str, value: f64, bounds: Bounds) -> SimResult<f64> {
    let value = require_finite(name, value)?;
    if bounds.contains(value) {
        Ok(value)
    } else {
        Err(SimError::OutOfRange {
            name,
            value,
            bounds,
        })
    }
}

/// Domain check for integer counts (trial counts, portfolio sizes).
pub fn require_count(name: &'static str, value: usize, min: usize, max: usize) -> SimResult<usize> {
    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(SimError::OutOfRange {
            name,
            value: value as f64,
            bounds: Bounds::closed(min as f64, max as f64),
        })
    }
}

/// Tier 1 for untyped payloads: the JSON value must be a number.
pub fn json_number(name: &'static str, value: &serde_json::Value) -> SimResult<f64> {
    match value.as_f64() {
        Some(v) => Ok(v),
        None => Err(SimError::TypeMismatch {
            name,
            actual: json_kind(value).to_string(),
        }),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Post-condition check on computed outputs. A failure here is a defect
/// signal, never a user-input outcome.
pub fn require_finite_result(what: &'static str, value: f64) -> SimResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::NonConvergentResult { what })
    }
}
