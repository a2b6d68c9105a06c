//! Error types for run setup and persistence.
//!
//! Gameplay itself never fails: actions whose preconditions do not hold are
//! declined silently. Errors here are reserved for configuration that cannot
//! produce a playable run, and for loading/saving tuning and history files.

use std::fmt;

/// Top-level error enum for the runner core.
#[derive(Debug)]
pub enum RunnerError {
    /// The segment library has no usable obstacle variants.
    NoObstacleVariants,

    /// The segment library has no usable flat variants.
    NoFlatVariants,

    /// A tuning value is outside the range the simulation can work with.
    InvalidTuning {
        /// Dotted path of the field, e.g. `spawner.spawn_distance`.
        name: &'static str,
        /// The rejected value.
        value: f32,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },

    /// Reading or writing a file failed.
    Io(std::io::Error),

    /// A JSON document could not be parsed or produced.
    Json(serde_json::Error),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::NoObstacleVariants => {
                write!(f, "segment library has no usable obstacle variants")
            }
            RunnerError::NoFlatVariants => {
                write!(f, "segment library has no usable flat variants")
            }
            RunnerError::InvalidTuning {
                name,
                value,
                expected,
            } => write!(
                f,
                "tuning value '{}' = {} is outside accepted range {}",
                name, value, expected
            ),
            RunnerError::Io(err) => write!(f, "i/o error: {}", err),
            RunnerError::Json(err) => write!(f, "json error: {}", err),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunnerError::Io(err) => Some(err),
            RunnerError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::Io(err)
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(err: serde_json::Error) -> Self {
        RunnerError::Json(err)
    }
}

/// Convenience alias: a `Result` using `RunnerError` as the error type.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Returns an error unless `value` is strictly positive and finite.
pub fn require_positive(name: &'static str, value: f32) -> RunnerResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RunnerError::InvalidTuning {
            name,
            value,
            expected: "(0.0, ∞)",
        })
    }
}

/// Returns an error unless `value` is finite and not negative.
pub fn require_non_negative(name: &'static str, value: f32) -> RunnerResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RunnerError::InvalidTuning {
            name,
            value,
            expected: "[0.0, ∞)",
        })
    }
}

/// Returns an error unless `value` is a probability in `[0, 1]`.
pub fn require_probability(name: &'static str, value: f32) -> RunnerResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(RunnerError::InvalidTuning {
            name,
            value,
            expected: "[0.0, 1.0]",
        })
    }
}
