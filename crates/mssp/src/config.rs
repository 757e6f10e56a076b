//! Parameter validation errors shared by every parameter group.
//!
//! Each group (`SamplerParams`, `NormalizerParams`, `SelectorParams`,
//! `CuratorParams`, ...) has sensible defaults and a `validate()` method; the
//! top-level configs built with `bon` call them from their `build()` finisher.

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A count must be at least `min`.
    InvalidCount {
        field: &'static str,
        value: usize,
        min: usize,
    },
    /// A threshold must be finite and non-negative.
    InvalidThreshold { field: &'static str, value: f64 },
    /// A probability must lie in [0, 1].
    InvalidProbability { field: &'static str, value: f64 },
    /// A range must be finite with `lower < upper`.
    InvalidRange {
        field: &'static str,
        lower: f64,
        upper: f64,
    },
    /// A free-form string field must not be empty.
    Empty { field: &'static str },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCount { field, value, min } => {
                write!(f, "{} must be at least {}, got {}", field, min, value)
            }
            Self::InvalidThreshold { field, value } => {
                write!(f, "{} must be finite and non-negative, got {}", field, value)
            }
            Self::InvalidProbability { field, value } => {
                write!(f, "{} must be in [0, 1], got {}", field, value)
            }
            Self::InvalidRange {
                field,
                lower,
                upper,
            } => write!(
                f,
                "{} must be a finite range with lower < upper, got [{}, {}]",
                field, lower, upper
            ),
            Self::Empty { field } => write!(f, "{} must not be empty", field),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Check `value >= min`.
pub(crate) fn check_count(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::InvalidCount { field, value, min });
    }
    Ok(())
}

/// Check that `value` is finite and non-negative.
pub(crate) fn check_threshold(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidThreshold { field, value });
    }
    Ok(())
}

pub(crate) fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidProbability { field, value });
    }
    Ok(())
}

pub(crate) fn check_range(field: &'static str, (lower, upper): (f64, f64)) -> Result<(), ConfigError> {
    if !lower.is_finite() || !upper.is_finite() || lower >= upper {
        return Err(ConfigError::InvalidRange {
            field,
            lower,
            upper,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = ConfigError::InvalidCount {
            field: "n_sets",
            value: 0,
            min: 1,
        };
        assert_eq!(e.to_string(), "n_sets must be at least 1, got 0");
        let e = ConfigError::InvalidRange {
            field: "coefficient_bounds",
            lower: 1.0,
            upper: -1.0,
        };
        assert!(e.to_string().contains("[1, -1]"));
    }

    #[test]
    fn checks() {
        assert!(check_count("n", 1, 1).is_ok());
        assert!(check_threshold("t", -0.1).is_err());
        assert!(check_threshold("t", f64::NAN).is_err());
        assert!(check_probability("p", 1.0).is_ok());
        assert!(check_probability("p", 1.5).is_err());
        assert!(check_range("r", (0.0, 0.0)).is_err());
        assert!(check_range("r", (-20.0, 20.0)).is_ok());
    }
}
