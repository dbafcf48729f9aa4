//! Error types for accumulation conveyor configuration.

use conveyor_types::ConveyorError;
use thiserror::Error;

use crate::section::SectionShape;

/// Errors raised while configuring or restoring an accumulation conveyor.
///
/// Every configuration error is non-fatal: the mutation that produced it is
/// rejected and the conveyor keeps its previous state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccumulationError {
    /// A dimension must be strictly positive.
    #[error("{name} must be greater than 0, got {value}")]
    NonPositive {
        /// Name of the rejected quantity.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// A distance must not be negative.
    #[error("{name} must be greater than or equal to 0, got {value}")]
    Negative {
        /// Name of the rejected quantity.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// Curve sweep angle outside the buildable range.
    #[error("curve angle must be between {min_degrees}° and {max_degrees}°, got {degrees:.1}°")]
    AngleOutOfRange {
        /// Rejected angle in degrees.
        degrees: f64,
        /// Lower bound in degrees.
        min_degrees: f64,
        /// Upper bound in degrees.
        max_degrees: f64,
    },

    /// No section exists at the given index.
    #[error("section index {index} is out of range for {count} sections")]
    SectionOutOfRange {
        /// Requested index.
        index: usize,
        /// Current number of sections.
        count: usize,
    },

    /// The section length is derived from the accumulation length.
    #[error("section {index} length is managed by the accumulation while fixed length is on")]
    LengthIsFixed {
        /// Section index.
        index: usize,
    },

    /// The section variant has no such parameter.
    #[error("{parameter} cannot be set on a {shape} section")]
    UnsupportedEdit {
        /// Shape of the targeted section.
        shape: SectionShape,
        /// Name of the parameter.
        parameter: &'static str,
    },

    /// Requested section count exceeds the supported maximum.
    #[error("number of sections must be at most {max}, got {count}")]
    TooManySections {
        /// Requested count.
        count: usize,
        /// Largest accepted count.
        max: usize,
    },

    /// A section index does not fit in a sensor tag.
    #[error("section index {index} cannot be encoded as a sensor tag")]
    TagOverflow {
        /// Offending index.
        index: usize,
    },

    /// Error from a conveyor primitive.
    #[error(transparent)]
    Conveyor(#[from] ConveyorError),

    /// Persisted data could not be encoded or decoded.
    #[error("invalid accumulation data: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AccumulationError {
    /// Creates a non-positive dimension error.
    #[must_use]
    pub const fn non_positive(name: &'static str, value: f64) -> Self {
        Self::NonPositive { name, value }
    }

    /// Creates a negative distance error.
    #[must_use]
    pub const fn negative(name: &'static str, value: f64) -> Self {
        Self::Negative { name, value }
    }

    /// Creates an out-of-range section error.
    #[must_use]
    pub const fn out_of_range(index: usize, count: usize) -> Self {
        Self::SectionOutOfRange { index, count }
    }
}

pub(crate) fn require_positive(name: &'static str, value: f64) -> crate::Result<f64> {
    if value.is_nan() || value <= 0.0 {
        return Err(AccumulationError::non_positive(name, value));
    }
    Ok(value)
}

pub(crate) fn require_non_negative(name: &'static str, value: f64) -> crate::Result<f64> {
    if value.is_nan() || value < 0.0 {
        return Err(AccumulationError::negative(name, value));
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let msg = format!("{}", AccumulationError::non_positive("length", 0.0));
        assert!(msg.contains("length"));
        assert!(msg.contains("greater than 0"));

        let msg = format!("{}", AccumulationError::negative("sensor distance", -0.1));
        assert!(msg.contains("sensor distance"));
        assert!(msg.contains("-0.1"));

        let msg = format!("{}", AccumulationError::out_of_range(5, 3));
        assert!(msg.contains('5'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn error_unsupported_edit() {
        let err = AccumulationError::UnsupportedEdit {
            shape: SectionShape::Curve,
            parameter: "length",
        };
        assert_eq!(format!("{err}"), "length cannot be set on a Curve section");
    }

    #[test]
    fn validators() {
        assert!(require_positive("width", 0.45).is_ok());
        assert!(require_positive("width", 0.0).is_err());
        assert!(require_positive("width", f64::NAN).is_err());
        assert!(require_non_negative("distance", 0.0).is_ok());
        assert!(require_non_negative("distance", -1e-9).is_err());
    }
}
