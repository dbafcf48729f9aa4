//! Error types for conveyor primitives.

use thiserror::Error;

use crate::{SensorId, SensorTag};

/// Errors that can occur when working with conveyor primitives.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConveyorError {
    /// A beam's ordering tag is write-once.
    #[error("{sensor} already carries tag {current}, refusing {requested}")]
    TagAlreadyAssigned {
        /// Sensor whose tag was set twice.
        sensor: SensorId,
        /// Tag already in place.
        current: SensorTag,
        /// Tag that was rejected.
        requested: SensorTag,
    },

    /// A dimension must be strictly positive.
    #[error("{name} must be greater than 0, got {value}")]
    NonPositive {
        /// Name of the rejected quantity.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
}

impl ConveyorError {
    /// Creates a non-positive dimension error.
    #[must_use]
    pub const fn non_positive(name: &'static str, value: f64) -> Self {
        Self::NonPositive { name, value }
    }
}
