//! Identifiers for sensors and loads.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a beam sensor.
///
/// Identity only: two beams with the same id are the same sensor. Ordering in
/// a sensor chain uses [`SensorTag`], never the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorId(pub u64);

impl SensorId {
    /// Create a new sensor ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for SensorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SensorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sensor({})", self.0)
    }
}

/// Identifier of a load (tote, case, pallet) moved by the physics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoadId(pub u64);

impl LoadId {
    /// Create a new load ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for LoadId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LoadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Load({})", self.0)
    }
}

/// Ordering tag of a sensor within a chain.
///
/// Lower tags sit closer to the discharge end. A beam receives its tag once,
/// when its owner registers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorTag(pub u32);

impl SensorTag {
    /// Create a new tag.
    #[must_use]
    pub const fn new(tag: u32) -> Self {
        Self(tag)
    }

    /// Get the raw tag value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SensorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_id() {
        let id = SensorId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.to_string(), "Sensor(42)");

        let id2: SensorId = 42.into();
        assert_eq!(id, id2);
    }

    #[test]
    fn test_load_id() {
        let id = LoadId::from(3);
        assert_eq!(id.raw(), 3);
        assert_eq!(id.to_string(), "Load(3)");
    }

    #[test]
    fn test_tag_ordering() {
        assert!(SensorTag::new(0) < SensorTag::new(1));
        assert_eq!(SensorTag::new(5).to_string(), "#5");
    }
}
