//! Beam presence sensor.
//!
//! A beam is a thin detection volume laid across a conveyor surface. The
//! physics engine reports loads entering and leaving it; the controller that
//! owns the beam decides whether a present load is held (attached) in place.

use nalgebra::Isometry3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ConveyorError, DigitalOutput, LoadId, Result, SensorId, SensorTag};

/// Default radius of a beam's detection volume in meters.
pub const DEFAULT_BEAM_RADIUS: f64 = 0.003;

/// Gap kept between the top of a conveyor surface and the beam volume.
pub const SURFACE_CLEARANCE: f64 = 0.01;

/// Persisted description of a beam.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BeamInfo {
    /// Display name.
    pub name: String,
    /// Radius of the detection volume in meters.
    pub radius: f64,
}

impl BeamInfo {
    /// Creates a beam description with the default radius.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            radius: DEFAULT_BEAM_RADIUS,
        }
    }
}

impl Default for BeamInfo {
    fn default() -> Self {
        Self::named("Sensor")
    }
}

/// A beam sensor with presence tracking and load holding.
///
/// - `loads` are the loads currently inside the detection volume.
/// - `attached` are the loads the beam is holding in place.
///
/// The beam is *active* while at least one load is present. Its `Blocked`
/// output mirrors that state for a PLC.
#[derive(Debug, Clone)]
pub struct Beam {
    id: SensorId,
    name: String,
    tag: Option<SensorTag>,
    radius: f64,
    length: f64,
    local_pose: Isometry3<f64>,
    loads: Vec<LoadId>,
    attached: Vec<LoadId>,
    blocked: DigitalOutput,
}

impl Beam {
    /// Creates an untagged, empty beam.
    #[must_use]
    pub fn new(id: SensorId, name: impl Into<String>) -> Self {
        Self::from_info(id, &BeamInfo::named(name))
    }

    /// Creates an untagged, empty beam from its persisted description.
    ///
    /// A non-positive radius in `info` falls back to [`DEFAULT_BEAM_RADIUS`].
    #[must_use]
    pub fn from_info(id: SensorId, info: &BeamInfo) -> Self {
        let radius = if info.radius > 0.0 {
            info.radius
        } else {
            DEFAULT_BEAM_RADIUS
        };
        Self {
            id,
            name: info.name.clone(),
            tag: None,
            radius,
            length: 1.0,
            local_pose: Isometry3::identity(),
            loads: Vec::new(),
            attached: Vec::new(),
            blocked: DigitalOutput::new("Blocked"),
        }
    }

    /// Returns the persisted description of this beam.
    #[must_use]
    pub fn info(&self) -> BeamInfo {
        BeamInfo {
            name: self.name.clone(),
            radius: self.radius,
        }
    }

    /// Sensor identity.
    #[must_use]
    pub const fn id(&self) -> SensorId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the beam.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Ordering tag, if one has been assigned.
    #[must_use]
    pub const fn tag(&self) -> Option<SensorTag> {
        self.tag
    }

    /// Assigns the ordering tag.
    ///
    /// Re-assigning the same tag is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConveyorError::TagAlreadyAssigned`] if a different tag is
    /// already in place.
    pub fn assign_tag(&mut self, tag: SensorTag) -> Result<()> {
        match self.tag {
            Some(current) if current != tag => Err(ConveyorError::TagAlreadyAssigned {
                sensor: self.id,
                current,
                requested: tag,
            }),
            _ => {
                self.tag = Some(tag);
                Ok(())
            }
        }
    }

    /// Radius of the detection volume.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Sets the radius of the detection volume.
    ///
    /// # Errors
    ///
    /// Returns [`ConveyorError::NonPositive`] for a radius `<= 0` or `NaN`.
    pub fn set_radius(&mut self, radius: f64) -> Result<()> {
        if radius.is_nan() || radius <= 0.0 {
            return Err(ConveyorError::non_positive("beam radius", radius));
        }
        self.radius = radius;
        Ok(())
    }

    /// Height of the beam's axis above the conveyor surface.
    #[must_use]
    pub fn clearance(&self) -> f64 {
        self.radius + SURFACE_CLEARANCE
    }

    /// Length of the beam across the conveyor.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Sets the length of the beam across the conveyor.
    pub fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    /// Pose of the beam in its owning section's frame.
    #[must_use]
    pub const fn local_pose(&self) -> &Isometry3<f64> {
        &self.local_pose
    }

    /// Places the beam in its owning section's frame.
    pub fn set_local_pose(&mut self, pose: Isometry3<f64>) {
        self.local_pose = pose;
    }

    /// Whether at least one load is inside the detection volume.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.loads.is_empty()
    }

    /// Loads currently inside the detection volume, in arrival order.
    #[must_use]
    pub fn loads(&self) -> &[LoadId] {
        &self.loads
    }

    /// Loads currently held in place by this beam.
    #[must_use]
    pub fn attached(&self) -> &[LoadId] {
        &self.attached
    }

    /// The `Blocked` output, high while the beam is active.
    #[must_use]
    pub const fn blocked(&self) -> &DigitalOutput {
        &self.blocked
    }

    /// Records a load entering the detection volume.
    pub fn load_entered(&mut self, load: LoadId) {
        if !self.loads.contains(&load) {
            self.loads.push(load);
        }
        self.blocked.on();
    }

    /// Records a load leaving the detection volume.
    ///
    /// Returns `false` if the load was not present.
    pub fn load_left(&mut self, load: LoadId) -> bool {
        let Some(position) = self.loads.iter().position(|l| *l == load) else {
            return false;
        };
        self.loads.remove(position);
        if self.loads.is_empty() {
            self.blocked.off();
        }
        true
    }

    /// Holds `load` in place.
    ///
    /// Returns `false` if the load was already held.
    pub fn attach(&mut self, load: LoadId) -> bool {
        if self.attached.contains(&load) {
            return false;
        }
        self.attached.push(load);
        true
    }

    /// Releases every held load and returns them in attach order.
    pub fn unattach_all(&mut self) -> Vec<LoadId> {
        std::mem::take(&mut self.attached)
    }
}
