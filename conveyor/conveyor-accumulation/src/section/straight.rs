//! Straight section.

use conveyor_types::{pose, Beam, SensorId};
use nalgebra::Isometry3;

use super::{Appearance, ConnectionPoint, Section, SectionBody, SectionEdit, SectionInfo, SectionShape};
use crate::config::StraightSectionInfo;
use crate::error::require_positive;
use crate::{AccumulationError, Result};

/// A straight run along local +X.
///
/// The start connection is the section origin and the end connection sits
/// `length` further along +X with the same heading. The beam crosses the
/// surface at `sensor_distance` from the start.
///
/// # Example
///
/// ```
/// use conveyor_accumulation::section::{Appearance, Section, StraightSection};
/// use conveyor_accumulation::StraightSectionInfo;
/// use conveyor_types::SensorId;
///
/// let section = StraightSection::new(
///     SensorId::new(1),
///     &StraightSectionInfo::default(),
///     Appearance::default(),
/// );
/// let end = section.end_connection();
/// assert!((end.translation.vector.x - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct StraightSection {
    length: f64,
    body: SectionBody,
}

impl StraightSection {
    /// Creates a straight section with an untagged beam.
    #[must_use]
    pub fn new(sensor_id: SensorId, info: &StraightSectionInfo, appearance: Appearance) -> Self {
        let sensor = Beam::from_info(sensor_id, &info.beam);
        let mut section = Self {
            length: info.length,
            body: SectionBody::new(sensor, info.width, info.sensor_distance, appearance),
        };
        section.update_sensor();
        section
    }

    fn update_sensor(&mut self) {
        let beam = &mut self.body.sensor;
        beam.set_length(self.body.width);
        let clearance = beam.clearance();
        beam.set_local_pose(pose::from_xyz_yaw(
            self.body.sensor_distance,
            0.0,
            clearance,
            0.0,
        ));
    }
}

impl Section for StraightSection {
    fn shape(&self) -> SectionShape {
        SectionShape::Straight
    }

    fn name(&self) -> &str {
        &self.body.name
    }

    fn set_name(&mut self, name: String) {
        self.body.name = name;
    }

    fn length(&self) -> f64 {
        self.length
    }

    fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    fn width(&self) -> f64 {
        self.body.width
    }

    fn set_width(&mut self, width: f64) {
        self.body.width = width;
        self.update_sensor();
    }

    fn sensor_distance(&self) -> f64 {
        self.body.sensor_distance
    }

    fn set_sensor_distance(&mut self, distance: f64) {
        self.body.sensor_distance = distance;
        self.update_sensor();
    }

    fn sensor(&self) -> &Beam {
        &self.body.sensor
    }

    fn sensor_mut(&mut self) -> &mut Beam {
        &mut self.body.sensor
    }

    fn local_pose(&self) -> &Isometry3<f64> {
        &self.body.local_pose
    }

    fn set_local_pose(&mut self, pose: Isometry3<f64>) {
        self.body.local_pose = pose;
    }

    fn start_connection(&self) -> Isometry3<f64> {
        Isometry3::identity()
    }

    fn end_connection(&self) -> Isometry3<f64> {
        pose::from_xyz_yaw(self.length, 0.0, 0.0, 0.0)
    }

    fn is_connection_visible(&self, point: ConnectionPoint) -> bool {
        self.body.is_connection_visible(point)
    }

    fn set_connection_visible(&mut self, point: ConnectionPoint, visible: bool) {
        self.body.set_connection_visible(point, visible);
    }

    fn appearance(&self) -> Appearance {
        self.body.appearance
    }

    fn set_appearance(&mut self, appearance: Appearance) {
        self.body.appearance = appearance;
    }

    fn apply(&mut self, edit: SectionEdit) -> Result<()> {
        match edit {
            SectionEdit::Length(length) => {
                self.length = require_positive("length", length)?;
                Ok(())
            }
            _ => Err(AccumulationError::UnsupportedEdit {
                shape: SectionShape::Straight,
                parameter: edit.parameter(),
            }),
        }
    }

    fn info(&self) -> SectionInfo {
        SectionInfo::Straight(StraightSectionInfo {
            length: self.length,
            width: self.body.width,
            sensor_distance: self.body.sensor_distance,
            beam: self.body.sensor.info(),
        })
    }
}
