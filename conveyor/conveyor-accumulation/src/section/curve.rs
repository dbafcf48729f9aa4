//! Curved section.
//!
//! The centerline is a circular arc in the horizontal plane that leaves the
//! section origin heading along +X. A counterclockwise curve turns left
//! about a center at `(0, radius, 0)`; a clockwise curve turns right about
//! `(0, -radius, 0)`.

use std::f64::consts::TAU;

use conveyor_types::{Beam, SensorId};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

use super::{
    Appearance, ConnectionPoint, Revolution, Section, SectionBody, SectionEdit, SectionInfo,
    SectionShape,
};
use crate::config::{require_curve_angle, CurveSectionInfo};
use crate::error::require_positive;
use crate::{AccumulationError, Result};

/// A circular arc section.
///
/// Its length is the centerline arc length `radius · angle` and cannot be
/// overridden by the accumulation layout.
///
/// # Example
///
/// ```
/// use conveyor_accumulation::section::{Appearance, CurveSection, Section};
/// use conveyor_accumulation::CurveSectionInfo;
/// use conveyor_types::SensorId;
///
/// let curve = CurveSection::new(
///     SensorId::new(1),
///     &CurveSectionInfo::default(),
///     Appearance::default(),
/// );
/// // Quarter turn of radius 0.6
/// assert!((curve.length() - 0.6 * std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CurveSection {
    radius: f64,
    angle: f64,
    revolution: Revolution,
    body: SectionBody,
}

impl CurveSection {
    /// Creates a curve section with an untagged beam.
    #[must_use]
    pub fn new(sensor_id: SensorId, info: &CurveSectionInfo, appearance: Appearance) -> Self {
        let sensor = Beam::from_info(sensor_id, &info.beam);
        let mut section = Self {
            radius: info.radius,
            angle: info.angle,
            revolution: info.revolution,
            body: SectionBody::new(sensor, info.width, info.sensor_distance, appearance),
        };
        section.update_sensor();
        section
    }

    /// Centerline radius in meters.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Sweep angle in radians.
    #[must_use]
    pub const fn angle(&self) -> f64 {
        self.angle
    }

    /// Turning direction.
    #[must_use]
    pub const fn revolution(&self) -> Revolution {
        self.revolution
    }

    /// Center of the arc in the section frame.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        Point3::new(0.0, self.revolution.sign() * self.radius, 0.0)
    }

    /// Arc angle swept by traveling `distance` along the centerline.
    #[must_use]
    pub fn arc_angle(&self, distance: f64) -> f64 {
        let circumference = TAU * self.radius;
        distance / circumference * TAU
    }

    /// Pose on the centerline after sweeping `angle` radians from the start.
    ///
    /// The pose heads along the direction of travel.
    #[must_use]
    pub fn pose_at(&self, angle: f64) -> Isometry3<f64> {
        let yaw = self.revolution.sign() * angle;
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw);
        let center = self.center();
        let point = center + rotation * (Point3::origin() - center);
        Isometry3::from_parts(Translation3::from(point.coords), rotation)
    }

    fn update_sensor(&mut self) {
        let angle = self.arc_angle(self.body.sensor_distance);
        let on_arc = self.pose_at(angle);
        let beam = &mut self.body.sensor;
        beam.set_length(self.body.width);
        let lifted = Translation3::new(0.0, 0.0, beam.clearance()) * on_arc;
        beam.set_local_pose(lifted);
    }
}

impl Section for CurveSection {
    fn shape(&self) -> SectionShape {
        SectionShape::Curve
    }

    fn name(&self) -> &str {
        &self.body.name
    }

    fn set_name(&mut self, name: String) {
        self.body.name = name;
    }

    fn length(&self) -> f64 {
        self.radius * self.angle
    }

    fn set_length(&mut self, _length: f64) {}

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
        self.pose_at(self.angle)
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
            SectionEdit::Radius(radius) => {
                self.radius = require_positive("curve radius", radius)?;
            }
            SectionEdit::Angle(angle) => {
                self.angle = require_curve_angle(angle)?;
            }
            SectionEdit::Revolution(revolution) => {
                self.revolution = revolution;
            }
            SectionEdit::Length(_) => {
                return Err(AccumulationError::UnsupportedEdit {
                    shape: SectionShape::Curve,
                    parameter: edit.parameter(),
                });
            }
        }
        self.update_sensor();
        Ok(())
    }

    fn info(&self) -> SectionInfo {
        SectionInfo::Curve(CurveSectionInfo {
            radius: self.radius,
            angle: self.angle,
            revolution: self.revolution,
            width: self.body.width,
            sensor_distance: self.body.sensor_distance,
            beam: self.body.sensor.info(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use conveyor_types::pose;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn curve(revolution: Revolution) -> CurveSection {
        CurveSection::new(
            SensorId::new(1),
            &CurveSectionInfo {
                revolution,
                ..CurveSectionInfo::for_index(0)
            },
            Appearance::default(),
        )
    }

    #[test]
    fn test_arc_angle_from_distance() {
        let section = curve(Revolution::Counterclockwise);
        // A quarter of the circumference is a quarter turn.
        let quarter = TAU * 0.6 / 4.0;
        assert_relative_eq!(section.arc_angle(quarter), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(section.arc_angle(0.0), 0.0);
    }

    #[test]
    fn test_counterclockwise_end_turns_left() {
        let section = curve(Revolution::Counterclockwise);
        let end = section.end_connection();
        assert_relative_eq!(end.translation.vector.x, 0.6, epsilon = 1e-12);
        assert_relative_eq!(end.translation.vector.y, 0.6, epsilon = 1e-12);
        assert_relative_eq!(pose::yaw(&end), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_clockwise_end_turns_right() {
        let section = curve(Revolution::Clockwise);
        let end = section.end_connection();
        assert_relative_eq!(end.translation.vector.x, 0.6, epsilon = 1e-12);
        assert_relative_eq!(end.translation.vector.y, -0.6, epsilon = 1e-12);
        assert_relative_eq!(pose::yaw(&end), -FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_sensor_on_arc() {
        for revolution in [Revolution::Clockwise, Revolution::Counterclockwise] {
            let section = curve(revolution);
            let beam = section.sensor();
            let angle: f64 = 0.4 / 0.6;
            let position = beam.local_pose().translation.vector;

            // On the centerline, at the beam's clearance height.
            let radial = Vector3::new(position.x, position.y, 0.0) - section.center().coords;
            assert_relative_eq!(radial.norm(), 0.6, epsilon = 1e-12);
            assert_relative_eq!(position.z, beam.clearance(), epsilon = 1e-12);
            assert_relative_eq!(position.x, 0.6 * angle.sin(), epsilon = 1e-12);

            // Yaw follows the arc.
            assert_relative_eq!(
                pose::yaw(beam.local_pose()),
                revolution.sign() * angle,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_length_is_arc_length() {
        let mut section = curve(Revolution::Counterclockwise);
        section.set_length(10.0);
        assert_relative_eq!(section.length(), 0.6 * FRAC_PI_2, epsilon = 1e-12);

        section.apply(SectionEdit::Angle(PI)).unwrap();
        assert_relative_eq!(section.length(), 0.6 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_apply_validates() {
        let mut section = curve(Revolution::Counterclockwise);
        assert!(section.apply(SectionEdit::Radius(-1.0)).is_err());
        assert!(section.apply(SectionEdit::Angle(0.1)).is_err());
        assert!(section.apply(SectionEdit::Length(1.0)).is_err());
        assert_relative_eq!(section.radius(), 0.6);
        assert_relative_eq!(section.angle(), FRAC_PI_2);

        section.apply(SectionEdit::Radius(1.2)).unwrap();
        section.apply(SectionEdit::Revolution(Revolution::Clockwise)).unwrap();
        assert_relative_eq!(section.center().y, -1.2);

        let beam_y = section.sensor().local_pose().translation.vector.y;
        assert!(beam_y < 0.0);
    }

    #[test]
    fn test_info_roundtrip() {
        let section = curve(Revolution::Clockwise);
        let SectionInfo::Curve(info) = section.info() else {
            panic!("expected curve info");
        };
        assert_eq!(info.revolution, Revolution::Clockwise);
        assert_relative_eq!(info.radius, 0.6);

        let rebuilt = CurveSection::new(SensorId::new(2), &info, Appearance::default());
        assert!(pose::coincident(
            &rebuilt.end_connection(),
            &section.end_connection(),
            1e-12
        ));
    }
}
