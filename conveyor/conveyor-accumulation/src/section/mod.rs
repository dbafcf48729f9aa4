//! Conveyor sections: geometry plus beam placement.
//!
//! A section is one unit of the chain. It knows its own dimensions, where its
//! start and end connection points are in its local frame, and where its beam
//! sits. Handlers and the accumulation only ever talk to sections through the
//! [`Section`] trait.

mod curve;
mod straight;

pub use curve::CurveSection;
pub use straight::StraightSection;

use conveyor_types::{Beam, Color, SensorId, SurfaceType};
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};

use crate::config::{CurveSectionInfo, SectionHandlerInfo, StraightSectionInfo};
use crate::Result;

/// Shape of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SectionShape {
    /// Straight run along local +X.
    #[default]
    Straight,
    /// Circular arc in the horizontal plane.
    Curve,
}

impl std::fmt::Display for SectionShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Straight => write!(f, "Straight"),
            Self::Curve => write!(f, "Curve"),
        }
    }
}

/// Turning direction of a curve, seen from above (+Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Revolution {
    /// Turns right.
    Clockwise,
    /// Turns left.
    #[default]
    Counterclockwise,
}

impl Revolution {
    /// Sign applied to yaw angles: `-1` for clockwise, `+1` otherwise.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Clockwise => -1.0,
            Self::Counterclockwise => 1.0,
        }
    }
}

/// Named connection point of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionPoint {
    /// Where loads come in.
    Start,
    /// Where loads go out.
    End,
}

/// Appearance shared by every section of an accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appearance {
    /// Surface fitted to the section.
    pub surface_type: SurfaceType,
    /// Surface color.
    pub color: Color,
    /// Whether the section is drawn.
    pub visible: bool,
}

impl Default for Appearance {
    fn default() -> Self {
        let surface_type = SurfaceType::default();
        Self {
            surface_type,
            color: surface_type.default_color(),
            visible: true,
        }
    }
}

/// A user-driven change to one section's own dimensions.
///
/// Each variant is only meaningful for some shapes; the others reject it
/// with [`crate::AccumulationError::UnsupportedEdit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SectionEdit {
    /// Explicit length of a straight section, in meters.
    Length(f64),
    /// Centerline radius of a curve, in meters.
    Radius(f64),
    /// Sweep of a curve, in radians.
    Angle(f64),
    /// Turning direction of a curve.
    Revolution(Revolution),
}

impl SectionEdit {
    /// Name of the edited parameter.
    #[must_use]
    pub const fn parameter(&self) -> &'static str {
        match self {
            Self::Length(_) => "length",
            Self::Radius(_) => "radius",
            Self::Angle(_) => "angle",
            Self::Revolution(_) => "revolution",
        }
    }
}

/// Persisted settings of a live section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionInfo {
    /// Straight settings.
    Straight(StraightSectionInfo),
    /// Curve settings.
    Curve(CurveSectionInfo),
}

/// Shared capability set of every section variant.
pub trait Section: std::fmt::Debug + Send + Sync {
    /// Shape of this variant.
    fn shape(&self) -> SectionShape;

    /// Display name.
    fn name(&self) -> &str;

    /// Renames the section.
    fn set_name(&mut self, name: String);

    /// Length along the travel path, in meters.
    fn length(&self) -> f64;

    /// Applies a length computed by the accumulation layout.
    ///
    /// Variants whose length is derived from other parameters ignore it.
    fn set_length(&mut self, length: f64);

    /// Width in meters.
    fn width(&self) -> f64;

    /// Sets the width and resizes the beam to span it.
    fn set_width(&mut self, width: f64);

    /// Travel distance from the start connection to the beam, in meters.
    fn sensor_distance(&self) -> f64;

    /// Moves the beam along the travel path.
    fn set_sensor_distance(&mut self, distance: f64);

    /// The embedded beam.
    fn sensor(&self) -> &Beam;

    /// The embedded beam, mutably.
    fn sensor_mut(&mut self) -> &mut Beam;

    /// Pose of the section frame in the accumulation frame.
    fn local_pose(&self) -> &Isometry3<f64>;

    /// Places the section frame in the accumulation frame.
    fn set_local_pose(&mut self, pose: Isometry3<f64>);

    /// Start connection pose in the section frame.
    fn start_connection(&self) -> Isometry3<f64>;

    /// End connection pose in the section frame.
    fn end_connection(&self) -> Isometry3<f64>;

    /// Whether the marker of a connection point is shown.
    fn is_connection_visible(&self, point: ConnectionPoint) -> bool;

    /// Shows or hides the marker of a connection point.
    fn set_connection_visible(&mut self, point: ConnectionPoint, visible: bool);

    /// Current appearance.
    fn appearance(&self) -> Appearance;

    /// Forwards appearance to the renderer.
    fn set_appearance(&mut self, appearance: Appearance);

    /// Applies a user-driven change to this section's own dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is invalid or the variant does not have
    /// the parameter. The section is unchanged on error.
    fn apply(&mut self, edit: SectionEdit) -> Result<()>;

    /// Persisted settings of this section.
    fn info(&self) -> SectionInfo;

    /// Pose of a connection point in the world, given the accumulation pose.
    fn connection_global(&self, point: ConnectionPoint, parent: &Isometry3<f64>) -> Isometry3<f64> {
        let connection = match point {
            ConnectionPoint::Start => self.start_connection(),
            ConnectionPoint::End => self.end_connection(),
        };
        parent * self.local_pose() * connection
    }
}

/// State shared by every section variant.
#[derive(Debug, Clone)]
pub(crate) struct SectionBody {
    pub(crate) name: String,
    pub(crate) width: f64,
    pub(crate) sensor_distance: f64,
    pub(crate) local_pose: Isometry3<f64>,
    pub(crate) sensor: Beam,
    pub(crate) start_visible: bool,
    pub(crate) end_visible: bool,
    pub(crate) appearance: Appearance,
}

impl SectionBody {
    pub(crate) fn new(
        sensor: Beam,
        width: f64,
        sensor_distance: f64,
        appearance: Appearance,
    ) -> Self {
        Self {
            name: String::new(),
            width,
            sensor_distance,
            local_pose: Isometry3::identity(),
            sensor,
            start_visible: true,
            end_visible: true,
            appearance,
        }
    }

    pub(crate) fn is_connection_visible(&self, point: ConnectionPoint) -> bool {
        match point {
            ConnectionPoint::Start => self.start_visible,
            ConnectionPoint::End => self.end_visible,
        }
    }

    pub(crate) fn set_connection_visible(&mut self, point: ConnectionPoint, visible: bool) {
        match point {
            ConnectionPoint::Start => self.start_visible = visible,
            ConnectionPoint::End => self.end_visible = visible,
        }
    }
}

/// Builds the active section of a chain position.
///
/// Uses the stored settings for `settings.shape` when present, defaults for
/// `index` otherwise. The returned section's beam is untagged.
pub(crate) fn build(
    settings: &SectionHandlerInfo,
    index: usize,
    sensor_id: SensorId,
    appearance: Appearance,
) -> Box<dyn Section> {
    match settings.shape {
        SectionShape::Straight => {
            let info = settings
                .straight
                .clone()
                .unwrap_or_else(|| StraightSectionInfo::for_index(index));
            Box::new(StraightSection::new(sensor_id, &info, appearance))
        }
        SectionShape::Curve => {
            let info = settings
                .curve
                .clone()
                .unwrap_or_else(|| CurveSectionInfo::for_index(index));
            Box::new(CurveSection::new(sensor_id, &info, appearance))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use conveyor_types::pose;

    #[test]
    fn test_build_uses_defaults() {
        let settings = SectionHandlerInfo::with_shape(SectionShape::Curve);
        let section = build(&settings, 2, SensorId::new(1), Appearance::default());
        assert_eq!(section.shape(), SectionShape::Curve);
        assert_eq!(section.sensor().name(), "Sensor 2");
        assert_eq!(section.sensor().tag(), None);
    }

    #[test]
    fn test_build_uses_stored_settings() {
        let settings = SectionHandlerInfo {
            shape: SectionShape::Straight,
            straight: Some(StraightSectionInfo {
                length: 2.5,
                ..StraightSectionInfo::for_index(0)
            }),
            curve: None,
        };
        let section = build(&settings, 0, SensorId::new(1), Appearance::default());
        assert_relative_eq!(section.length(), 2.5);
    }

    #[test]
    fn test_connection_global_composes_parent() {
        let settings = SectionHandlerInfo::default();
        let mut section = build(&settings, 0, SensorId::new(1), Appearance::default());
        section.set_local_pose(pose::from_xyz_yaw(1.0, 0.0, 0.0, 0.0));

        let parent = pose::from_xyz_yaw(0.0, 0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let end = section.connection_global(ConnectionPoint::End, &parent);
        // Local end is (2, 0, 0); the parent turns it onto +Y.
        assert_relative_eq!(end.translation.vector.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(end.translation.vector.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_revolution_sign() {
        assert_relative_eq!(Revolution::Clockwise.sign(), -1.0);
        assert_relative_eq!(Revolution::Counterclockwise.sign(), 1.0);
    }
}
