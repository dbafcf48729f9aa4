//! Persisted configuration records.
//!
//! Everything needed to rebuild an identical conveyor lives in
//! [`AccumulationInfo`]: section count, length mode, global dimensions,
//! appearance, the release input symbol and one [`SectionHandlerInfo`] per
//! chain position. Presence and holding state of the beams is transient and
//! never saved.

use std::f64::consts::{FRAC_PI_2, PI};

use conveyor_types::{BeamInfo, Color, InputInfo, SurfaceType};
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};

use crate::error::{require_non_negative, require_positive};
use crate::section::{Revolution, SectionShape};
use crate::{AccumulationError, Result};

/// Default section count of a new accumulation.
pub const DEFAULT_NUMBER_OF_SECTIONS: usize = 2;
/// Largest section count a conveyor accepts.
pub const MAX_NUMBER_OF_SECTIONS: usize = 1024;
/// Default total length in meters.
pub const DEFAULT_LENGTH: f64 = 2.0;
/// Default width in meters.
pub const DEFAULT_WIDTH: f64 = 0.45;
/// Default distance from a section's start to its beam, in meters.
pub const DEFAULT_SENSOR_DISTANCE: f64 = 0.4;
/// Default length of a straight section in meters.
pub const DEFAULT_STRAIGHT_LENGTH: f64 = 1.0;
/// Default centerline radius of a curve section in meters.
pub const DEFAULT_CURVE_RADIUS: f64 = 0.6;
/// Default sweep of a curve section in radians.
pub const DEFAULT_CURVE_ANGLE: f64 = FRAC_PI_2;
/// Smallest buildable curve sweep in radians (30°).
pub const MIN_CURVE_ANGLE: f64 = PI / 6.0;
/// Largest buildable curve sweep in radians (180°).
pub const MAX_CURVE_ANGLE: f64 = PI;
/// Symbol of the release input.
pub const RELEASE_SYMBOL: &str = "Release";

/// Validates a section count.
pub(crate) fn require_section_count(count: usize) -> Result<usize> {
    if count > MAX_NUMBER_OF_SECTIONS {
        return Err(AccumulationError::TooManySections {
            count,
            max: MAX_NUMBER_OF_SECTIONS,
        });
    }
    Ok(count)
}

/// Validates a curve sweep angle in radians.
pub(crate) fn require_curve_angle(angle: f64) -> Result<f64> {
    // Bounds are inclusive after the degree round trip.
    let degrees = angle.to_degrees();
    let (min, max) = (MIN_CURVE_ANGLE.to_degrees(), MAX_CURVE_ANGLE.to_degrees());
    if angle.is_nan() || degrees < min - 1e-9 || degrees > max + 1e-9 {
        return Err(AccumulationError::AngleOutOfRange {
            degrees,
            min_degrees: min,
            max_degrees: max,
        });
    }
    Ok(angle)
}

fn beam_name(index: usize) -> String {
    format!("Sensor {index}")
}

/// Persisted settings of a straight section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StraightSectionInfo {
    /// Explicit length in meters. Overwritten by the accumulation while fixed
    /// length is on.
    pub length: f64,
    /// Width in meters.
    pub width: f64,
    /// Distance from the section start to the beam, in meters.
    pub sensor_distance: f64,
    /// Beam description.
    pub beam: BeamInfo,
}

impl StraightSectionInfo {
    /// Default settings for the section at chain position `index`.
    #[must_use]
    pub fn for_index(index: usize) -> Self {
        Self {
            beam: BeamInfo::named(beam_name(index)),
            ..Self::default()
        }
    }

    /// Checks that every dimension is buildable.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        require_positive("straight length", self.length)?;
        require_positive("straight width", self.width)?;
        require_non_negative("sensor distance", self.sensor_distance)?;
        Ok(())
    }
}

impl Default for StraightSectionInfo {
    fn default() -> Self {
        Self {
            length: DEFAULT_STRAIGHT_LENGTH,
            width: DEFAULT_WIDTH,
            sensor_distance: DEFAULT_SENSOR_DISTANCE,
            beam: BeamInfo::default(),
        }
    }
}

/// Persisted settings of a curve section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSectionInfo {
    /// Centerline radius in meters.
    pub radius: f64,
    /// Sweep angle in radians.
    pub angle: f64,
    /// Turning direction seen from above.
    pub revolution: Revolution,
    /// Width in meters.
    pub width: f64,
    /// Arc distance from the section start to the beam, in meters.
    pub sensor_distance: f64,
    /// Beam description.
    pub beam: BeamInfo,
}

impl CurveSectionInfo {
    /// Default settings for the section at chain position `index`.
    #[must_use]
    pub fn for_index(index: usize) -> Self {
        Self {
            beam: BeamInfo::named(beam_name(index)),
            ..Self::default()
        }
    }

    /// Checks that every dimension is buildable.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        require_positive("curve radius", self.radius)?;
        require_curve_angle(self.angle)?;
        require_positive("curve width", self.width)?;
        require_non_negative("sensor distance", self.sensor_distance)?;
        Ok(())
    }
}

impl Default for CurveSectionInfo {
    fn default() -> Self {
        Self {
            radius: DEFAULT_CURVE_RADIUS,
            angle: DEFAULT_CURVE_ANGLE,
            revolution: Revolution::default(),
            width: DEFAULT_WIDTH,
            sensor_distance: DEFAULT_SENSOR_DISTANCE,
            beam: BeamInfo::default(),
        }
    }
}

/// Persisted settings of one chain position.
///
/// Settings are kept per shape: toggling a position from straight to curve
/// and back restores the straight section it had before, rather than
/// resetting the returning shape to catalog defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionHandlerInfo {
    /// Active shape.
    pub shape: SectionShape,
    /// Straight settings, if this position has ever been straight.
    pub straight: Option<StraightSectionInfo>,
    /// Curve settings, if this position has ever been a curve.
    pub curve: Option<CurveSectionInfo>,
}

impl SectionHandlerInfo {
    /// Creates settings with the given active shape and no stored dimensions.
    #[must_use]
    pub fn with_shape(shape: SectionShape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    /// Checks the stored settings of both shapes.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if let Some(straight) = &self.straight {
            straight.validate()?;
        }
        if let Some(curve) = &self.curve {
            curve.validate()?;
        }
        Ok(())
    }
}

/// Persisted state of an accumulation conveyor.
///
/// # Example
///
/// ```
/// use conveyor_accumulation::AccumulationInfo;
///
/// let info = AccumulationInfo::default();
/// assert_eq!(info.number_of_sections, 2);
/// assert!(info.fixed_length);
///
/// let json = info.to_json().unwrap();
/// let restored = AccumulationInfo::from_json(&json).unwrap();
/// assert_eq!(restored, info);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulationInfo {
    /// Display name.
    pub name: String,
    /// Pose of the accumulation frame in the world.
    pub pose: Isometry3<f64>,
    /// Number of sections in the chain.
    pub number_of_sections: usize,
    /// Whether straight lengths are derived from [`Self::length`].
    pub fixed_length: bool,
    /// Total length shared by the straight sections, in meters.
    pub length: f64,
    /// Width of every section, in meters.
    pub width: f64,
    /// Distance from each section's start to its beam, in meters.
    pub sensor_distance: f64,
    /// Surface fitted to every section.
    pub surface_type: SurfaceType,
    /// Color of every section.
    pub color: Color,
    /// Whether the conveyor is drawn.
    pub visible: bool,
    /// Release input description.
    pub release: InputInfo,
    /// Per-position settings. May hold more entries than
    /// [`Self::number_of_sections`]; extra entries are reused on growth.
    pub sections: Vec<SectionHandlerInfo>,
}

impl AccumulationInfo {
    /// Checks every dimension, including the stored section settings.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        require_section_count(self.number_of_sections)?;
        require_positive("length", self.length)?;
        require_positive("width", self.width)?;
        require_non_negative("sensor distance", self.sensor_distance)?;
        for section in &self.sections {
            section.validate()?;
        }
        Ok(())
    }

    /// Encodes the record as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes a record from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::Serialization`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for AccumulationInfo {
    fn default() -> Self {
        let surface_type = SurfaceType::default();
        Self {
            name: "Accumulation".to_string(),
            pose: Isometry3::identity(),
            number_of_sections: DEFAULT_NUMBER_OF_SECTIONS,
            fixed_length: true,
            length: DEFAULT_LENGTH,
            width: DEFAULT_WIDTH,
            sensor_distance: DEFAULT_SENSOR_DISTANCE,
            surface_type,
            color: surface_type.default_color(),
            visible: true,
            release: InputInfo::new(RELEASE_SYMBOL),
            sections: Vec::new(),
        }
    }
}
