//! The accumulation conveyor.
//!
//! [`Accumulation`] owns the chain of handlers, the global dimensions and the
//! release input. Every configuration change ends in a full [`recompute`],
//! which re-derives section lengths and re-chains section poses from the
//! tail (highest index, at the local origin) to the head (index 0, at the
//! discharge end).
//!
//! All entry points take `&mut self`; the conveyor is driven by exactly one
//! writer and every call runs to completion before returning.
//!
//! [`recompute`]: Accumulation::recompute

#![allow(clippy::cast_precision_loss)]

use std::collections::VecDeque;

use conveyor_types::{Color, DigitalInput, Edge, LoadId, SensorId, SurfaceType};
use nalgebra::Isometry3;
use tracing::{debug, info, warn};

use crate::config::{require_section_count, AccumulationInfo, SectionHandlerInfo};
use crate::controller::{Controller, GateDecision, SensorBank};
use crate::error::{require_non_negative, require_positive};
use crate::handler::{Neighbors, SectionHandler};
use crate::section::{Appearance, SectionEdit, SectionShape};
use crate::{AccumulationError, Result};

/// Two dimensions closer than this are treated as equal.
const DIMENSION_EPSILON: f64 = 1e-9;

fn effectively_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < DIMENSION_EPSILON
}

fn rejected(err: &AccumulationError) {
    warn!(%err, "configuration rejected");
}

/// A presence change reported by the physics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    /// A load entered a beam.
    Entering {
        /// Beam reporting the change.
        sensor: SensorId,
        /// Load that entered.
        load: LoadId,
    },
    /// A load left a beam.
    Leaving {
        /// Beam reporting the change.
        sensor: SensorId,
        /// Load that left.
        load: LoadId,
    },
}

/// Result of handling a [`SensorEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Decision taken for an entering load.
    Gate(GateDecision),
    /// Loads released by a leaving load.
    Released(Vec<LoadId>),
}

/// A zero-pressure accumulation conveyor.
///
/// # Example
///
/// ```
/// use conveyor_accumulation::{Accumulation, AccumulationInfo, GateDecision};
/// use conveyor_types::LoadId;
///
/// let mut conveyor = Accumulation::new(AccumulationInfo::default()).unwrap();
/// let head = conveyor.sections()[0].sensor_id();
///
/// // The head holds whatever arrives while release is off.
/// assert_eq!(conveyor.load_entering(head, LoadId::new(1)), GateDecision::Hold);
///
/// // Switching release on frees it.
/// assert_eq!(conveyor.set_release(true), vec![LoadId::new(1)]);
/// ```
#[derive(Debug)]
pub struct Accumulation {
    name: String,
    pose: Isometry3<f64>,
    fixed_length: bool,
    length: f64,
    width: f64,
    sensor_distance: f64,
    appearance: Appearance,
    release: DigitalInput,
    sections: Vec<SectionHandler>,
    retained: VecDeque<SectionHandlerInfo>,
    controller: Controller,
}

impl Accumulation {
    /// Builds a conveyor from persisted state.
    ///
    /// Positions `0..number_of_sections` reuse `info.sections` where present;
    /// further entries are kept for later growth.
    ///
    /// # Errors
    ///
    /// Returns the first invalid dimension found in `info`.
    pub fn new(info: AccumulationInfo) -> Result<Self> {
        info.validate()?;

        let AccumulationInfo {
            name,
            pose,
            number_of_sections,
            fixed_length,
            length,
            width,
            sensor_distance,
            surface_type,
            color,
            visible,
            release,
            sections,
        } = info;

        let mut accumulation = Self {
            name,
            pose,
            fixed_length,
            length,
            width,
            sensor_distance,
            appearance: Appearance {
                surface_type,
                color,
                visible,
            },
            release: DigitalInput::from_info(&release),
            sections: Vec::new(),
            retained: sections.into(),
            controller: Controller::new(),
        };
        accumulation.resize(number_of_sections)?;
        accumulation.recompute();
        Ok(accumulation)
    }

    /// Builds a conveyor from JSON produced by [`Accumulation::to_json`].
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or invalid dimensions.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(AccumulationInfo::from_json(json)?)
    }

    /// Snapshot of the persisted state.
    #[must_use]
    pub fn info(&self) -> AccumulationInfo {
        let mut sections: Vec<_> = self.sections.iter().map(SectionHandler::info).collect();
        sections.extend(self.retained.iter().cloned());

        AccumulationInfo {
            name: self.name.clone(),
            pose: self.pose,
            number_of_sections: self.sections.len(),
            fixed_length: self.fixed_length,
            length: self.length,
            width: self.width,
            sensor_distance: self.sensor_distance,
            surface_type: self.appearance.surface_type,
            color: self.appearance.color,
            visible: self.appearance.visible,
            release: self.release.info(),
            sections,
        }
    }

    /// Encodes the persisted state as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        self.info().to_json()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pose of the accumulation frame in the world.
    #[must_use]
    pub const fn pose(&self) -> &Isometry3<f64> {
        &self.pose
    }

    /// Handlers in index order; index 0 is the head.
    #[must_use]
    pub fn sections(&self) -> &[SectionHandler] {
        &self.sections
    }

    /// Handler at `index`.
    #[must_use]
    pub fn section(&self, index: usize) -> Option<&SectionHandler> {
        self.sections.get(index)
    }

    /// Number of sections.
    #[must_use]
    pub fn number_of_sections(&self) -> usize {
        self.sections.len()
    }

    /// The sensor chain.
    #[must_use]
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The release input.
    #[must_use]
    pub const fn release(&self) -> &DigitalInput {
        &self.release
    }

    /// Whether straight lengths are derived from [`Accumulation::length`].
    #[must_use]
    pub const fn fixed_length(&self) -> bool {
        self.fixed_length
    }

    /// Total length shared by the straight sections.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Width of every section.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Distance from each section's start to its beam.
    #[must_use]
    pub const fn sensor_distance(&self) -> f64 {
        self.sensor_distance
    }

    /// Surface fitted to every section.
    #[must_use]
    pub const fn surface_type(&self) -> SurfaceType {
        self.appearance.surface_type
    }

    /// Color of every section.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.appearance.color
    }

    /// Whether the conveyor is drawn.
    #[must_use]
    pub const fn visible(&self) -> bool {
        self.appearance.visible
    }

    /// Sum of all section lengths along the travel path.
    #[must_use]
    pub fn path_length(&self) -> f64 {
        self.sections.iter().map(|h| h.section().length()).sum()
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Grows or shrinks the chain to `count` sections.
    ///
    /// New positions reuse retained settings where available. Removed
    /// positions are disposed from the highest index down and their settings
    /// retained.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::TooManySections`] above
    /// [`MAX_NUMBER_OF_SECTIONS`](crate::MAX_NUMBER_OF_SECTIONS), leaving the
    /// chain unchanged.
    pub fn set_number_of_sections(&mut self, count: usize) -> Result<()> {
        let count = require_section_count(count).inspect_err(rejected)?;
        if count == self.sections.len() {
            return Ok(());
        }
        let from = self.sections.len();
        let outcome = self.resize(count);
        info!(from, to = self.sections.len(), "section count changed");
        self.recompute();
        outcome
    }

    fn resize(&mut self, count: usize) -> Result<()> {
        while self.sections.len() < count {
            let index = self.sections.len();
            let settings = self.retained.pop_front().unwrap_or_default();
            let outcome =
                SectionHandler::new(index, settings.clone(), &mut self.controller, self.appearance);
            match outcome {
                Ok(handler) => self.sections.push(handler),
                Err(err) => {
                    self.retained.push_front(settings);
                    self.rename_sections();
                    return Err(err);
                }
            }
        }
        while self.sections.len() > count {
            if let Some(handler) = self.sections.pop() {
                let settings = handler.dispose(&mut self.controller);
                self.retained.push_front(settings);
            }
        }
        self.rename_sections();
        Ok(())
    }

    fn rename_sections(&mut self) {
        for (index, handler) in self.sections.iter_mut().enumerate() {
            handler.section_mut().set_name(format!("Section {index}"));
        }
    }

    /// Sets the total length shared by the straight sections.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::NonPositive`] for a length `<= 0`.
    pub fn set_length(&mut self, length: f64) -> Result<()> {
        let length = require_positive("length", length).inspect_err(rejected)?;
        if effectively_equal(self.length, length) {
            return Ok(());
        }
        self.length = length;
        self.recompute();
        Ok(())
    }

    /// Sets the width of every section.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::NonPositive`] for a width `<= 0`.
    pub fn set_width(&mut self, width: f64) -> Result<()> {
        let width = require_positive("width", width).inspect_err(rejected)?;
        if effectively_equal(self.width, width) {
            return Ok(());
        }
        self.width = width;
        self.recompute();
        Ok(())
    }

    /// Sets the distance from each section's start to its beam.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::Negative`] for a distance `< 0`.
    pub fn set_sensor_distance(&mut self, distance: f64) -> Result<()> {
        let distance = require_non_negative("sensor distance", distance).inspect_err(rejected)?;
        if effectively_equal(self.sensor_distance, distance) {
            return Ok(());
        }
        self.sensor_distance = distance;
        self.recompute();
        Ok(())
    }

    /// Switches between derived (`true`) and explicit straight lengths.
    pub fn set_fixed_length(&mut self, fixed_length: bool) {
        if self.fixed_length == fixed_length {
            return;
        }
        self.fixed_length = fixed_length;
        self.recompute();
    }

    /// Moves the accumulation frame in the world.
    pub fn set_pose(&mut self, pose: Isometry3<f64>) {
        self.pose = pose;
        self.recompute();
    }

    /// Renames the conveyor.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Sets the surface of every section.
    pub fn set_surface_type(&mut self, surface_type: SurfaceType) {
        self.appearance.surface_type = surface_type;
        self.update_visualization();
    }

    /// Sets the color of every section.
    pub fn set_color(&mut self, color: Color) {
        self.appearance.color = color;
        self.update_visualization();
    }

    /// Shows or hides the conveyor.
    pub fn set_visible(&mut self, visible: bool) {
        self.appearance.visible = visible;
        self.update_visualization();
    }

    /// Changes the shape of the section at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::SectionOutOfRange`] for an unknown index.
    pub fn set_section_shape(&mut self, index: usize, shape: SectionShape) -> Result<()> {
        let count = self.sections.len();
        let handler = self
            .sections
            .get_mut(index)
            .ok_or_else(|| AccumulationError::out_of_range(index, count))
            .inspect_err(rejected)?;
        if handler.set_shape(shape, &mut self.controller, self.appearance)? {
            self.recompute();
        }
        Ok(())
    }

    /// Sets the explicit length of the straight section at `index`.
    ///
    /// Only allowed while fixed length is off.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::LengthIsFixed`] in fixed-length mode, and
    /// the usual range and validation errors otherwise.
    pub fn set_section_length(&mut self, index: usize, length: f64) -> Result<()> {
        self.edit_section(index, SectionEdit::Length(length))
    }

    /// Changes one of the section's own dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::SectionOutOfRange`] for an unknown index,
    /// [`AccumulationError::LengthIsFixed`] for a length edit in fixed-length
    /// mode, [`AccumulationError::UnsupportedEdit`] if the section has no
    /// such parameter, and validation errors for bad values. The section is
    /// unchanged on error.
    pub fn edit_section(&mut self, index: usize, edit: SectionEdit) -> Result<()> {
        let count = self.sections.len();
        let fixed_length = self.fixed_length;
        let result = match self.sections.get_mut(index) {
            Some(_) if fixed_length && matches!(edit, SectionEdit::Length(_)) => {
                Err(AccumulationError::LengthIsFixed { index })
            }
            Some(handler) => handler.section_mut().apply(edit),
            None => Err(AccumulationError::out_of_range(index, count)),
        };
        if let Err(err) = &result {
            warn!(%err, index, "section edit rejected");
            return result;
        }
        self.recompute();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Re-derives section lengths and re-chains every section pose.
    ///
    /// Walks from the tail to the head so each section is placed after the
    /// one it attaches to.
    pub fn recompute(&mut self) {
        let count = self.sections.len();
        let straights = self
            .sections
            .iter()
            .filter(|h| h.shape() == SectionShape::Straight)
            .count();
        let section_length = if straights == 0 {
            self.length
        } else {
            self.length / straights as f64
        };
        let (width, sensor_distance, fixed_length) =
            (self.width, self.sensor_distance, self.fixed_length);
        let pose = self.pose;
        let appearance = self.appearance;

        for index in (0..count).rev() {
            let (head, tail) = self.sections.split_at_mut(index + 1);
            let previous = tail.first();
            let handler = &mut head[index];

            handler.update_dimensions(section_length, width, sensor_distance, fixed_length);
            handler.position_relative_to(previous, &pose);
            handler.set_neighbors(Neighbors::of(index, count));
            handler.update_visualization(appearance);
        }

        debug!(count, straights, section_length, "layout recomputed");
    }

    fn update_visualization(&mut self) {
        let appearance = self.appearance;
        for handler in &mut self.sections {
            handler.update_visualization(appearance);
        }
    }

    // ------------------------------------------------------------------
    // Runtime events
    // ------------------------------------------------------------------

    /// Records `load` entering `sensor` and decides whether it is held.
    pub fn load_entering(&mut self, sensor: SensorId, load: LoadId) -> GateDecision {
        let Some(beam) = self.sections.as_mut_slice().beam_mut(sensor) else {
            debug!(sensor = %sensor, load = %load, "entering on unknown sensor");
            return GateDecision::Ignored;
        };
        beam.load_entered(load);
        self.controller.on_entering(
            sensor,
            load,
            self.release.is_active(),
            self.sections.as_mut_slice(),
        )
    }

    /// Records `load` leaving `sensor` and returns the loads it frees.
    pub fn load_leaving(&mut self, sensor: SensorId, load: LoadId) -> Vec<LoadId> {
        let Some(beam) = self.sections.as_mut_slice().beam_mut(sensor) else {
            debug!(sensor = %sensor, load = %load, "leaving on unknown sensor");
            return Vec::new();
        };
        beam.load_left(load);
        self.controller
            .on_leaving(sensor, load, self.sections.as_mut_slice())
    }

    /// Dispatches a presence change.
    pub fn handle(&mut self, event: SensorEvent) -> EventOutcome {
        match event {
            SensorEvent::Entering { sensor, load } => {
                EventOutcome::Gate(self.load_entering(sensor, load))
            }
            SensorEvent::Leaving { sensor, load } => {
                EventOutcome::Released(self.load_leaving(sensor, load))
            }
        }
    }

    /// Drives the release input. A rising edge frees the head.
    ///
    /// Returns the loads freed by this call.
    pub fn set_release(&mut self, active: bool) -> Vec<LoadId> {
        match self.release.set(active) {
            Some(Edge::Rising) => self.controller.on_release(self.sections.as_mut_slice()),
            Some(Edge::Falling) | None => Vec::new(),
        }
    }
}
