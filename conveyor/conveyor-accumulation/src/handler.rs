//! Ownership of one chain position.
//!
//! A [`SectionHandler`] owns the live section at a fixed index and swaps it
//! when the shape changes. It keeps the settings of the shape that is not
//! live so toggling back restores them.

use conveyor_types::{pose, Beam, SensorId, SensorTag};
use nalgebra::Isometry3;
use tracing::info;

use crate::config::SectionHandlerInfo;
use crate::controller::{Controller, SensorBank};
use crate::section::{self, Appearance, ConnectionPoint, Section, SectionInfo, SectionShape};
use crate::{AccumulationError, Result};

/// Indices of the adjacent handlers found by the last layout pass.
///
/// `previous` is upstream (index + 1), `next` is toward discharge
/// (index - 1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neighbors {
    /// Upstream neighbor.
    pub previous: Option<usize>,
    /// Downstream neighbor.
    pub next: Option<usize>,
}

impl Neighbors {
    /// Neighbors of `index` in a chain of `count` handlers.
    #[must_use]
    pub fn of(index: usize, count: usize) -> Self {
        Self {
            previous: (index + 1 < count).then_some(index + 1),
            next: index.checked_sub(1),
        }
    }
}

/// Owner of the live section at one chain position.
#[derive(Debug)]
pub struct SectionHandler {
    index: usize,
    settings: SectionHandlerInfo,
    section: Box<dyn Section>,
    neighbors: Neighbors,
}

impl SectionHandler {
    /// Builds the section described by `settings` and registers its beam,
    /// tagged with `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AccumulationError::TagOverflow`] if `index` does not fit in a
    /// sensor tag.
    pub(crate) fn new(
        index: usize,
        settings: SectionHandlerInfo,
        controller: &mut Controller,
        appearance: Appearance,
    ) -> Result<Self> {
        let tag = tag_for(index)?;
        let mut section = section::build(&settings, index, controller.allocate_id(), appearance);
        section.sensor_mut().assign_tag(tag)?;
        controller.add(section.sensor());

        Ok(Self {
            index,
            settings,
            section,
            neighbors: Neighbors::default(),
        })
    }

    /// Chain position, fixed for the handler's lifetime.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Shape of the live section.
    #[must_use]
    pub fn shape(&self) -> SectionShape {
        self.section.shape()
    }

    /// The live section.
    #[must_use]
    pub fn section(&self) -> &dyn Section {
        self.section.as_ref()
    }

    pub(crate) fn section_mut(&mut self) -> &mut dyn Section {
        self.section.as_mut()
    }

    /// Id of the live section's beam.
    #[must_use]
    pub fn sensor_id(&self) -> SensorId {
        self.section.sensor().id()
    }

    /// Neighbors found by the last layout pass.
    #[must_use]
    pub const fn neighbors(&self) -> Neighbors {
        self.neighbors
    }

    pub(crate) fn set_neighbors(&mut self, neighbors: Neighbors) {
        self.neighbors = neighbors;
    }

    /// Replaces the live section with one of `shape`.
    ///
    /// The old beam is deregistered before the replacement is built, and the
    /// replacement's beam is registered only after the old section is
    /// dropped. Returns `false` if the shape is unchanged; a
    /// `true` result means the owner must re-run its layout.
    ///
    /// # Errors
    ///
    /// Propagates tag assignment failures; cannot fail for an index that was
    /// accepted by [`SectionHandler::new`].
    pub(crate) fn set_shape(
        &mut self,
        shape: SectionShape,
        controller: &mut Controller,
        appearance: Appearance,
    ) -> Result<bool> {
        if self.section.shape() == shape {
            return Ok(false);
        }

        controller.remove(self.sensor_id());
        self.store_live_settings();
        self.settings.shape = shape;

        let name = self.section.name().to_string();
        let replacement = section::build(&self.settings, self.index, controller.allocate_id(), appearance);
        drop(std::mem::replace(&mut self.section, replacement));

        self.section.set_name(name);
        self.section.sensor_mut().assign_tag(tag_for(self.index)?)?;
        controller.add(self.section.sensor());

        info!(index = self.index, %shape, "section shape changed");
        Ok(true)
    }

    /// Applies the layout dimensions to the live section.
    ///
    /// `length` is only applied while the accumulation is in fixed-length
    /// mode.
    pub fn update_dimensions(
        &mut self,
        length: f64,
        width: f64,
        sensor_distance: f64,
        fixed_length: bool,
    ) {
        if fixed_length {
            self.section.set_length(length);
        }
        self.section.set_width(width);
        self.section.set_sensor_distance(sensor_distance);
    }

    /// Places the live section so its start meets the end of `previous`.
    ///
    /// The previous section's end is read in the world frame and brought back
    /// into the accumulation frame described by `parent_pose`. Without a
    /// previous handler the section sits at the accumulation origin.
    pub fn position_relative_to(
        &mut self,
        previous: Option<&SectionHandler>,
        parent_pose: &Isometry3<f64>,
    ) {
        let local = match previous {
            Some(previous) => {
                let end = previous
                    .section
                    .connection_global(ConnectionPoint::End, parent_pose);
                let target = pose::global_to_local(parent_pose, &end);
                target * self.section.start_connection().inverse()
            }
            None => Isometry3::identity(),
        };
        self.section.set_local_pose(local);
    }

    /// Shows connection markers only at the chain ends and forwards
    /// appearance to the live section.
    pub fn update_visualization(&mut self, appearance: Appearance) {
        self.section
            .set_connection_visible(ConnectionPoint::Start, self.neighbors.previous.is_none());
        self.section
            .set_connection_visible(ConnectionPoint::End, self.neighbors.next.is_none());
        self.section.set_appearance(appearance);
    }

    /// Persisted settings, including those of the shape that is not live.
    #[must_use]
    pub fn info(&self) -> SectionHandlerInfo {
        let mut settings = self.settings.clone();
        settings.shape = self.section.shape();
        match self.section.info() {
            SectionInfo::Straight(straight) => settings.straight = Some(straight),
            SectionInfo::Curve(curve) => settings.curve = Some(curve),
        }
        settings
    }

    /// Deregisters the beam and drops the section.
    ///
    /// Returns the persisted settings so the position can be rebuilt later.
    pub(crate) fn dispose(self, controller: &mut Controller) -> SectionHandlerInfo {
        controller.remove(self.sensor_id());
        self.info()
    }

    fn store_live_settings(&mut self) {
        self.settings = self.info();
    }
}

fn tag_for(index: usize) -> Result<SensorTag> {
    u32::try_from(index)
        .map(SensorTag::new)
        .map_err(|_| AccumulationError::TagOverflow { index })
}

impl SensorBank for [SectionHandler] {
    fn beam(&self, id: SensorId) -> Option<&Beam> {
        self.iter()
            .map(|handler| handler.section.sensor())
            .find(|beam| beam.id() == id)
    }

    fn beam_mut(&mut self, id: SensorId) -> Option<&mut Beam> {
        self.iter_mut()
            .map(|handler| handler.section.sensor_mut())
            .find(|beam| beam.id() == id)
    }
}
