//! Zero-pressure accumulation conveyor.
//!
//! An accumulation conveyor is a chain of sections, each carrying one
//! photo-eye beam. Loads queue up toward the discharge end without touching
//! each other: a beam holds its load only while the beam in front of it is
//! occupied, and a release input lets the head go.
//!
//! - [`Accumulation`] - The conveyor: section chain, dimensions, release input
//! - [`Controller`] - Cascading backpressure over the tag-sorted beam chain
//! - [`SectionHandler`] - Owner of one chain position and its live section
//! - [`section`] - Straight and curved section geometry
//! - [`AccumulationInfo`] - Persisted configuration, JSON round-trippable
//!
//! # Chain Layout
//!
//! Index 0 is the head, at the discharge end. The section with the highest
//! index is the tail and sits at the accumulation origin; every lower index
//! is attached to the end of the section above it. Loads travel from the
//! tail toward the head.
//!
//! # Example
//!
//! ```
//! use conveyor_accumulation::{Accumulation, AccumulationInfo, GateDecision};
//! use conveyor_accumulation::section::SectionShape;
//! use conveyor_types::LoadId;
//!
//! let mut conveyor = Accumulation::new(AccumulationInfo {
//!     number_of_sections: 3,
//!     length: 3.0,
//!     ..AccumulationInfo::default()
//! })
//! .unwrap();
//! conveyor.set_section_shape(1, SectionShape::Curve).unwrap();
//!
//! let head = conveyor.sections()[0].sensor_id();
//! let middle = conveyor.sections()[1].sensor_id();
//!
//! assert_eq!(conveyor.load_entering(head, LoadId::new(1)), GateDecision::Hold);
//! assert_eq!(conveyor.load_entering(middle, LoadId::new(2)), GateDecision::Hold);
//!
//! // Releasing the head lets it leave, which frees the load behind it.
//! conveyor.set_release(true);
//! assert_eq!(conveyor.load_leaving(head, LoadId::new(1)), vec![LoadId::new(2)]);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod accumulation;
mod config;
mod controller;
mod error;
mod handler;
pub mod section;

pub use accumulation::{Accumulation, EventOutcome, SensorEvent};
pub use config::{
    AccumulationInfo, CurveSectionInfo, SectionHandlerInfo, StraightSectionInfo,
    DEFAULT_CURVE_ANGLE, DEFAULT_CURVE_RADIUS, DEFAULT_LENGTH, DEFAULT_NUMBER_OF_SECTIONS,
    DEFAULT_SENSOR_DISTANCE, DEFAULT_STRAIGHT_LENGTH, DEFAULT_WIDTH, MAX_CURVE_ANGLE,
    MAX_NUMBER_OF_SECTIONS, MIN_CURVE_ANGLE, RELEASE_SYMBOL,
};
pub use controller::{Controller, GateDecision, SensorBank};
pub use error::AccumulationError;
pub use handler::{Neighbors, SectionHandler};

/// Result type for accumulation conveyor operations.
pub type Result<T> = std::result::Result<T, AccumulationError>;
