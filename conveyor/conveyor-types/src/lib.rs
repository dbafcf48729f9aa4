//! Hardware-agnostic conveyor control primitives.
//!
//! This crate provides the small set of types a conveyor controller consumes
//! from the simulation or plant it is wired into:
//!
//! - [`Beam`] - Presence sensor that reports loads and can hold them in place
//! - [`DigitalInput`] / [`DigitalOutput`] - Boolean I/O lines with edge detection
//! - [`SensorId`], [`LoadId`], [`SensorTag`] - Identifiers
//! - [`SurfaceType`], [`Color`] - Appearance passthrough for sections
//! - [`pose`] - Yaw-based helpers on [`nalgebra::Isometry3`]
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. The physics or
//! rendering engine that actually moves loads is an external collaborator:
//! it reports presence changes to a [`Beam`] and reads back which loads the
//! beam is holding.
//!
//! # Coordinate System
//!
//! Right-handed, consistent with the rest of CortenForge:
//!
//! - X: travel direction of a section's local frame
//! - Y: lateral (left of travel)
//! - Z: height (up)
//!
//! # Example
//!
//! ```
//! use conveyor_types::{Beam, LoadId, SensorId, SensorTag};
//!
//! let mut beam = Beam::new(SensorId::new(7), "Sensor 0");
//! beam.assign_tag(SensorTag::new(0)).unwrap();
//!
//! beam.load_entered(LoadId::new(1));
//! assert!(beam.is_active());
//!
//! beam.attach(LoadId::new(1));
//! assert_eq!(beam.unattach_all(), vec![LoadId::new(1)]);
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: Enable serialization for persisted types

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod appearance;
mod beam;
mod error;
mod id;
pub mod pose;
mod signal;

pub use appearance::{Color, SurfaceType};
pub use beam::{Beam, BeamInfo, DEFAULT_BEAM_RADIUS, SURFACE_CLEARANCE};
pub use error::ConveyorError;
pub use id::{LoadId, SensorId, SensorTag};
pub use signal::{DigitalInput, DigitalOutput, Edge, InputInfo};

/// Result type for conveyor primitive operations.
pub type Result<T> = std::result::Result<T, ConveyorError>;
