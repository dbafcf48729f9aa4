//! Planar pose helpers.
//!
//! Conveyor sections lie flat, so every pose a section produces is a
//! translation plus a yaw about +Z. These helpers keep that convention in one
//! place while still handing out full [`Isometry3`] values so callers can
//! compose them with arbitrarily oriented parent frames.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

/// Builds a pose from a position and a yaw angle (radians, about +Z).
///
/// # Example
///
/// ```
/// use conveyor_types::pose::{from_xyz_yaw, yaw};
/// use std::f64::consts::FRAC_PI_2;
///
/// let pose = from_xyz_yaw(1.0, 2.0, 0.0, FRAC_PI_2);
/// assert!((yaw(&pose) - FRAC_PI_2).abs() < 1e-12);
/// ```
#[must_use]
pub fn from_xyz_yaw(x: f64, y: f64, z: f64, yaw: f64) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw),
    )
}

/// Yaw angle of a pose in radians, in `(-π, π]`.
#[must_use]
pub fn yaw(pose: &Isometry3<f64>) -> f64 {
    pose.rotation.euler_angles().2
}

/// Re-expresses a global pose in the frame described by `frame`.
#[must_use]
pub fn global_to_local(frame: &Isometry3<f64>, global: &Isometry3<f64>) -> Isometry3<f64> {
    frame.inv_mul(global)
}

/// Checks whether two poses coincide within `tolerance` (meters / radians).
#[must_use]
pub fn coincident(a: &Isometry3<f64>, b: &Isometry3<f64>, tolerance: f64) -> bool {
    let distance = (a.translation.vector - b.translation.vector).norm();
    let angle = a.rotation.angle_to(&b.rotation);
    distance <= tolerance && angle <= tolerance
}
