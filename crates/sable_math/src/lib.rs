//! Sable Math - geometry kernel for the Sable path tracer.
//!
//! Double precision throughout: vectors are `glam::DVec3`, exposed under the
//! names the renderer uses for points, directions and colors.

// Re-export glam for convenience
pub use glam;
pub use glam::DVec3;

mod interval;
mod ray;
mod vec3;
pub mod sampling;

pub use interval::Interval;
pub use ray::Ray;
pub use vec3::{Vec3Ext, NEAR_ZERO_EPSILON};

/// 3D vector used for directions.
pub type Vec3 = DVec3;

/// 3D point. Same representation as [`Vec3`].
pub type Point3 = DVec3;

/// Linear RGB color.
pub type Color = DVec3;
