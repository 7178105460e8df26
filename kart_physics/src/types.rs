//! Math aliases shared by every module.
//!
//! Conventions: +Y is up, a heading of 0 faces +Z and increases toward +X.

use nalgebra as na;

pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Mat4 = na::Matrix4<f32>;

/// World-space up axis.
#[inline]
pub fn world_up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

/// Unit forward vector in the horizontal plane for `heading` radians.
#[inline]
pub fn heading_forward(heading: f32) -> Vec3 {
    Vec3::new(heading.sin(), 0.0, heading.cos())
}

/// Drop the vertical component.
#[inline]
pub fn to_planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
