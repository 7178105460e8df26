/*!
Collision tolerances.

Distances are in meters. Favor practical world-space tolerances over machine
epsilon so the geometry stays stable for karts moving at racing speeds.
*/

/// Walls narrower than this (half-width, meters) are degenerate and never collide.
pub const MIN_WALL_HALF_WIDTH: f32 = 1.0e-4;

/// Centre distances below this are treated as coincident (meters).
pub const COINCIDENT_EPS: f32 = 1.0e-5;

/// `1 - |cos θ|` below which two directions count as (anti)parallel.
pub const PARALLEL_EPS: f32 = 1.0e-6;

/// Minimum length of a cross product used as a rotation axis.
pub const AXIS_EPS: f32 = 1.0e-4;
