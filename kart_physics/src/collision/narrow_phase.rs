use nalgebra as na;
use std::f32::consts::PI;

use super::{
    settings::{AXIS_EPS, COINCIDENT_EPS, MIN_WALL_HALF_WIDTH, PARALLEL_EPS},
    types::{Contact, SphereSnapshot, WallSnapshot},
};
use crate::types::{Quat, Vec3, to_planar, world_up};

/// Shortest-arc rotation taking direction `from` onto direction `to`.
///
/// Antiparallel inputs have no unique axis; the half turn is taken about
/// `from × up`, or `from × X` when `from` is vertical. Zero-length inputs
/// give the identity.
pub fn rotation_between(from: &Vec3, to: &Vec3) -> Quat {
    let (Some(f), Some(t)) = (
        na::Unit::try_new(*from, AXIS_EPS),
        na::Unit::try_new(*to, AXIS_EPS),
    ) else {
        return Quat::identity();
    };

    let cos = f.dot(&t);
    if cos >= 1.0 - PARALLEL_EPS {
        return Quat::identity();
    }
    if cos <= -1.0 + PARALLEL_EPS {
        return half_turn_about_perpendicular(&f);
    }

    Quat::rotation_between_axis(&f, &t).unwrap_or_else(|| half_turn_about_perpendicular(&f))
}

fn half_turn_about_perpendicular(dir: &Vec3) -> Quat {
    let axis = na::Unit::try_new(dir.cross(&world_up()), AXIS_EPS)
        .or_else(|| na::Unit::try_new(dir.cross(&Vec3::x()), AXIS_EPS))
        .unwrap_or_else(Vec3::z_axis);
    Quat::from_axis_angle(&axis, PI)
}

/// Radius of the horizontal slice of a sphere at `height_diff` from a wall's
/// centre line, or `None` if the sphere is entirely above/below the wall.
///
/// Inside the wall's vertical extent the full radius is used; in the band
/// `(half_height, half_height + radius]` the chord radius `sqrt(h(2R - h))`
/// with `h = (half_height + R) - height_diff`.
pub fn effective_radius(radius: f32, half_height: f32, height_diff: f32) -> Option<f32> {
    let height_diff = height_diff.abs();
    if height_diff > half_height + radius {
        return None;
    }
    if height_diff <= half_height {
        return Some(radius);
    }
    let h = (half_height + radius) - height_diff;
    Some((h * (2.0 * radius - h)).max(0.0).sqrt())
}

/// Sphere vs sphere. The returned normal points from `b` toward `a`.
pub fn sphere_sphere(a: &SphereSnapshot, b: &SphereSnapshot) -> Option<Contact> {
    let delta = a.center - b.center;
    let dist = delta.norm();
    let reach = a.radius + b.radius;
    if dist > reach {
        return None;
    }

    let normal = if dist > COINCIDENT_EPS {
        delta / dist
    } else {
        Vec3::x()
    };
    let penetration = reach - dist;

    Some(Contact {
        point: b.center + normal * (b.radius - penetration * 0.5),
        normal,
        penetration,
        passed_through: false,
    })
}

/// Sphere vs wall. The returned normal points from the wall toward the sphere.
///
/// The vertical axis is reduced first (see [`effective_radius`]), then the
/// test runs in 2D in a frame where the wall's edge starts at the origin and
/// runs along +Z.
pub fn sphere_wall(sphere: &SphereSnapshot, wall: &WallSnapshot) -> Option<Contact> {
    if wall.half_width <= MIN_WALL_HALF_WIDTH {
        return None;
    }
    let normal = na::Unit::try_new(to_planar(wall.normal), AXIS_EPS)?.into_inner();

    let edge_dir = world_up().cross(&normal);
    let start = wall.center - edge_dir * wall.half_width;
    let length = 2.0 * wall.half_width;

    if let Some(contact) = pass_through(sphere, wall, &normal, &edge_dir) {
        return Some(contact);
    }

    let r_eff = effective_radius(sphere.radius, wall.half_height, sphere.center.y - wall.center.y)?;

    let frame = rotation_between(&edge_dir, &Vec3::z());
    let local = frame * to_planar(sphere.center - start);
    let along = local.z.clamp(0.0, length);
    let offset = Vec3::new(local.x, 0.0, local.z - along);
    let dist = offset.norm();
    if dist > r_eff {
        return None;
    }

    let world_normal = if dist > COINCIDENT_EPS {
        frame.inverse() * (offset / dist)
    } else {
        // Centre sits on the wall line; push back toward the side it came from.
        let side = (sphere.previous - wall.center).dot(&normal);
        if side < 0.0 { -normal } else { normal }
    };

    let mut point = start + edge_dir * along;
    point.y = sphere.center.y.clamp(
        wall.center.y - wall.half_height,
        wall.center.y + wall.half_height,
    );

    Some(Contact {
        point,
        normal: world_normal,
        penetration: r_eff - dist,
        passed_through: false,
    })
}

/// Detect a sphere whose centre crossed the wall plane between the previous
/// and current tick, inside the wall rectangle.
fn pass_through(
    sphere: &SphereSnapshot,
    wall: &WallSnapshot,
    normal: &Vec3,
    edge_dir: &Vec3,
) -> Option<Contact> {
    let before = (sphere.previous - wall.center).dot(normal);
    let after = (sphere.center - wall.center).dot(normal);
    if before == 0.0 || before.signum() == after.signum() || after == 0.0 {
        return None;
    }

    let t = before / (before - after);
    let crossing = sphere.previous + (sphere.center - sphere.previous) * t;
    let along = (crossing - wall.center).dot(edge_dir);
    if along.abs() > wall.half_width {
        return None;
    }
    let r_eff = effective_radius(sphere.radius, wall.half_height, crossing.y - wall.center.y)?;

    let back = if before > 0.0 { *normal } else { -*normal };
    let mut point = wall.center + edge_dir * along;
    point.y = crossing.y;

    Some(Contact {
        point,
        normal: back,
        penetration: after.abs() + r_eff,
        passed_through: true,
    })
}
