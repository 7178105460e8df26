//! Kart reaction to contact reports from the collider registry.

use super::{controller::KartMovementController, events::KartSignal};
use crate::{
    collision::{ColliderKind, ContactReport},
    constants::DIR_EPS_SQ,
    transform::TransformTree,
    types::{heading_forward, to_planar},
};

/// Extra separation added to every push-out so a resolved contact does not
/// re-trigger next tick.
const SEPARATION_SKIN: f32 = 0.01;

impl KartMovementController {
    /// Push the kart out of the contact and add a bounce impulse to its
    /// outside force. Detect-only contacts only emit [`KartSignal::Touched`].
    pub fn on_contact(&mut self, report: &ContactReport, tree: &mut TransformTree) {
        if !report.applies_physics {
            self.push_signal(KartSignal::Touched {
                other: report.other,
            });
            return;
        }
        let Some(mut position) = tree.local_translation(self.node()) else {
            log::warn!("kart {:#x} has no transform node, contact dropped", self.entity());
            return;
        };

        // Karts stay on the track; only the horizontal part of the normal moves them.
        let normal = to_planar(report.normal);
        if normal.norm_squared() < DIR_EPS_SQ {
            return;
        }
        let normal = normal.normalize();

        let resistance = self.derived().outside_force_resistance;
        let (wall_bounce, wall_speed_multiplier, kart_bounce) = {
            let t = self.tuning();
            (t.wall_bounce, t.wall_speed_multiplier, t.kart_bounce)
        };
        position += normal * (report.penetration + SEPARATION_SKIN);

        let state = self.state_mut();
        let speed = state.speed;
        match report.other_kind {
            ColliderKind::Wall => {
                let travel = heading_forward(state.heading) * speed.signum();
                let head_on = travel.dot(&-normal).max(0.0);
                state.outside_force += normal * speed.abs() * head_on * wall_bounce * resistance;
                state.speed *= wall_speed_multiplier;
                log::debug!(
                    "kart {:#x} hit wall {:#x} (head-on {head_on:.2}{})",
                    self.entity(),
                    report.other,
                    if report.passed_through { ", passed through" } else { "" }
                );
                self.push_signal(KartSignal::HitWall {
                    other: report.other,
                });
            }
            ColliderKind::Sphere => {
                state.outside_force += normal * speed.abs() * kart_bounce * resistance;
                self.push_signal(KartSignal::HitKart {
                    other: report.other,
                });
            }
        }

        tree.set_local_translation(self.node(), position);
    }
}
