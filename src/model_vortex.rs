//! Height runs along +y; the rings lie on the x/z plane around the origin.

use std::f32::consts::TAU;

use crate::agent::{AgentSet, VortexMode};
use crate::config::{SpeedLimits, VortexConfig};
use crate::math::{self, MathMode, EPSILON};
use crate::model::{ForceModel, TickContext};
use crate::neighbors::NeighborLists;

impl VortexConfig {
    pub fn target_radius(&self, mode: VortexMode) -> f32 {
        match mode {
            VortexMode::Ascend => self.inner_ring,
            VortexMode::Descend => self.outer_ring,
        }
    }

    /// Climb rate for an agent circling at `radius` with the configured
    /// tangential speed.
    pub fn ascent_speed(&self, radius: f32) -> f32 {
        let angular_speed = self.tangential_speed / radius.max(self.inner_ring * 0.5);
        angular_speed / TAU * self.rise_per_turn
    }

    /// Climb rate on the inner ring; vertical velocity snaps to this on re-entry.
    pub fn nominal_ascent_speed(&self) -> f32 {
        self.ascent_speed(self.inner_ring)
    }

    /// Mode an agent at `height` moves to, if it crossed a transition height.
    pub fn transition(&self, mode: VortexMode, height: f32) -> Option<VortexMode> {
        match mode {
            VortexMode::Ascend if height >= self.peel_height => Some(VortexMode::Descend),
            VortexMode::Descend if height <= self.reentry_height => Some(VortexMode::Ascend),
            _ => None,
        }
    }

    fn radial_gain_at(&self, mode: VortexMode, height: f32) -> f32 {
        let boosted = match mode {
            VortexMode::Ascend => height >= self.peel_height - self.boost_band,
            VortexMode::Descend => height <= self.reentry_height + self.boost_band,
        };
        if boosted {
            self.radial_gain * self.boundary_boost
        } else {
            self.radial_gain
        }
    }
}

/// Radial and tangential unit vectors on the x/z plane, plus the radius.
fn ring_frame(position: (f32, f32, f32)) -> ((f32, f32, f32), (f32, f32, f32), f32) {
    let radius = (position.0 * position.0 + position.2 * position.2).sqrt();
    if radius <= EPSILON {
        return ((1.0, 0.0, 0.0), (0.0, 0.0, 1.0), 0.0);
    }
    let radial = (position.0 / radius, 0.0, position.2 / radius);
    let tangent = (-radial.2, 0.0, radial.0);
    (radial, tangent, radius)
}

impl ForceModel for VortexConfig {
    fn neighbor_radius(&self) -> f32 {
        self.separation_distance
    }

    fn speed_limits(&self) -> SpeedLimits {
        SpeedLimits {
            min: self.min_speed,
            max: self.max_speed,
        }
    }

    fn force(
        &self,
        agents: &AgentSet,
        i: usize,
        neighbors: &[usize],
        _ctx: &TickContext,
    ) -> (f32, f32, f32) {
        let position = agents.position(i);
        let velocity = agents.velocity(i);
        let mode = agents.mode(i);
        let (radial, tangent, radius) = ring_frame(position);

        let current_tangential = math::dot3(velocity, tangent);
        let tangential = math::scale3(
            tangent,
            (self.tangential_speed - current_tangential) * self.tangential_gain,
        );

        let radial_force = math::scale3(
            radial,
            (self.target_radius(mode) - radius) * self.radial_gain_at(mode, position.1),
        );

        let desired_vertical = match mode {
            VortexMode::Ascend => self.ascent_speed(radius),
            VortexMode::Descend => -self.descent_speed,
        };
        let vertical = (desired_vertical - velocity.1) * self.vertical_gain;
        let centering = -position.1 * self.centering_gain;

        let mut force = math::add3(tangential, radial_force);
        force.1 += vertical + centering;
        math::add3(force, separation(self, agents, i, neighbors))
    }

    fn after_integrate(
        &self,
        agents: &mut AgentSet,
        _neighbors: &NeighborLists,
        ctx: &TickContext,
    ) {
        let nominal = self.nominal_ascent_speed();
        let limits = self.speed_limits();
        for i in 0..agents.len() {
            let Some(next) = self.transition(agents.mode(i), agents.pos_y[i]) else {
                continue;
            };
            agents.set_mode(i, next);
            if next == VortexMode::Ascend {
                let (_, tangent, _) = ring_frame(agents.position(i));
                let velocity =
                    snap_climb_rate(agents.velocity(i), tangent, nominal, limits, ctx.math_mode);
                agents.set_velocity(i, velocity);
            }
        }
    }
}

/// Pins the vertical component to `climb` and refits the horizontal part so
/// the speed stays within `limits`. A climb rate above `limits.max` cannot be
/// kept, so the whole vector is clamped instead.
fn snap_climb_rate(
    velocity: (f32, f32, f32),
    tangent: (f32, f32, f32),
    climb: f32,
    limits: SpeedLimits,
    mode: MathMode,
) -> (f32, f32, f32) {
    let (vx, _, vz) = velocity;
    let climb_sq = climb * climb;
    if climb_sq > limits.max * limits.max {
        return math::clamp_magnitude_range(mode, (vx, climb, vz), limits.min, limits.max);
    }

    let horizontal_sq = vx * vx + vz * vz;
    let lo = (limits.min * limits.min - climb_sq).max(0.0);
    let hi = limits.max * limits.max - climb_sq;
    let target_sq = horizontal_sq.clamp(lo, hi);
    if target_sq == horizontal_sq {
        return (vx, climb, vz);
    }

    let target = target_sq.sqrt();
    if horizontal_sq <= EPSILON {
        return (tangent.0 * target, climb, tangent.2 * target);
    }
    let scale = target / horizontal_sq.sqrt();
    (vx * scale, climb, vz * scale)
}

fn separation(
    config: &VortexConfig,
    agents: &AgentSet,
    i: usize,
    neighbors: &[usize],
) -> (f32, f32, f32) {
    if config.separation_weight <= 0.0 || config.separation_distance <= EPSILON {
        return (0.0, 0.0, 0.0);
    }
    let position = agents.position(i);
    let mut push = (0.0, 0.0, 0.0);
    for &j in neighbors {
        let away = math::sub3(position, agents.position(j));
        let dist = math::length_3d(away);
        if dist <= EPSILON || dist >= config.separation_distance {
            continue;
        }
        let strength = (1.0 - dist / config.separation_distance) * config.separation_weight;
        push = math::add3(push, math::scale3(away, strength / dist));
    }
    push
}
