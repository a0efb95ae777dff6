use std::f32::consts::PI;

use crate::agent::AgentSet;
use crate::config::{HeatConfig, HuddleConfig, SpeedLimits, TemperatureModel};
use crate::math::{self, EPSILON};
use crate::model::{ForceModel, PointerSample, TickContext};
use crate::neighbors::NeighborLists;

// Blend of locally generated heat and heat received from neighbors.
const GENERATED_SHARE: f32 = 0.4;
const TRANSFERRED_SHARE: f32 = 0.6;

impl HuddleConfig {
    /// Spiral radius for `phase`: full radius at 0, shrinking to the center
    /// at π, and back to full radius at 2π.
    pub fn spiral_radius(&self, phase: f32) -> f32 {
        if phase < PI {
            self.max_radius * (1.0 - phase / PI)
        } else {
            self.max_radius * ((phase - PI) / PI)
        }
    }

    /// 0 outside the pointer radius, rising linearly to 1 at the pointer.
    pub fn pointer_proximity(
        &self,
        position: (f32, f32, f32),
        pointer: Option<PointerSample>,
    ) -> f32 {
        let Some(pointer) = pointer else {
            return 0.0;
        };
        if self.pointer_radius <= EPSILON {
            return 0.0;
        }
        let dx = position.0 - pointer.x;
        let dy = position.1 - pointer.y;
        let dist = (dx * dx + dy * dy).sqrt();
        (1.0 - dist / self.pointer_radius).max(0.0)
    }

    pub fn target_position(
        &self,
        agents: &AgentSet,
        i: usize,
        pointer: Option<PointerSample>,
    ) -> (f32, f32, f32) {
        let phase = agents.spiral_phase(i);
        let proximity = self.pointer_proximity(agents.position(i), pointer);
        let spread = 1.0 + self.pointer_spread * proximity;
        let radius = self.spiral_radius(phase) * spread;
        let angle = agents.home_angle(i) + phase * 0.5;
        let (sin, cos) = angle.sin_cos();
        (cos * radius, sin * radius, 0.0)
    }

    fn advance_phases(&self, agents: &mut AgentSet, pointer: Option<PointerSample>) {
        for i in 0..agents.len() {
            let proximity = self.pointer_proximity(agents.position(i), pointer);
            let rate = self.spiral_rate * (1.0 - self.pointer_slowdown * proximity);
            let phase = agents.spiral_phase(i) + rate;
            agents.set_spiral_phase(i, phase);
        }
    }
}

impl ForceModel for HuddleConfig {
    fn neighbor_radius(&self) -> f32 {
        self.heat.heat_radius.max(self.ideal_spacing)
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
        ctx: &TickContext,
    ) -> (f32, f32, f32) {
        let position = agents.position(i);
        let velocity = agents.velocity(i);

        let target = self.target_position(agents, i, ctx.pointer);
        let mut force = math::scale3(math::sub3(target, position), self.target_gain);

        if !neighbors.is_empty() {
            let mut centroid = (0.0, 0.0, 0.0);
            for &j in neighbors {
                centroid = math::add3(centroid, agents.position(j));
            }
            centroid = math::scale3(centroid, 1.0 / neighbors.len() as f32);
            force = math::add3(
                force,
                math::scale3(math::sub3(centroid, position), self.cohesion_gain),
            );
        }

        for &j in neighbors {
            let away = math::sub3(position, agents.position(j));
            let dist = math::length_3d(away);
            if dist <= EPSILON || dist >= self.ideal_spacing {
                continue;
            }
            let strength = (self.ideal_spacing - dist) / self.ideal_spacing * self.separation_gain;
            force = math::add3(force, math::scale3(away, strength / dist));
        }

        let from_center = math::length_3d(position);
        if from_center > self.boundary_distance && from_center > EPSILON {
            let inward = math::scale3(position, -1.0 / from_center);
            let overshoot = from_center - self.boundary_distance;
            force = math::add3(force, math::scale3(inward, overshoot * self.boundary_gain));
        }

        // v' = v * damping + increment, expressed as an acceleration.
        math::sub3(force, math::scale3(velocity, 1.0 - self.damping))
    }

    fn after_integrate(
        &self,
        agents: &mut AgentSet,
        neighbors: &NeighborLists,
        ctx: &TickContext,
    ) {
        self.advance_phases(agents, ctx.pointer);
        update_heat(&self.heat, agents, neighbors);
    }
}

/// Heat an agent would settle at given its neighborhood, before smoothing.
fn target_heat(config: &HeatConfig, agents: &AgentSet, i: usize, neighbors: &[usize]) -> f32 {
    let position = agents.position(i);
    let mut proximity_sum = 0.0;
    let mut weighted_heat = 0.0;

    for &j in neighbors {
        let dist = math::distance_3d(position, agents.position(j));
        if dist >= config.heat_radius {
            continue;
        }
        let weight = 1.0 - dist / config.heat_radius;
        proximity_sum += weight;
        weighted_heat += weight * agents.heat(j);
    }

    let generated = config.max_heat * (proximity_sum / config.density_saturation).min(1.0);
    let transferred = if proximity_sum > EPSILON {
        weighted_heat / proximity_sum
    } else {
        0.0
    };
    GENERATED_SHARE * generated + TRANSFERRED_SHARE * transferred
}

/// Smooths every agent's heat toward its target, reading only pre-update
/// heat values.
pub fn update_heat(config: &HeatConfig, agents: &mut AgentSet, neighbors: &NeighborLists) {
    let mut next = std::mem::take(&mut agents.heat_next);
    next.clear();
    next.extend((0..agents.len()).map(|i| {
        let heat = agents.heat(i);
        let target = target_heat(config, agents, i, neighbors.neighbors(i));
        let rate = if target > heat {
            config.gain_rate
        } else {
            config.loss_rate
        };
        (heat + (target - heat) * rate).clamp(config.min_heat, config.max_heat)
    }));

    std::mem::swap(&mut agents.heat, &mut next);
    agents.heat_next = next;
}

/// Display temperature for a heat intensity. Not stored on the agent.
pub fn temperature(model: &TemperatureModel, heat: f32) -> f32 {
    let deficit = 1.0 - heat;
    match *model {
        TemperatureModel::Exponential {
            ambient,
            core,
            lambda,
        } => ambient + (core - ambient) * (-deficit / lambda.max(EPSILON)).exp(),
        TemperatureModel::Quadratic { core, k } => core - k * deficit * deficit,
    }
}
