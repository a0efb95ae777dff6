use std::f32::consts::TAU;

use crate::agent::AgentSet;
use crate::config::{BoundaryMode, Bounds, FlockVariant, FlockingConfig, SpeedLimits};
use crate::math::{self, EPSILON};
use crate::model::{ForceModel, TickContext};

// Lower bound on the normalized zone distance so overlapping agents get a
// large but finite separation push.
const ZONE_PERCENT_FLOOR: f32 = 1.0e-3;

impl ForceModel for FlockingConfig {
    fn neighbor_radius(&self) -> f32 {
        match self.variant {
            FlockVariant::Simple => self
                .separation_distance
                .max(self.alignment_distance)
                .max(self.cohesion_distance),
            FlockVariant::Zoned => self.zone_radius(),
        }
    }

    fn speed_limits(&self) -> SpeedLimits {
        SpeedLimits {
            min: self.min_speed,
            max: self.max_speed,
        }
    }

    fn containment(&self) -> Option<(Bounds, BoundaryMode)> {
        Some((self.bounds, self.boundary))
    }

    fn force(
        &self,
        agents: &AgentSet,
        i: usize,
        neighbors: &[usize],
        ctx: &TickContext,
    ) -> (f32, f32, f32) {
        let flocking = match self.variant {
            FlockVariant::Simple => simple_force(self, agents, i, neighbors, ctx),
            FlockVariant::Zoned => zoned_force(self, agents, i, neighbors),
        };
        math::add3(flocking, pointer_repulsion(self, agents, i, ctx))
    }
}

/// Classic Reynolds rules: each rule averages over its own radius, becomes
/// a steering vector clamped to `max_force`, and is then weighted.
pub fn simple_force(
    config: &FlockingConfig,
    agents: &AgentSet,
    i: usize,
    neighbors: &[usize],
    ctx: &TickContext,
) -> (f32, f32, f32) {
    let position = agents.position(i);
    let velocity = agents.velocity(i);
    let separation_sq = config.separation_distance * config.separation_distance;
    let alignment_sq = config.alignment_distance * config.alignment_distance;
    let cohesion_sq = config.cohesion_distance * config.cohesion_distance;

    let mut sep = (0.0, 0.0, 0.0);
    let mut sep_count = 0usize;
    let mut align = (0.0, 0.0, 0.0);
    let mut align_count = 0usize;
    let mut coh = (0.0, 0.0, 0.0);
    let mut coh_count = 0usize;

    for &j in neighbors {
        let delta = math::sub3(agents.position(j), position);
        let dist_sq = math::distance_sq_3d(delta.0, delta.1, delta.2);
        if dist_sq <= EPSILON {
            continue;
        }

        if dist_sq <= separation_sq {
            // Unit direction away from the neighbor, weighted by 1/distance.
            sep = math::sub3(sep, math::scale3(delta, 1.0 / dist_sq));
            sep_count += 1;
        }
        if dist_sq <= alignment_sq {
            align = math::add3(align, agents.velocity(j));
            align_count += 1;
        }
        if dist_sq <= cohesion_sq {
            coh = math::add3(coh, delta);
            coh_count += 1;
        }
    }

    let steer = |sum: (f32, f32, f32), count: usize, weight: f32| {
        if count == 0 || weight <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        let average = math::scale3(sum, 1.0 / count as f32);
        let (sx, sy, sz) =
            math::steer_towards_3d(ctx.math_mode, average, velocity, config.max_speed);
        let limited = math::limit_magnitude_3d(ctx.math_mode, sx, sy, sz, config.max_force);
        math::scale3(limited, weight)
    };

    let mut force = steer(sep, sep_count, config.separation_weight);
    force = math::add3(force, steer(align, align_count, config.alignment_weight));
    math::add3(force, steer(coh, coh_count, config.cohesion_weight))
}

/// Zoned rules: the interaction radius is split into separation, alignment
/// and cohesion bands by normalized distance, and every neighbor adds to
/// exactly one band.
pub fn zoned_force(
    config: &FlockingConfig,
    agents: &AgentSet,
    i: usize,
    neighbors: &[usize],
) -> (f32, f32, f32) {
    let zone_radius = config.zone_radius();
    if zone_radius <= EPSILON {
        return (0.0, 0.0, 0.0);
    }
    let zone_sq = zone_radius * zone_radius;
    let separation_thresh = config.separation_distance / zone_radius;
    let alignment_thresh = (config.separation_distance + config.alignment_distance) / zone_radius;

    let position = agents.position(i);
    let mut force = (0.0, 0.0, 0.0);

    for &j in neighbors {
        let delta = math::sub3(agents.position(j), position);
        let dist_sq = math::distance_sq_3d(delta.0, delta.1, delta.2);
        if dist_sq <= EPSILON || dist_sq >= zone_sq {
            continue;
        }

        let percent = dist_sq / zone_sq;
        let toward = math::normalize_or_default(delta, (0.0, 0.0, 0.0));

        if percent < separation_thresh {
            let strength = (separation_thresh / percent.max(ZONE_PERCENT_FLOOR) - 1.0)
                * config.zone_gain
                * config.separation_weight;
            force = math::sub3(force, math::scale3(toward, strength));
        } else if percent < alignment_thresh {
            let span = (alignment_thresh - separation_thresh).max(EPSILON);
            let t = (percent - separation_thresh) / span;
            let strength = (0.5 - (t * TAU).cos() * 0.5 + 0.5)
                * config.zone_gain
                * config.alignment_weight;
            let heading = math::normalize_or_default(agents.velocity(j), (0.0, 0.0, 0.0));
            force = math::add3(force, math::scale3(heading, strength));
        } else {
            let span = (1.0 - alignment_thresh).max(EPSILON);
            let t = (percent - alignment_thresh) / span;
            let strength = (0.5 - ((t * TAU).cos() * -0.5 + 0.5))
                * config.zone_gain
                * config.cohesion_weight;
            force = math::add3(force, math::scale3(toward, strength));
        }
    }

    force
}

fn pointer_repulsion(
    config: &FlockingConfig,
    agents: &AgentSet,
    i: usize,
    ctx: &TickContext,
) -> (f32, f32, f32) {
    let Some(pointer) = ctx.pointer else {
        return (0.0, 0.0, 0.0);
    };
    if config.pointer_radius <= EPSILON || config.pointer_strength <= 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let mut pointer_position = pointer.position();
    if agents.is_planar() {
        pointer_position.2 = 0.0;
    }
    let away = math::sub3(agents.position(i), pointer_position);
    let dist = math::length_3d(away);
    if dist >= config.pointer_radius {
        return (0.0, 0.0, 0.0);
    }

    let strength = config.pointer_strength * (1.0 - dist / config.pointer_radius);
    math::scale3(math::normalize_or_default(away, (1.0, 0.0, 0.0)), strength)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::MathMode;
    use crate::model::PointerSample;

    fn ctx() -> TickContext {
        TickContext {
            pointer: None,
            math_mode: MathMode::Accurate,
        }
    }

    fn pair(distance: f32) -> AgentSet {
        let mut agents = AgentSet::new(2, 2);
        agents.set_position(0, (400.0, 300.0, 0.0));
        agents.set_position(1, (400.0 + distance, 300.0, 0.0));
        agents
    }

    fn separation_only(variant: FlockVariant) -> FlockingConfig {
        FlockingConfig {
            variant,
            separation_weight: 1.0,
            alignment_weight: 0.0,
            cohesion_weight: 0.0,
            ..FlockingConfig::default()
        }
    }

    #[test]
    fn separation_pushes_close_agents_apart() {
        for variant in [FlockVariant::Simple, FlockVariant::Zoned] {
            let config = separation_only(variant);
            let agents = pair(5.0);
            let left = config.force(&agents, 0, &[1], &ctx());
            let right = config.force(&agents, 1, &[0], &ctx());
            assert!(left.0 < 0.0, "{variant:?}: {left:?}");
            assert!(right.0 > 0.0, "{variant:?}: {right:?}");
        }
    }

    #[test]
    fn simple_rules_respect_max_force() {
        let config = separation_only(FlockVariant::Simple);
        let agents = pair(0.5);
        let force = config.force(&agents, 0, &[1], &ctx());
        assert!(math::length_3d(force) <= config.max_force + 1.0e-4);
    }

    #[test]
    fn zero_neighbors_produce_zero_force() {
        let agents = pair(5.0);
        for variant in [FlockVariant::Simple, FlockVariant::Zoned] {
            let config = FlockingConfig {
                variant,
                ..FlockingConfig::default()
            };
            assert_eq!(config.force(&agents, 0, &[], &ctx()), (0.0, 0.0, 0.0));
        }
    }

    #[test]
    fn alignment_steers_toward_neighbor_heading() {
        let config = FlockingConfig {
            separation_weight: 0.0,
            alignment_weight: 1.0,
            cohesion_weight: 0.0,
            ..FlockingConfig::default()
        };
        let mut agents = pair(30.0);
        agents.set_velocity(0, (50.0, 0.0, 0.0));
        agents.set_velocity(1, (0.0, 50.0, 0.0));
        let force = config.force(&agents, 0, &[1], &ctx());
        assert!(force.1 > 0.0);
    }

    #[test]
    fn cohesion_pulls_toward_neighbors() {
        let config = FlockingConfig {
            separation_weight: 0.0,
            alignment_weight: 0.0,
            cohesion_weight: 1.0,
            ..FlockingConfig::default()
        };
        let agents = pair(40.0);
        let force = config.force(&agents, 0, &[1], &ctx());
        assert!(force.0 > 0.0);
    }

    #[test]
    fn zoned_alignment_band_follows_neighbor_velocity() {
        let config = FlockingConfig {
            variant: FlockVariant::Zoned,
            ..FlockingConfig::default()
        };
        // zone 125: separation below 0.2, alignment below 0.6 of d²/zone².
        let mut agents = pair(80.0);
        agents.set_velocity(1, (0.0, -60.0, 0.0));
        let force = config.force(&agents, 0, &[1], &ctx());
        assert!(force.1 < 0.0);
        assert!(force.0.abs() < 1.0e-4);
    }

    #[test]
    fn coincident_agents_are_skipped_without_faults() {
        let config = FlockingConfig::default();
        let agents = pair(0.0);
        let force = config.force(&agents, 0, &[1], &ctx());
        assert_eq!(force, (0.0, 0.0, 0.0));
    }

    #[test]
    fn pointer_repels_nearby_agents_only() {
        let config = FlockingConfig::default();
        let agents = pair(200.0);
        let mut ctx = ctx();
        ctx.pointer = Some(PointerSample::planar(380.0, 300.0));

        let near = config.force(&agents, 0, &[], &ctx);
        assert!(near.0 > 0.0);
        let far = config.force(&agents, 1, &[], &ctx);
        assert_eq!(far, (0.0, 0.0, 0.0));
    }
}
