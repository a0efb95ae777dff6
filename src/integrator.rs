use crate::agent::AgentSet;
use crate::config::{BoundaryMode, Bounds, IntegratorConfig, SpeedLimits};
use crate::math::{self, MathMode};

/// A zero `dt` still updates velocities but leaves positions alone.
pub fn integrate(
    agents: &mut AgentSet,
    dt: f32,
    limits: SpeedLimits,
    containment: Option<(Bounds, BoundaryMode)>,
    config: &IntegratorConfig,
    mode: MathMode,
) {
    let axes = agents.dims();
    for i in 0..agents.len() {
        let mut velocity = math::scale3(agents.velocity(i), config.damping);
        let (ax, ay, az) = agents.acceleration(i);
        let accel = match config.max_acceleration {
            Some(max) => math::limit_magnitude_3d(mode, ax, ay, az, max),
            None => (ax, ay, az),
        };
        velocity = math::add3(velocity, accel);

        let position = agents.position(i);
        if let Some((bounds, BoundaryMode::Soft { margin, turn })) = containment {
            velocity = soft_nudge(position, velocity, &bounds, margin, turn, axes);
        }
        if axes == 2 {
            velocity.2 = 0.0;
        }
        velocity = math::clamp_magnitude_range(mode, velocity, limits.min, limits.max);

        if dt <= 0.0 {
            agents.set_velocity(i, velocity);
            continue;
        }

        let mut p = [position.0, position.1, position.2];
        let mut v = [velocity.0, velocity.1, velocity.2];
        for axis in 0..axes {
            let (next, vel) = match containment {
                Some((bounds, boundary)) => integrate_axis(
                    p[axis],
                    v[axis],
                    dt,
                    bounds.min[axis],
                    bounds.max[axis],
                    boundary,
                ),
                None => (p[axis] + v[axis] * dt, v[axis]),
            };
            p[axis] = next;
            v[axis] = vel;
        }

        agents.set_velocity(i, (v[0], v[1], v[2]));
        agents.set_position(i, (p[0], p[1], p[2]));
    }
}

/// Advances one axis by `vel * dt` and applies the containment policy
/// between `lo` and `hi`.
pub fn integrate_axis(
    pos: f32,
    vel: f32,
    dt: f32,
    lo: f32,
    hi: f32,
    boundary: BoundaryMode,
) -> (f32, f32) {
    let next = pos + vel * dt;
    match boundary {
        BoundaryMode::None | BoundaryMode::Soft { .. } => (next, vel),
        BoundaryMode::Clamp => (next.clamp(lo, hi), vel),
        BoundaryMode::Bounce => {
            if next < lo {
                ((lo + (lo - next)).min(hi), -vel)
            } else if next > hi {
                ((hi - (next - hi)).max(lo), -vel)
            } else {
                (next, vel)
            }
        }
        BoundaryMode::Wrap => {
            let extent = hi - lo;
            if extent <= 0.0 {
                return (lo, vel);
            }
            if (lo..hi).contains(&next) {
                (next, vel)
            } else {
                (lo + (next - lo).rem_euclid(extent), vel)
            }
        }
    }
}

fn soft_nudge(
    position: (f32, f32, f32),
    velocity: (f32, f32, f32),
    bounds: &Bounds,
    margin: f32,
    turn: f32,
    axes: usize,
) -> (f32, f32, f32) {
    let p = [position.0, position.1, position.2];
    let mut v = [velocity.0, velocity.1, velocity.2];
    for axis in 0..axes {
        if p[axis] < bounds.min[axis] + margin {
            v[axis] += turn;
        } else if p[axis] > bounds.max[axis] - margin {
            v[axis] -= turn;
        }
    }
    (v[0], v[1], v[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(min: f32, max: f32) -> SpeedLimits {
        SpeedLimits { min, max }
    }

    fn single(position: (f32, f32, f32), velocity: (f32, f32, f32), dims: usize) -> AgentSet {
        let mut agents = AgentSet::new(1, dims);
        agents.set_position(0, position);
        agents.set_velocity(0, velocity);
        agents
    }

    fn box_bounds() -> Bounds {
        Bounds::new([0.0, 0.0, 0.0], [100.0, 100.0, 100.0])
    }

    #[test]
    fn acceleration_is_added_before_moving() {
        let mut agents = single((10.0, 10.0, 0.0), (1.0, 0.0, 0.0), 2);
        agents.set_acceleration(0, (1.0, 2.0, 0.0));
        integrate(
            &mut agents,
            0.5,
            limits(0.0, 100.0),
            None,
            &IntegratorConfig::default(),
            MathMode::Accurate,
        );
        assert_eq!(agents.velocity(0), (2.0, 2.0, 0.0));
        assert_eq!(agents.position(0), (11.0, 11.0, 0.0));
    }

    #[test]
    fn speed_is_clamped_into_limits() {
        let mut agents = AgentSet::new(2, 3);
        agents.set_velocity(0, (300.0, 0.0, 0.0));
        agents.set_velocity(1, (0.0, 1.0, 0.0));
        integrate(
            &mut agents,
            0.01,
            limits(40.0, 160.0),
            None,
            &IntegratorConfig::default(),
            MathMode::Accurate,
        );
        assert!((agents.speed(0) - 160.0).abs() < 1.0e-3);
        assert!((agents.speed(1) - 40.0).abs() < 1.0e-3);
    }

    #[test]
    fn stopped_agent_restarts_at_min_speed() {
        let mut agents = single((5.0, 5.0, 0.0), (0.0, 0.0, 0.0), 2);
        integrate(
            &mut agents,
            0.0,
            limits(40.0, 160.0),
            None,
            &IntegratorConfig::default(),
            MathMode::Accurate,
        );
        assert_eq!(agents.velocity(0), (40.0, 0.0, 0.0));
    }

    #[test]
    fn zero_dt_keeps_positions() {
        let mut agents = single((99.5, 3.0, 0.0), (50.0, 0.0, 0.0), 2);
        agents.set_acceleration(0, (5.0, 5.0, 0.0));
        integrate(
            &mut agents,
            0.0,
            limits(0.0, 100.0),
            Some((box_bounds(), BoundaryMode::Wrap)),
            &IntegratorConfig::default(),
            MathMode::Accurate,
        );
        assert_eq!(agents.position(0), (99.5, 3.0, 0.0));
        assert_eq!(agents.velocity(0), (55.0, 5.0, 0.0));
    }

    #[test]
    fn max_acceleration_caps_the_velocity_change() {
        let mut agents = single((0.0, 0.0, 0.0), (0.0, 0.0, 0.0), 3);
        agents.set_acceleration(0, (30.0, 40.0, 0.0));
        let config = IntegratorConfig {
            max_acceleration: Some(5.0),
            ..IntegratorConfig::default()
        };
        integrate(&mut agents, 0.0, limits(0.0, 100.0), None, &config, MathMode::Accurate);
        let v = agents.velocity(0);
        assert!((v.0 - 3.0).abs() < 1.0e-4 && (v.1 - 4.0).abs() < 1.0e-4);
    }

    #[test]
    fn damping_scales_velocity() {
        let mut agents = single((0.0, 0.0, 0.0), (10.0, 0.0, 0.0), 2);
        let config = IntegratorConfig {
            damping: 0.5,
            ..IntegratorConfig::default()
        };
        integrate(&mut agents, 0.0, limits(0.0, 100.0), None, &config, MathMode::Accurate);
        assert_eq!(agents.velocity(0), (5.0, 0.0, 0.0));
    }

    #[test]
    fn planar_agents_stay_on_the_plane() {
        let mut agents = single((10.0, 10.0, 0.0), (10.0, 0.0, 0.0), 2);
        agents.set_acceleration(0, (0.0, 0.0, 9.0));
        integrate(
            &mut agents,
            0.1,
            limits(0.0, 100.0),
            Some((box_bounds(), BoundaryMode::Clamp)),
            &IntegratorConfig::default(),
            MathMode::Accurate,
        );
        assert_eq!(agents.position(0).2, 0.0);
        assert_eq!(agents.velocity(0).2, 0.0);
    }

    #[test]
    fn clamp_holds_positions_on_the_box() {
        assert_eq!(integrate_axis(99.0, 50.0, 0.1, 0.0, 100.0, BoundaryMode::Clamp), (100.0, 50.0));
        assert_eq!(integrate_axis(1.0, -50.0, 0.1, 0.0, 100.0, BoundaryMode::Clamp), (0.0, -50.0));
    }

    #[test]
    fn bounce_reflects_position_and_velocity() {
        let (pos, vel) = integrate_axis(99.0, 20.0, 0.1, 0.0, 100.0, BoundaryMode::Bounce);
        assert!((pos - 99.0).abs() < 1.0e-4);
        assert_eq!(vel, -20.0);

        let (pos, vel) = integrate_axis(1.0, -20.0, 0.1, 0.0, 100.0, BoundaryMode::Bounce);
        assert!((pos - 1.0).abs() < 1.0e-4);
        assert_eq!(vel, 20.0);
    }

    #[test]
    fn wrap_is_toroidal() {
        let (pos, vel) = integrate_axis(99.0, 20.0, 0.1, 0.0, 100.0, BoundaryMode::Wrap);
        assert!((pos - 1.0).abs() < 1.0e-4);
        assert_eq!(vel, 20.0);

        let (pos, _) = integrate_axis(1.0, -20.0, 0.1, 0.0, 100.0, BoundaryMode::Wrap);
        assert!((pos - 99.0).abs() < 1.0e-4);
    }

    #[test]
    fn soft_boundary_turns_agents_inward_near_faces() {
        let bounds = box_bounds();
        let nudged = soft_nudge((5.0, 50.0, 0.0), (-10.0, 0.0, 0.0), &bounds, 10.0, 3.0, 2);
        assert_eq!(nudged, (-7.0, 0.0, 0.0));
        let nudged = soft_nudge((50.0, 95.0, 0.0), (0.0, 10.0, 0.0), &bounds, 10.0, 3.0, 2);
        assert_eq!(nudged, (0.0, 7.0, 0.0));
        let untouched = soft_nudge((50.0, 50.0, 0.0), (1.0, 1.0, 0.0), &bounds, 10.0, 3.0, 2);
        assert_eq!(untouched, (1.0, 1.0, 0.0));
    }
}
