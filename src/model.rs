use crate::agent::AgentSet;
use crate::config::{BoundaryMode, Bounds, ModelConfig, SpeedLimits};
use crate::math::MathMode;
use crate::neighbors::NeighborLists;

/// Cursor position sampled once per tick, in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl PointerSample {
    pub fn planar(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn position(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }
}

/// Per-tick inputs shared by every agent's update.
#[derive(Clone, Copy, Debug)]
pub struct TickContext {
    pub pointer: Option<PointerSample>,
    pub math_mode: MathMode,
}

pub trait ForceModel {
    /// Radius the neighbor index is queried with.
    fn neighbor_radius(&self) -> f32;

    fn speed_limits(&self) -> SpeedLimits;

    /// Box and containment policy applied by the integrator, if any.
    fn containment(&self) -> Option<(Bounds, BoundaryMode)> {
        None
    }

    /// Acceleration for agent `i`, computed from the tick-start state.
    fn force(
        &self,
        agents: &AgentSet,
        i: usize,
        neighbors: &[usize],
        ctx: &TickContext,
    ) -> (f32, f32, f32);

    /// Runs once after positions have moved.
    fn after_integrate(
        &self,
        _agents: &mut AgentSet,
        _neighbors: &NeighborLists,
        _ctx: &TickContext,
    ) {
    }
}

impl ModelConfig {
    pub fn force_model(&self) -> &dyn ForceModel {
        match self {
            Self::Flocking(config) => config,
            Self::Vortex(config) => config,
            Self::Huddle(config) => config,
        }
    }
}
