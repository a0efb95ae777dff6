use tracing::info;

use crate::agent::AgentSet;
use crate::clock::sanitize_dt;
use crate::config::{Bounds, ModelConfig, SimConfig};
use crate::error::ConfigError;
use crate::integrator;
use crate::model::{PointerSample, TickContext};
use crate::model_huddle;
use crate::neighbors::{NeighborIndex, NeighborLists};

pub use crate::agent::initialize_agents;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimTime {
    pub time: f64,
    pub frame: u64,
}

/// Advances `agents` by one frame.
///
/// `dt` is sanitized against `config.integrator.max_dt` first. The pointer
/// sample is read once and shared by every agent.
pub fn tick(
    agents: &mut AgentSet,
    index: &mut NeighborIndex,
    clock: &mut SimTime,
    dt: f32,
    pointer: Option<PointerSample>,
    config: &SimConfig,
) {
    let dt = sanitize_dt(dt, config.integrator.max_dt);
    let model = config.model.force_model();

    index.refresh_if_due(agents, clock.frame);
    let ctx = TickContext {
        pointer,
        math_mode: config.math_mode,
    };

    // Forces read only tick-start state; integration writes afterwards.
    let lists = index.lists();
    for i in 0..agents.len() {
        let accel = model.force(agents, i, lists.neighbors(i), &ctx);
        agents.set_acceleration(i, accel);
    }

    integrator::integrate(
        agents,
        dt,
        model.speed_limits(),
        model.containment(),
        &config.integrator,
        config.math_mode,
    );
    model.after_integrate(agents, lists, &ctx);

    clock.time += f64::from(dt);
    clock.frame += 1;

    debug_assert!(
        agents.first_non_finite().is_none(),
        "non-finite agent state after frame {}",
        clock.frame
    );
}

pub fn export_positions(agents: &AgentSet, out: &mut Vec<f32>) {
    agents.write_positions(out);
}

pub struct Simulation {
    config: SimConfig,
    agents: AgentSet,
    index: NeighborIndex,
    clock: SimTime,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let agents = initialize_agents(&config);
        let radius = config.model.force_model().neighbor_radius();
        let index = NeighborIndex::new(&config.neighbors, radius, agents.len());

        info!(
            model = config.model.name(),
            count = agents.len(),
            dims = agents.dims(),
            seed = config.seed,
            neighbor_radius = index.radius(),
            "simulation initialized"
        );

        Ok(Self {
            config,
            agents,
            index,
            clock: SimTime::default(),
        })
    }

    pub fn tick(&mut self, dt: f32, pointer: Option<PointerSample>) {
        tick(
            &mut self.agents,
            &mut self.index,
            &mut self.clock,
            dt,
            pointer,
            &self.config,
        );
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn agents(&self) -> &AgentSet {
        &self.agents
    }

    /// Direct access for hosts that place agents themselves.
    pub fn agents_mut(&mut self) -> &mut AgentSet {
        &mut self.agents
    }

    pub fn neighbors(&self) -> &NeighborLists {
        self.index.lists()
    }

    pub fn neighbors_visited(&self) -> usize {
        self.index.neighbors_visited_last_refresh()
    }

    pub fn time(&self) -> f64 {
        self.clock.time
    }

    pub fn frame(&self) -> u64 {
        self.clock.frame
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.agents.dims()
    }

    pub fn export_positions(&self, out: &mut Vec<f32>) {
        export_positions(&self.agents, out);
    }

    pub fn export_velocities(&self, out: &mut Vec<f32>) {
        self.agents.write_velocities(out);
    }

    /// Per-agent heat in `[min_heat, max_heat]`; empty for models without heat.
    pub fn export_heat(&self, out: &mut Vec<f32>) {
        out.clear();
        if matches!(self.config.model, ModelConfig::Huddle(_)) {
            out.extend_from_slice(self.agents.heat_values());
        }
    }

    /// Temperature projected from heat; empty for models without heat.
    pub fn export_temperatures(&self, out: &mut Vec<f32>) {
        out.clear();
        if let ModelConfig::Huddle(huddle) = &self.config.model {
            let model = &huddle.heat.temperature;
            out.extend(
                self.agents
                    .heat_values()
                    .iter()
                    .map(|&heat| model_huddle::temperature(model, heat)),
            );
        }
    }

    /// Resizes the flocking box to `[0, width] × [0, height]`, keeping its
    /// depth. Other models have no box and ignore the call.
    pub fn set_bounds(&mut self, width: f32, height: f32) -> Result<(), ConfigError> {
        let ModelConfig::Flocking(flocking) = &self.config.model else {
            return Ok(());
        };
        let mut resized = flocking.clone();
        resized.bounds = Bounds::new(
            [0.0, 0.0, flocking.bounds.min[2]],
            [width, height, flocking.bounds.max[2]],
        );
        let mut config = self.config.clone();
        config.model = ModelConfig::Flocking(resized);
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
