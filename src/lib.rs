//! Flocking, vortex and huddle swarms behind one frame loop. [`Sim`] wraps
//! [`Simulation`] for a browser renderer.

use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;

pub mod agent;
pub mod clock;
pub mod config;
pub mod error;
pub mod integrator;
pub mod math;
pub mod model;
pub mod model_flocking;
pub mod model_huddle;
pub mod model_vortex;
pub mod neighbor_grid;
pub mod neighbors;
pub mod simulation;

pub use agent::{initialize_agents, AgentSet, SpiralDirection, VortexMode};
pub use clock::FrameClock;
pub use config::{
    BoundaryMode, Bounds, FlockingConfig, HuddleConfig, ModelConfig, NeighborBackend,
    NeighborConfig, NeighborPolicy, SimConfig, VortexConfig,
};
pub use error::ConfigError;
pub use model::{ForceModel, PointerSample};
pub use neighbors::{NeighborIndex, NeighborLists};
pub use simulation::{export_positions, tick, SimTime, Simulation};

#[wasm_bindgen]
pub struct Sim {
    inner: Simulation,
    clock: FrameClock,
    pointer: Option<PointerSample>,
    positions: Vec<f32>,
}

#[wasm_bindgen]
impl Sim {
    /// Default flock of `count` agents in a `width × height` box. A zero seed
    /// draws one from the platform.
    #[wasm_bindgen(constructor)]
    pub fn new(count: usize, seed: u32, width: f32, height: f32) -> Result<Sim, JsError> {
        let mut config = SimConfig::flocking(count);
        config.seed = u64::from(seed);
        if let ModelConfig::Flocking(flocking) = &mut config.model {
            flocking.bounds = Bounds::new(
                [0.0, 0.0, flocking.bounds.min[2]],
                [width, height, flocking.bounds.max[2]],
            );
        }
        Self::build(config)
    }

    /// Builds from a `SimConfig`-shaped object; missing fields take defaults
    /// and `null` or `undefined` yields the default flock.
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(config: JsValue) -> Result<Sim, JsError> {
        let config = if config.is_null() || config.is_undefined() {
            SimConfig::default()
        } else {
            from_value::<SimConfig>(config).map_err(js_error)?
        };
        Self::build(config)
    }

    pub fn step(&mut self, dt: f32) {
        self.inner.tick(dt, self.pointer);
        self.sync_render_buffers();
    }

    /// Advances by the time elapsed since the previous call, given a host
    /// timestamp in milliseconds.
    pub fn frame(&mut self, now_ms: f64) {
        let dt = self.clock.advance(now_ms);
        self.step(dt);
    }

    #[wasm_bindgen(js_name = setPointer)]
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = if x.is_finite() && y.is_finite() {
            Some(PointerSample::planar(x, y))
        } else {
            None
        };
    }

    #[wasm_bindgen(js_name = clearPointer)]
    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    #[wasm_bindgen(js_name = setBounds)]
    pub fn set_bounds(&mut self, width: f32, height: f32) -> Result<(), JsError> {
        self.inner.set_bounds(width, height).map_err(js_error)
    }

    /// Interleaved positions, `count × dims` values.
    pub fn positions(&self) -> Vec<f32> {
        self.positions.clone()
    }

    /// Pointer into linear memory for zero-copy reads; valid until the next
    /// `step` or `frame`.
    #[wasm_bindgen(js_name = positionsPtr)]
    pub fn positions_ptr(&self) -> *const f32 {
        self.positions.as_ptr()
    }

    pub fn heat(&self) -> Vec<f32> {
        let mut out = Vec::new();
        self.inner.export_heat(&mut out);
        out
    }

    pub fn temperatures(&self) -> Vec<f32> {
        let mut out = Vec::new();
        self.inner.export_temperatures(&mut out);
        out
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }

    pub fn dims(&self) -> usize {
        self.inner.dims()
    }

    #[wasm_bindgen(js_name = neighborsVisited)]
    pub fn neighbors_visited(&self) -> usize {
        self.inner.neighbors_visited()
    }
}

impl Sim {
    fn build(mut config: SimConfig) -> Result<Sim, JsError> {
        if config.seed == 0 {
            config.seed = random_seed().map_err(js_error)?;
        }
        let max_dt = config.integrator.max_dt;
        let inner = Simulation::new(config).map_err(js_error)?;
        let mut sim = Sim {
            inner,
            clock: FrameClock::new(max_dt),
            pointer: None,
            positions: Vec::new(),
        };
        sim.sync_render_buffers();
        Ok(sim)
    }

    fn sync_render_buffers(&mut self) {
        self.inner.export_positions(&mut self.positions);
    }

    pub fn simulation(&self) -> &Simulation {
        &self.inner
    }
}

fn random_seed() -> Result<u64, getrandom::Error> {
    let mut bytes = [0u8; 8];
    getrandom::fill(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes).max(1))
}

fn js_error(err: impl std::fmt::Display) -> JsError {
    JsError::new(&err.to_string())
}
