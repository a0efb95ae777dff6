use std::f32::consts::{PI, TAU};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

use crate::config::{FlockingConfig, HuddleConfig, ModelConfig, SimConfig, VortexConfig};
use crate::math;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VortexMode {
    #[default]
    Ascend,
    Descend,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpiralDirection {
    Inward,
    Outward,
}

impl SpiralDirection {
    pub fn from_phase(phase: f32) -> Self {
        if phase < PI {
            Self::Inward
        } else {
            Self::Outward
        }
    }
}

/// Contiguous struct-of-arrays agent store.
///
/// Planar stores keep `z` at zero for every agent. Auxiliary columns
/// (`mode`, `spiral_phase`, `home_angle`, `heat`) are always allocated and
/// simply unused by models that do not read them.
#[derive(Clone, Debug)]
pub struct AgentSet {
    dims: usize,
    pub(crate) pos_x: Vec<f32>,
    pub(crate) pos_y: Vec<f32>,
    pub(crate) pos_z: Vec<f32>,
    pub(crate) vel_x: Vec<f32>,
    pub(crate) vel_y: Vec<f32>,
    pub(crate) vel_z: Vec<f32>,
    pub(crate) accel_x: Vec<f32>,
    pub(crate) accel_y: Vec<f32>,
    pub(crate) accel_z: Vec<f32>,
    pub(crate) mode: Vec<VortexMode>,
    pub(crate) spiral_phase: Vec<f32>,
    pub(crate) home_angle: Vec<f32>,
    pub(crate) heat: Vec<f32>,
    pub(crate) heat_next: Vec<f32>,
}

impl AgentSet {
    /// Zeroed store of `count` agents with `dims` (2 or 3) spatial components.
    pub fn new(count: usize, dims: usize) -> Self {
        Self {
            dims: dims.clamp(2, 3),
            pos_x: vec![0.0; count],
            pos_y: vec![0.0; count],
            pos_z: vec![0.0; count],
            vel_x: vec![0.0; count],
            vel_y: vec![0.0; count],
            vel_z: vec![0.0; count],
            accel_x: vec![0.0; count],
            accel_y: vec![0.0; count],
            accel_z: vec![0.0; count],
            mode: vec![VortexMode::Ascend; count],
            spiral_phase: vec![0.0; count],
            home_angle: vec![0.0; count],
            heat: vec![0.0; count],
            heat_next: Vec::with_capacity(count),
        }
    }

    pub fn len(&self) -> usize {
        self.pos_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos_x.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn is_planar(&self) -> bool {
        self.dims == 2
    }

    pub fn position(&self, i: usize) -> (f32, f32, f32) {
        (self.pos_x[i], self.pos_y[i], self.pos_z[i])
    }

    pub fn velocity(&self, i: usize) -> (f32, f32, f32) {
        (self.vel_x[i], self.vel_y[i], self.vel_z[i])
    }

    pub fn acceleration(&self, i: usize) -> (f32, f32, f32) {
        (self.accel_x[i], self.accel_y[i], self.accel_z[i])
    }

    pub fn set_position(&mut self, i: usize, position: (f32, f32, f32)) {
        self.pos_x[i] = position.0;
        self.pos_y[i] = position.1;
        self.pos_z[i] = if self.is_planar() { 0.0 } else { position.2 };
    }

    pub fn set_velocity(&mut self, i: usize, velocity: (f32, f32, f32)) {
        self.vel_x[i] = velocity.0;
        self.vel_y[i] = velocity.1;
        self.vel_z[i] = if self.is_planar() { 0.0 } else { velocity.2 };
    }

    pub(crate) fn set_acceleration(&mut self, i: usize, accel: (f32, f32, f32)) {
        self.accel_x[i] = accel.0;
        self.accel_y[i] = accel.1;
        self.accel_z[i] = if self.is_planar() { 0.0 } else { accel.2 };
    }

    pub fn speed(&self, i: usize) -> f32 {
        math::length_3d(self.velocity(i))
    }

    pub fn mode(&self, i: usize) -> VortexMode {
        self.mode[i]
    }

    pub fn set_mode(&mut self, i: usize, mode: VortexMode) {
        self.mode[i] = mode;
    }

    pub fn spiral_phase(&self, i: usize) -> f32 {
        self.spiral_phase[i]
    }

    /// Stores `phase` wrapped into `[0, 2π)`.
    pub fn set_spiral_phase(&mut self, i: usize, phase: f32) {
        self.spiral_phase[i] = wrap_phase(phase);
    }

    pub fn spiral_direction(&self, i: usize) -> SpiralDirection {
        SpiralDirection::from_phase(self.spiral_phase[i])
    }

    pub fn home_angle(&self, i: usize) -> f32 {
        self.home_angle[i]
    }

    pub fn heat(&self, i: usize) -> f32 {
        self.heat[i]
    }

    pub fn set_heat(&mut self, i: usize, heat: f32) {
        self.heat[i] = heat;
    }

    pub fn heat_values(&self) -> &[f32] {
        &self.heat
    }

    /// Index of the first agent holding a NaN or infinite value, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        (0..self.len()).find(|&i| {
            let (px, py, pz) = self.position(i);
            let (vx, vy, vz) = self.velocity(i);
            let (ax, ay, az) = self.acceleration(i);
            ![
                px,
                py,
                pz,
                vx,
                vy,
                vz,
                ax,
                ay,
                az,
                self.spiral_phase[i],
                self.heat[i],
            ]
            .iter()
            .all(|v| v.is_finite())
        })
    }

    /// Writes `len × dims` interleaved positions into `out`, replacing its contents.
    pub fn write_positions(&self, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.len() * self.dims);
        for i in 0..self.len() {
            out.push(self.pos_x[i]);
            out.push(self.pos_y[i]);
            if !self.is_planar() {
                out.push(self.pos_z[i]);
            }
        }
    }

    pub fn write_velocities(&self, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.len() * self.dims);
        for i in 0..self.len() {
            out.push(self.vel_x[i]);
            out.push(self.vel_y[i]);
            if !self.is_planar() {
                out.push(self.vel_z[i]);
            }
        }
    }
}

pub(crate) fn wrap_phase(phase: f32) -> f32 {
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Equal seeds give equal populations.
pub fn initialize_agents(config: &SimConfig) -> AgentSet {
    let mut rng = ChaCha12Rng::seed_from_u64(config.seed);
    let mut agents = AgentSet::new(config.count, config.dims());

    match &config.model {
        ModelConfig::Flocking(flock) => seed_flock(&mut agents, flock, &mut rng),
        ModelConfig::Vortex(vortex) => seed_vortex(&mut agents, vortex, &mut rng),
        ModelConfig::Huddle(huddle) => seed_huddle(&mut agents, huddle, &mut rng),
    }

    agents
}

fn seed_flock(agents: &mut AgentSet, config: &FlockingConfig, rng: &mut ChaCha12Rng) {
    let planar = agents.is_planar();
    for i in 0..agents.len() {
        let x = sample(rng, config.bounds.min[0], config.bounds.max[0]);
        let y = sample(rng, config.bounds.min[1], config.bounds.max[1]);
        let z = if planar {
            0.0
        } else {
            sample(rng, config.bounds.min[2], config.bounds.max[2])
        };
        agents.set_position(i, (x, y, z));

        let direction = random_direction(rng, planar);
        let speed = sample(rng, config.min_speed, config.max_speed);
        agents.set_velocity(i, math::scale3(direction, speed));
    }
}

fn seed_vortex(agents: &mut AgentSet, config: &VortexConfig, rng: &mut ChaCha12Rng) {
    for i in 0..agents.len() {
        let mode = if rng.gen_bool(0.5) {
            VortexMode::Ascend
        } else {
            VortexMode::Descend
        };
        let ring = match mode {
            VortexMode::Ascend => config.inner_ring,
            VortexMode::Descend => config.outer_ring,
        };
        let angle = sample(rng, 0.0, TAU);
        let radius = (ring + sample(rng, -1.0, 1.0)).max(config.inner_ring * 0.5);
        let height = sample(rng, config.reentry_height, config.peel_height);
        let (sin, cos) = angle.sin_cos();

        agents.set_position(i, (cos * radius, height, sin * radius));
        // Counter-clockwise tangent around +y.
        let tangent = (-sin, 0.0, cos);
        agents.set_velocity(i, math::scale3(tangent, config.tangential_speed));
        agents.set_mode(i, mode);
    }
}

fn seed_huddle(agents: &mut AgentSet, config: &HuddleConfig, rng: &mut ChaCha12Rng) {
    for i in 0..agents.len() {
        let angle = sample(rng, 0.0, TAU);
        let radius = config.max_radius * sample(rng, 0.0, 1.0).sqrt();
        let (sin, cos) = angle.sin_cos();
        agents.set_position(i, (cos * radius, sin * radius, 0.0));
        agents.set_velocity(i, (0.0, 0.0, 0.0));
        agents.home_angle[i] = angle;
        agents.set_spiral_phase(i, sample(rng, 0.0, TAU));
        agents.set_heat(i, sample(rng, config.heat.min_heat, config.heat.max_heat));
    }
}

fn random_direction(rng: &mut ChaCha12Rng, planar: bool) -> (f32, f32, f32) {
    if planar {
        let angle = sample(rng, 0.0, TAU);
        let (sin, cos) = angle.sin_cos();
        return (cos, sin, 0.0);
    }
    let z = sample(rng, -1.0, 1.0);
    let angle = sample(rng, 0.0, TAU);
    let ring = (1.0 - z * z).max(0.0).sqrt();
    let (sin, cos) = angle.sin_cos();
    (ring * cos, ring * sin, z)
}

fn sample(rng: &mut ChaCha12Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}
