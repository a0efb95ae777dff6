use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::MathMode;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Number of agents; fixed for the lifetime of the simulation.
    pub count: usize,
    /// Seed for the initial population.
    pub seed: u64,
    pub model: ModelConfig,
    pub neighbors: NeighborConfig,
    pub integrator: IntegratorConfig,
    pub math_mode: MathMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::flocking(400)
    }
}

impl SimConfig {
    pub fn flocking(count: usize) -> Self {
        Self {
            count,
            seed: 42,
            model: ModelConfig::Flocking(FlockingConfig::default()),
            neighbors: NeighborConfig::default(),
            integrator: IntegratorConfig::default(),
            math_mode: MathMode::Accurate,
        }
    }

    pub fn vortex(count: usize) -> Self {
        Self {
            model: ModelConfig::Vortex(VortexConfig::default()),
            ..Self::flocking(count)
        }
    }

    pub fn huddle(count: usize) -> Self {
        Self {
            model: ModelConfig::Huddle(HuddleConfig::default()),
            neighbors: NeighborConfig {
                policy: NeighborPolicy::Nearest { k: 20 },
                refresh_interval: 3,
                ..NeighborConfig::default()
            },
            ..Self::flocking(count)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.model {
            ModelConfig::Flocking(config) => config.validate()?,
            ModelConfig::Vortex(config) => config.validate()?,
            ModelConfig::Huddle(config) => config.validate()?,
        }
        self.neighbors.validate()?;
        self.integrator.validate()
    }

    /// Components exported per agent: 2 for planar models, 3 otherwise.
    pub fn dims(&self) -> usize {
        match &self.model {
            ModelConfig::Flocking(config) => config.dimensions.count(),
            ModelConfig::Vortex(_) => 3,
            ModelConfig::Huddle(_) => 2,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelConfig {
    Flocking(FlockingConfig),
    Vortex(VortexConfig),
    Huddle(HuddleConfig),
}

impl ModelConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flocking(_) => "flocking",
            Self::Vortex(_) => "vortex",
            Self::Huddle(_) => "huddle",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Dimensions {
    #[default]
    Two,
    Three,
}

impl Dimensions {
    pub fn count(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedLimits {
    pub min: f32,
    pub max: f32,
}

/// Axis-aligned box. The z extent is ignored by planar models.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> (f32, f32, f32) {
        (
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (axis, name) in ['x', 'y', 'z'].into_iter().enumerate() {
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if !lo.is_finite() || !hi.is_finite() || lo >= hi {
                return Err(ConfigError::Bounds { axis: name });
            }
        }
        Ok(())
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new([0.0, 0.0, 0.0], [800.0, 600.0, 400.0])
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BoundaryMode {
    #[default]
    None,
    /// Hard clamp of position onto the box; velocity is left to the speed limits.
    Clamp,
    /// Reflect position and velocity at the faces.
    Bounce,
    /// Toroidal wrap.
    Wrap,
    /// Velocity nudge of `turn` toward the interior within `margin` of a face.
    Soft { margin: f32, turn: f32 },
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlockVariant {
    /// Per-force radii, each steering force clamped to `max_force` before weighting.
    #[default]
    Simple,
    /// Concentric normalized zones with cosine ramps, accumulated directly.
    Zoned,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlockingConfig {
    pub dimensions: Dimensions,
    pub bounds: Bounds,
    pub boundary: BoundaryMode,
    pub variant: FlockVariant,
    pub separation_distance: f32,
    pub alignment_distance: f32,
    pub cohesion_distance: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub max_force: f32,
    /// Scale of the zoned ramps, in velocity units per tick.
    pub zone_gain: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub pointer_radius: f32,
    pub pointer_strength: f32,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            dimensions: Dimensions::Two,
            bounds: Bounds::default(),
            boundary: BoundaryMode::Soft {
                margin: 50.0,
                turn: 8.0,
            },
            variant: FlockVariant::Simple,
            separation_distance: 25.0,
            alignment_distance: 50.0,
            cohesion_distance: 50.0,
            separation_weight: 1.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            max_force: 6.0,
            zone_gain: 4.0,
            min_speed: 40.0,
            max_speed: 160.0,
            pointer_radius: 80.0,
            pointer_strength: 12.0,
        }
    }
}

impl FlockingConfig {
    pub fn zone_radius(&self) -> f32 {
        self.separation_distance + self.alignment_distance + self.cohesion_distance
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bounds.validate()?;
        if let BoundaryMode::Soft { margin, turn } = self.boundary {
            non_negative("boundary.margin", margin)?;
            non_negative("boundary.turn", turn)?;
        }
        non_negative("separation_distance", self.separation_distance)?;
        non_negative("alignment_distance", self.alignment_distance)?;
        non_negative("cohesion_distance", self.cohesion_distance)?;
        non_negative("separation_weight", self.separation_weight)?;
        non_negative("alignment_weight", self.alignment_weight)?;
        non_negative("cohesion_weight", self.cohesion_weight)?;
        non_negative("max_force", self.max_force)?;
        non_negative("zone_gain", self.zone_gain)?;
        non_negative("pointer_radius", self.pointer_radius)?;
        non_negative("pointer_strength", self.pointer_strength)?;
        if self.variant == FlockVariant::Zoned {
            positive("zone_radius", self.zone_radius())?;
        }
        speed_range(self.min_speed, self.max_speed)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VortexConfig {
    /// Radius of the helical ascent column.
    pub inner_ring: f32,
    /// Radius of the peripheral descent.
    pub outer_ring: f32,
    pub tangential_speed: f32,
    pub tangential_gain: f32,
    pub radial_gain: f32,
    /// Multiplier on `radial_gain` inside the transition bands.
    pub boundary_boost: f32,
    pub boost_band: f32,
    /// Height gained per full turn while ascending.
    pub rise_per_turn: f32,
    pub descent_speed: f32,
    pub vertical_gain: f32,
    pub centering_gain: f32,
    pub peel_height: f32,
    pub reentry_height: f32,
    pub separation_distance: f32,
    pub separation_weight: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for VortexConfig {
    fn default() -> Self {
        Self {
            inner_ring: 6.0,
            outer_ring: 14.0,
            tangential_speed: 8.0,
            tangential_gain: 0.08,
            radial_gain: 0.04,
            boundary_boost: 3.0,
            boost_band: 2.0,
            rise_per_turn: 3.0,
            descent_speed: 2.5,
            vertical_gain: 0.1,
            centering_gain: 0.002,
            peel_height: 10.0,
            reentry_height: -10.0,
            separation_distance: 1.0,
            separation_weight: 0.05,
            min_speed: 0.0,
            max_speed: 20.0,
        }
    }
}

impl VortexConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("inner_ring", self.inner_ring)?;
        ordering("inner_ring", self.inner_ring, "outer_ring", self.outer_ring)?;
        finite("reentry_height", self.reentry_height)?;
        finite("peel_height", self.peel_height)?;
        ordering(
            "reentry_height",
            self.reentry_height,
            "peel_height",
            self.peel_height,
        )?;
        non_negative("tangential_speed", self.tangential_speed)?;
        non_negative("tangential_gain", self.tangential_gain)?;
        non_negative("radial_gain", self.radial_gain)?;
        non_negative("boundary_boost", self.boundary_boost)?;
        non_negative("boost_band", self.boost_band)?;
        non_negative("rise_per_turn", self.rise_per_turn)?;
        non_negative("descent_speed", self.descent_speed)?;
        non_negative("vertical_gain", self.vertical_gain)?;
        non_negative("centering_gain", self.centering_gain)?;
        non_negative("separation_distance", self.separation_distance)?;
        non_negative("separation_weight", self.separation_weight)?;
        speed_range(self.min_speed, self.max_speed)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum TemperatureModel {
    /// `T = ambient + (core - ambient) * exp(-d / lambda)`.
    Exponential { ambient: f32, core: f32, lambda: f32 },
    /// `T = core - k * d^2`.
    Quadratic { core: f32, k: f32 },
}

impl Default for TemperatureModel {
    fn default() -> Self {
        Self::Exponential {
            ambient: -20.0,
            core: 37.0,
            lambda: 0.35,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeatConfig {
    pub heat_radius: f32,
    /// Proximity-weighted neighbor count at which generated heat saturates.
    pub density_saturation: f32,
    pub min_heat: f32,
    pub max_heat: f32,
    pub gain_rate: f32,
    pub loss_rate: f32,
    pub temperature: TemperatureModel,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            heat_radius: 30.0,
            density_saturation: 6.0,
            min_heat: 0.1,
            max_heat: 1.0,
            gain_rate: 0.08,
            loss_rate: 0.02,
            temperature: TemperatureModel::default(),
        }
    }
}

impl HeatConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("heat_radius", self.heat_radius)?;
        positive("density_saturation", self.density_saturation)?;
        finite("min_heat", self.min_heat)?;
        finite("max_heat", self.max_heat)?;
        if self.min_heat > self.max_heat {
            return Err(ConfigError::Ordering {
                lower_name: "min_heat",
                lower: self.min_heat,
                upper_name: "max_heat",
                upper: self.max_heat,
            });
        }
        unit_rate("gain_rate", self.gain_rate)?;
        unit_rate("loss_rate", self.loss_rate)?;
        match self.temperature {
            TemperatureModel::Exponential {
                ambient,
                core,
                lambda,
            } => {
                finite("temperature.ambient", ambient)?;
                finite("temperature.core", core)?;
                positive("temperature.lambda", lambda)
            }
            TemperatureModel::Quadratic { core, k } => {
                finite("temperature.core", core)?;
                non_negative("temperature.k", k)
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HuddleConfig {
    /// Spiral radius at phase 0 and at the end of each cycle.
    pub max_radius: f32,
    /// Phase advance per frame, in radians.
    pub spiral_rate: f32,
    pub target_gain: f32,
    pub cohesion_gain: f32,
    pub separation_gain: f32,
    pub ideal_spacing: f32,
    /// Distance from the center beyond which the boundary force engages.
    pub boundary_distance: f32,
    pub boundary_gain: f32,
    /// Per-frame velocity retention.
    pub damping: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub pointer_radius: f32,
    pub pointer_spread: f32,
    pub pointer_slowdown: f32,
    pub heat: HeatConfig,
}

impl Default for HuddleConfig {
    fn default() -> Self {
        Self {
            max_radius: 120.0,
            spiral_rate: 0.01,
            target_gain: 0.02,
            cohesion_gain: 0.01,
            separation_gain: 0.6,
            ideal_spacing: 14.0,
            boundary_distance: 160.0,
            boundary_gain: 0.05,
            damping: 0.92,
            min_speed: 0.0,
            max_speed: 30.0,
            pointer_radius: 100.0,
            pointer_spread: 0.5,
            pointer_slowdown: 0.6,
            heat: HeatConfig::default(),
        }
    }
}

impl HuddleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("max_radius", self.max_radius)?;
        non_negative("spiral_rate", self.spiral_rate)?;
        non_negative("target_gain", self.target_gain)?;
        non_negative("cohesion_gain", self.cohesion_gain)?;
        non_negative("separation_gain", self.separation_gain)?;
        positive("ideal_spacing", self.ideal_spacing)?;
        non_negative("boundary_distance", self.boundary_distance)?;
        non_negative("boundary_gain", self.boundary_gain)?;
        unit_rate("damping", self.damping)?;
        non_negative("pointer_radius", self.pointer_radius)?;
        non_negative("pointer_spread", self.pointer_spread)?;
        if !(0.0..=1.0).contains(&self.pointer_slowdown) {
            return Err(ConfigError::UnitRate {
                field: "pointer_slowdown",
                value: self.pointer_slowdown,
            });
        }
        speed_range(self.min_speed, self.max_speed)?;
        self.heat.validate()
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum NeighborPolicy {
    /// Every agent within the radius, in agent-index order.
    #[default]
    Radius,
    /// The `k` closest agents within the radius, nearest first.
    Nearest { k: usize },
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NeighborBackend {
    #[default]
    BruteForce,
    Grid,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NeighborConfig {
    pub policy: NeighborPolicy,
    pub backend: NeighborBackend,
    /// Frames between neighbor refreshes; lists are reused in between.
    pub refresh_interval: u32,
    /// Overrides the model's own interaction radius when set.
    pub radius: Option<f32>,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            policy: NeighborPolicy::Radius,
            backend: NeighborBackend::BruteForce,
            refresh_interval: 1,
            radius: None,
        }
    }
}

impl NeighborConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        if let NeighborPolicy::Nearest { k: 0 } = self.policy {
            return Err(ConfigError::ZeroNeighborCap);
        }
        if let Some(radius) = self.radius {
            non_negative("neighbors.radius", radius)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Upper bound on a single step, in seconds.
    pub max_dt: f32,
    /// Optional cap on the per-tick velocity change.
    pub max_acceleration: Option<f32>,
    /// Velocity retention applied before the acceleration.
    pub damping: f32,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            max_dt: 0.06,
            max_acceleration: None,
            damping: 1.0,
        }
    }
}

impl IntegratorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("integrator.max_dt", self.max_dt)?;
        if let Some(max_acceleration) = self.max_acceleration {
            non_negative("integrator.max_acceleration", max_acceleration)?;
        }
        unit_rate("integrator.damping", self.damping)
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(())
}

fn unit_rate(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 || value > 1.0 {
        return Err(ConfigError::UnitRate { field, value });
    }
    Ok(())
}

fn ordering(
    lower_name: &'static str,
    lower: f32,
    upper_name: &'static str,
    upper: f32,
) -> Result<(), ConfigError> {
    finite(upper_name, upper)?;
    if lower >= upper {
        return Err(ConfigError::Ordering {
            lower_name,
            lower,
            upper_name,
            upper,
        });
    }
    Ok(())
}

fn speed_range(min: f32, max: f32) -> Result<(), ConfigError> {
    non_negative("min_speed", min)?;
    non_negative("max_speed", max)?;
    if min > max {
        return Err(ConfigError::SpeedRange { min, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert_eq!(SimConfig::flocking(10).validate(), Ok(()));
        assert_eq!(SimConfig::vortex(10).validate(), Ok(()));
        assert_eq!(SimConfig::huddle(10).validate(), Ok(()));
    }

    #[test]
    fn inverted_speed_range_is_rejected() {
        let mut config = SimConfig::flocking(10);
        if let ModelConfig::Flocking(flock) = &mut config.model {
            flock.min_speed = 50.0;
            flock.max_speed = 10.0;
        }
        assert_eq!(
            config.validate(),
            Err(ConfigError::SpeedRange {
                min: 50.0,
                max: 10.0
            })
        );
    }

    #[test]
    fn vortex_rings_and_heights_must_be_ordered() {
        let mut config = SimConfig::vortex(10);
        if let ModelConfig::Vortex(vortex) = &mut config.model {
            vortex.inner_ring = 20.0;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Ordering {
                lower_name: "inner_ring",
                ..
            })
        ));

        let mut config = SimConfig::vortex(10);
        if let ModelConfig::Vortex(vortex) = &mut config.model {
            vortex.reentry_height = vortex.peel_height;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Ordering {
                lower_name: "reentry_height",
                ..
            })
        ));
    }

    #[test]
    fn heat_limits_and_rates_are_checked() {
        let mut config = SimConfig::huddle(10);
        if let ModelConfig::Huddle(huddle) = &mut config.model {
            huddle.heat.min_heat = 0.9;
            huddle.heat.max_heat = 0.2;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Ordering {
                lower_name: "min_heat",
                ..
            })
        ));

        let mut config = SimConfig::huddle(10);
        if let ModelConfig::Huddle(huddle) = &mut config.model {
            huddle.heat.loss_rate = 0.0;
        }
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnitRate {
                field: "loss_rate",
                value: 0.0
            })
        );
    }

    #[test]
    fn neighbor_and_integrator_settings_are_checked() {
        let mut config = SimConfig::flocking(10);
        config.neighbors.refresh_interval = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroRefreshInterval));

        let mut config = SimConfig::flocking(10);
        config.neighbors.policy = NeighborPolicy::Nearest { k: 0 };
        assert_eq!(config.validate(), Err(ConfigError::ZeroNeighborCap));

        let mut config = SimConfig::flocking(10);
        config.integrator.max_dt = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { .. })
        ));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut config = SimConfig::flocking(10);
        if let ModelConfig::Flocking(flock) = &mut config.model {
            flock.max_force = f32::NAN;
        }
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonFinite { field: "max_force" })
        );

        let mut config = SimConfig::flocking(10);
        if let ModelConfig::Flocking(flock) = &mut config.model {
            flock.bounds.max[1] = flock.bounds.min[1];
        }
        assert_eq!(config.validate(), Err(ConfigError::Bounds { axis: 'y' }));
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let json = r#"{
            "count": 64,
            "model": { "kind": "vortex", "peel_height": 12.0 },
            "neighbors": { "policy": { "policy": "nearest", "k": 8 }, "backend": "grid" }
        }"#;
        let config: SimConfig = serde_json::from_str(json).expect("config parses");

        assert_eq!(config.count, 64);
        assert_eq!(config.seed, 42);
        assert_eq!(config.neighbors.policy, NeighborPolicy::Nearest { k: 8 });
        assert_eq!(config.neighbors.backend, NeighborBackend::Grid);
        assert_eq!(config.neighbors.refresh_interval, 1);
        let ModelConfig::Vortex(vortex) = &config.model else {
            panic!("expected vortex model");
        };
        assert_eq!(vortex.peel_height, 12.0);
        assert_eq!(vortex.outer_ring, VortexConfig::default().outer_ring);
        assert_eq!(config.dims(), 3);
        assert_eq!(config.math_mode, MathMode::Accurate);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn math_mode_is_selected_by_name() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "math_mode": "fast" }"#).expect("config parses");
        assert_eq!(config.math_mode, MathMode::Fast);
        assert!(serde_json::from_str::<SimConfig>(r#"{ "math_mode": 1 }"#).is_err());
    }
}
