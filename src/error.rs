use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("min_speed {min} exceeds max_speed {max}")]
    SpeedRange { min: f32, max: f32 },
    #[error("{lower_name} ({lower}) must be below {upper_name} ({upper})")]
    Ordering {
        lower_name: &'static str,
        lower: f32,
        upper_name: &'static str,
        upper: f32,
    },
    #[error("{field} must lie in (0, 1], got {value}")]
    UnitRate { field: &'static str, value: f32 },
    #[error("bounds are empty or inverted on the {axis} axis")]
    Bounds { axis: char },
    #[error("neighbor refresh interval must be at least one frame")]
    ZeroRefreshInterval,
    #[error("nearest-neighbor cap must be at least one")]
    ZeroNeighborCap,
}
