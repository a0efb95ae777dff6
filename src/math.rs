use serde::{Deserialize, Serialize};

pub const EPSILON: f32 = 1.0e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathMode {
    #[default]
    Accurate,
    Fast,
}

pub fn add3(a: (f32, f32, f32), b: (f32, f32, f32)) -> (f32, f32, f32) {
    (a.0 + b.0, a.1 + b.1, a.2 + b.2)
}

pub fn sub3(a: (f32, f32, f32), b: (f32, f32, f32)) -> (f32, f32, f32) {
    (a.0 - b.0, a.1 - b.1, a.2 - b.2)
}

pub fn scale3(v: (f32, f32, f32), s: f32) -> (f32, f32, f32) {
    (v.0 * s, v.1 * s, v.2 * s)
}

pub fn dot3(a: (f32, f32, f32), b: (f32, f32, f32)) -> f32 {
    a.0 * b.0 + a.1 * b.1 + a.2 * b.2
}

pub fn distance_sq_3d(dx: f32, dy: f32, dz: f32) -> f32 {
    dx * dx + dy * dy + dz * dz
}

pub fn length_3d(v: (f32, f32, f32)) -> f32 {
    distance_sq_3d(v.0, v.1, v.2).sqrt()
}

pub fn distance_3d(a: (f32, f32, f32), b: (f32, f32, f32)) -> f32 {
    length_3d(sub3(a, b))
}

pub fn normalize_to_magnitude(
    mode: MathMode,
    x: f32,
    y: f32,
    z: f32,
    magnitude: f32,
) -> (f32, f32, f32) {
    let mag_sq = distance_sq_3d(x, y, z);
    if mag_sq <= EPSILON {
        return (0.0, 0.0, 0.0);
    }

    let inv_mag = inverse_sqrt(mode, mag_sq);
    let scale = magnitude * inv_mag;
    (x * scale, y * scale, z * scale)
}

pub fn normalize_or_default(v: (f32, f32, f32), default: (f32, f32, f32)) -> (f32, f32, f32) {
    let len_sq = distance_sq_3d(v.0, v.1, v.2);
    if len_sq <= EPSILON {
        return default;
    }
    scale3(v, 1.0 / len_sq.sqrt())
}

pub fn limit_magnitude_3d(
    mode: MathMode,
    x: f32,
    y: f32,
    z: f32,
    max_magnitude: f32,
) -> (f32, f32, f32) {
    if max_magnitude <= 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let mag_sq = distance_sq_3d(x, y, z);
    let max_sq = max_magnitude * max_magnitude;
    if mag_sq <= max_sq {
        return (x, y, z);
    }

    let scale = max_magnitude * inverse_sqrt(mode, mag_sq);
    (x * scale, y * scale, z * scale)
}

/// Clamps the magnitude of `v` into `[min, max]`, keeping its direction.
///
/// A near-zero vector cannot be rescaled, so with a positive `min` it is
/// restarted along +x at `min`.
pub fn clamp_magnitude_range(
    mode: MathMode,
    v: (f32, f32, f32),
    min: f32,
    max: f32,
) -> (f32, f32, f32) {
    let mag_sq = distance_sq_3d(v.0, v.1, v.2);
    if mag_sq <= EPSILON {
        return if min > 0.0 { (min, 0.0, 0.0) } else { v };
    }

    let min_sq = min * min;
    let max_sq = max * max;
    if mag_sq < min_sq {
        normalize_to_magnitude(mode, v.0, v.1, v.2, min)
    } else if mag_sq > max_sq {
        normalize_to_magnitude(mode, v.0, v.1, v.2, max)
    } else {
        v
    }
}

/// Reynolds steering: the change that turns `velocity` into `desired`
/// rescaled to `max_speed`.
pub fn steer_towards_3d(
    mode: MathMode,
    desired: (f32, f32, f32),
    velocity: (f32, f32, f32),
    max_speed: f32,
) -> (f32, f32, f32) {
    if distance_sq_3d(desired.0, desired.1, desired.2) <= EPSILON {
        return (0.0, 0.0, 0.0);
    }
    let target = normalize_to_magnitude(mode, desired.0, desired.1, desired.2, max_speed);
    sub3(target, velocity)
}

fn inverse_sqrt(mode: MathMode, value: f32) -> f32 {
    match mode {
        MathMode::Accurate => 1.0 / value.sqrt(),
        MathMode::Fast => fast_inverse_sqrt(value),
    }
}

// One Newton-Raphson refinement keeps this fast while staying stable enough
// for steering vectors where small precision drift is acceptable.
fn fast_inverse_sqrt(value: f32) -> f32 {
    let half = 0.5 * value;
    let mut i = value.to_bits();
    i = 0x5f37_59df_u32.wrapping_sub(i >> 1);
    let mut y = f32::from_bits(i);
    y *= 1.5 - half * y * y;
    y.max(0.0)
}
