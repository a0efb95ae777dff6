use tracing::warn;

/// Floors `dt` at zero, maps non-finite values to zero and caps it at `max_dt`.
pub fn sanitize_dt(dt: f32, max_dt: f32) -> f32 {
    if !dt.is_finite() || dt <= 0.0 {
        return 0.0;
    }
    if dt > max_dt {
        warn!(dt, max_dt, "step clamped");
        return max_dt.max(0.0);
    }
    dt
}

#[derive(Clone, Debug)]
pub struct FrameClock {
    max_dt: f32,
    last_ms: Option<f64>,
    frames: u64,
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self {
            max_dt,
            last_ms: None,
            frames: 0,
        }
    }

    /// Seconds elapsed since the previous call, or zero on the first call.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        self.frames += 1;
        if !now_ms.is_finite() {
            return 0.0;
        }
        let Some(last) = self.last_ms.replace(now_ms) else {
            return 0.0;
        };
        let elapsed = ((now_ms - last) / 1000.0) as f32;
        sanitize_dt(elapsed, self.max_dt)
    }

    /// Forgets the previous timestamp; the next `advance` yields zero.
    pub fn reset(&mut self) {
        self.last_ms = None;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
