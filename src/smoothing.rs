// src/smoothing.rs - Temporal smoothing of garment targets
use crate::geometry::{DisplaySize, TargetRect};

/// Smoothing factors per channel group. Position and size respond at
/// different rates.
pub const POSITION_SMOOTHING: f32 = 0.9;
pub const SIZE_SMOOTHING: f32 = 0.7;

/// Assumed frame interval when real elapsed time is not tracked (~60Hz).
pub const NOMINAL_FRAME_MS: f32 = 16.0;

/// Continuous-time exponential blend coefficient. Robust to variable
/// frame intervals: alpha approaches 1 as dt grows.
fn alpha(factor: f32, dt_ms: f32) -> f32 {
    1.0 - (-factor * dt_ms / NOMINAL_FRAME_MS).exp()
}

fn blend(prev: f32, target: f32, factor: f32, dt_ms: f32) -> f32 {
    prev + alpha(factor, dt_ms) * (target - prev)
}

/// Exponential low-pass filter over the garment target rectangle, one
/// channel each for x, y, width and height. Holds the last emitted
/// rectangle across frames; must be seeded before the first pose arrives.
pub struct RectSmoother {
    state: TargetRect,
}

impl RectSmoother {
    pub fn new(initial: TargetRect) -> Self {
        Self { state: initial }
    }

    /// Seed rectangle before any pose has been seen: screen-centered at
    /// half the given base garment size.
    pub fn seeded(display: DisplaySize, base_size: (f32, f32)) -> Self {
        let (w, h) = (base_size.0 / 2.0, base_size.1 / 2.0);
        Self::new(TargetRect::from_center(
            display.width / 2.0,
            display.height / 2.0,
            w,
            h,
        ))
    }

    pub fn current(&self) -> TargetRect {
        self.state
    }

    /// Blends the new target against the previous output. `dt_ms` is the
    /// elapsed time since the last processed frame; `None` falls back to
    /// the nominal frame interval.
    pub fn apply(&mut self, target: TargetRect, dt_ms: Option<f32>) -> TargetRect {
        let dt = dt_ms.unwrap_or(NOMINAL_FRAME_MS).max(0.0);
        let prev = self.state;

        self.state = TargetRect {
            x: blend(prev.x, target.x, POSITION_SMOOTHING, dt),
            y: blend(prev.y, target.y, POSITION_SMOOTHING, dt),
            width: blend(prev.width, target.width, SIZE_SMOOTHING, dt),
            height: blend(prev.height, target.height, SIZE_SMOOTHING, dt),
        };
        self.state
    }

    pub fn reset(&mut self, rect: TargetRect) {
        self.state = rect;
    }
}
