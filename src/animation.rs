// src/animation.rs - Overlay animation driver
use crate::geometry::{TargetRect, MAX_GARMENT_HEIGHT, MAX_GARMENT_WIDTH};
use crate::session::OverlayUpdate;

/// Rect channels tween linearly toward their targets over this window.
pub const RECT_TWEEN_MS: f32 = 30.0;

/// Visibility spring parameters.
pub const VISIBILITY_STIFFNESS: f32 = 120.0;
pub const VISIBILITY_DAMPING: f32 = 25.0;

/// Visibility changes at or below this delta are applied directly
/// instead of starting a spring transition.
pub const SPRING_TRIGGER: f32 = 0.1;

/// Spring integration substep cap, seconds.
const MAX_SPRING_STEP: f32 = 1.0 / 60.0;

/// The continuously-updated on-screen overlay state: position, size and
/// a visibility scale (0 = hidden, 1 = fully shown). Written only by the
/// animation driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub visibility: f32,
}

impl RenderTarget {
    pub fn rect(&self) -> TargetRect {
        TargetRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Linear tween for one scalar channel. Retargeting restarts from the
/// value currently on screen, so a new target mid-flight never jumps.
struct Tween {
    from: f32,
    to: f32,
    elapsed_ms: f32,
}

impl Tween {
    fn settled(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            elapsed_ms: RECT_TWEEN_MS,
        }
    }

    fn value(&self) -> f32 {
        let t = (self.elapsed_ms / RECT_TWEEN_MS).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    fn retarget(&mut self, to: f32) {
        self.from = self.value();
        self.to = to;
        self.elapsed_ms = 0.0;
    }

    fn advance(&mut self, dt_ms: f32) {
        self.elapsed_ms = (self.elapsed_ms + dt_ms).min(RECT_TWEEN_MS);
    }
}

/// Owns the `RenderTarget` and tweens it toward the smoothed targets,
/// independently of pose-frame arrival. Ticked from the repaint loop.
pub struct OverlayAnimator {
    x: Tween,
    y: Tween,
    width: Tween,
    height: Tween,
    visibility: f32,
    visibility_velocity: f32,
    visibility_target: f32,
}

impl OverlayAnimator {
    /// Starts hidden at the given rectangle.
    pub fn new(initial: TargetRect) -> Self {
        Self {
            x: Tween::settled(initial.x),
            y: Tween::settled(initial.y),
            width: Tween::settled(initial.width),
            height: Tween::settled(initial.height),
            visibility: 0.0,
            visibility_velocity: 0.0,
            visibility_target: 0.0,
        }
    }

    pub fn set_rect_target(&mut self, rect: TargetRect) {
        self.x.retarget(rect.x);
        self.y.retarget(rect.y);
        self.width.retarget(rect.width);
        self.height.retarget(rect.height);
    }

    pub fn set_visibility_target(&mut self, target: f32) {
        let target = target.clamp(0.0, 1.0);
        self.visibility_target = target;
        if (target - self.visibility).abs() <= SPRING_TRIGGER {
            // Small correction: land immediately, no transition.
            self.visibility = target;
            self.visibility_velocity = 0.0;
        }
    }

    pub fn apply(&mut self, update: &OverlayUpdate) {
        self.set_rect_target(update.rect);
        self.set_visibility_target(update.visibility);
    }

    /// Advances all transitions by `dt_ms` and returns the new state.
    pub fn tick(&mut self, dt_ms: f32) -> RenderTarget {
        let dt_ms = dt_ms.max(0.0);
        self.x.advance(dt_ms);
        self.y.advance(dt_ms);
        self.width.advance(dt_ms);
        self.height.advance(dt_ms);

        // Semi-implicit Euler, substepped so large repaint gaps stay stable.
        let mut remaining = dt_ms / 1000.0;
        while remaining > 0.0 {
            let step = remaining.min(MAX_SPRING_STEP);
            let accel = VISIBILITY_STIFFNESS * (self.visibility_target - self.visibility)
                - VISIBILITY_DAMPING * self.visibility_velocity;
            self.visibility_velocity += accel * step;
            self.visibility += self.visibility_velocity * step;
            remaining -= step;
        }
        self.visibility = self.visibility.clamp(0.0, 1.0);

        self.current()
    }

    pub fn current(&self) -> RenderTarget {
        RenderTarget {
            x: self.x.value(),
            y: self.y.value(),
            width: self.width.value().clamp(0.0, MAX_GARMENT_WIDTH),
            height: self.height.value().clamp(0.0, MAX_GARMENT_HEIGHT),
            visibility: self.visibility,
        }
    }
}
