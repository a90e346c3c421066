// src/scheduler.rs - Update gate bounding pose recomputation rate
use std::time::{Duration, Instant};

/// Every Nth sensor frame is admitted regardless of timing.
pub const FRAME_STRIDE: u64 = 20;

/// A frame is also admitted once this much time has passed since the
/// last admission, so a fast sensor cannot starve updates.
pub const MAX_GAP: Duration = Duration::from_millis(50);

/// Decides which incoming pose frames are processed. Frames that are not
/// admitted are dropped outright; there is no queueing or backpressure,
/// the visual animation rate is decoupled downstream.
pub struct FrameGate {
    frames_seen: u64,
    last_admitted: Option<Instant>,
}

impl FrameGate {
    pub fn new() -> Self {
        Self {
            frames_seen: 0,
            last_admitted: None,
        }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Returns true when the frame arriving at `now` should be processed.
    pub fn admit(&mut self, now: Instant) -> bool {
        let on_stride = self.frames_seen % FRAME_STRIDE == 0;
        let overdue = match self.last_admitted {
            Some(last) => now.duration_since(last) >= MAX_GAP,
            None => true,
        };
        self.frames_seen += 1;

        if on_stride || overdue {
            self.last_admitted = Some(now);
            true
        } else {
            false
        }
    }
}

impl Default for FrameGate {
    fn default() -> Self {
        Self::new()
    }
}
