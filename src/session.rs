// src/session.rs - Per-camera-session try-on pipeline state
use std::time::Instant;

use tracing::debug;

use crate::catalog::{GarmentProfile, BASE_ASSET_SIZE};
use crate::geometry::{self, DisplaySize, TargetRect};
use crate::pose::PoseFrame;
use crate::scheduler::FrameGate;
use crate::smoothing::RectSmoother;

/// Smoothed target handed to the animation driver after a frame is
/// processed. `visibility` is 0 when the wearer is not confidently
/// detected; the rectangle then holds its last smoothed value so the
/// overlay fades in place instead of snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayUpdate {
    pub rect: TargetRect,
    pub visibility: f32,
}

/// All mutable pipeline state for one camera session: the frame gate and
/// the smoothing state. Constructed when a session starts, dropped with
/// it. The admitted-frame path here is the sole writer of the smoothing
/// state.
pub struct TryOnSession {
    display: DisplaySize,
    gate: FrameGate,
    smoother: RectSmoother,
    last_processed: Option<Instant>,
}

impl TryOnSession {
    pub fn new(display: DisplaySize) -> Self {
        let DisplaySize { width, height } = display;
        debug!(width, height, "starting try-on session");
        Self {
            display,
            gate: FrameGate::new(),
            smoother: RectSmoother::seeded(display, BASE_ASSET_SIZE),
            last_processed: None,
        }
    }

    pub fn display(&self) -> DisplaySize {
        self.display
    }

    /// Feeds one sensor frame through gate -> normalize -> resolve ->
    /// smooth. Returns `None` when the gate drops the frame; dropped
    /// frames leave all state untouched.
    pub fn ingest(
        &mut self,
        frame: &PoseFrame,
        profile: &GarmentProfile,
        now: Instant,
    ) -> Option<OverlayUpdate> {
        if !self.gate.admit(now) {
            return None;
        }

        let dt_ms = self
            .last_processed
            .map(|last| now.duration_since(last).as_secs_f32() * 1000.0);
        self.last_processed = Some(now);

        let placement = frame.primary().and_then(|person| {
            let person = geometry::normalize_person(person, frame.source_size, self.display);
            geometry::resolve(&person, profile, self.display)
        });

        let update = match placement {
            Some(placement) => OverlayUpdate {
                rect: self.smoother.apply(placement.rect, dt_ms),
                visibility: placement.visibility,
            },
            // Missing person or low-confidence shoulders: fade out where
            // the garment last was.
            None => OverlayUpdate {
                rect: self.smoother.current(),
                visibility: 0.0,
            },
        };

        Some(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::pose::{Keypoint, PersonPose};
    use std::time::Duration;

    fn display() -> DisplaySize {
        DisplaySize::new(1280.0, 720.0)
    }

    fn tshirt() -> GarmentProfile {
        catalog::profile("tshirt").unwrap()
    }

    fn visible_frame() -> PoseFrame {
        let mut person = PersonPose::default();
        person.nose = Some(Keypoint::new(640.0, 160.0, 0.95));
        person.left_shoulder = Some(Keypoint::new(560.0, 260.0, 0.9));
        person.right_shoulder = Some(Keypoint::new(720.0, 260.0, 0.9));
        PoseFrame {
            people: vec![person],
            source_size: None,
        }
    }

    #[test]
    fn test_gated_frames_produce_no_update() {
        let mut session = TryOnSession::new(display());
        let frame = visible_frame();
        let base = Instant::now();

        assert!(session.ingest(&frame, &tshirt(), base).is_some());
        // Next frames arrive 1ms apart: inside the stride, inside the gap.
        assert!(session
            .ingest(&frame, &tshirt(), base + Duration::from_millis(1))
            .is_none());
        assert!(session
            .ingest(&frame, &tshirt(), base + Duration::from_millis(2))
            .is_none());
    }

    #[test]
    fn test_empty_frame_fades_out_in_place() {
        let mut session = TryOnSession::new(display());
        let base = Instant::now();

        let shown = session
            .ingest(&visible_frame(), &tshirt(), base)
            .unwrap();
        assert!(shown.visibility >= 0.8);

        let hidden = session
            .ingest(
                &PoseFrame::default(),
                &tshirt(),
                base + Duration::from_millis(60),
            )
            .unwrap();
        assert_eq!(hidden.visibility, 0.0);
        // Geometry holds where the garment last was.
        assert_eq!(hidden.rect, shown.rect);
    }

    #[test]
    fn test_repeated_frames_converge_on_target() {
        let mut session = TryOnSession::new(display());
        let frame = visible_frame();
        let base = Instant::now();

        let mut last = None;
        for i in 0..100 {
            let now = base + Duration::from_millis(i * 60);
            if let Some(update) = session.ingest(&frame, &tshirt(), now) {
                last = Some(update);
            }
        }
        let update = last.unwrap();

        // Converged output must center on the screen midline with the
        // clamped shoulder-derived width.
        assert!((update.rect.center().x - 640.0).abs() < 1.0);
        assert!((update.rect.width - 304.0).abs() < 1.0);
    }

    #[test]
    fn test_sensor_resolution_is_normalized() {
        let mut session = TryOnSession::new(display());

        // Same pose expressed at half resolution.
        let mut frame = visible_frame();
        for person in &mut frame.people {
            for kp in [
                &mut person.nose,
                &mut person.left_shoulder,
                &mut person.right_shoulder,
            ] {
                if let Some(kp) = kp {
                    kp.position.x /= 2.0;
                    kp.position.y /= 2.0;
                }
            }
        }
        frame.source_size = Some((640.0, 360.0));

        let mut full_res = TryOnSession::new(display());
        let base = Instant::now();
        let scaled = session.ingest(&frame, &tshirt(), base).unwrap();
        let reference = full_res
            .ingest(&visible_frame(), &tshirt(), base)
            .unwrap();
        assert_eq!(scaled, reference);
    }
}
