// src/pose.rs - Pose data model and detector bridge
use anyhow::Result;
use image::DynamicImage;
use nalgebra::Point2;
use tracing::warn;

/// A named anatomical landmark with 2D position and detection confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub position: Point2<f32>,
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self {
            position: Point2::new(x, y),
            confidence,
        }
    }
}

/// Upper-body landmarks for one detected person. Landmarks the detector
/// did not report are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonPose {
    pub nose: Option<Keypoint>,
    pub left_eye: Option<Keypoint>,
    pub right_eye: Option<Keypoint>,
    pub left_shoulder: Option<Keypoint>,
    pub right_shoulder: Option<Keypoint>,
    pub left_hip: Option<Keypoint>,
    pub right_hip: Option<Keypoint>,
}

/// One sensor tick worth of detections. Immutable once received and
/// discarded after processing.
#[derive(Debug, Clone, Default)]
pub struct PoseFrame {
    pub people: Vec<PersonPose>,
    /// Resolution the keypoint coordinates are expressed in, when the
    /// sensor reports one.
    pub source_size: Option<(f32, f32)>,
}

impl PoseFrame {
    /// Only the first detected person is tracked.
    pub fn primary(&self) -> Option<&PersonPose> {
        self.people.first()
    }
}

/// Handle to the native pose model. Stub version for builds without a
/// bundled model; `new` failing routes the detector into simulation.
struct PoseBackend;

impl PoseBackend {
    fn new() -> Result<Self> {
        anyhow::bail!("no native pose model bundled in this build")
    }

    fn process(&mut self, _frame: &DynamicImage) -> Result<PoseFrame> {
        Ok(PoseFrame::default())
    }
}

/// Black-box wrapper around the pose sensor. Produces one `PoseFrame` per
/// camera frame; falls back to a synthetic swaying person when no native
/// backend is available so the pipeline keeps running end-to-end.
pub struct PoseDetector {
    backend: Option<PoseBackend>,
    sim_time: f32,
}

const SIM_SOURCE_WIDTH: f32 = 640.0;
const SIM_SOURCE_HEIGHT: f32 = 480.0;

impl PoseDetector {
    pub fn new() -> Self {
        let backend = match PoseBackend::new() {
            Ok(backend) => Some(backend),
            Err(e) => {
                warn!("pose backend unavailable ({e}), using simulation mode");
                None
            }
        };

        Self {
            backend,
            sim_time: 0.0,
        }
    }

    pub fn is_simulating(&self) -> bool {
        self.backend.is_none()
    }

    /// Runs detection on one camera frame. `None` frames (camera hiccup)
    /// are only meaningful in simulation mode, where a frame is always
    /// synthesized.
    pub fn process(&mut self, frame: Option<&DynamicImage>) -> Result<PoseFrame> {
        match (&mut self.backend, frame) {
            (Some(backend), Some(frame)) => backend.process(frame),
            (Some(_), None) => Ok(PoseFrame::default()),
            (None, _) => Ok(self.simulate()),
        }
    }

    /// Synthetic person gently swaying in front of the camera.
    fn simulate(&mut self) -> PoseFrame {
        let t = self.sim_time;
        self.sim_time += 0.033;

        let sway = 14.0 * (t * 0.6).sin();
        let bob = 6.0 * (t * 1.1).sin();
        let cx = SIM_SOURCE_WIDTH / 2.0 + sway;

        let person = PersonPose {
            nose: Some(Keypoint::new(cx, 132.0 + bob, 0.97)),
            left_eye: Some(Keypoint::new(cx - 17.0, 122.0 + bob, 0.95)),
            right_eye: Some(Keypoint::new(cx + 17.0, 122.0 + bob, 0.95)),
            left_shoulder: Some(Keypoint::new(cx - 72.0, 208.0 + bob, 0.93)),
            right_shoulder: Some(Keypoint::new(cx + 72.0, 208.0 + bob, 0.94)),
            left_hip: Some(Keypoint::new(cx - 52.0, 360.0 + bob * 0.5, 0.88)),
            right_hip: Some(Keypoint::new(cx + 52.0, 360.0 + bob * 0.5, 0.87)),
        };

        PoseFrame {
            people: vec![person],
            source_size: Some((SIM_SOURCE_WIDTH, SIM_SOURCE_HEIGHT)),
        }
    }
}
