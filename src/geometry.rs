// src/geometry.rs - Keypoint normalization and garment placement
use nalgebra::Point2;

use crate::catalog::{GarmentKind, GarmentProfile};
use crate::pose::{Keypoint, PersonPose};

/// Shoulders below this confidence make the garment not-visible.
pub const MIN_KEYPOINT_CONFIDENCE: f32 = 0.6;

/// On-screen garment size bounds, display units.
pub const MIN_GARMENT_WIDTH: f32 = 100.0;
pub const MAX_GARMENT_WIDTH: f32 = 400.0;
pub const MIN_GARMENT_HEIGHT: f32 = 100.0;
pub const MAX_GARMENT_HEIGHT: f32 = 1600.0;

/// Vertical-center clamp band, fractions of display height.
pub const MIN_CENTER_Y_FRACTION: f32 = 0.2;
pub const MAX_CENTER_Y_FRACTION: f32 = 0.9;

/// Drop multiplier used when the head ratio is non-positive or undefined.
pub const NEUTRAL_DROP_MULTIPLIER: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

impl DisplaySize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned overlay rectangle in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TargetRect {
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Raw garment target produced by the resolver, before smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GarmentPlacement {
    pub rect: TargetRect,
    pub visibility: f32,
}

/// Rescales keypoints from sensor resolution to display resolution,
/// independently per axis. A missing source resolution means the
/// coordinates are already in display space (scale factors 1).
pub fn normalize_person(
    person: &PersonPose,
    source_size: Option<(f32, f32)>,
    display: DisplaySize,
) -> PersonPose {
    let (sx, sy) = match source_size {
        Some((sw, sh)) if sw > 0.0 && sh > 0.0 => (display.width / sw, display.height / sh),
        _ => (1.0, 1.0),
    };

    let scale = |kp: Option<Keypoint>| {
        kp.map(|mut kp| {
            kp.position.x *= sx;
            kp.position.y *= sy;
            kp
        })
    };

    PersonPose {
        nose: scale(person.nose),
        left_eye: scale(person.left_eye),
        right_eye: scale(person.right_eye),
        left_shoulder: scale(person.left_shoulder),
        right_shoulder: scale(person.right_shoulder),
        left_hip: scale(person.left_hip),
        right_hip: scale(person.right_hip),
    }
}

/// Step function mapping the head's vertical screen fraction to a drop
/// multiplier. A larger head ratio means the camera is closer, so the
/// garment needs a larger downward offset from the head.
pub fn head_drop_multiplier(ratio: f32) -> f32 {
    // NaN fails the comparison and lands on the neutral default.
    if !(ratio > 0.0) {
        return NEUTRAL_DROP_MULTIPLIER;
    }
    match ratio {
        r if r >= 0.75 => 2.1,
        r if r >= 0.68 => 1.9,
        r if r >= 0.62 => 1.75,
        r if r >= 0.58 => 1.6,
        r if r >= 0.55 => 1.5,
        r if r >= 0.52 => 1.4,
        r if r >= 0.45 => 1.25,
        r if r >= 0.35 => 1.1,
        r if r >= 0.25 => 1.0,
        _ => 0.9,
    }
}

/// Head position estimate: nose, else eye midpoint, else left shoulder.
pub fn head_anchor(person: &PersonPose) -> Option<Point2<f32>> {
    if let Some(nose) = person.nose {
        return Some(nose.position);
    }
    if let (Some(le), Some(re)) = (person.left_eye, person.right_eye) {
        return Some(Point2::new(
            (le.position.x + re.position.x) / 2.0,
            (le.position.y + re.position.y) / 2.0,
        ));
    }
    person.left_shoulder.map(|kp| kp.position)
}

fn confident(kp: Option<Keypoint>) -> Option<Keypoint> {
    kp.filter(|kp| kp.confidence >= MIN_KEYPOINT_CONFIDENCE)
}

/// Computes the garment target rectangle and visibility for one person,
/// or `None` when the shoulders are not confidently detected. The caller
/// must then animate visibility to zero rather than hold stale geometry.
pub fn resolve(
    person: &PersonPose,
    profile: &GarmentProfile,
    display: DisplaySize,
) -> Option<GarmentPlacement> {
    let left = confident(person.left_shoulder)?;
    let right = confident(person.right_shoulder)?;

    let shoulder_center_y = (left.position.y + right.position.y) / 2.0;
    let span = (right.position.x - left.position.x).abs();
    let width = (span * profile.width_scale).clamp(MIN_GARMENT_WIDTH, MAX_GARMENT_WIDTH);

    // Torso length is only usable when both hips are confident.
    let torso_len = match (confident(person.left_hip), confident(person.right_hip)) {
        (Some(lh), Some(rh)) => {
            let hip_center_y = (lh.position.y + rh.position.y) / 2.0;
            Some((hip_center_y - shoulder_center_y).abs())
        }
        _ => None,
    };

    let height = match profile.kind {
        GarmentKind::FullLength { torso_multiplier } => match torso_len {
            Some(torso) => torso * torso_multiplier,
            None => width * profile.aspect_ratio,
        },
        GarmentKind::Silhouette {
            height_multiplier,
            torso_override,
        } => {
            let base = width * profile.aspect_ratio * height_multiplier;
            match (torso_override, torso_len) {
                // The torso adjustment only ever grows the garment.
                (Some(multiplier), Some(torso)) => base.max(torso * multiplier),
                _ => base,
            }
        }
    };
    let height = height.clamp(MIN_GARMENT_HEIGHT, MAX_GARMENT_HEIGHT);

    let head = head_anchor(person)?;
    let head_ratio = if display.height > 0.0 {
        (head.y / display.height).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let drop = (shoulder_center_y - head.y).abs() * head_drop_multiplier(head_ratio);

    let center_y = (shoulder_center_y - drop + profile.offset_y).clamp(
        MIN_CENTER_Y_FRACTION * display.height,
        MAX_CENTER_Y_FRACTION * display.height,
    );
    // The garment tracks the screen midline horizontally; shoulder-X
    // tracking is intentionally not part of the placement.
    let center_x = display.width / 2.0 + profile.offset_x;

    let visibility = left.confidence.min(right.confidence).clamp(0.8, 1.0);

    Some(GarmentPlacement {
        rect: TargetRect::from_center(center_x, center_y, width, height),
        visibility,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GarmentKind, GarmentProfile};
    use crate::pose::Keypoint;

    fn display() -> DisplaySize {
        DisplaySize::new(1280.0, 720.0)
    }

    fn silhouette_profile() -> GarmentProfile {
        GarmentProfile {
            width_scale: 2.0,
            aspect_ratio: 11.9,
            offset_x: 0.0,
            offset_y: 0.0,
            kind: GarmentKind::Silhouette {
                height_multiplier: 0.1,
                torso_override: None,
            },
        }
    }

    fn full_length_profile(torso_multiplier: f32) -> GarmentProfile {
        GarmentProfile {
            width_scale: 2.0,
            aspect_ratio: 1.6,
            offset_x: 0.0,
            offset_y: 0.0,
            kind: GarmentKind::FullLength { torso_multiplier },
        }
    }

    fn person_with_shoulders(lx: f32, rx: f32, y: f32, conf: f32) -> PersonPose {
        let mut person = PersonPose::default();
        person.left_shoulder = Some(Keypoint::new(lx, y, conf));
        person.right_shoulder = Some(Keypoint::new(rx, y, conf));
        person.nose = Some(Keypoint::new((lx + rx) / 2.0, y - 80.0, 0.95));
        person
    }

    #[test]
    fn test_drop_multiplier_monotone_and_bounded() {
        let mut prev = 0.0_f32;
        let mut r = 0.01_f32;
        while r <= 1.0 {
            let m = head_drop_multiplier(r);
            assert!(m >= 0.9 && m <= 2.1, "multiplier {} out of range at r={}", m, r);
            assert!(m >= prev, "multiplier decreased at r={}", r);
            prev = m;
            r += 0.005;
        }
    }

    #[test]
    fn test_drop_multiplier_neutral_default() {
        assert_eq!(head_drop_multiplier(0.0), 1.4);
        assert_eq!(head_drop_multiplier(-0.3), 1.4);
        assert_eq!(head_drop_multiplier(f32::NAN), 1.4);
    }

    #[test]
    fn test_low_shoulder_confidence_is_not_visible() {
        let mut person = person_with_shoulders(500.0, 780.0, 300.0, 0.9);
        person.left_shoulder = Some(Keypoint::new(500.0, 300.0, 0.5));

        assert!(resolve(&person, &silhouette_profile(), display()).is_none());
    }

    #[test]
    fn test_width_clamped_at_extremes() {
        // Zero span
        let person = person_with_shoulders(640.0, 640.0, 300.0, 0.9);
        let placement = resolve(&person, &silhouette_profile(), display()).unwrap();
        assert_eq!(placement.rect.width, MIN_GARMENT_WIDTH);

        // Absurd span
        let person = person_with_shoulders(-4000.0, 6000.0, 300.0, 0.9);
        let placement = resolve(&person, &silhouette_profile(), display()).unwrap();
        assert_eq!(placement.rect.width, MAX_GARMENT_WIDTH);
    }

    #[test]
    fn test_full_length_height_from_torso() {
        let mut person = person_with_shoulders(540.0, 740.0, 250.0, 0.9);
        person.left_hip = Some(Keypoint::new(560.0, 350.0, 0.85));
        person.right_hip = Some(Keypoint::new(720.0, 350.0, 0.85));

        // Torso span 100, multiplier 11.4 -> height 1140.
        let placement = resolve(&person, &full_length_profile(11.4), display()).unwrap();
        assert!((placement.rect.height - 1140.0).abs() < 1e-3);
    }

    #[test]
    fn test_full_length_falls_back_on_low_hip_confidence() {
        let mut person = person_with_shoulders(540.0, 740.0, 250.0, 0.9);
        person.left_hip = Some(Keypoint::new(560.0, 350.0, 0.4));
        person.right_hip = Some(Keypoint::new(720.0, 350.0, 0.85));

        let profile = full_length_profile(11.4);
        let placement = resolve(&person, &profile, display()).unwrap();
        assert!((placement.rect.height - placement.rect.width * profile.aspect_ratio).abs() < 1e-3);
    }

    #[test]
    fn test_silhouette_torso_override_only_grows() {
        let mut person = person_with_shoulders(540.0, 740.0, 250.0, 0.9);
        person.left_hip = Some(Keypoint::new(560.0, 350.0, 0.85));
        person.right_hip = Some(Keypoint::new(720.0, 350.0, 0.85));

        let mut profile = silhouette_profile();
        let base_height = resolve(&person, &profile, display()).unwrap().rect.height;

        // Tiny override multiplier: torso value would be below base, so
        // the height must stay put.
        profile.kind = GarmentKind::Silhouette {
            height_multiplier: 0.1,
            torso_override: Some(0.01),
        };
        let same = resolve(&person, &profile, display()).unwrap().rect.height;
        assert!((same - base_height).abs() < 1e-3);

        // Large override wins.
        profile.kind = GarmentKind::Silhouette {
            height_multiplier: 0.1,
            torso_override: Some(8.0),
        };
        let grown = resolve(&person, &profile, display()).unwrap().rect.height;
        assert!((grown - 800.0).abs() < 1e-3);
        assert!(grown > base_height);
    }

    #[test]
    fn test_vertical_center_clamped_on_screen() {
        let d = display();

        // Head and shoulders near the top edge: center must not go above 0.2H.
        let mut person = person_with_shoulders(540.0, 740.0, 40.0, 0.9);
        person.nose = Some(Keypoint::new(640.0, 5.0, 0.95));
        let placement = resolve(&person, &silhouette_profile(), d).unwrap();
        let cy = placement.rect.center().y;
        assert!((cy - MIN_CENTER_Y_FRACTION * d.height).abs() < 1e-3);

        // Shoulders near the bottom with a huge positive offset: capped at 0.9H.
        let person = person_with_shoulders(540.0, 740.0, 700.0, 0.9);
        let mut profile = silhouette_profile();
        profile.offset_y = 5000.0;
        let placement = resolve(&person, &profile, d).unwrap();
        let cy = placement.rect.center().y;
        assert!((cy - MAX_CENTER_Y_FRACTION * d.height).abs() < 1e-3);
    }

    #[test]
    fn test_horizontal_center_ignores_shoulder_x() {
        let d = display();
        let left_of_frame = person_with_shoulders(100.0, 300.0, 300.0, 0.9);
        let right_of_frame = person_with_shoulders(900.0, 1100.0, 300.0, 0.9);

        let a = resolve(&left_of_frame, &silhouette_profile(), d).unwrap();
        let b = resolve(&right_of_frame, &silhouette_profile(), d).unwrap();
        assert!((a.rect.center().x - d.width / 2.0).abs() < 1e-3);
        assert!((b.rect.center().x - d.width / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_visibility_floor_and_ceiling() {
        let person = person_with_shoulders(540.0, 740.0, 300.0, 0.65);
        let placement = resolve(&person, &silhouette_profile(), display()).unwrap();
        assert_eq!(placement.visibility, 0.8);

        let person = person_with_shoulders(540.0, 740.0, 300.0, 0.95);
        let placement = resolve(&person, &silhouette_profile(), display()).unwrap();
        assert_eq!(placement.visibility, 0.95);
    }

    #[test]
    fn test_head_anchor_priority() {
        let mut person = PersonPose::default();
        person.left_shoulder = Some(Keypoint::new(500.0, 300.0, 0.9));
        person.right_shoulder = Some(Keypoint::new(700.0, 300.0, 0.9));

        // Only shoulders: left shoulder position.
        assert_eq!(head_anchor(&person).unwrap(), Point2::new(500.0, 300.0));

        // Eyes beat the shoulder fallback.
        person.left_eye = Some(Keypoint::new(580.0, 200.0, 0.9));
        person.right_eye = Some(Keypoint::new(620.0, 210.0, 0.9));
        assert_eq!(head_anchor(&person).unwrap(), Point2::new(600.0, 205.0));

        // Nose beats everything.
        person.nose = Some(Keypoint::new(601.0, 190.0, 0.9));
        assert_eq!(head_anchor(&person).unwrap(), Point2::new(601.0, 190.0));
    }

    #[test]
    fn test_normalize_rescales_per_axis() {
        let mut person = PersonPose::default();
        person.nose = Some(Keypoint::new(320.0, 240.0, 0.9));

        let scaled = normalize_person(&person, Some((640.0, 480.0)), display());
        let nose = scaled.nose.unwrap();
        assert_eq!(nose.position, Point2::new(640.0, 360.0));
        assert_eq!(nose.confidence, 0.9);
    }

    #[test]
    fn test_normalize_without_source_size_is_identity() {
        let mut person = PersonPose::default();
        person.nose = Some(Keypoint::new(320.0, 240.0, 0.9));

        let scaled = normalize_person(&person, None, display());
        assert_eq!(scaled.nose.unwrap().position, Point2::new(320.0, 240.0));
    }
}
