// src/video.rs - Live camera capture
use anyhow::{Context, Result};
use image::DynamicImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::info;

/// Webcam wrapper feeding the pose worker. Frames come back as RGB
/// images, horizontally flipped by default so the feed reads as a mirror.
pub struct CameraSource {
    camera: Camera,
    mirrored: bool,
}

impl CameraSource {
    pub fn new(index: u32) -> Result<Self> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .with_context(|| format!("failed to open camera {index}"))?;
        camera
            .open_stream()
            .context("failed to open camera stream")?;

        let resolution = camera.resolution();
        info!(
            "camera {} streaming at {}x{} @ {}fps",
            index,
            resolution.width(),
            resolution.height(),
            camera.frame_rate()
        );

        Ok(Self {
            camera,
            mirrored: true,
        })
    }

    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    pub fn resolution(&self) -> (u32, u32) {
        let res = self.camera.resolution();
        (res.width(), res.height())
    }

    pub fn read_frame(&mut self) -> Result<DynamicImage> {
        if !self.camera.is_stream_open() {
            self.camera
                .open_stream()
                .context("failed to reopen camera stream")?;
        }

        let frame = self.camera.frame().context("failed to capture frame")?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("failed to decode frame")?;

        if self.mirrored {
            Ok(DynamicImage::ImageRgb8(image::imageops::flip_horizontal(
                &decoded,
            )))
        } else {
            Ok(DynamicImage::ImageRgb8(decoded))
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
    }
}
