// src/app.rs - FitMirror application shell
use crate::animation::{OverlayAnimator, RenderTarget};
use crate::catalog::GarmentCatalog;
use crate::geometry::DisplaySize;
use crate::pose::PoseDetector;
use crate::session::{OverlayUpdate, TryOnSession};
use crate::ui::UiComponents;
use crate::video::CameraSource;

use eframe::egui::{self, Color32, Pos2, Rect, Rounding};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Logical display space the pipeline works in. The camera panel maps
/// this space onto whatever screen area it actually occupies.
const LOGICAL_DISPLAY: DisplaySize = DisplaySize {
    width: 1280.0,
    height: 720.0,
};

/// Latest worker output, crossed over to the UI thread. The worker is
/// the only writer of `update`; the UI takes values out and owns the
/// animator from there.
#[derive(Default)]
struct SharedFrameState {
    update: Option<OverlayUpdate>,
    camera_frame: Option<egui::ColorImage>,
    shoulder_confidence: f32,
    simulating: bool,
    mirrored: bool,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub camera_index: u32,
    pub mirrored: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            camera_index: 0,
            mirrored: true,
        }
    }
}

pub struct FitMirrorApp {
    catalog: Arc<GarmentCatalog>,
    animator: OverlayAnimator,
    shared: Arc<Mutex<SharedFrameState>>,

    // UI state
    ui_components: UiComponents,
    settings: AppSettings,
    show_settings: bool,
    show_about: bool,

    // Textures
    camera_texture: Option<egui::TextureHandle>,
    garment_textures: Vec<Option<egui::TextureHandle>>,
    textures_loaded: bool,

    // Status mirrored out of the worker
    shoulder_confidence: f32,
    simulating: bool,

    last_tick: Instant,
}

impl FitMirrorApp {
    pub fn new(cc: &eframe::CreationContext<'_>, catalog: Arc<GarmentCatalog>) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let settings = AppSettings::default();
        let shared = Arc::new(Mutex::new(SharedFrameState {
            mirrored: settings.mirrored,
            ..Default::default()
        }));

        spawn_pose_worker(
            Arc::clone(&catalog),
            Arc::clone(&shared),
            settings.camera_index,
        );

        let seed = crate::smoothing::RectSmoother::seeded(
            LOGICAL_DISPLAY,
            crate::catalog::BASE_ASSET_SIZE,
        )
        .current();

        Self {
            catalog,
            animator: OverlayAnimator::new(seed),
            shared,
            ui_components: UiComponents::new(&cc.egui_ctx),
            settings,
            show_settings: false,
            show_about: false,
            camera_texture: None,
            garment_textures: Vec::new(),
            textures_loaded: false,
            shoulder_confidence: 0.0,
            simulating: false,
            last_tick: Instant::now(),
        }
    }

    fn load_garment_textures(&mut self, ctx: &egui::Context) {
        self.garment_textures = self
            .catalog
            .entries()
            .iter()
            .map(|entry| match image::open(&entry.image) {
                Ok(img) => {
                    let rgba = img.to_rgba8();
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    let color_image =
                        egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                    Some(ctx.load_texture(entry.name.clone(), color_image, Default::default()))
                }
                Err(e) => {
                    warn!("no artwork for `{}` ({e}), using placeholder", entry.name);
                    None
                }
            })
            .collect();
        self.textures_loaded = true;
    }

    fn drain_worker_state(&mut self, ctx: &egui::Context) {
        let mut shared = self.shared.lock().unwrap();

        if let Some(update) = shared.update.take() {
            self.animator.apply(&update);
        }
        if let Some(frame) = shared.camera_frame.take() {
            match &mut self.camera_texture {
                Some(texture) => texture.set(frame, Default::default()),
                None => {
                    self.camera_texture =
                        Some(ctx.load_texture("camera", frame, Default::default()))
                }
            }
        }
        self.shoulder_confidence = shared.shoulder_confidence;
        self.simulating = shared.simulating;
        shared.mirrored = self.settings.mirrored;
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            egui::menu::bar(ui, |ui| {
                ui.horizontal(|ui| {
                    if let Some(logo) = self.ui_components.logo_texture.as_ref() {
                        ui.image((logo.id(), egui::vec2(32.0, 32.0)));
                    }
                    ui.heading("FitMirror");
                    if self.simulating {
                        ui.colored_label(
                            self.ui_components.theme.secondary,
                            "simulation mode",
                        );
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.show_settings = !self.show_settings;
                    }
                    if ui.button("ℹ About").clicked() {
                        self.show_about = !self.show_about;
                    }
                });
            });
            ui.add_space(8.0);
        });
    }

    fn render_control_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                let next_btn = ui.add_sized(
                    [150.0, 40.0],
                    egui::Button::new("👕 Next Garment")
                        .fill(self.ui_components.theme.primary),
                );
                if next_btn.clicked() {
                    let index = self.catalog.advance();
                    info!(
                        "switched to garment {} ({})",
                        index,
                        self.catalog.active().name
                    );
                }

                ui.separator();

                let (index, total) = self.catalog.position();
                ui.label(format!(
                    "{}  ({}/{})",
                    self.catalog.active().name,
                    index + 1,
                    total
                ));

                ui.separator();
                ui.checkbox(&mut self.settings.mirrored, "Mirror");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.ui_components.draw_confidence_bar(
                        ui,
                        "Shoulders:",
                        self.shoulder_confidence,
                    );
                });
            });
            ui.add_space(10.0);
        });
    }

    fn render_mirror_panel(&mut self, ctx: &egui::Context, target: &RenderTarget) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let aspect = LOGICAL_DISPLAY.width / LOGICAL_DISPLAY.height;
            let mut size = avail;
            if size.x / size.y > aspect {
                size.x = size.y * aspect;
            } else {
                size.y = size.x / aspect;
            }
            let panel = Rect::from_center_size(ui.max_rect().center(), size);
            let painter = ui.painter_at(ui.max_rect());

            painter.rect_filled(panel, Rounding::same(8.0), self.ui_components.theme.background);

            match &self.camera_texture {
                Some(texture) => {
                    painter.image(
                        texture.id(),
                        panel,
                        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
                None => {
                    painter.text(
                        panel.center(),
                        egui::Align2::CENTER_CENTER,
                        "No camera feed",
                        egui::FontId::proportional(18.0),
                        self.ui_components.theme.text_secondary,
                    );
                }
            }

            let (index, _) = self.catalog.position();
            let texture = self
                .garment_textures
                .get(index)
                .and_then(|t| t.as_ref());
            self.ui_components.draw_garment_overlay(
                &painter,
                panel,
                LOGICAL_DISPLAY,
                target,
                texture,
                &self.catalog.active().name,
            );
        });
    }

    fn render_settings_window(&mut self, ctx: &egui::Context) {
        egui::Window::new("Settings")
            .open(&mut self.show_settings)
            .resizable(false)
            .default_size([320.0, 200.0])
            .show(ctx, |ui| {
                ui.heading("Camera");
                ui.label(format!("Device index: {}", self.settings.camera_index));
                ui.checkbox(&mut self.settings.mirrored, "Mirror the feed");

                ui.separator();

                ui.heading("Tracking");
                ui.label(if self.simulating {
                    "Pose source: simulated"
                } else {
                    "Pose source: camera"
                });
                ui.label(format!(
                    "Shoulder confidence: {:.0}%",
                    self.shoulder_confidence * 100.0
                ));
            });
    }

    fn render_about_window(&mut self, ctx: &egui::Context) {
        egui::Window::new("About")
            .open(&mut self.show_about)
            .resizable(false)
            .default_size([360.0, 220.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("FitMirror");
                    ui.label("Version 1.0.0");
                    ui.add_space(16.0);
                    ui.label("A virtual mirror that overlays garments");
                    ui.label("tracked to your pose in real time.");
                });
            });
    }
}

impl eframe::App for FitMirrorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt_ms = now.duration_since(self.last_tick).as_secs_f32() * 1000.0;
        self.last_tick = now;

        if !self.textures_loaded {
            self.load_garment_textures(ctx);
        }

        self.drain_worker_state(ctx);

        // The overlay keeps animating between processed pose frames.
        let target = self.animator.tick(dt_ms);

        self.render_header(ctx);
        self.render_control_panel(ctx);

        if self.show_settings {
            self.render_settings_window(ctx);
        }
        if self.show_about {
            self.render_about_window(ctx);
        }

        self.render_mirror_panel(ctx, &target);

        // Continuous repaint keeps the tween/spring loop running.
        ctx.request_repaint();
    }
}

/// Camera + detector + session live on their own thread; one admitted
/// frame runs the whole pipeline synchronously, dropped frames never
/// start. Output crosses to the UI through `SharedFrameState`.
fn spawn_pose_worker(
    catalog: Arc<GarmentCatalog>,
    shared: Arc<Mutex<SharedFrameState>>,
    camera_index: u32,
) {
    std::thread::Builder::new()
        .name("pose-worker".into())
        .spawn(move || {
            let mut camera = match CameraSource::new(camera_index) {
                Ok(camera) => Some(camera),
                Err(e) => {
                    warn!("camera unavailable ({e:#}), overlay will track simulated poses");
                    None
                }
            };
            let mut detector = PoseDetector::new();
            let mut session = TryOnSession::new(LOGICAL_DISPLAY);

            loop {
                let mirrored = shared.lock().unwrap().mirrored;
                if let Some(camera) = camera.as_mut() {
                    camera.set_mirrored(mirrored);
                }

                let frame_img = camera.as_mut().and_then(|c| match c.read_frame() {
                    Ok(frame) => Some(frame),
                    Err(e) => {
                        warn!("camera frame failed: {e:#}");
                        None
                    }
                });

                let pose = match detector.process(frame_img.as_ref()) {
                    Ok(pose) => pose,
                    Err(e) => {
                        warn!("pose detection failed: {e:#}");
                        std::thread::sleep(Duration::from_millis(33));
                        continue;
                    }
                };

                let confidence = pose
                    .primary()
                    .and_then(|p| {
                        Some(
                            p.left_shoulder?
                                .confidence
                                .min(p.right_shoulder?.confidence),
                        )
                    })
                    .unwrap_or(0.0);

                let profile = catalog.active().profile;
                let update = session.ingest(&pose, &profile, Instant::now());

                {
                    let mut shared = shared.lock().unwrap();
                    if let Some(update) = update {
                        shared.update = Some(update);
                        shared.shoulder_confidence = confidence;
                    }
                    if let Some(frame_img) = frame_img {
                        let rgb = frame_img.to_rgb8();
                        let size = [rgb.width() as usize, rgb.height() as usize];
                        shared.camera_frame =
                            Some(egui::ColorImage::from_rgb(size, rgb.as_raw()));
                    }
                    shared.simulating = detector.is_simulating();
                }

                // Sensor cadence; the gate inside the session bounds how
                // many of these actually recompute geometry.
                std::thread::sleep(Duration::from_millis(33));
            }
        })
        .expect("failed to spawn pose worker");
}
