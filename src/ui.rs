// src/ui.rs - Theme, logo and overlay painting
use eframe::egui::{self, Color32, Pos2, Rect, Rounding, Stroke, Vec2};
use usvg::TreeParsing;

use crate::animation::RenderTarget;
use crate::geometry::DisplaySize;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color32,
    pub secondary: Color32,
    pub background: Color32,
    pub surface: Color32,
    pub error: Color32,
    pub success: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(186, 104, 200),
            secondary: Color32::from_rgb(77, 182, 172),
            background: Color32::from_rgb(18, 18, 22),
            surface: Color32::from_rgb(30, 30, 35),
            error: Color32::from_rgb(244, 67, 54),
            success: Color32::from_rgb(76, 175, 80),
            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(200, 200, 200),
        }
    }
}

pub struct UiComponents {
    pub logo_texture: Option<egui::TextureHandle>,
    pub theme: Theme,
}

impl UiComponents {
    pub fn new(ctx: &egui::Context) -> Self {
        let mut components = Self {
            logo_texture: None,
            theme: Theme::default(),
        };

        // Wordmark is optional; the header falls back to plain text.
        if let Ok(logo_rgba) = load_svg_as_rgba("assets/fitmirror.svg", 256) {
            let color_image =
                egui::ColorImage::from_rgba_unmultiplied([256, 256], &logo_rgba);
            components.logo_texture =
                Some(ctx.load_texture("logo", color_image, Default::default()));
        }

        components
    }

    /// Paints the garment overlay above the camera feed. `panel` is the
    /// on-screen area the feed occupies; the render target lives in the
    /// session's logical display space and is mapped into it.
    pub fn draw_garment_overlay(
        &self,
        painter: &egui::Painter,
        panel: Rect,
        display: DisplaySize,
        target: &RenderTarget,
        texture: Option<&egui::TextureHandle>,
        label: &str,
    ) {
        if target.visibility <= 0.01 || display.width <= 0.0 || display.height <= 0.0 {
            return;
        }

        let sx = panel.width() / display.width;
        let sy = panel.height() / display.height;
        let rect = Rect::from_min_size(
            panel.min + Vec2::new(target.x * sx, target.y * sy),
            Vec2::new(target.width * sx, target.height * sy),
        );

        match texture {
            Some(texture) => {
                let tint = Color32::WHITE.gamma_multiply(target.visibility);
                painter.image(
                    texture.id(),
                    rect,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    tint,
                );
            }
            None => {
                // Artwork missing: draw a placeholder silhouette so the
                // tracking still reads on screen.
                let fill = self.theme.primary.gamma_multiply(target.visibility * 0.55);
                let stroke_color = self.theme.primary.gamma_multiply(target.visibility);
                painter.rect(
                    rect,
                    Rounding::same(12.0),
                    fill,
                    Stroke::new(2.0, stroke_color),
                );
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    label,
                    egui::FontId::proportional(16.0),
                    self.theme.text_primary.gamma_multiply(target.visibility),
                );
            }
        }
    }

    pub fn draw_confidence_bar(&self, ui: &mut egui::Ui, label: &str, value: f32) {
        ui.horizontal(|ui| {
            ui.label(label);

            let bar_width = 160.0;
            let bar_height = 14.0;
            let (_, rect) = ui.allocate_space(Vec2::new(bar_width, bar_height));
            let painter = ui.painter();

            painter.rect_filled(rect, Rounding::same(4.0), self.theme.surface);
            let filled = Rect::from_min_size(
                rect.min,
                Vec2::new(rect.width() * value.clamp(0.0, 1.0), rect.height()),
            );
            let color = if value >= 0.6 {
                self.theme.success
            } else {
                self.theme.error
            };
            painter.rect_filled(filled, Rounding::same(4.0), color);
        });
    }
}

fn load_svg_as_rgba(path: &str, size: u32) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let svg_data = std::fs::read_to_string(path)?;
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(&svg_data, &opt)?;

    let pixmap_size = tree.size.to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size, size)
        .ok_or("failed to allocate pixmap")?;

    let scale = size as f32 / pixmap_size.width().max(pixmap_size.height()) as f32;
    let transform = resvg::tiny_skia::Transform::from_scale(scale, scale);

    resvg::Tree::from_usvg(&tree).render(transform, &mut pixmap.as_mut());

    Ok(pixmap.data().to_vec())
}
