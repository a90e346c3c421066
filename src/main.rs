// src/main.rs
mod animation;
mod app;
mod catalog;
mod geometry;
mod pose;
mod scheduler;
mod session;
mod smoothing;
mod ui;
mod video;

use std::sync::Arc;

use catalog::GarmentCatalog;
use eframe::egui;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    if let Ok(p) = std::env::current_exe() {
        eprintln!("Running from: {}", p.display());
    }

    // DEBUG: List all available cameras
    println!("=== Camera Detection Debug ===");
    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(cameras) => {
            println!("Found {} camera(s):", cameras.len());
            for (i, camera) in cameras.iter().enumerate() {
                println!("  [{}] {}", i, camera.human_name());
            }
        }
        Err(e) => {
            println!("Failed to query cameras: {}", e);
        }
    }
    println!("============================\n");

    // A broken garment configuration is fatal here, never per-frame.
    let catalog = match GarmentCatalog::load_or_builtin("garments.json") {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            eprintln!("Invalid garment configuration: {e}");
            std::process::exit(1);
        }
    };

    // Set up GUI options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([960.0, 640.0]),
        centered: true,
        ..Default::default()
    };

    // Run the application
    let result = eframe::run_native(
        "FitMirror — Virtual Try-On",
        options,
        Box::new(move |cc| {
            // Configure fonts and visuals
            configure_fonts(&cc.egui_ctx);
            cc.egui_ctx.set_visuals(create_visuals());

            Box::new(app::FitMirrorApp::new(cc, catalog))
        }),
    );

    // Handle the error if needed
    if let Err(e) = result {
        eprintln!("Error running application: {:?}", e);
    }
}

fn configure_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    // Optional bundled font; egui's defaults cover the fallback.
    let font_path = "assets/fonts/Montserrat-VariableFont_wght.ttf";
    if let Ok(font_data) = std::fs::read(font_path) {
        fonts.font_data.insert(
            "Montserrat".to_owned(),
            egui::FontData::from_owned(font_data),
        );

        fonts
            .families
            .entry(egui::FontFamily::Proportional)
            .or_default()
            .insert(0, "Montserrat".to_owned());

        fonts
            .families
            .entry(egui::FontFamily::Monospace)
            .or_default()
            .push("Montserrat".to_owned());
    }

    ctx.set_fonts(fonts);
}

fn create_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();

    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(24, 24, 30);
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(42, 42, 50);
    visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(55, 55, 65);
    visuals.widgets.active.bg_fill = egui::Color32::from_rgb(186, 104, 200);

    visuals.widgets.noninteractive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.inactive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.hovered.rounding = egui::Rounding::same(8.0);
    visuals.widgets.active.rounding = egui::Rounding::same(8.0);

    visuals.window_rounding = egui::Rounding::same(12.0);
    visuals.menu_rounding = egui::Rounding::same(8.0);

    visuals
}
