//! GUI-specific constants for layout, colors and texture handling

use egui;

/// Studio window dimensions
pub const WINDOW_WIDTH: f32 = 1100.0;
pub const WINDOW_HEIGHT: f32 = 780.0;
pub const WINDOW_MIN_WIDTH: f32 = 760.0;
pub const WINDOW_MIN_HEIGHT: f32 = 560.0;

/// Application id handed to eframe
pub const APP_ID: &str = "qr-studio";

/// Layout spacing
pub const PADDING: f32 = 8.0;
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;
pub const OPTIONS_PANEL_WIDTH: f32 = 420.0;

/// File manager window
pub const FILE_MANAGER_WIDTH: f32 = 720.0;
pub const FILE_MANAGER_HEIGHT: f32 = 480.0;
pub const FOLDER_COLUMN_WIDTH: f32 = 200.0;

/// Largest edge of the on-screen preview
pub const PREVIEW_MAX_SIDE: f32 = 420.0;

/// Texture name of the live preview
pub const PREVIEW_TEXTURE: &str = "qr-preview";

/// Status colors
pub const STATUS_OK: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);
pub const STATUS_INFO: egui::Color32 = egui::Color32::from_rgb(120, 170, 255);

/// Button tint for destructive actions
pub const DANGER: egui::Color32 = egui::Color32::from_rgb(200, 60, 60);

/// Range and step of the design sliders
pub const LOGO_SIZE_STEP: f64 = 0.05;
pub const LOGO_MARGIN_MAX: u32 = 20;
pub const MARGIN_MAX: u32 = 50;
pub const MARGIN_STEP: f64 = 2.0;
