//! Style configuration (the renderer's option tree)
//!
//! `QrOptions` is the full snapshot stored with a project. `StyleOptions` is
//! the part without size and payload, which is what templates store. Both are
//! plain values: saving or applying always clones.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::studio::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DotType {
    Square,
    Dots,
    Rounded,
    ExtraRounded,
    Classy,
    ClassyRounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerSquareType {
    Square,
    Dot,
    ExtraRounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerDotType {
    Square,
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCorrectionLevel {
    L,
    M,
    Q,
    H,
}

/// Encoding mode hint. The matrix builder picks segment modes on its own,
/// so this is carried for fidelity of saved configurations only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOrigin {
    Anonymous,
    UseCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    Radial,
    Linear,
}

/// Export file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    Png,
    Jpeg,
    Webp,
    Svg,
}

impl DotType {
    pub const ALL: [DotType; 6] = [
        DotType::Square,
        DotType::Dots,
        DotType::Rounded,
        DotType::ExtraRounded,
        DotType::Classy,
        DotType::ClassyRounded,
    ];

    /// Key suffix used by the locale bundles (`dot_style.<key>`)
    pub fn key(&self) -> &'static str {
        match self {
            DotType::Square => "square",
            DotType::Dots => "dots",
            DotType::Rounded => "rounded",
            DotType::ExtraRounded => "extra_rounded",
            DotType::Classy => "classy",
            DotType::ClassyRounded => "classy_rounded",
        }
    }
}

impl CornerSquareType {
    pub const ALL: [CornerSquareType; 3] = [
        CornerSquareType::Square,
        CornerSquareType::Dot,
        CornerSquareType::ExtraRounded,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CornerSquareType::Square => "square",
            CornerSquareType::Dot => "dot",
            CornerSquareType::ExtraRounded => "extra_rounded",
        }
    }
}

impl CornerDotType {
    pub const ALL: [CornerDotType; 2] = [CornerDotType::Square, CornerDotType::Dot];

    pub fn key(&self) -> &'static str {
        match self {
            CornerDotType::Square => "square",
            CornerDotType::Dot => "dot",
        }
    }
}

impl ErrorCorrectionLevel {
    pub const ALL: [ErrorCorrectionLevel; 4] = [
        ErrorCorrectionLevel::L,
        ErrorCorrectionLevel::M,
        ErrorCorrectionLevel::Q,
        ErrorCorrectionLevel::H,
    ];
}

impl fmt::Display for ErrorCorrectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Extension {
    pub const ALL: [Extension; 4] = [Extension::Png, Extension::Jpeg, Extension::Webp, Extension::Svg];

    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Png => "png",
            Extension::Jpeg => "jpeg",
            Extension::Webp => "webp",
            Extension::Svg => "svg",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    #[serde(rename = "type")]
    pub kind: GradientType,
    /// Radians, linear gradients only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    pub color_stops: Vec<ColorStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeOptions {
    pub error_correction_level: ErrorCorrectionLevel,
    /// 0 picks the smallest version that fits, 1..=40 forces one
    pub type_number: u8,
    pub mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    pub hide_background_dots: bool,
    /// Logo edge as a fraction of the symbol edge
    pub image_size: f32,
    /// Clear zone around the logo in pixels
    pub margin: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<CrossOrigin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotsOptions {
    pub color: String,
    #[serde(rename = "type")]
    pub kind: DotType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundOptions {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornersSquareOptions {
    pub color: String,
    #[serde(rename = "type")]
    pub kind: Option<CornerSquareType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornersDotOptions {
    pub color: String,
    #[serde(rename = "type")]
    pub kind: Option<CornerDotType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

/// Everything visual, independent of size and payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOptions {
    pub margin: u32,
    pub qr_options: CodeOptions,
    pub image_options: ImageOptions,
    pub dots_options: DotsOptions,
    pub background_options: BackgroundOptions,
    pub corners_square_options: CornersSquareOptions,
    pub corners_dot_options: CornersDotOptions,
    /// Logo as a base64 data URL
    #[serde(default)]
    pub image: Option<String>,
}

/// Full renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrOptions {
    pub width: u32,
    pub height: u32,
    /// Payload last derived for this configuration
    pub data: String,
    #[serde(flatten)]
    pub style: StyleOptions,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
            qr_options: CodeOptions {
                error_correction_level: ErrorCorrectionLevel::Q,
                type_number: 0,
                mode: Mode::Byte,
            },
            image_options: ImageOptions {
                hide_background_dots: true,
                image_size: DEFAULT_IMAGE_SIZE,
                margin: DEFAULT_IMAGE_MARGIN,
                cross_origin: Some(CrossOrigin::Anonymous),
            },
            dots_options: DotsOptions {
                color: DEFAULT_DOT_COLOR.to_string(),
                kind: DotType::Square,
                gradient: None,
            },
            background_options: BackgroundOptions {
                color: DEFAULT_BACKGROUND_COLOR.to_string(),
                gradient: None,
            },
            corners_square_options: CornersSquareOptions {
                color: DEFAULT_DOT_COLOR.to_string(),
                kind: Some(CornerSquareType::Square),
                gradient: None,
            },
            corners_dot_options: CornersDotOptions {
                color: DEFAULT_DOT_COLOR.to_string(),
                kind: Some(CornerDotType::Square),
                gradient: None,
            },
            image: None,
        }
    }
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            data: DEFAULT_DATA.to_string(),
            style: StyleOptions::default(),
        }
    }
}

impl QrOptions {
    /// Copy with the size overridden, used for exports
    pub fn with_size(&self, size: u32) -> Self {
        Self {
            width: size,
            height: size,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(QrOptions::default()).unwrap();
        assert_eq!(json["width"], 300);
        assert_eq!(json["margin"], 10);
        assert_eq!(json["qrOptions"]["errorCorrectionLevel"], "Q");
        assert_eq!(json["imageOptions"]["hideBackgroundDots"], true);
        assert_eq!(json["dotsOptions"]["type"], "square");
        assert_eq!(json["cornersSquareOptions"]["type"], "square");
        assert!(json["image"].is_null());
    }

    #[test]
    fn test_template_style_has_no_size_or_payload() {
        let json = serde_json::to_value(StyleOptions::default()).unwrap();
        assert!(json.get("width").is_none());
        assert!(json.get("height").is_none());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_kebab_case_shapes() {
        let dots: DotsOptions = serde_json::from_str(
            r##"{"color":"#123456","type":"classy-rounded"}"##,
        )
        .unwrap();
        assert_eq!(dots.kind, DotType::ClassyRounded);
        assert!(dots.gradient.is_none());
    }

    #[test]
    fn test_with_size_keeps_style() {
        let mut options = QrOptions::default();
        options.style.dots_options.color = "#ff0000".to_string();
        let export = options.with_size(2048);
        assert_eq!((export.width, export.height), (2048, 2048));
        assert_eq!(export.style, options.style);
        assert_eq!(options.width, 300);
    }
}
