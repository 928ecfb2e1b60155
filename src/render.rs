//! Default render engine
//!
//! Builds the module matrix with `qrcode` and paints it onto an RGBA canvas
//! with `image`. Finder patterns are drawn as whole shapes when a corner style
//! is set and fall back to the dot style otherwise. SVG is emitted directly
//! from the same layout.

use anyhow::{Context, Result, anyhow, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Pixel, RgbaImage};
use qrcode::{EcLevel, QrCode, Version};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::color::HexColor;
use crate::constants::validation::{MAX_IMAGE_SIZE, MIN_IMAGE_SIZE};
use crate::studio::{RenderEngine, RenderRequest};
use crate::style::{
    CodeOptions, CornerDotType, CornerSquareType, DotType, ErrorCorrectionLevel, Extension, Gradient,
    GradientType, StyleOptions,
};

/// Finder patterns are 7x7 modules
const FINDER: u32 = 7;

pub struct QrRenderer {
    request: RenderRequest,
    image: RgbaImage,
    revision: u64,
}

impl QrRenderer {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Bumped on every successful update
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[cfg(test)]
    pub fn request(&self) -> &RenderRequest {
        &self.request
    }
}

impl RenderEngine for QrRenderer {
    fn construct(request: &RenderRequest) -> Result<Self> {
        let image = rasterize(request)?;
        Ok(Self {
            request: request.clone(),
            image,
            revision: 0,
        })
    }

    fn update(&mut self, request: &RenderRequest) -> Result<()> {
        self.image = rasterize(request)?;
        self.request = request.clone();
        self.revision += 1;
        Ok(())
    }

    fn download(&self, name: &str, extension: Extension, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
        let path = dir.join(format!("{name}.{extension}"));

        match extension {
            Extension::Svg => {
                let scene = Scene::build(&self.request)?;
                let svg = to_svg(&scene, &self.request).context("Failed to build SVG markup")?;
                fs::write(&path, svg).with_context(|| format!("Failed to write {}", path.display()))?
            }
            Extension::Png => self
                .image
                .save_with_format(&path, ImageFormat::Png)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            Extension::Jpeg => DynamicImage::ImageRgba8(self.image.clone())
                .to_rgb8()
                .save_with_format(&path, ImageFormat::Jpeg)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            Extension::Webp => self
                .image
                .save_with_format(&path, ImageFormat::WebP)
                .with_context(|| format!("Failed to write {}", path.display()))?,
        }

        Ok(path)
    }
}

/// Read an image file into a base64 data URL usable as a logo
pub fn logo_data_url(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read logo {}", path.display()))?;
    let format = image::guess_format(&bytes)
        .with_context(|| format!("Unrecognized image format in {}", path.display()))?;
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(&bytes)
    ))
}

fn decode_data_url(url: &str) -> Result<DynamicImage> {
    let (_, encoded) = url
        .split_once("base64,")
        .ok_or_else(|| anyhow!("Logo is not a base64 data URL"))?;
    let bytes = STANDARD
        .decode(encoded.trim())
        .context("Logo data URL is not valid base64")?;
    image::load_from_memory(&bytes).context("Failed to decode logo image")
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl Rect {
    fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w && other.x < self.x + self.w && self.y < other.y + other.h && other.y < self.y + self.h
    }
}

/// Module grid placement on the canvas, in whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    count: u32,
    cell: u32,
    origin_x: u32,
    origin_y: u32,
}

impl Layout {
    fn new(width: u32, height: u32, margin: u32, count: u32) -> Self {
        let drawable = width.min(height).saturating_sub(margin.saturating_mul(2));
        let cell = (drawable / count.max(1)).max(1);
        let side = cell * count;
        Self {
            count,
            cell,
            origin_x: width.saturating_sub(side) / 2,
            origin_y: height.saturating_sub(side) / 2,
        }
    }

    fn side(&self) -> u32 {
        self.cell * self.count
    }

    fn module_origin(&self, mx: u32, my: u32) -> (u32, u32) {
        (self.origin_x + mx * self.cell, self.origin_y + my * self.cell)
    }

    fn module_rect(&self, mx: u32, my: u32) -> Rect {
        let (x, y) = self.module_origin(mx, my);
        Rect {
            x: x as f32,
            y: y as f32,
            w: self.cell as f32,
            h: self.cell as f32,
        }
    }

    fn bounds(&self) -> Rect {
        Rect {
            x: self.origin_x as f32,
            y: self.origin_y as f32,
            w: self.side() as f32,
            h: self.side() as f32,
        }
    }

    /// Top-left module of each finder pattern
    fn finders(&self) -> [(u32, u32); 3] {
        let far = self.count.saturating_sub(FINDER);
        [(0, 0), (far, 0), (0, far)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Data,
    CornerSquare,
    CornerDot,
    /// Light ring inside a finder
    FinderGap,
}

struct Matrix {
    count: u32,
    dark: Vec<bool>,
}

impl Matrix {
    fn encode(data: &str, code: &CodeOptions) -> Result<Self> {
        let ec = match code.error_correction_level {
            ErrorCorrectionLevel::L => EcLevel::L,
            ErrorCorrectionLevel::M => EcLevel::M,
            ErrorCorrectionLevel::Q => EcLevel::Q,
            ErrorCorrectionLevel::H => EcLevel::H,
        };
        let encoded = if code.type_number > 0 {
            QrCode::with_version(data.as_bytes(), Version::Normal(i16::from(code.type_number.min(40))), ec)
        } else {
            QrCode::with_error_correction_level(data.as_bytes(), ec)
        };
        let qr = encoded.map_err(|e| {
            anyhow!(
                "Failed to encode {} byte payload at level {} (version {}): {e}",
                data.len(),
                code.error_correction_level,
                code.type_number
            )
        })?;

        let count = qr.width() as u32;
        let dark = qr
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        Ok(Self { count, dark })
    }

    fn is_dark(&self, x: i64, y: i64) -> bool {
        let n = self.count as i64;
        if x < 0 || y < 0 || x >= n || y >= n {
            return false;
        }
        self.dark[(y * n + x) as usize]
    }

    fn neighbors(&self, x: u32, y: u32) -> Neighbors {
        let (x, y) = (x as i64, y as i64);
        Neighbors {
            top: self.is_dark(x, y - 1),
            right: self.is_dark(x + 1, y),
            bottom: self.is_dark(x, y + 1),
            left: self.is_dark(x - 1, y),
        }
    }

    fn role(&self, x: u32, y: u32) -> Role {
        let far = self.count.saturating_sub(FINDER);
        for (fx, fy) in [(0, 0), (far, 0), (0, far)] {
            if (fx..fx + FINDER).contains(&x) && (fy..fy + FINDER).contains(&y) {
                let (lx, ly) = (x - fx, y - fy);
                if lx == 0 || ly == 0 || lx == FINDER - 1 || ly == FINDER - 1 {
                    return Role::CornerSquare;
                }
                if (2..=4).contains(&lx) && (2..=4).contains(&ly) {
                    return Role::CornerDot;
                }
                return Role::FinderGap;
            }
        }
        Role::Data
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Neighbors {
    top: bool,
    right: bool,
    bottom: bool,
    left: bool,
}

/// Logo resized for the current layout
struct Logo {
    image: RgbaImage,
    rect: Rect,
}

/// Everything derived from a request before painting
struct Scene {
    width: u32,
    height: u32,
    matrix: Matrix,
    layout: Layout,
    logo: Option<Logo>,
    /// Data modules touching this area are left out
    hidden: Option<Rect>,
}

impl Scene {
    fn build(request: &RenderRequest) -> Result<Self> {
        let options = &request.options;
        if options.width == 0 || options.height == 0 {
            bail!("Canvas size must be positive, got {}x{}", options.width, options.height);
        }
        let style = &options.style;
        let matrix = Matrix::encode(&request.data, &style.qr_options)?;
        let layout = Layout::new(options.width, options.height, style.margin, matrix.count);

        let logo = style.image.as_deref().and_then(|url| match place_logo(url, style, &layout) {
            Ok(logo) => Some(logo),
            Err(e) => {
                warn!(error = ?e, "Skipping logo");
                None
            }
        });
        let hidden = logo
            .as_ref()
            .filter(|_| style.image_options.hide_background_dots)
            .map(|logo| {
                let m = style.image_options.margin as f32;
                Rect {
                    x: logo.rect.x - m,
                    y: logo.rect.y - m,
                    w: logo.rect.w + 2.0 * m,
                    h: logo.rect.h + 2.0 * m,
                }
            });

        debug!(
            modules = matrix.count,
            cell = layout.cell,
            width = options.width,
            height = options.height,
            "Layout computed"
        );

        Ok(Self {
            width: options.width,
            height: options.height,
            matrix,
            layout,
            logo,
            hidden,
        })
    }

    fn is_hidden(&self, mx: u32, my: u32) -> bool {
        self.hidden
            .as_ref()
            .is_some_and(|zone| zone.intersects(&self.layout.module_rect(mx, my)))
    }
}

fn place_logo(url: &str, style: &StyleOptions, layout: &Layout) -> Result<Logo> {
    let decoded = decode_data_url(url)?;
    let ratio = style.image_options.image_size.clamp(MIN_IMAGE_SIZE, MAX_IMAGE_SIZE);
    let max_side = ((layout.side() as f32 * ratio).round() as u32).max(1);
    let image = decoded.resize(max_side, max_side, FilterType::Triangle).to_rgba8();
    let (w, h) = image.dimensions();
    let bounds = layout.bounds();
    let rect = Rect {
        x: (bounds.x + (bounds.w - w as f32) / 2.0).floor(),
        y: (bounds.y + (bounds.h - h as f32) / 2.0).floor(),
        w: w as f32,
        h: h as f32,
    };
    Ok(Logo { image, rect })
}

fn parse_or_warn(value: &str, fallback: HexColor, target: &str) -> HexColor {
    HexColor::parse(value).unwrap_or_else(|| {
        warn!(target_part = %target, value = %value, fallback = %fallback.to_hex_string(), "Invalid color");
        fallback
    })
}

#[derive(Debug, Clone, PartialEq)]
struct GradientPaint {
    kind: GradientType,
    rotation: f32,
    stops: Vec<(f32, HexColor)>,
    bounds: Rect,
}

#[derive(Debug, Clone, PartialEq)]
enum Paint {
    Solid(HexColor),
    Gradient(GradientPaint),
}

impl Paint {
    fn resolve(color: &str, gradient: Option<&Gradient>, fallback: HexColor, bounds: Rect, target: &str) -> Self {
        let solid = parse_or_warn(color, fallback, target);
        let Some(gradient) = gradient else {
            return Paint::Solid(solid);
        };

        let mut stops: Vec<(f32, HexColor)> = gradient
            .color_stops
            .iter()
            .map(|stop| (stop.offset.clamp(0.0, 1.0), parse_or_warn(&stop.color, solid, target)))
            .collect();
        if stops.is_empty() {
            warn!(target_part = %target, "Gradient has no color stops, using solid color");
            return Paint::Solid(solid);
        }
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));

        Paint::Gradient(GradientPaint {
            kind: gradient.kind,
            rotation: gradient.rotation.unwrap_or(0.0),
            stops,
            bounds,
        })
    }

    fn at(&self, x: f32, y: f32) -> HexColor {
        match self {
            Paint::Solid(color) => *color,
            Paint::Gradient(gradient) => gradient.color_at(gradient.position(x, y)),
        }
    }
}

impl GradientPaint {
    fn direction(&self) -> (f32, f32) {
        (self.rotation.cos(), self.rotation.sin())
    }

    /// Projected length of the bounds along the gradient direction
    fn span(&self) -> f32 {
        let (dx, dy) = self.direction();
        let span = (self.bounds.w * dx).abs() + (self.bounds.h * dy).abs();
        if span > 0.0 { span } else { 1.0 }
    }

    fn radius(&self) -> f32 {
        let r = (self.bounds.w.powi(2) + self.bounds.h.powi(2)).sqrt() / 2.0;
        if r > 0.0 { r } else { 1.0 }
    }

    /// Position along the gradient, 0 at the first stop and 1 at the last
    fn position(&self, x: f32, y: f32) -> f32 {
        let (cx, cy) = self.bounds.center();
        match self.kind {
            GradientType::Linear => {
                let (dx, dy) = self.direction();
                ((x - cx) * dx + (y - cy) * dy) / self.span() + 0.5
            }
            GradientType::Radial => ((x - cx).powi(2) + (y - cy).powi(2)).sqrt() / self.radius(),
        }
    }

    fn color_at(&self, t: f32) -> HexColor {
        let (first_offset, first) = self.stops[0];
        if t <= first_offset {
            return first;
        }
        for pair in self.stops.windows(2) {
            let (a_offset, a) = pair[0];
            let (b_offset, b) = pair[1];
            if t <= b_offset {
                let span = b_offset - a_offset;
                let local = if span > 0.0 { (t - a_offset) / span } else { 1.0 };
                return a.lerp(b, local);
            }
        }
        self.stops[self.stops.len() - 1].1
    }
}

/// Point-in-shape test for rounded rectangles, radii ordered tl, tr, br, bl
fn rounded_contains(x: f32, y: f32, w: f32, h: f32, radii: [f32; 4]) -> bool {
    if x < 0.0 || y < 0.0 || x > w || y > h {
        return false;
    }
    let left = x < w / 2.0;
    let top = y < h / 2.0;
    let r = match (left, top) {
        (true, true) => radii[0],
        (false, true) => radii[1],
        (false, false) => radii[2],
        (true, false) => radii[3],
    };
    if r <= 0.0 {
        return true;
    }
    let cx = if left { r } else { w - r };
    let cy = if top { r } else { h - r };
    let in_corner_x = if left { x < cx } else { x > cx };
    let in_corner_y = if top { y < cy } else { y > cy };
    if !(in_corner_x && in_corner_y) {
        return true;
    }
    (x - cx).powi(2) + (y - cy).powi(2) <= r * r
}

/// Corner radii of one dot, as a fraction of the cell
///
/// Only corners whose two adjacent sides have no dark neighbour get rounded,
/// so runs of modules merge into bars.
fn dot_radii(kind: DotType, n: Neighbors) -> [f32; 4] {
    let (radius, classy) = match kind {
        DotType::Square => return [0.0; 4],
        DotType::Dots => return [0.5; 4],
        DotType::Rounded => (0.25, false),
        DotType::ExtraRounded => (0.4, false),
        DotType::Classy => (0.15, true),
        DotType::ClassyRounded => (0.3, true),
    };
    let round = |a: bool, b: bool, eligible: bool| if !a && !b && eligible { radius } else { 0.0 };
    [
        round(n.top, n.left, true),
        round(n.top, n.right, !classy),
        round(n.bottom, n.right, true),
        round(n.bottom, n.left, !classy),
    ]
}

fn dot_contains(kind: DotType, n: Neighbors, u: f32, v: f32) -> bool {
    match kind {
        DotType::Dots => (u - 0.5).powi(2) + (v - 0.5).powi(2) <= 0.25,
        _ => rounded_contains(u, v, 1.0, 1.0, dot_radii(kind, n)),
    }
}

/// `u`, `v` in module units within the 7x7 finder
fn corner_square_contains(kind: CornerSquareType, u: f32, v: f32) -> bool {
    match kind {
        CornerSquareType::Square => !(u > 1.0 && u < 6.0 && v > 1.0 && v < 6.0),
        CornerSquareType::Dot => {
            let d = ((u - 3.5).powi(2) + (v - 3.5).powi(2)).sqrt();
            (2.5..=3.5).contains(&d)
        }
        CornerSquareType::ExtraRounded => {
            rounded_contains(u, v, 7.0, 7.0, [2.5; 4])
                && !(u > 1.0 && v > 1.0 && rounded_contains(u - 1.0, v - 1.0, 5.0, 5.0, [1.5; 4]))
        }
    }
}

/// `u`, `v` in module units within the 3x3 centre
fn corner_dot_contains(kind: CornerDotType, u: f32, v: f32) -> bool {
    match kind {
        CornerDotType::Square => true,
        CornerDotType::Dot => (u - 1.5).powi(2) + (v - 1.5).powi(2) <= 2.25,
    }
}

/// Blend `paint` over every pixel of a square region whose centre passes `contains`
///
/// `contains` receives coordinates normalized to 0..1 across the region.
fn fill_region(canvas: &mut RgbaImage, x0: u32, y0: u32, size: u32, paint: &Paint, contains: impl Fn(f32, f32) -> bool) {
    let (width, height) = canvas.dimensions();
    let extent = size as f32;
    for py in y0..(y0 + size).min(height) {
        for px in x0..(x0 + size).min(width) {
            let u = ((px - x0) as f32 + 0.5) / extent;
            let v = ((py - y0) as f32 + 0.5) / extent;
            if contains(u, v) {
                let color = paint.at(px as f32 + 0.5, py as f32 + 0.5).to_rgba();
                canvas.get_pixel_mut(px, py).blend(&color);
            }
        }
    }
}

struct Paints {
    background: Paint,
    dots: Paint,
    corner_square: Paint,
    corner_dot: Paint,
}

impl Paints {
    fn resolve(style: &StyleOptions, scene: &Scene) -> Self {
        let canvas = Rect {
            x: 0.0,
            y: 0.0,
            w: scene.width as f32,
            h: scene.height as f32,
        };
        let symbol = scene.layout.bounds();
        let bg = &style.background_options;
        let dots = &style.dots_options;
        let square = &style.corners_square_options;
        let dot = &style.corners_dot_options;
        Self {
            background: Paint::resolve(&bg.color, bg.gradient.as_ref(), HexColor::WHITE, canvas, "background"),
            dots: Paint::resolve(&dots.color, dots.gradient.as_ref(), HexColor::BLACK, symbol, "dots"),
            corner_square: Paint::resolve(&square.color, square.gradient.as_ref(), HexColor::BLACK, symbol, "corner square"),
            corner_dot: Paint::resolve(&dot.color, dot.gradient.as_ref(), HexColor::BLACK, symbol, "corner dot"),
        }
    }
}

fn rasterize(request: &RenderRequest) -> Result<RgbaImage> {
    let scene = Scene::build(request)?;
    let style = &request.options.style;
    let paints = Paints::resolve(style, &scene);
    let layout = scene.layout;
    let matrix = &scene.matrix;

    let mut canvas = RgbaImage::new(scene.width, scene.height);
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        *pixel = paints.background.at(x as f32 + 0.5, y as f32 + 0.5).to_rgba();
    }

    let dot_kind = style.dots_options.kind;
    let square_kind = style.corners_square_options.kind;
    let dot_center_kind = style.corners_dot_options.kind;

    for my in 0..matrix.count {
        for mx in 0..matrix.count {
            if !matrix.is_dark(mx as i64, my as i64) {
                continue;
            }
            let paint = match matrix.role(mx, my) {
                Role::Data if scene.is_hidden(mx, my) => continue,
                Role::Data => &paints.dots,
                Role::CornerSquare if square_kind.is_none() => &paints.corner_square,
                Role::CornerDot if dot_center_kind.is_none() => &paints.corner_dot,
                _ => continue,
            };
            let neighbors = matrix.neighbors(mx, my);
            let (x0, y0) = layout.module_origin(mx, my);
            fill_region(&mut canvas, x0, y0, layout.cell, paint, |u, v| {
                dot_contains(dot_kind, neighbors, u, v)
            });
        }
    }

    for (fx, fy) in layout.finders() {
        if let Some(kind) = square_kind {
            let (x0, y0) = layout.module_origin(fx, fy);
            fill_region(&mut canvas, x0, y0, layout.cell * FINDER, &paints.corner_square, |u, v| {
                corner_square_contains(kind, u * 7.0, v * 7.0)
            });
        }
        if let Some(kind) = dot_center_kind {
            let (x0, y0) = layout.module_origin(fx + 2, fy + 2);
            fill_region(&mut canvas, x0, y0, layout.cell * 3, &paints.corner_dot, |u, v| {
                corner_dot_contains(kind, u * 3.0, v * 3.0)
            });
        }
    }

    if let Some(logo) = &scene.logo {
        imageops::overlay(&mut canvas, &logo.image, logo.rect.x as i64, logo.rect.y as i64);
    }

    Ok(canvas)
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Emit a gradient definition when needed and return the paint reference
fn svg_paint(out: &mut String, paint: &Paint, id: &str) -> Result<String, fmt::Error> {
    let gradient = match paint {
        Paint::Solid(color) => return Ok(color.to_hex_string()),
        Paint::Gradient(gradient) => gradient,
    };
    let (cx, cy) = gradient.bounds.center();
    match gradient.kind {
        GradientType::Linear => {
            let (dx, dy) = gradient.direction();
            let half = gradient.span() / 2.0;
            writeln!(
                out,
                r#"<linearGradient id="{id}" gradientUnits="userSpaceOnUse" x1="{}" y1="{}" x2="{}" y2="{}">"#,
                cx - dx * half,
                cy - dy * half,
                cx + dx * half,
                cy + dy * half
            )?;
        }
        GradientType::Radial => {
            writeln!(
                out,
                r#"<radialGradient id="{id}" gradientUnits="userSpaceOnUse" cx="{cx}" cy="{cy}" r="{}">"#,
                gradient.radius()
            )?;
        }
    }
    for (offset, color) in &gradient.stops {
        writeln!(out, r#"<stop offset="{offset}" stop-color="{}"/>"#, color.to_hex_string())?;
    }
    match gradient.kind {
        GradientType::Linear => writeln!(out, "</linearGradient>")?,
        GradientType::Radial => writeln!(out, "</radialGradient>")?,
    }
    Ok(format!("url(#{id})"))
}

/// Path for a rounded rectangle with per-corner radii (tl, tr, br, bl)
fn rounded_path(x: f32, y: f32, w: f32, h: f32, [tl, tr, br, bl]: [f32; 4]) -> String {
    format!(
        "M{} {}H{}A{tr} {tr} 0 0 1 {} {}V{}A{br} {br} 0 0 1 {} {}H{}A{bl} {bl} 0 0 1 {} {}V{}A{tl} {tl} 0 0 1 {} {}Z",
        x + tl,
        y,
        x + w - tr,
        x + w,
        y + tr,
        y + h - br,
        x + w - br,
        y + h,
        x + bl,
        x,
        y + h - bl,
        y + tl,
        x + tl,
        y
    )
}

fn svg_dot(out: &mut String, kind: DotType, n: Neighbors, rect: Rect) -> fmt::Result {
    match kind {
        DotType::Square => writeln!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}"/>"#,
            rect.x, rect.y, rect.w, rect.h
        ),
        DotType::Dots => {
            let (cx, cy) = rect.center();
            writeln!(out, r#"<circle cx="{cx}" cy="{cy}" r="{}"/>"#, rect.w / 2.0)
        }
        _ => {
            let radii = dot_radii(kind, n).map(|r| r * rect.w);
            writeln!(out, r#"<path d="{}"/>"#, rounded_path(rect.x, rect.y, rect.w, rect.h, radii))
        }
    }
}

fn to_svg(scene: &Scene, request: &RenderRequest) -> Result<String, fmt::Error> {
    let style = &request.options.style;
    let paints = Paints::resolve(style, scene);
    let layout = scene.layout;
    let matrix = &scene.matrix;
    let cell = layout.cell as f32;

    let mut defs = String::new();
    let background = svg_paint(&mut defs, &paints.background, "background-color")?;
    let dots = svg_paint(&mut defs, &paints.dots, "dot-color")?;
    let corner_square = svg_paint(&mut defs, &paints.corner_square, "corners-square-color")?;
    let corner_dot = svg_paint(&mut defs, &paints.corner_dot, "corners-dot-color")?;

    let mut out = String::new();
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = scene.width,
        h = scene.height
    )?;
    if !defs.is_empty() {
        writeln!(out, "<defs>\n{defs}</defs>")?;
    }
    writeln!(
        out,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="{background}"/>"#,
        scene.width, scene.height
    )?;

    let dot_kind = style.dots_options.kind;
    let square_kind = style.corners_square_options.kind;
    let dot_center_kind = style.corners_dot_options.kind;

    for (role, fill) in [
        (Role::Data, &dots),
        (Role::CornerSquare, &corner_square),
        (Role::CornerDot, &corner_dot),
    ] {
        let drawn_as_shape = match role {
            Role::CornerSquare => square_kind.is_some(),
            Role::CornerDot => dot_center_kind.is_some(),
            _ => false,
        };
        if drawn_as_shape {
            continue;
        }
        writeln!(out, r#"<g fill="{fill}">"#)?;
        for my in 0..matrix.count {
            for mx in 0..matrix.count {
                if !matrix.is_dark(mx as i64, my as i64) || matrix.role(mx, my) != role {
                    continue;
                }
                if role == Role::Data && scene.is_hidden(mx, my) {
                    continue;
                }
                svg_dot(&mut out, dot_kind, matrix.neighbors(mx, my), layout.module_rect(mx, my))?;
            }
        }
        writeln!(out, "</g>")?;
    }

    for (fx, fy) in layout.finders() {
        let (x0, y0) = layout.module_origin(fx, fy);
        let (x0, y0) = (x0 as f32, y0 as f32);
        if let Some(kind) = square_kind {
            // Ring drawn as a stroke along the middle of the outer module row
            let stroke = format!(r#"fill="none" stroke="{corner_square}" stroke-width="{cell}""#);
            match kind {
                CornerSquareType::Dot => writeln!(
                    out,
                    r#"<circle cx="{}" cy="{}" r="{}" {stroke}/>"#,
                    x0 + 3.5 * cell,
                    y0 + 3.5 * cell,
                    3.0 * cell
                )?,
                CornerSquareType::Square | CornerSquareType::ExtraRounded => {
                    let rx = if kind == CornerSquareType::ExtraRounded { 2.0 * cell } else { 0.0 };
                    writeln!(
                        out,
                        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{rx}" {stroke}/>"#,
                        x0 + cell / 2.0,
                        y0 + cell / 2.0,
                        6.0 * cell,
                        6.0 * cell
                    )?
                }
            }
        }
        if let Some(kind) = dot_center_kind {
            match kind {
                CornerDotType::Square => writeln!(
                    out,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{corner_dot}"/>"#,
                    x0 + 2.0 * cell,
                    y0 + 2.0 * cell,
                    3.0 * cell,
                    3.0 * cell
                )?,
                CornerDotType::Dot => writeln!(
                    out,
                    r#"<circle cx="{}" cy="{}" r="{}" fill="{corner_dot}"/>"#,
                    x0 + 3.5 * cell,
                    y0 + 3.5 * cell,
                    1.5 * cell
                )?,
            }
        }
    }

    if let (Some(logo), Some(url)) = (&scene.logo, style.image.as_deref()) {
        writeln!(
            out,
            r#"<image href="{}" x="{}" y="{}" width="{}" height="{}"/>"#,
            xml_escape(url),
            logo.rect.x,
            logo.rect.y,
            logo.rect.w,
            logo.rect.h
        )?;
    }

    writeln!(out, "</svg>")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ColorStop, QrOptions};
    use image::Rgba;
    use std::io::Cursor;

    fn request(data: &str, options: QrOptions) -> RenderRequest {
        RenderRequest {
            data: data.to_string(),
            options,
        }
    }

    fn layout_for(req: &RenderRequest) -> Layout {
        Scene::build(req).unwrap().layout
    }

    /// Pixel at the centre of a module
    fn module_pixel(image: &RgbaImage, layout: &Layout, mx: u32, my: u32) -> Rgba<u8> {
        let (x, y) = layout.module_origin(mx, my);
        *image.get_pixel(x + layout.cell / 2, y + layout.cell / 2)
    }

    fn red_logo_url() -> String {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255])))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(&bytes))
    }

    #[test]
    fn test_default_dimensions_and_colors() {
        let req = request("https://react.dev", QrOptions::default());
        let renderer = QrRenderer::construct(&req).unwrap();
        let image = renderer.image();
        assert_eq!(image.dimensions(), (300, 300));
        assert_eq!(*image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));

        let layout = layout_for(&req);
        assert!(layout.origin_x >= 10);
        assert_eq!(module_pixel(image, &layout, 0, 0), Rgba([0, 0, 0, 255]));
        // Light ring inside the finder
        assert_eq!(module_pixel(image, &layout, 1, 1), Rgba([255, 255, 255, 255]));
        assert_eq!(module_pixel(image, &layout, 3, 3), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_corner_colors() {
        let mut options = QrOptions::default();
        options.style.corners_square_options.color = "#ff0000".to_string();
        options.style.corners_dot_options.color = "#0000ff".to_string();
        options.style.background_options.color = "#00ff00".to_string();
        let req = request("hello", options);
        let renderer = QrRenderer::construct(&req).unwrap();
        let layout = layout_for(&req);
        let image = renderer.image();

        let far = layout.count - 7;
        assert_eq!(module_pixel(image, &layout, far, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(module_pixel(image, &layout, 0, far + 3), Rgba([255, 0, 0, 255]));
        assert_eq!(module_pixel(image, &layout, far + 3, 3), Rgba([0, 0, 255, 255]));
        assert_eq!(*image.get_pixel(1, 1), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_unstyled_corners_follow_dot_shape() {
        let mut options = QrOptions::default();
        options.style.corners_square_options.kind = None;
        options.style.corners_square_options.color = "#ff0000".to_string();
        options.style.dots_options.kind = DotType::Dots;
        let req = request("hello", options);
        let renderer = QrRenderer::construct(&req).unwrap();
        let layout = layout_for(&req);
        assert_eq!(module_pixel(renderer.image(), &layout, 0, 0), Rgba([255, 0, 0, 255]));
        // Cell corner lies outside the circle
        let (x, y) = layout.module_origin(0, 0);
        assert_eq!(*renderer.image().get_pixel(x, y), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_invalid_color_falls_back() {
        let mut options = QrOptions::default();
        options.style.dots_options.color = "not-a-color".to_string();
        options.style.corners_square_options.color = "#zzz".to_string();
        let req = request("hello", options);
        let renderer = QrRenderer::construct(&req).unwrap();
        let layout = layout_for(&req);
        assert_eq!(module_pixel(renderer.image(), &layout, 0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_linear_gradient_positions() {
        let gradient = Gradient {
            kind: GradientType::Linear,
            rotation: Some(0.0),
            color_stops: vec![
                ColorStop { offset: 0.0, color: "#000000".to_string() },
                ColorStop { offset: 1.0, color: "#ffffff".to_string() },
            ],
        };
        let bounds = Rect { x: 0.0, y: 0.0, w: 100.0, h: 100.0 };
        let paint = Paint::resolve("#123456", Some(&gradient), HexColor::BLACK, bounds, "test");
        assert_eq!(paint.at(0.0, 50.0), HexColor::BLACK);
        assert_eq!(paint.at(100.0, 50.0), HexColor::WHITE);
        assert_eq!(paint.at(50.0, 10.0).r, 128);
    }

    #[test]
    fn test_empty_gradient_is_solid() {
        let gradient = Gradient {
            kind: GradientType::Radial,
            rotation: None,
            color_stops: Vec::new(),
        };
        let bounds = Rect { x: 0.0, y: 0.0, w: 10.0, h: 10.0 };
        let paint = Paint::resolve("#ff0000", Some(&gradient), HexColor::BLACK, bounds, "test");
        assert_eq!(paint, Paint::Solid(HexColor::rgb(255, 0, 0)));
    }

    #[test]
    fn test_logo_is_centered_and_clears_dots() {
        let mut options = QrOptions::default();
        options.style.qr_options.error_correction_level = ErrorCorrectionLevel::H;
        options.style.image = Some(red_logo_url());
        let req = request("https://example.com/with/a/longer/path", options);
        let scene = Scene::build(&req).unwrap();
        let logo = scene.logo.as_ref().unwrap();
        let side = scene.layout.side() as f32;
        assert!((logo.rect.w - side * 0.4).abs() <= 1.0);
        assert!(scene.hidden.is_some());

        let renderer = QrRenderer::construct(&req).unwrap();
        let center = renderer.image().get_pixel(150, 150);
        assert!(center[0] > 200 && center[1] < 50 && center[2] < 50);
    }

    #[test]
    fn test_broken_logo_is_skipped() {
        let mut options = QrOptions::default();
        options.style.image = Some("data:image/png;base64,@@@".to_string());
        let req = request("hello", options);
        assert!(QrRenderer::construct(&req).is_ok());
        assert!(Scene::build(&req).unwrap().logo.is_none());
    }

    #[test]
    fn test_fixed_version_too_small_fails() {
        let mut options = QrOptions::default();
        options.style.qr_options.type_number = 1;
        let req = request(&"x".repeat(200), options);
        assert!(QrRenderer::construct(&req).is_err());
    }

    #[test]
    fn test_update_bumps_revision() {
        let mut renderer = QrRenderer::construct(&request("a", QrOptions::default())).unwrap();
        renderer.update(&request("b", QrOptions::default().with_size(128))).unwrap();
        assert_eq!(renderer.revision(), 1);
        assert_eq!(renderer.image().dimensions(), (128, 128));
        assert_eq!(renderer.request().data, "b");
    }

    #[test]
    fn test_downloads_all_formats() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = QrOptions::default().with_size(512);
        options.style.dots_options.kind = DotType::ClassyRounded;
        options.style.dots_options.gradient = Some(Gradient {
            kind: GradientType::Linear,
            rotation: Some(0.5),
            color_stops: vec![
                ColorStop { offset: 0.0, color: "#ff0000".to_string() },
                ColorStop { offset: 1.0, color: "#0000ff".to_string() },
            ],
        });
        let renderer = QrRenderer::construct(&request("export me", options)).unwrap();

        for extension in Extension::ALL {
            let path = renderer.download("qr-code", extension, dir.path()).unwrap();
            assert_eq!(path.file_name().unwrap(), format!("qr-code.{extension}").as_str());
            assert!(path.metadata().unwrap().len() > 0);
        }

        let png = image::open(dir.path().join("qr-code.png")).unwrap();
        assert_eq!((png.width(), png.height()), (512, 512));
        let jpeg = image::open(dir.path().join("qr-code.jpeg")).unwrap();
        assert_eq!(jpeg.color(), image::ColorType::Rgb8);

        let svg = fs::read_to_string(dir.path().join("qr-code.svg")).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="512""#));
        assert!(svg.contains("<linearGradient id=\"dot-color\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_logo_data_url_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])).save(&path).unwrap();
        let url = logo_data_url(&path).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap().width(), 4);
    }
}
