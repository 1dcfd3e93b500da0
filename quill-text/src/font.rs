//! Fonts: descriptions, metrics, and the rasterizer capability.
//!
//! The atlas builder only needs a handful of per-glyph queries, so it
//! talks to a [`GlyphRasterizer`] rather than to a concrete font
//! library. [`SystemFont`] implements it on top of `font-kit`, which
//! resolves families through the OS font source (CoreText, DirectWrite,
//! fontconfig).
//!
//! ## Coordinate conventions
//!
//! ```text
//!        y < 0  ▲ ink above the baseline
//!               │
//!  origin ──────┼──────────► x
//!               │
//!        y > 0  ▼ descenders
//! ```
//!
//! [`PixelRect`]s are integral pixel boxes in this y-down space, relative
//! to the glyph origin, at the pixel size passed to the query.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use font_kit::canvas::{Canvas, Format, RasterizationOptions};
use font_kit::family_name::FamilyName;
use font_kit::font::Font;
use font_kit::handle::Handle;
use font_kit::hinting::HintingOptions;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use pathfinder_geometry::rect::RectI;
use pathfinder_geometry::transform2d::Transform2F;
use pathfinder_geometry::vector::{Vector2F, Vector2I};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("No font matches {0:?}")]
    NotFound(String),
    #[error("Failed to load font {name:?}: {reason}")]
    Load { name: String, reason: String },
    #[error("Invalid point size {0}")]
    InvalidSize(f32),
}

// ── Font description ────────────────────────────────────────────────

/// Optional typographic features.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FontFeatures {
    /// Let the shaper substitute ligature glyphs. Turning this off also
    /// turns off kerning, since the shaper then maps characters to
    /// glyphs one by one.
    pub ligatures: bool,
    /// Replace straight quotes with typographic ones as text is typed.
    pub smart_quotes: bool,
}

impl Default for FontFeatures {
    fn default() -> Self {
        Self {
            ligatures: true,
            smart_quotes: false,
        }
    }
}

/// Which font to use and at what size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontDescription {
    /// Family name, or a generic keyword (`sans-serif`, `serif`, `monospace`).
    pub family: String,
    /// Exact face to load. Takes precedence over `family` when set.
    pub postscript_name: Option<String>,
    /// Nominal size in points. All metrics returned by this crate are in
    /// these units.
    pub point_size: f32,
    pub features: FontFeatures,
}

impl Default for FontDescription {
    fn default() -> Self {
        Self {
            family: String::from("monospace"),
            postscript_name: None,
            point_size: 14.0,
            features: FontFeatures::default(),
        }
    }
}

impl FontDescription {
    pub fn new(family: impl Into<String>, point_size: f32) -> Self {
        Self {
            family: family.into(),
            point_size,
            ..Default::default()
        }
    }

    /// Name used in log lines and error messages.
    pub fn display_name(&self) -> &str {
        self.postscript_name.as_deref().unwrap_or(&self.family)
    }

    fn family_name(&self) -> FamilyName {
        match self.family.trim().to_lowercase().as_str() {
            "serif" => FamilyName::Serif,
            "sans-serif" => FamilyName::SansSerif,
            "monospace" => FamilyName::Monospace,
            "cursive" => FamilyName::Cursive,
            "fantasy" => FamilyName::Fantasy,
            _ => FamilyName::Title(self.family.trim().to_owned()),
        }
    }
}

// ── Metrics ─────────────────────────────────────────────────────────

/// Vertical font metrics. Both `ascent` and `descent` are positive
/// distances from the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

impl FontMetrics {
    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }

    /// Divide every metric by `factor`.
    pub fn unscaled(self, factor: f32) -> Self {
        Self {
            ascent: self.ascent / factor,
            descent: self.descent / factor,
            line_gap: self.line_gap / factor,
        }
    }
}

/// Integral pixel box relative to a glyph origin (y grows downward).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// True for glyphs without ink (space, control characters).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<RectI> for PixelRect {
    fn from(rect: RectI) -> Self {
        Self {
            x: rect.min_x(),
            y: rect.min_y(),
            width: rect.width().max(0) as u32,
            height: rect.height().max(0) as u32,
        }
    }
}

// ── Rasterizer capability ───────────────────────────────────────────

/// The per-glyph queries the atlas builder needs from a font.
///
/// `pixel_size` is the em size in pixels the glyph is rendered at; the
/// builder passes `point_size * scale`. Any query may return `None`, in
/// which case the character is treated as missing from the font.
pub trait GlyphRasterizer {
    /// Nominal size in points.
    fn point_size(&self) -> f32;

    /// Glyph id for `ch`, or `None` when the font does not cover it.
    fn glyph_id(&self, ch: char) -> Option<u32>;

    /// Tight ink box of the glyph.
    fn ink_bounds(&self, glyph: u32, pixel_size: f32, smoothing: bool) -> Option<PixelRect>;

    /// Horizontal advance in pixels.
    fn advance(&self, glyph: u32, pixel_size: f32) -> Option<f32>;

    /// Render the glyph into a `bounds.width × bounds.height` coverage
    /// buffer, row 0 at the top of the ink box.
    fn rasterize(
        &self,
        glyph: u32,
        pixel_size: f32,
        bounds: PixelRect,
        smoothing: bool,
    ) -> Option<Vec<u8>>;

    /// Vertical metrics in pixels.
    fn metrics(&self, pixel_size: f32) -> FontMetrics;
}

// ── System font ─────────────────────────────────────────────────────

/// A font resolved through `font-kit`.
pub struct SystemFont {
    font: Font,
    description: FontDescription,
    units_per_em: f32,
}

impl SystemFont {
    /// Resolve `description` against the installed fonts.
    pub fn load(description: &FontDescription) -> Result<Self, FontError> {
        check_size(description.point_size)?;
        let start = Instant::now();
        let source = SystemSource::new();

        let handle = match &description.postscript_name {
            Some(name) => source
                .select_by_postscript_name(name)
                .map_err(|_| FontError::NotFound(name.clone()))?,
            None => source
                .select_best_match(&[description.family_name()], &Properties::new())
                .map_err(|_| FontError::NotFound(description.family.clone()))?,
        };

        let font = load_handle(&handle, description.display_name())?;
        log::info!(
            "SystemFont: resolved {:?} to {:?} ({:.1}ms)",
            description.display_name(),
            font.postscript_name().unwrap_or_else(|| font.family_name()),
            start.elapsed().as_secs_f64() * 1000.0,
        );
        Ok(Self::from_font(font, description.clone()))
    }

    /// Load a font from raw TrueType/OpenType bytes (first face).
    pub fn from_bytes(bytes: Vec<u8>, description: &FontDescription) -> Result<Self, FontError> {
        check_size(description.point_size)?;
        let font = Font::from_bytes(Arc::new(bytes), 0).map_err(|e| FontError::Load {
            name: description.display_name().to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_font(font, description.clone()))
    }

    /// Load a font file from disk (first face).
    pub fn from_path(path: &Path, description: &FontDescription) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|e| FontError::Load {
            name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(bytes, description)
    }

    fn from_font(font: Font, description: FontDescription) -> Self {
        let units_per_em = font.metrics().units_per_em as f32;
        Self {
            font,
            description,
            units_per_em,
        }
    }

    pub fn description(&self) -> &FontDescription {
        &self.description
    }

    /// Family name reported by the font itself.
    pub fn family_name(&self) -> String {
        self.font.family_name()
    }

    pub fn postscript_name(&self) -> Option<String> {
        self.font.postscript_name()
    }

    /// Raw bytes of the file backing this face, for handing the exact same
    /// face to a shaper.
    pub fn font_data(&self) -> Option<Vec<u8>> {
        self.font.copy_font_data().map(|data| data.as_ref().clone())
    }

    fn units_to_pixels(&self, pixel_size: f32) -> f32 {
        pixel_size / self.units_per_em.max(1.0)
    }
}

impl GlyphRasterizer for SystemFont {
    fn point_size(&self) -> f32 {
        self.description.point_size
    }

    fn glyph_id(&self, ch: char) -> Option<u32> {
        // Glyph 0 is .notdef: treat it as "not covered".
        self.font.glyph_for_char(ch).filter(|&id| id != 0)
    }

    fn ink_bounds(&self, glyph: u32, pixel_size: f32, smoothing: bool) -> Option<PixelRect> {
        self.font
            .raster_bounds(
                glyph,
                pixel_size,
                Transform2F::default(),
                HintingOptions::None,
                rasterization_options(smoothing),
            )
            .ok()
            .map(PixelRect::from)
    }

    fn advance(&self, glyph: u32, pixel_size: f32) -> Option<f32> {
        let advance = self.font.advance(glyph).ok()?;
        Some(advance.x() * self.units_to_pixels(pixel_size))
    }

    fn rasterize(
        &self,
        glyph: u32,
        pixel_size: f32,
        bounds: PixelRect,
        smoothing: bool,
    ) -> Option<Vec<u8>> {
        if bounds.is_empty() {
            return Some(Vec::new());
        }
        let width = bounds.width as usize;
        let mut canvas = Canvas::new(
            Vector2I::new(bounds.width as i32, bounds.height as i32),
            Format::A8,
        );
        // Shift the ink box's top-left corner onto the canvas origin.
        let shift = Vector2F::new(-(bounds.x as f32), -(bounds.y as f32));
        self.font
            .rasterize_glyph(
                &mut canvas,
                glyph,
                pixel_size,
                Transform2F::from_translation(shift),
                HintingOptions::None,
                rasterization_options(smoothing),
            )
            .ok()?;

        let mut coverage = Vec::with_capacity(width * bounds.height as usize);
        for row in canvas.pixels.chunks(canvas.stride).take(bounds.height as usize) {
            coverage.extend_from_slice(&row[..width]);
        }
        Some(coverage)
    }

    fn metrics(&self, pixel_size: f32) -> FontMetrics {
        let metrics = self.font.metrics();
        let k = self.units_to_pixels(pixel_size);
        FontMetrics {
            ascent: metrics.ascent * k,
            descent: -metrics.descent * k,
            line_gap: metrics.line_gap * k,
        }
    }
}

fn check_size(point_size: f32) -> Result<(), FontError> {
    if point_size.is_finite() && point_size > 0.0 {
        Ok(())
    } else {
        Err(FontError::InvalidSize(point_size))
    }
}

fn load_handle(handle: &Handle, name: &str) -> Result<Font, FontError> {
    handle.load().map_err(|e| FontError::Load {
        name: name.to_owned(),
        reason: e.to_string(),
    })
}

fn rasterization_options(smoothing: bool) -> RasterizationOptions {
    if smoothing {
        RasterizationOptions::GrayscaleAa
    } else {
        RasterizationOptions::Bilevel
    }
}

// ===================================================================
// Tests
// ===================================================================
