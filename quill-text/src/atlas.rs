//! Glyph atlas: rasterizes a character set into one grayscale texture.
//!
//! Uses a row-based "shelf" packing algorithm. Cells are placed left to
//! right; when a cell does not fit the current row, the cursor drops
//! below the tallest cell of that row. A glyph that would run past the
//! bottom edge is dropped and the build carries on with the rest.
//!
//! ```text
//!  (0,0) ┌──────────────────────────────── size ─┐
//!        │ ┌pad┐┌─────┐┌────────┐                 │
//!        │ │ A ││  B  ││   W    │  ...  → wrap    │
//!        │ └───┘└─────┘└────────┘                 │
//!        │   + padding                            │
//!        │ ┌────┐┌──┐                             │
//!        │ │ g  ││ i│  ...                        │
//!        └────────────────────────────────────────┘
//! ```
//!
//! Glyphs are drawn at `scale`× their point size; every metric stored in
//! [`GlyphInfo`] is divided back, so callers always work in points.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::charset::CharacterSet;
use crate::config::AtlasConfig;
use crate::font::{FontMetrics, GlyphRasterizer, PixelRect};

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("Failed to allocate a {size}×{size} atlas bitmap")]
    BitmapAllocation { size: u32 },
    #[error("Invalid atlas config: {0}")]
    InvalidConfig(String),
}

// ── Rectangles ──────────────────────────────────────────────────────

/// A region within the atlas texture (UV coordinates normalized to [0,1]).
///
/// `v_min` is the edge nearest atlas row 0, i.e. the top of the glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct UvRect {
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

impl UvRect {
    /// Whether the rect lies inside [0,1]².
    pub fn is_normalized(&self) -> bool {
        0.0 <= self.u_min
            && self.u_min <= self.u_max
            && self.u_max <= 1.0
            && 0.0 <= self.v_min
            && self.v_min <= self.v_max
            && self.v_max <= 1.0
    }

    pub fn intersects(&self, other: &UvRect) -> bool {
        self.u_min < other.u_max
            && other.u_min < self.u_max
            && self.v_min < other.v_max
            && other.v_min < self.v_max
    }
}

/// Pixel-space rectangle within the atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Ink box in points, relative to the glyph origin. Y grows upward, so
/// `min_y` is the lowest ink row (negative for descenders).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GlyphBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl GlyphBounds {
    /// Convert a y-down pixel box at `scale`× into y-up points.
    pub fn from_pixels(rect: PixelRect, scale: f32) -> Self {
        Self {
            min_x: rect.x as f32 / scale,
            min_y: -(rect.y + rect.height as i32) as f32 / scale,
            width: rect.width as f32 / scale,
            height: rect.height as f32 / scale,
        }
    }

    pub fn max_x(&self) -> f32 {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.min_y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

// ── Glyph info ──────────────────────────────────────────────────────

/// Everything the layout engine needs to draw one character.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GlyphInfo {
    pub character: char,
    /// Ink rect in the atlas, widened by `texture_expansion` on each side.
    pub texture_rect: UvRect,
    /// Ink box in points.
    pub bounds: GlyphBounds,
    /// Pen advance in points.
    pub advance: f32,
    /// UV margin in points (atlas margin / scale).
    pub texture_expansion: f32,
    /// Padded cell occupied in the atlas, in pixels.
    pub cell: AtlasRect,
}

/// Character → glyph lookup produced by one atlas build.
pub type GlyphMap = HashMap<char, GlyphInfo>;

// ── Bitmap ──────────────────────────────────────────────────────────

/// Single-channel 8-bit atlas raster. White ink (255) on black (0),
/// row 0 at the top.
#[derive(Clone, PartialEq, Eq)]
pub struct AtlasBitmap {
    size: u32,
    pixels: Vec<u8>,
}

impl AtlasBitmap {
    /// Allocate a zeroed `size × size` bitmap.
    pub fn new(size: u32) -> Result<Self, AtlasError> {
        let len = (size as usize)
            .checked_mul(size as usize)
            .ok_or(AtlasError::BitmapAllocation { size })?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| AtlasError::BitmapAllocation { size })?;
        pixels.resize(len, 0);
        Ok(Self { size, pixels })
    }

    /// Width = height in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.pixels.get((y as usize) * (self.size as usize) + x as usize).copied()
    }

    /// Copy a row-major coverage buffer into the bitmap, clipping at
    /// the edges.
    fn blit(&mut self, x: u32, y: u32, width: u32, height: u32, coverage: &[u8]) {
        if width == 0 || x >= self.size {
            return;
        }
        let stride = self.size as usize;
        let copy_w = width.min(self.size - x) as usize;
        for (row, src) in coverage.chunks(width as usize).take(height as usize).enumerate() {
            let dst_y = y as usize + row;
            if dst_y >= stride {
                break;
            }
            let dst = dst_y * stride + x as usize;
            let n = copy_w.min(src.len());
            self.pixels[dst..dst + n].copy_from_slice(&src[..n]);
        }
    }
}

impl std::fmt::Debug for AtlasBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlasBitmap").field("size", &self.size).finish_non_exhaustive()
    }
}

// ── Shelf packer ────────────────────────────────────────────────────

/// Row packing cursor. All values in atlas pixels.
#[derive(Clone, Debug)]
pub(crate) struct ShelfPacker {
    size: u32,
    padding: u32,
    x: u32,
    y: u32,
    row_height: u32,
    rows: u32,
}

impl ShelfPacker {
    pub(crate) fn new(size: u32, padding: u32) -> Self {
        Self {
            size,
            padding,
            x: 0,
            y: 0,
            row_height: 0,
            rows: 0,
        }
    }

    /// Reserve a `width × height` cell and return its top-left corner,
    /// or `None` if it would cross the atlas edge.
    pub(crate) fn place(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if self.x > 0 && self.x.saturating_add(width) > self.size {
            self.x = 0;
            self.y = self.y.saturating_add(self.row_height.saturating_add(self.padding));
            self.row_height = 0;
        }
        if width > self.size || self.y.saturating_add(height) > self.size {
            return None;
        }
        if self.x == 0 {
            self.rows += 1;
        }
        let origin = (self.x, self.y);
        self.x += width;
        self.row_height = self.row_height.max(height);
        Some(origin)
    }

    /// Number of rows that received at least one cell.
    pub(crate) fn rows(&self) -> u32 {
        self.rows
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Counters from one build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AtlasStats {
    /// Characters written to the atlas.
    pub placed: usize,
    /// Characters the font has no glyph for.
    pub missing: usize,
    /// Characters dropped because the atlas was full.
    pub overflowed: usize,
    /// Shelf rows used.
    pub rows: u32,
}

/// Result of one build: the bitmap plus everything needed to draw from it.
#[derive(Debug)]
pub struct GlyphAtlas {
    pub bitmap: AtlasBitmap,
    pub glyphs: GlyphMap,
    /// Font metrics in points.
    pub metrics: FontMetrics,
    pub stats: AtlasStats,
}

impl GlyphAtlas {
    pub fn get(&self, ch: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&ch)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Split into the bitmap (for upload) and the glyph map (for layout).
    pub fn into_parts(self) -> (AtlasBitmap, GlyphMap) {
        (self.bitmap, self.glyphs)
    }
}

/// Packs glyphs from a [`GlyphRasterizer`] into a [`GlyphAtlas`].
#[derive(Clone, Debug, Default)]
pub struct AtlasBuilder {
    config: AtlasConfig,
}

impl AtlasBuilder {
    pub fn new(config: AtlasConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Rasterize every character of `charset` that the font covers.
    ///
    /// Missing glyphs and glyphs that no longer fit are skipped and
    /// logged; only config and allocation problems fail the build.
    pub fn build(
        &self,
        font: &dyn GlyphRasterizer,
        charset: &CharacterSet,
    ) -> Result<GlyphAtlas, AtlasError> {
        self.config.validate()?;
        let start = Instant::now();

        let AtlasConfig {
            size,
            scale,
            padding,
            expansion,
            smoothing,
        } = self.config;
        let pixel_size = font.point_size() * scale;

        let mut bitmap = AtlasBitmap::new(size)?;
        let mut packer = ShelfPacker::new(size, padding);
        let mut glyphs = GlyphMap::with_capacity(charset.len());
        let mut stats = AtlasStats::default();
        let inv = 1.0 / size as f32;

        for ch in charset.iter() {
            let Some(glyph) = font.glyph_id(ch) else {
                log::debug!("Atlas: no glyph for {ch:?}, skipping");
                stats.missing += 1;
                continue;
            };
            let (Some(ink), Some(advance)) = (
                font.ink_bounds(glyph, pixel_size, smoothing),
                font.advance(glyph, pixel_size),
            ) else {
                log::debug!("Atlas: no metrics for {ch:?} (glyph {glyph}), skipping");
                stats.missing += 1;
                continue;
            };

            let (Some(cell_w), Some(cell_h)) =
                (padded(ink.width, padding), padded(ink.height, padding))
            else {
                log::warn!(
                    "Atlas: {ch:?} ({}×{} plus padding {padding}) is too large",
                    ink.width,
                    ink.height
                );
                stats.overflowed += 1;
                continue;
            };
            let Some((cell_x, cell_y)) = packer.place(cell_w, cell_h) else {
                log::warn!("Atlas: {ch:?} ({cell_w}×{cell_h}) does not fit in {size}×{size}");
                stats.overflowed += 1;
                continue;
            };

            let ink_x = cell_x + padding;
            let ink_y = cell_y + padding;
            if !ink.is_empty() {
                match font.rasterize(glyph, pixel_size, ink, smoothing) {
                    Some(coverage) => bitmap.blit(ink_x, ink_y, ink.width, ink.height, &coverage),
                    None => log::debug!("Atlas: failed to rasterize {ch:?}, cell left blank"),
                }
            }

            let texture_rect = UvRect {
                u_min: (ink_x as f32 - expansion) * inv,
                v_min: (ink_y as f32 - expansion) * inv,
                u_max: ((ink_x + ink.width) as f32 + expansion) * inv,
                v_max: ((ink_y + ink.height) as f32 + expansion) * inv,
            };

            glyphs.insert(
                ch,
                GlyphInfo {
                    character: ch,
                    texture_rect,
                    bounds: GlyphBounds::from_pixels(ink, scale),
                    advance: advance / scale,
                    texture_expansion: expansion / scale,
                    cell: AtlasRect {
                        x: cell_x,
                        y: cell_y,
                        width: cell_w,
                        height: cell_h,
                    },
                },
            );
            stats.placed += 1;
        }

        stats.rows = packer.rows();
        log::info!(
            "Atlas: placed {} of {} glyphs in {} rows ({} missing, {} overflowed, {:.1}ms)",
            stats.placed,
            charset.len(),
            stats.rows,
            stats.missing,
            stats.overflowed,
            start.elapsed().as_secs_f64() * 1000.0,
        );

        Ok(GlyphAtlas {
            bitmap,
            glyphs,
            metrics: font.metrics(pixel_size).unscaled(scale),
            stats,
        })
    }
}

/// Cell extent for `len` pixels of ink, or `None` on overflow.
fn padded(len: u32, padding: u32) -> Option<u32> {
    padding.checked_mul(2)?.checked_add(len)
}

// ===================================================================
// Tests
// ===================================================================
