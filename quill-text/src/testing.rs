//! Synthetic font and shaper used by the unit tests, so they run the
//! same on every machine regardless of installed fonts.

use std::collections::HashMap;

use crate::font::{FontDescription, FontMetrics, GlyphRasterizer, PixelRect};
use crate::shaping::{ShapedGlyph, TextShaper};

/// Coverage written into the first (top) ink row of every box glyph.
pub const TOP_ROW: u8 = 255;
/// Coverage of every other ink row.
pub const BODY: u8 = 96;

/// One rectangular glyph, in pixels at the font's nominal point size.
#[derive(Clone, Copy, Debug)]
pub struct BoxGlyph {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub advance: f32,
}

impl BoxGlyph {
    pub fn new(width: u32, height: u32, advance: f32) -> Self {
        // Sits on the baseline.
        Self { x: 0, y: -(height as i32), width, height, advance }
    }

    pub fn blank(advance: f32) -> Self {
        Self { x: 0, y: 0, width: 0, height: 0, advance }
    }
}

/// A font whose glyphs are solid rectangles with a brighter top row.
pub struct BoxFont {
    point_size: f32,
    glyphs: HashMap<char, (u32, BoxGlyph)>,
    by_id: HashMap<u32, BoxGlyph>,
}

impl BoxFont {
    pub fn new(point_size: f32) -> Self {
        Self { point_size, glyphs: HashMap::new(), by_id: HashMap::new() }
    }

    pub fn with_glyph(mut self, ch: char, glyph: BoxGlyph) -> Self {
        let id = self.glyphs.len() as u32 + 1;
        self.glyphs.insert(ch, (id, glyph));
        self.by_id.insert(id, glyph);
        self
    }

    /// Every character in `chars` gets the same box.
    pub fn uniform(point_size: f32, chars: impl IntoIterator<Item = char>, glyph: BoxGlyph) -> Self {
        chars.into_iter().fold(Self::new(point_size), |font, ch| font.with_glyph(ch, glyph))
    }

    fn factor(&self, pixel_size: f32) -> f32 {
        pixel_size / self.point_size
    }
}

impl GlyphRasterizer for BoxFont {
    fn point_size(&self) -> f32 {
        self.point_size
    }

    fn glyph_id(&self, ch: char) -> Option<u32> {
        self.glyphs.get(&ch).map(|(id, _)| *id)
    }

    fn ink_bounds(&self, glyph: u32, pixel_size: f32, _smoothing: bool) -> Option<PixelRect> {
        let g = self.by_id.get(&glyph)?;
        let f = self.factor(pixel_size);
        let x0 = (g.x as f32 * f).floor() as i32;
        let y0 = (g.y as f32 * f).floor() as i32;
        let x1 = ((g.x + g.width as i32) as f32 * f).ceil() as i32;
        let y1 = ((g.y + g.height as i32) as f32 * f).ceil() as i32;
        Some(PixelRect::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32))
    }

    fn advance(&self, glyph: u32, pixel_size: f32) -> Option<f32> {
        self.by_id.get(&glyph).map(|g| g.advance * self.factor(pixel_size))
    }

    fn rasterize(
        &self,
        _glyph: u32,
        _pixel_size: f32,
        bounds: PixelRect,
        _smoothing: bool,
    ) -> Option<Vec<u8>> {
        let (w, h) = (bounds.width as usize, bounds.height as usize);
        let mut coverage = vec![BODY; w * h];
        coverage[..w].fill(TOP_ROW);
        Some(coverage)
    }

    fn metrics(&self, pixel_size: f32) -> FontMetrics {
        FontMetrics {
            ascent: pixel_size * 0.8,
            descent: pixel_size * 0.2,
            line_gap: 0.0,
        }
    }
}

/// Shaper with fixed advances, pair kerning, and two-character ligatures.
#[derive(Default)]
pub struct FixedShaper {
    pub advances: HashMap<char, f32>,
    pub kerning: HashMap<(char, char), f32>,
    pub ligatures: Vec<(char, char)>,
    pub calls: usize,
}

impl FixedShaper {
    pub fn new(advances: &[(char, f32)]) -> Self {
        Self { advances: advances.iter().copied().collect(), ..Default::default() }
    }

    pub fn kern(mut self, left: char, right: char, adjust: f32) -> Self {
        self.kerning.insert((left, right), adjust);
        self
    }

    pub fn ligature(mut self, first: char, second: char) -> Self {
        self.ligatures.push((first, second));
        self
    }
}

impl TextShaper for FixedShaper {
    fn shape(&mut self, text: &str, _font: &FontDescription) -> Vec<ShapedGlyph> {
        self.calls += 1;
        let chars: Vec<char> = text.chars().collect();
        let mut glyphs = Vec::new();
        let mut pen = 0.0;
        let mut i = 0;
        while i < chars.len() {
            if i > 0 {
                pen += self.kerning.get(&(chars[i - 1], chars[i])).copied().unwrap_or(0.0);
            }
            let advance_of = |c: char| self.advances.get(&c).copied().unwrap_or(0.0);
            let is_ligature = i + 1 < chars.len() && self.ligatures.contains(&(chars[i], chars[i + 1]));
            let (count, advance) = if is_ligature {
                (2, advance_of(chars[i]) + advance_of(chars[i + 1]))
            } else {
                (1, advance_of(chars[i]))
            };
            glyphs.push(ShapedGlyph { char_index: i, char_count: count, x: pen, advance });
            pen += advance;
            i += count;
        }
        glyphs
    }
}
