//! Shaping: kerning-aware pen positions for a line of text.
//!
//! The layout engine asks for shaping through [`Shaping`], chosen per
//! call: either a [`TextShaper`] that knows the font's kerning and
//! ligature tables, or naive summation of the advances stored in the
//! glyph map.
//!
//! [`CosmicShaper`] wraps a `cosmic-text` `FontSystem` and keeps a small
//! LRU of recent results, since the edit field relayouts the whole line
//! on every edit.

use std::num::NonZeroUsize;
use std::sync::Arc;

use cosmic_text::{
    fontdb, Attrs, Buffer, Family, FontSystem, Metrics, Shaping as CosmicShaping, Stretch, Style,
    Weight,
};
use lru::LruCache;

use crate::font::FontDescription;

/// Shaped lines kept per shaper.
const SHAPE_CACHE_CAPACITY: usize = 64;

/// Line height handed to cosmic-text, as a multiple of the font size.
/// Single-line layout never reads it back.
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// One glyph from the shaper, mapped back to the characters it covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapedGlyph {
    /// Index of the first source character (in chars, not bytes).
    pub char_index: usize,
    /// Characters covered: more than one for ligatures.
    pub char_count: usize,
    /// Pen x relative to the start of the line, in points.
    pub x: f32,
    /// Advance in points.
    pub advance: f32,
}

/// A text shaping engine.
pub trait TextShaper {
    /// Shape `text` as a single line, in logical order.
    fn shape(&mut self, text: &str, font: &FontDescription) -> Vec<ShapedGlyph>;
}

/// How a layout pass computes pen positions.
pub enum Shaping<'a> {
    /// Run the shaper over the whole line.
    Shaped {
        shaper: &'a mut dyn TextShaper,
        font: &'a FontDescription,
    },
    /// Sum the advances from the glyph map.
    Naive,
}

impl<'a> Shaping<'a> {
    pub fn shaped(shaper: &'a mut dyn TextShaper, font: &'a FontDescription) -> Self {
        Self::Shaped { shaper, font }
    }

    pub fn is_shaped(&self) -> bool {
        matches!(self, Self::Shaped { .. })
    }
}

// ── cosmic-text ─────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ShapeKey {
    text: String,
    family: String,
    size_bits: u32,
    ligatures: bool,
}

/// Face attributes copied out of the font database, so every line is
/// shaped with the face the atlas was rasterized from.
#[derive(Clone, Debug)]
struct PinnedFace {
    family: String,
    weight: Weight,
    style: Style,
    stretch: Stretch,
}

/// [`TextShaper`] backed by cosmic-text (rustybuzz shaping, system fonts).
pub struct CosmicShaper {
    font_system: FontSystem,
    cache: LruCache<ShapeKey, Vec<ShapedGlyph>>,
    pinned: Option<PinnedFace>,
}

impl CosmicShaper {
    /// Create a shaper with system font discovery.
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    pub fn with_font_system(font_system: FontSystem) -> Self {
        let capacity = NonZeroUsize::new(SHAPE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            font_system,
            cache: LruCache::new(capacity),
            pinned: None,
        }
    }

    /// Load `data` and shape every later line with one of its faces
    /// (the one named `postscript_name`, else the first), ignoring the
    /// family in the [`FontDescription`].
    ///
    /// Returns the family name of the pinned face, or `None` if the data
    /// holds no usable face.
    pub fn pin_font_data(&mut self, data: Vec<u8>, postscript_name: Option<&str>) -> Option<String> {
        let ids = self
            .font_system
            .db_mut()
            .load_font_source(fontdb::Source::Binary(Arc::new(data)));
        let db = self.font_system.db();
        let faces: Vec<_> = ids.iter().filter_map(|&id| db.face(id)).collect();
        let face = postscript_name
            .and_then(|name| faces.iter().find(|face| face.post_script_name == name))
            .or_else(|| faces.first())?;
        let (family, _) = face.families.first()?;

        let pinned = PinnedFace {
            family: family.clone(),
            weight: face.weight,
            style: face.style,
            stretch: face.stretch,
        };
        log::debug!("CosmicShaper: pinned {:?} ({pinned:?})", face.post_script_name);
        let family = pinned.family.clone();
        self.pinned = Some(pinned);
        self.cache.clear();
        Some(family)
    }

    pub fn font_system(&self) -> &FontSystem {
        &self.font_system
    }

    fn shape_uncached(&mut self, text: &str, font: &FontDescription) -> Vec<ShapedGlyph> {
        let size = font.point_size;
        let metrics = Metrics::new(size, size * LINE_HEIGHT_FACTOR);
        let pinned = self.pinned.clone();
        let attrs = match &pinned {
            Some(face) => Attrs::new()
                .family(Family::Name(&face.family))
                .weight(face.weight)
                .style(face.style)
                .stretch(face.stretch),
            None => Attrs::new().family(generic_family(font.family.trim())),
        };
        // Basic shaping maps characters to glyphs one by one: no
        // ligatures, no kerning.
        let mode = if font.features.ligatures {
            CosmicShaping::Advanced
        } else {
            CosmicShaping::Basic
        };

        // cosmic-text splits paragraphs on line breaks and restarts glyph
        // byte offsets per paragraph; keep the line in one piece.
        let line: String = text
            .chars()
            .map(|ch| if is_paragraph_break(ch) { ' ' } else { ch })
            .collect();

        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(&mut self.font_system, &line, attrs, mode);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let char_at_byte = char_index_by_byte(&line);
        let mut glyphs = Vec::new();
        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                let Some(&char_index) = char_at_byte.get(glyph.start) else {
                    continue;
                };
                let char_count = line
                    .get(glyph.start..glyph.end)
                    .map(|s| s.chars().count())
                    .unwrap_or(1)
                    .max(1);
                glyphs.push(ShapedGlyph {
                    char_index,
                    char_count,
                    x: glyph.x,
                    advance: glyph.w,
                });
            }
        }
        glyphs
    }
}

fn generic_family(name: &str) -> Family<'_> {
    match name.to_lowercase().as_str() {
        "sans-serif" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

/// Characters with the Unicode paragraph-separator bidi class.
pub(crate) fn is_paragraph_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{1c}'..='\u{1e}' | '\u{85}' | '\u{2029}')
}

impl Default for CosmicShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextShaper for CosmicShaper {
    fn shape(&mut self, text: &str, font: &FontDescription) -> Vec<ShapedGlyph> {
        let key = ShapeKey {
            text: text.to_owned(),
            family: font.family.clone(),
            size_bits: font.point_size.to_bits(),
            ligatures: font.features.ligatures,
        };
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        let glyphs = self.shape_uncached(text, font);
        self.cache.put(key, glyphs.clone());
        glyphs
    }
}

/// Byte offset → char index; one slot per byte (`len + 1` slots), only
/// char boundaries are meaningful.
fn char_index_by_byte(text: &str) -> Vec<usize> {
    let mut map = vec![0usize; text.len() + 1];
    let mut count = 0;
    for (byte, ch) in text.char_indices() {
        map[byte..byte + ch.len_utf8()].fill(count);
        count += 1;
    }
    map[text.len()] = count;
    map
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedShaper;

    #[test]
    fn test_char_index_by_byte() {
        let map = char_index_by_byte("a€b");
        // 'a' = 1 byte, '€' = 3 bytes, 'b' = 1 byte.
        assert_eq!(map, vec![0, 1, 1, 1, 2, 3]);
        assert_eq!(char_index_by_byte(""), vec![0]);
    }

    #[test]
    fn test_shaping_selector() {
        let mut shaper = FixedShaper::new(&[('a', 5.0)]);
        let font = FontDescription::default();
        assert!(Shaping::shaped(&mut shaper, &font).is_shaped());
        assert!(!Shaping::Naive.is_shaped());
    }

    #[test]
    fn test_fixed_shaper_applies_kerning() {
        let mut shaper = FixedShaper::new(&[('A', 10.0), ('V', 10.0)]).kern('A', 'V', -2.0);
        let glyphs = shaper.shape("AV", &FontDescription::default());
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[1].x, 8.0);
    }

    #[test]
    fn test_cosmic_shaper_positions_are_monotonic() {
        let mut shaper = CosmicShaper::new();
        // Skip gracefully on machines without fonts.
        if shaper.font_system().db().faces().count() == 0 {
            return;
        }
        let font = FontDescription::new("sans-serif", 16.0);
        let glyphs = shaper.shape("Hello", &font);
        assert!(!glyphs.is_empty());
        for pair in glyphs.windows(2) {
            assert!(pair[0].x <= pair[1].x, "{pair:?}");
            assert!(pair[0].char_index < pair[1].char_index);
        }
        let covered: usize = glyphs.iter().map(|g| g.char_count).sum();
        assert_eq!(covered, 5);
    }

    #[test]
    fn test_cosmic_shaper_caches_lines() {
        let mut shaper = CosmicShaper::new();
        if shaper.font_system().db().faces().count() == 0 {
            return;
        }
        let font = FontDescription::new("sans-serif", 16.0);
        let first = shaper.shape("cache me", &font);
        let second = shaper.shape("cache me", &font);
        assert_eq!(first, second);
        assert_eq!(shaper.cache.len(), 1);
    }

    #[test]
    fn test_paragraph_breaks() {
        for ch in ['\n', '\r', '\u{85}', '\u{2029}'] {
            assert!(is_paragraph_break(ch), "{ch:?}");
        }
        assert!(!is_paragraph_break(' '));
        assert!(!is_paragraph_break('\u{2028}'));
    }

    #[test]
    fn test_cosmic_shaper_line_break_keeps_char_indices() {
        let mut shaper = CosmicShaper::new();
        if shaper.font_system().db().faces().count() == 0 {
            return;
        }
        let font = FontDescription::new("sans-serif", 16.0);
        let glyphs = shaper.shape("ab\ncd", &font);
        for pair in glyphs.windows(2) {
            assert!(pair[0].char_index < pair[1].char_index, "{pair:?}");
        }
        assert_eq!(glyphs.iter().map(|g| g.char_count).sum::<usize>(), 5);
        assert_eq!(glyphs.last().map(|g| g.char_index), Some(4));
    }

    #[test]
    fn test_pinned_face_matches_atlas_advances() {
        use crate::font::{GlyphRasterizer, SystemFont};

        // Any installed face will do; select it by PostScript name while
        // the family still says "monospace".
        let Some(font) = font_kit::source::SystemSource::new()
            .all_fonts()
            .unwrap_or_default()
            .iter()
            .filter_map(|handle| handle.load().ok())
            .filter_map(|face| face.postscript_name())
            .find_map(|name| {
                let description = FontDescription {
                    postscript_name: Some(name),
                    ..FontDescription::new("monospace", 16.0)
                };
                SystemFont::load(&description)
                    .ok()
                    .filter(|font| font.glyph_id('i').is_some())
            })
        else {
            return;
        };
        let Some(expected) = font.glyph_id('i').and_then(|id| font.advance(id, 16.0)) else {
            return;
        };
        let Some(data) = font.font_data() else { return };

        let mut shaper = CosmicShaper::new();
        let postscript = font.postscript_name();
        if shaper.pin_font_data(data, postscript.as_deref()).is_none() {
            return;
        }
        let glyphs = shaper.shape("iiii", font.description());
        assert_eq!(glyphs.len(), 4);
        for (i, glyph) in glyphs.iter().enumerate() {
            let want = expected * i as f32;
            assert!((glyph.x - want).abs() < 0.05, "glyph {i}: x {} vs {want}", glyph.x);
        }
    }

    #[test]
    fn test_pin_rejects_garbage() {
        let mut shaper = CosmicShaper::new();
        assert_eq!(shaper.pin_font_data(vec![0u8; 16], None), None);
        assert!(shaper.pinned.is_none());
    }

    #[test]
    fn test_cosmic_shaper_empty_text() {
        let mut shaper = CosmicShaper::new();
        let glyphs = shaper.shape("", &FontDescription::default());
        assert!(glyphs.is_empty());
    }
}
