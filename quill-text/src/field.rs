//! Single-line edit field.
//!
//! Holds the string, the insertion offset, and the most recent layout.
//! Every mutation relayouts the whole line, which keeps the quads and
//! the position table in lockstep; layout is linear in the line length,
//! so this stays well inside a frame.

use crate::atlas::GlyphMap;
use crate::font::{FontDescription, FontMetrics};
use crate::layout::{GlyphGeometry, LayoutEngine, Point, TextLayout};
use crate::shaping::{is_paragraph_break, Shaping, TextShaper};

/// Caret rectangle in render space (y up).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Caret width in points.
const CURSOR_WIDTH: f32 = 1.0;

pub struct TextField {
    text: String,
    char_count: usize,
    /// Insertion offset in characters, always in `0..=char_count`.
    insertion: usize,
    origin: Point,
    font: FontDescription,
    glyphs: GlyphMap,
    shaper: Option<Box<dyn TextShaper>>,
    engine: LayoutEngine,
    layout: TextLayout,
}

impl TextField {
    /// Empty field using naive advances from `glyphs`.
    pub fn new(font: FontDescription, glyphs: GlyphMap, origin: Point) -> Self {
        Self {
            text: String::new(),
            char_count: 0,
            insertion: 0,
            origin,
            font,
            glyphs,
            shaper: None,
            engine: LayoutEngine::default(),
            layout: TextLayout::empty(origin),
        }
    }

    /// Shape with `shaper` instead of summing advances.
    pub fn with_shaper(mut self, shaper: Box<dyn TextShaper>) -> Self {
        self.shaper = Some(shaper);
        self.relayout();
        self
    }

    pub fn with_engine(mut self, engine: LayoutEngine) -> Self {
        self.engine = engine;
        self.relayout();
        self
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn insertion(&self) -> usize {
        self.insertion
    }

    pub fn layout(&self) -> &TextLayout {
        &self.layout
    }

    pub fn font(&self) -> &FontDescription {
        &self.font
    }

    pub fn geometry(&self) -> GlyphGeometry {
        self.layout.to_buffers()
    }

    /// Caret x for the current insertion offset.
    pub fn cursor_x(&self) -> f32 {
        self.layout.positions.cursor_x(self.insertion)
    }

    /// Caret spanning the font's ascent and descent around the baseline.
    pub fn cursor_rect(&self, metrics: &FontMetrics) -> CursorRect {
        CursorRect {
            x: self.cursor_x(),
            y: self.origin.y - metrics.descent,
            width: CURSOR_WIDTH,
            height: metrics.ascent + metrics.descent,
        }
    }

    // ── Font changes ────────────────────────────────────────────────

    /// Swap in the glyph map from a new atlas build.
    pub fn set_glyphs(&mut self, font: FontDescription, glyphs: GlyphMap) {
        self.font = font;
        self.glyphs = glyphs;
        self.relayout();
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
        self.relayout();
    }

    // ── Editing ─────────────────────────────────────────────────────

    /// Replace the whole text and move the caret to the end. Line breaks
    /// are dropped.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.chars().filter(|&ch| !is_paragraph_break(ch)).collect();
        self.char_count = self.text.chars().count();
        self.insertion = self.char_count;
        self.relayout();
    }

    /// Insert at the caret and move the caret past the insertion. Line
    /// breaks are dropped.
    pub fn insert_str(&mut self, s: &str) {
        let byte = self.byte_offset(self.insertion);
        let smart_quotes = self.font.features.smart_quotes;
        let mut prev = self.text[..byte].chars().next_back();
        let inserted: String = s
            .chars()
            .filter(|&ch| !is_paragraph_break(ch))
            .map(|ch| {
                let out = if smart_quotes { smart_quote(prev, ch) } else { ch };
                prev = Some(out);
                out
            })
            .collect();
        if inserted.is_empty() {
            return;
        }
        let added = inserted.chars().count();
        self.text.insert_str(byte, &inserted);
        self.char_count += added;
        self.insertion += added;
        self.relayout();
    }

    /// Delete the character before the caret (backspace).
    pub fn delete_backward(&mut self) -> bool {
        if self.insertion == 0 {
            return false;
        }
        self.insertion -= 1;
        self.remove_at(self.insertion);
        true
    }

    /// Delete the character after the caret.
    pub fn delete_forward(&mut self) -> bool {
        if self.insertion >= self.char_count {
            return false;
        }
        self.remove_at(self.insertion);
        true
    }

    // ── Caret movement ──────────────────────────────────────────────

    pub fn set_insertion(&mut self, offset: usize) {
        self.insertion = offset.min(self.char_count);
    }

    pub fn move_left(&mut self) {
        self.insertion = self.insertion.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.set_insertion(self.insertion + 1);
    }

    pub fn move_to_start(&mut self) {
        self.insertion = 0;
    }

    pub fn move_to_end(&mut self) {
        self.insertion = self.char_count;
    }

    /// Place the caret at the insertion point nearest `x`.
    pub fn click(&mut self, x: f32) -> usize {
        self.insertion = self.layout.positions.hit_test(x).min(self.char_count);
        self.insertion
    }

    // ── Internals ───────────────────────────────────────────────────

    fn remove_at(&mut self, offset: usize) {
        let byte = self.byte_offset(offset);
        self.text.remove(byte);
        self.char_count -= 1;
        self.relayout();
    }

    fn byte_offset(&self, offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(offset)
            .map(|(byte, _)| byte)
            .unwrap_or(self.text.len())
    }

    fn relayout(&mut self) {
        let shaping = match self.shaper.as_deref_mut() {
            Some(shaper) => Shaping::shaped(shaper, &self.font),
            None => Shaping::Naive,
        };
        self.layout = self.engine.layout(&self.text, self.origin, &self.glyphs, shaping);
    }
}

/// Typographic replacement for a straight quote typed after `prev`.
///
/// A quote opens at the start of the text, after whitespace, or after an
/// opening bracket or dash; otherwise it closes (which also covers
/// apostrophes inside words).
pub fn smart_quote(prev: Option<char>, ch: char) -> char {
    let opens = match prev {
        None => true,
        Some(p) => p.is_whitespace() || matches!(p, '(' | '[' | '{' | '—' | '–' | '“' | '‘'),
    };
    match (ch, opens) {
        ('"', true) => '“',
        ('"', false) => '”',
        ('\'', true) => '‘',
        ('\'', false) => '’',
        _ => ch,
    }
}

// ===================================================================
// Tests
// ===================================================================
