//! Layout: places one quad per visible character and flattens quads
//! into vertex/index buffers.
//!
//! Both shaping modes first produce a [`PositionTable`]; quads are then
//! placed at `positions[i] + bounds.min_x`, so caret positions and the
//! drawn glyphs can never disagree.
//!
//! ## Quad layout (render space, y up)
//!
//! ```text
//!   3 ─────── 2      v_min   (atlas row nearest 0)
//!   │       ╱ │
//!   │     ╱   │
//!   │   ╱     │
//!   0 ─────── 1      v_max
//!   ▲ pen_x + min_x, baseline + min_y
//! ```
//!
//! Triangles are `(0, 1, 2)` and `(2, 3, 0)`, counter-clockwise.

use serde::{Deserialize, Serialize};

use crate::atlas::{GlyphInfo, GlyphMap};
use crate::config::LayoutConfig;
use crate::positions::PositionTable;
use crate::shaping::{ShapedGlyph, Shaping};

/// Indices per quad (two triangles).
pub const INDICES_PER_QUAD: usize = 6;

/// Quads addressable with 16-bit indices.
pub const MAX_QUADS: usize = (u16::MAX as usize + 1) / 4;

/// Floats per vertex: `[x, y, u, v]`.
pub const FLOATS_PER_VERTEX: usize = 4;

/// Render-space point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One corner of a glyph quad.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

/// A textured quad for one character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextQuad {
    pub character: char,
    /// Index of the character in the laid-out string.
    pub char_index: usize,
    /// Bottom-left, bottom-right, top-right, top-left.
    pub vertices: [QuadVertex; 4],
}

impl TextQuad {
    /// Build the quad for `info` with its origin at `(pen_x, baseline_y)`.
    ///
    /// The quad is grown by `texture_expansion` on every side so the
    /// geometry covers exactly the (expanded) UV rect.
    pub fn new(info: &GlyphInfo, char_index: usize, pen_x: f32, baseline_y: f32) -> Self {
        let e = info.texture_expansion;
        let x0 = pen_x + info.bounds.min_x - e;
        let y0 = baseline_y + info.bounds.min_y - e;
        let x1 = pen_x + info.bounds.max_x() + e;
        let y1 = baseline_y + info.bounds.max_y() + e;
        let uv = info.texture_rect;
        // Atlas rows grow downward, render y grows upward: the bottom
        // edge samples v_max.
        let vertices = [
            QuadVertex { position: [x0, y0], uv: [uv.u_min, uv.v_max] },
            QuadVertex { position: [x1, y0], uv: [uv.u_max, uv.v_max] },
            QuadVertex { position: [x1, y1], uv: [uv.u_max, uv.v_min] },
            QuadVertex { position: [x0, y1], uv: [uv.u_min, uv.v_min] },
        ];
        Self {
            character: info.character,
            char_index,
            vertices,
        }
    }

    pub fn bottom_left(&self) -> QuadVertex {
        self.vertices[0]
    }

    pub fn top_right(&self) -> QuadVertex {
        self.vertices[2]
    }
}

/// Output of one layout pass.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    pub quads: Vec<TextQuad>,
    pub positions: PositionTable,
}

impl TextLayout {
    pub fn empty(origin: Point) -> Self {
        Self {
            quads: Vec::new(),
            positions: PositionTable::empty(origin.x),
        }
    }

    pub fn to_buffers(&self) -> GlyphGeometry {
        to_buffers(&self.quads)
    }
}

/// Flat GPU-ready buffers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphGeometry {
    /// `[x, y, u, v]` per vertex, four vertices per quad.
    pub vertices: Vec<f32>,
    /// Six indices per quad.
    pub indices: Vec<u16>,
}

impl GlyphGeometry {
    pub fn quad_count(&self) -> usize {
        self.indices.len() / INDICES_PER_QUAD
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Flatten quads into interleaved vertices and u16 indices.
///
/// Quads beyond [`MAX_QUADS`] cannot be indexed with u16 and are dropped.
pub fn to_buffers(quads: &[TextQuad]) -> GlyphGeometry {
    if quads.len() > MAX_QUADS {
        log::warn!(
            "Layout: {} quads exceed the 16-bit index range, drawing the first {}",
            quads.len(),
            MAX_QUADS
        );
    }
    let quads = &quads[..quads.len().min(MAX_QUADS)];

    let mut vertices = Vec::with_capacity(quads.len() * 4 * FLOATS_PER_VERTEX);
    let mut indices = Vec::with_capacity(quads.len() * INDICES_PER_QUAD);
    for (q, quad) in quads.iter().enumerate() {
        for v in &quad.vertices {
            vertices.extend_from_slice(&[v.position[0], v.position[1], v.uv[0], v.uv[1]]);
        }
        let base = (q * 4) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    GlyphGeometry { vertices, indices }
}

// ── Engine ──────────────────────────────────────────────────────────

/// Lays out single lines against a glyph map.
#[derive(Clone, Debug, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out `text` with its baseline starting at `origin`.
    pub fn layout(
        &self,
        text: &str,
        origin: Point,
        glyphs: &GlyphMap,
        shaping: Shaping<'_>,
    ) -> TextLayout {
        if text.is_empty() {
            return TextLayout::empty(origin);
        }
        let chars: Vec<char> = text.chars().collect();

        let positions = match shaping {
            Shaping::Shaped { shaper, font } => {
                let shaped = shaper.shape(text, font);
                shaped_positions(&shaped, chars.len(), origin.x)
            }
            Shaping::Naive => self.naive_positions(&chars, glyphs, origin.x),
        };

        let quads = chars
            .iter()
            .enumerate()
            .filter_map(|(i, ch)| {
                let info = glyphs.get(ch)?;
                if info.bounds.is_empty() {
                    return None;
                }
                Some(TextQuad::new(info, i, positions.cursor_x(i), origin.y))
            })
            .collect();

        TextLayout { quads, positions }
    }

    fn naive_positions(&self, chars: &[char], glyphs: &GlyphMap, origin_x: f32) -> PositionTable {
        let mut positions = Vec::with_capacity(chars.len() + 1);
        let mut pen = origin_x;
        for ch in chars {
            positions.push(pen);
            pen += glyphs
                .get(ch)
                .map(|info| info.advance)
                .unwrap_or(self.config.missing_advance);
        }
        positions.push(pen);
        PositionTable::from_positions(origin_x, positions)
    }
}

/// Positions from shaper output. Characters inside a ligature split the
/// cluster advance evenly; characters the shaper dropped inherit the
/// previous boundary.
fn shaped_positions(shaped: &[ShapedGlyph], char_count: usize, origin_x: f32) -> PositionTable {
    let mut slots: Vec<Option<f32>> = vec![None; char_count + 1];
    let mut end = 0.0f32;
    for glyph in shaped {
        let count = glyph.char_count.max(1);
        for k in 0..count {
            let Some(slot) = slots.get_mut(glyph.char_index + k) else {
                break;
            };
            if slot.is_none() {
                *slot = Some(glyph.x + glyph.advance * k as f32 / count as f32);
            }
        }
        end = end.max(glyph.x + glyph.advance);
    }
    slots[char_count] = Some(end);

    let mut last = 0.0;
    let positions = slots
        .into_iter()
        .map(|slot| {
            let x = slot.unwrap_or(last);
            last = x;
            origin_x + x
        })
        .collect();
    PositionTable::from_positions(origin_x, positions)
}

// ===================================================================
// Tests
// ===================================================================
