//! # quill-text
//!
//! Text-rendering core for the Quill editor. Turns a font and a string
//! into GPU-ready geometry plus a packed glyph texture, and keeps the
//! offset → x-position table used for caret placement and click
//! hit-testing.
//!
//! ## Architecture
//!
//! ```text
//! FontDescription ──► SystemFont (font-kit)
//!                          │
//!                          ▼
//! AtlasBuilder::build(font, CharacterSet) ──► GlyphAtlas { AtlasBitmap, GlyphMap }
//!                                                              │
//!        ┌─────────────────────────────────────────────────────┘
//!        ▼
//! LayoutEngine::layout(text, origin, &GlyphMap, Shaping)
//!        │                         │
//!        ▼                         ▼
//!  Vec<TextQuad> ──► to_buffers   PositionTable ──► cursor_x / hit_test
//! ```
//!
//! - **`atlas`**: shelf packing, glyph rasterization, `GlyphInfo` records.
//! - **`charset`**: ordered, duplicate-free character sets.
//! - **`config`**: atlas and layout tunables (serde-loadable).
//! - **`font`**: font descriptions and the rasterizer capability.
//! - **`shaping`**: kerning-aware shaping through `cosmic-text`.
//! - **`layout`**: quads, vertex/index buffers.
//! - **`positions`**: caret positions and hit-testing.
//! - **`field`**: single-line edit field that relayouts on every mutation.

pub mod atlas;
pub mod charset;
pub mod config;
pub mod field;
pub mod font;
pub mod layout;
pub mod positions;
pub mod shaping;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for ergonomic use.
pub use atlas::{
    AtlasBitmap, AtlasBuilder, AtlasError, AtlasRect, AtlasStats, GlyphAtlas, GlyphBounds,
    GlyphInfo, GlyphMap, UvRect,
};
pub use charset::CharacterSet;
pub use config::{AtlasConfig, LayoutConfig};
pub use field::{smart_quote, CursorRect, TextField};
pub use font::{
    FontDescription, FontError, FontFeatures, FontMetrics, GlyphRasterizer, PixelRect, SystemFont,
};
pub use layout::{to_buffers, GlyphGeometry, LayoutEngine, Point, QuadVertex, TextLayout, TextQuad};
pub use positions::PositionTable;
pub use shaping::{CosmicShaper, ShapedGlyph, Shaping, TextShaper};
