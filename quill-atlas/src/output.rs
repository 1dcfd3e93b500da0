//! Files and listings produced by the atlas tool.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::{Context, Result};
use image::codecs::png::PngEncoder;
use image::GrayImage;
use quill_text::{
    AtlasBitmap, AtlasConfig, AtlasStats, FontDescription, FontMetrics, GlyphAtlas, GlyphInfo,
    PositionTable,
};
use serde::Serialize;

/// Contents of `glyphs.json`: everything needed to draw from `atlas.png`.
#[derive(Debug, Serialize)]
pub struct GlyphReport<'a> {
    pub font: &'a FontDescription,
    pub config: &'a AtlasConfig,
    pub metrics: FontMetrics,
    pub stats: AtlasStats,
    /// Sorted by character for stable output.
    pub glyphs: BTreeMap<char, &'a GlyphInfo>,
}

impl<'a> GlyphReport<'a> {
    pub fn new(font: &'a FontDescription, config: &'a AtlasConfig, atlas: &'a GlyphAtlas) -> Self {
        Self {
            font,
            config,
            metrics: atlas.metrics,
            stats: atlas.stats,
            glyphs: atlas.glyphs.iter().map(|(&ch, info)| (ch, info)).collect(),
        }
    }
}

/// Write the atlas as an 8-bit grayscale PNG.
pub fn write_png(bitmap: &AtlasBitmap, path: &Path) -> Result<()> {
    let size = bitmap.size();
    let image = GrayImage::from_raw(size, size, bitmap.pixels().to_vec())
        .context("atlas bitmap does not match its size")?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    image
        .write_with_encoder(PngEncoder::new(BufWriter::new(file)))
        .with_context(|| format!("encoding {}", path.display()))?;
    Ok(())
}

/// Write `report` as pretty-printed JSON.
pub fn write_json(report: &GlyphReport<'_>, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("serializing {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// One row per caret offset: the character that starts there and its x.
pub fn format_positions(text: &str, table: &PositionTable) -> String {
    let mut out = String::from("offset  char        x\n");
    let mut chars = text.chars();
    for (offset, x) in table.as_slice().iter().enumerate() {
        let label = match chars.next() {
            Some(ch) => format!("{ch:?}"),
            None => "end".to_owned(),
        };
        let _ = writeln!(out, "{offset:>6}  {label:<6} {x:>8.2}");
    }
    out
}
