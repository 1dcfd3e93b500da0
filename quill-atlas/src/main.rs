//! quill-atlas: builds a glyph atlas from a font and lays out a line.
//!
//! Writes `atlas.png` and `glyphs.json` to `--out`, prints the caret
//! position table for `--text`, and with `--gpu` uploads both the atlas
//! and the line geometry to a headless `wgpu` device.
//!
//! ```text
//! quill-atlas --font monospace --size 14 --text "Hello" --out target/atlas
//! ```

mod output;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use quill_render::{AtlasTexture, GeometryBuffers, GeometrySlot, GpuContext};
use quill_text::{
    AtlasBitmap, AtlasBuilder, AtlasConfig, CharacterSet, CosmicShaper, FontDescription,
    FontFeatures, GlyphGeometry, Point, SystemFont, TextField,
};

use output::{format_positions, write_json, write_png, GlyphReport};

#[derive(Parser, Debug)]
#[command(name = "quill-atlas", version, about = "Build a glyph atlas and lay out a line of text")]
struct Args {
    /// Font family, or a generic family such as `monospace`.
    #[arg(long, default_value = "monospace")]
    font: String,

    /// PostScript name; takes precedence over `--font`.
    #[arg(long)]
    postscript: Option<String>,

    /// Load this font file instead of an installed font.
    #[arg(long, conflicts_with = "postscript")]
    font_file: Option<PathBuf>,

    /// Point size.
    #[arg(long, default_value_t = 14.0)]
    size: f32,

    /// Rasterization scale (overrides the config file).
    #[arg(long)]
    scale: Option<f32>,

    /// Atlas width and height in pixels (overrides the config file).
    #[arg(long)]
    atlas_size: Option<u32>,

    /// JSON file with atlas settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Characters to pack instead of the default set.
    #[arg(long)]
    chars: Option<String>,

    /// Line to lay out.
    #[arg(long)]
    text: Option<String>,

    /// Shape `--text` with cosmic-text instead of summing advances.
    #[arg(long, requires = "text")]
    shaped: bool,

    #[arg(long)]
    no_ligatures: bool,

    /// Curl straight quotes typed into `--text`.
    #[arg(long)]
    smart_quotes: bool,

    /// Report the caret offset nearest to this x.
    #[arg(long, requires = "text")]
    hit: Option<f32>,

    /// Output directory.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Upload the atlas and geometry to a headless GPU device.
    #[arg(long)]
    gpu: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let config = atlas_config(&args)?;

    let mut description = FontDescription::new(args.font.as_str(), args.size);
    description.postscript_name = args.postscript.clone();
    description.features = FontFeatures {
        ligatures: !args.no_ligatures,
        smart_quotes: args.smart_quotes,
    };

    let font = match &args.font_file {
        Some(path) => SystemFont::from_path(path, &description)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SystemFont::load(&description)
            .with_context(|| format!("loading font {:?}", description.display_name()))?,
    };
    // Report and shape with the face that was actually resolved.
    description.family = font.family_name();

    let charset = args
        .chars
        .as_deref()
        .map(CharacterSet::from)
        .unwrap_or_default();

    let atlas = AtlasBuilder::new(config.clone())
        .build(&font, &charset)
        .context("building atlas")?;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let png_path = args.out.join("atlas.png");
    let json_path = args.out.join("glyphs.json");
    write_png(&atlas.bitmap, &png_path)?;
    write_json(&GlyphReport::new(&description, &config, &atlas), &json_path)?;

    let stats = atlas.stats;
    println!(
        "{}: {} glyphs in {} rows ({} missing, {} did not fit) -> {}, {}",
        description.display_name(),
        stats.placed,
        stats.rows,
        stats.missing,
        stats.overflowed,
        png_path.display(),
        json_path.display(),
    );

    let field = args.text.as_deref().map(|text| {
        let mut field = TextField::new(description.clone(), atlas.glyphs.clone(), Point::default());
        if args.shaped {
            field = field.with_shaper(Box::new(shaper_for(&font)));
        }
        field.insert_str(text);
        field
    });

    if let Some(field) = &field {
        let positions = &field.layout().positions;
        print!("{}", format_positions(field.text(), positions));
        if let Some(x) = args.hit {
            println!("hit {x:.2} -> offset {}", positions.hit_test(x));
        }
    }

    if args.gpu {
        let geometry = field.as_ref().map(TextField::geometry).unwrap_or_default();
        let (bitmap, _) = atlas.into_parts();
        pollster::block_on(upload(bitmap, geometry))?;
    }

    Ok(())
}

/// Shaper pinned to the face the atlas was rasterized from.
fn shaper_for(font: &SystemFont) -> CosmicShaper {
    let mut shaper = CosmicShaper::new();
    let pinned = font
        .font_data()
        .and_then(|data| shaper.pin_font_data(data, font.postscript_name().as_deref()));
    if pinned.is_none() {
        warn!(
            "could not hand {:?} to the shaper, shaping by family name",
            font.family_name()
        );
    }
    shaper
}

/// Config file (or defaults) with command-line overrides applied.
fn atlas_config(args: &Args) -> Result<AtlasConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            AtlasConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => AtlasConfig::default(),
    };
    if let Some(scale) = args.scale {
        config.scale = scale;
    }
    if let Some(size) = args.atlas_size {
        config.size = size;
    }
    config.validate()?;
    Ok(config)
}

async fn upload(bitmap: AtlasBitmap, geometry: GlyphGeometry) -> Result<()> {
    let ctx = GpuContext::new_headless()
        .await
        .context("creating GPU context")?;
    let texture = AtlasTexture::upload(&ctx, bitmap).await?;

    let slot = GeometrySlot::default();
    let version = slot.publish(geometry);
    let snapshot = slot.load();
    let buffers = GeometryBuffers::upload(&ctx.device, &snapshot);

    info!("GPU upload: geometry version {version}");
    println!(
        "gpu: {0}×{0} atlas texture, {1} indices",
        texture.size(),
        buffers.as_ref().map_or(0, GeometryBuffers::index_count),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["quill-atlas"]).unwrap();
        assert_eq!(args.font, "monospace");
        assert_eq!(args.size, 14.0);
        assert_eq!(args.out, PathBuf::from("."));
        assert!(!args.gpu);
        assert_eq!(atlas_config(&args).unwrap(), AtlasConfig::default());
    }

    #[test]
    fn test_overrides_apply_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.json");
        fs::write(&path, r#"{ "size": 1024, "padding": 6 }"#).unwrap();

        let args = Args::try_parse_from([
            "quill-atlas",
            "--config",
            path.to_str().unwrap(),
            "--scale",
            "3",
        ])
        .unwrap();
        let config = atlas_config(&args).unwrap();
        assert_eq!(config.size, 1024);
        assert_eq!(config.padding, 6);
        assert_eq!(config.scale, 3.0);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = Args::try_parse_from(["quill-atlas", "--atlas-size", "0"]).unwrap();
        assert!(atlas_config(&args).is_err());
    }

    #[test]
    fn test_hit_requires_text() {
        assert!(Args::try_parse_from(["quill-atlas", "--hit", "3"]).is_err());
        assert!(Args::try_parse_from(["quill-atlas", "--text", "Hi", "--hit", "3"]).is_ok());
    }

    /// PostScript name of some installed face that covers 'i'.
    fn installed_postscript_name() -> Option<String> {
        font_kit::source::SystemSource::new()
            .all_fonts()
            .ok()?
            .iter()
            .filter_map(|handle| handle.load().ok())
            .filter(|face| face.glyph_for_char('i').is_some_and(|id| id != 0))
            .find_map(|face| face.postscript_name())
    }

    #[test]
    fn test_postscript_face_drives_shaping() {
        let Some(name) = installed_postscript_name() else { return };
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "quill-atlas",
            "--postscript",
            name.as_str(),
            "--chars",
            "i",
            "--text",
            "iiii",
            "--shaped",
            "--out",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        run(args).unwrap();

        let description = FontDescription {
            postscript_name: Some(name),
            ..FontDescription::new("monospace", 14.0)
        };
        let font = SystemFont::load(&description).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("glyphs.json")).unwrap())
                .unwrap();
        assert_eq!(json["font"]["family"], font.family_name());

        let config = AtlasConfig { size: 256, ..Default::default() };
        let atlas = AtlasBuilder::new(config).build(&font, &CharacterSet::from("i")).unwrap();
        let advance = atlas.get('i').unwrap().advance;
        let mut field = TextField::new(description, atlas.glyphs.clone(), Point::default())
            .with_shaper(Box::new(shaper_for(&font)));
        field.insert_str("iiii");
        for (i, x) in field.layout().positions.as_slice().iter().enumerate() {
            let want = advance * i as f32;
            assert!((x - want).abs() < 0.05, "offset {i}: {x} vs {want}");
        }
    }

    #[test]
    fn test_font_file_conflicts_with_postscript() {
        let result = Args::try_parse_from([
            "quill-atlas",
            "--font-file",
            "a.ttf",
            "--postscript",
            "Menlo-Regular",
        ]);
        assert!(result.is_err());
    }
}
