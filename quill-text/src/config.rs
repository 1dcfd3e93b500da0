//! Build-time tunables for the atlas builder and the layout engine.
//!
//! Both structs deserialize from JSON with every field optional, so a
//! config file only needs to mention the values it overrides:
//!
//! ```json
//! { "size": 2048, "scale": 3.0 }
//! ```

use serde::{Deserialize, Serialize};

use crate::atlas::AtlasError;

/// Default atlas edge length in pixels.
pub const DEFAULT_ATLAS_SIZE: u32 = 4096;

/// Default horizontal advance for characters missing from the glyph map.
pub const DEFAULT_MISSING_ADVANCE: f32 = 10.0;

// ── Atlas config ────────────────────────────────────────────────────

/// Parameters for [`AtlasBuilder`](crate::atlas::AtlasBuilder).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Atlas width = height in pixels.
    pub size: u32,
    /// Rasterization magnification. Glyphs are drawn at
    /// `point_size * scale` and every stored metric is divided back.
    pub scale: f32,
    /// Gap around each glyph cell, in atlas pixels.
    pub padding: u32,
    /// Margin added to each UV rect on all four sides, in atlas pixels.
    pub expansion: f32,
    /// Grayscale antialiasing while rasterizing. Off by default: the
    /// shader applies its own edge treatment.
    pub smoothing: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_ATLAS_SIZE,
            scale: 2.0,
            padding: 4,
            expansion: 1.0,
            smoothing: false,
        }
    }
}

impl AtlasConfig {
    /// Parse a (partial) config from JSON.
    pub fn from_json(json: &str) -> Result<Self, AtlasError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AtlasError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the packer cannot honor.
    pub fn validate(&self) -> Result<(), AtlasError> {
        if self.size == 0 {
            return Err(AtlasError::InvalidConfig("atlas size must be non-zero".into()));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(AtlasError::InvalidConfig(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }
        if !self.expansion.is_finite() || self.expansion < 0.0 {
            return Err(AtlasError::InvalidConfig(format!(
                "expansion must be non-negative, got {}",
                self.expansion
            )));
        }
        // The expanded UV rect must stay inside the padded cell.
        if (self.padding as f32) < self.expansion * 2.0 {
            return Err(AtlasError::InvalidConfig(format!(
                "padding {} is smaller than twice the expansion {}",
                self.padding, self.expansion
            )));
        }
        // A padded cell must leave room for at least one pixel of ink.
        if self.padding.checked_mul(2).map_or(true, |both| both >= self.size) {
            return Err(AtlasError::InvalidConfig(format!(
                "padding {} leaves no room in a {}px atlas",
                self.padding, self.size
            )));
        }
        Ok(())
    }
}

// ── Layout config ───────────────────────────────────────────────────

/// Parameters for [`LayoutEngine`](crate::layout::LayoutEngine).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Pen advance used for characters that have no glyph in the map
    /// (naive mode only; the shaper reports its own advances).
    pub missing_advance: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            missing_advance: DEFAULT_MISSING_ADVANCE,
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AtlasConfig::default();
        assert_eq!(config.size, 4096);
        assert_eq!(config.scale, 2.0);
        assert_eq!(config.padding, 4);
        assert!(!config.smoothing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AtlasConfig::from_json(r#"{ "size": 1024, "smoothing": true }"#).unwrap();
        assert_eq!(config.size, 1024);
        assert!(config.smoothing);
        assert_eq!(config.padding, 4);
        assert_eq!(config.expansion, 1.0);
    }

    #[test]
    fn test_rejects_zero_size() {
        let config = AtlasConfig { size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(AtlasError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_scale() {
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = AtlasConfig { scale, ..Default::default() };
            assert!(config.validate().is_err(), "scale {scale} should be rejected");
        }
    }

    #[test]
    fn test_rejects_padding_below_expansion() {
        let config = AtlasConfig { padding: 1, expansion: 1.0, ..Default::default() };
        assert!(config.validate().is_err());
        let config = AtlasConfig { padding: 2, expansion: 1.0, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_padding_that_fills_atlas() {
        let config = AtlasConfig { size: 64, padding: 32, ..Default::default() };
        assert!(config.validate().is_err());
        let config = AtlasConfig { size: 64, padding: 31, ..Default::default() };
        assert!(config.validate().is_ok());
        // 2 * padding would overflow u32.
        let config = AtlasConfig { size: 64, padding: u32::MAX / 2 + 1, ..Default::default() };
        assert!(matches!(config.validate(), Err(AtlasError::InvalidConfig(_))));
        assert!(AtlasConfig::from_json(r#"{ "padding": 4294967295 }"#).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            AtlasConfig::from_json("{ size: "),
            Err(AtlasError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_layout_config_default() {
        let config: LayoutConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.missing_advance, 10.0);
    }
}
