//! Instancing configuration
//!
//! Pool sizing, the dev/prod assertion policy, and the color palette.

use super::{Config, ConfigError};
use crate::render::instancing::palette::{BodyCategory, Color};
use serde::{Deserialize, Serialize};

/// Capacity of every regular instance pool unless configured otherwise
pub const DEFAULT_POOL_CAPACITY: usize = 250;

/// Most colors a single body category may cycle through
const MAX_COLORS_PER_CATEGORY: usize = 4;

/// Top-level settings for the collider instancing core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstancingConfig {
    /// Slots per (shape kind, palette bucket) pool
    pub pool_capacity: usize,

    /// Fail fast on bookkeeping errors (duplicate add, unknown remove)
    pub strict: bool,

    /// Seed for the palette color draw, re-applied on every world reset
    pub palette_seed: u64,

    /// Colors per body category
    pub palette: PaletteConfig,
}

impl Default for InstancingConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            strict: cfg!(debug_assertions),
            palette_seed: 0,
            palette: PaletteConfig::default(),
        }
    }
}

impl Config for InstancingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_capacity == 0 {
            return Err(ConfigError::Invalid("pool_capacity must be at least 1".to_string()));
        }
        self.palette.validate()
    }
}

/// Color table, 1 to 4 colors per body category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Fixed (immovable) bodies
    pub fixed: Vec<Color>,
    /// Kinematic bodies
    pub kinematic: Vec<Color>,
    /// Dynamic bodies
    pub dynamic: Vec<Color>,
    /// Dynamic bodies with continuous collision detection
    pub ccd_enabled: Vec<Color>,
    /// Sensor colliders
    pub sensor: Vec<Color>,
    /// The highlight overlay
    pub highlighted: Vec<Color>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            fixed: vec![Color(0x6E6E6E)],
            kinematic: vec![Color(0xE5A83B)],
            dynamic: vec![Color(0xF3D9B1), Color(0x98C1D9), Color(0x053C5E), Color(0x1F7A8C)],
            ccd_enabled: vec![Color(0xD1495B)],
            sensor: vec![Color(0x7FD17F)],
            highlighted: vec![Color(0xFF0000)],
        }
    }
}

impl PaletteConfig {
    /// Colors configured for a category
    pub fn colors(&self, category: BodyCategory) -> &[Color] {
        match category {
            BodyCategory::Fixed => &self.fixed,
            BodyCategory::Kinematic => &self.kinematic,
            BodyCategory::Dynamic => &self.dynamic,
            BodyCategory::CcdEnabled => &self.ccd_enabled,
            BodyCategory::Sensor => &self.sensor,
            BodyCategory::Highlighted => &self.highlighted,
        }
    }

    /// Every category must have between 1 and 4 colors
    pub fn validate(&self) -> Result<(), ConfigError> {
        for &category in BodyCategory::all() {
            let count = self.colors(category).len();
            if count == 0 || count > MAX_COLORS_PER_CATEGORY {
                return Err(ConfigError::Invalid(format!(
                    "palette for {category} has {count} colors, expected 1..={MAX_COLORS_PER_CATEGORY}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_default_config_is_valid() {
        let config = InstancingConfig::default();
        assert_eq!(config.pool_capacity, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let text = r#"
            pool_capacity = 8
            strict = false
            palette_seed = 42

            [palette]
            dynamic = [0x112233, 0x445566]
        "#;

        let config = InstancingConfig::parse(text, ConfigFormat::Toml).expect("Should parse");
        assert_eq!(config.pool_capacity, 8);
        assert!(!config.strict);
        assert_eq!(config.palette_seed, 42);
        assert_eq!(config.palette.dynamic, vec![Color(0x112233), Color(0x445566)]);
        // Unspecified categories keep their defaults
        assert_eq!(config.palette.fixed, vec![Color(0x6E6E6E)]);
    }

    #[test]
    fn test_ron_render_then_parse() {
        let mut config = InstancingConfig::default();
        config.pool_capacity = 16;
        config.palette.sensor = vec![Color(0x00FF00)];

        let text = config.render(ConfigFormat::Ron).expect("Should render");
        let parsed = InstancingConfig::parse(&text, ConfigFormat::Ron).expect("Should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let result = InstancingConfig::parse("pool_capacity = 0", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_oversized_palette() {
        let text = "[palette]\ndynamic = [1, 2, 3, 4, 5]\n";
        let result = InstancingConfig::parse(text, ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            ConfigFormat::from_path("settings.json"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
