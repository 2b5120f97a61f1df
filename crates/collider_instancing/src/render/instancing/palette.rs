//! Category palette
//!
//! Colors are grouped by the motion category of the body owning a collider.
//! A category may cycle through up to four colors; which one a new collider
//! gets is drawn from a caller-owned random source so that runs with the same
//! seed reproduce the same picture.

use crate::config::PaletteConfig;
use crate::physics::{BodyMotion, ColliderView};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Packed `0xRRGGBB` color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    /// Linear RGBA in `[0, 1]`, fully opaque
    pub fn rgba(self) -> [f32; 4] {
        let channel = |shift: u32| ((self.0 >> shift) & 0xFF) as f32 / 255.0;
        [channel(16), channel(8), channel(0), 1.0]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0 & 0x00FF_FFFF)
    }
}

/// Color category of a collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyCategory {
    /// Immovable body or free-standing collider
    Fixed,
    /// Externally driven body
    Kinematic,
    /// Solver-driven body
    Dynamic,
    /// Solver-driven body with continuous collision detection
    CcdEnabled,
    /// Sensor collider
    Sensor,
    /// Highlight overlay, never assigned at registration
    Highlighted,
}

impl BodyCategory {
    /// Get all categories
    pub fn all() -> &'static [BodyCategory] {
        &[
            BodyCategory::Fixed,
            BodyCategory::Kinematic,
            BodyCategory::Dynamic,
            BodyCategory::CcdEnabled,
            BodyCategory::Sensor,
            BodyCategory::Highlighted,
        ]
    }

    /// Category from a body motion type and sensor flag
    pub fn from_motion(body: Option<BodyMotion>, is_sensor: bool) -> Self {
        if is_sensor {
            return BodyCategory::Sensor;
        }
        match body {
            None | Some(BodyMotion::Fixed) => BodyCategory::Fixed,
            Some(BodyMotion::KinematicPositionBased | BodyMotion::KinematicVelocityBased) => {
                BodyCategory::Kinematic
            }
            Some(BodyMotion::Dynamic { ccd: true }) => BodyCategory::CcdEnabled,
            Some(BodyMotion::Dynamic { ccd: false }) => BodyCategory::Dynamic,
        }
    }

    /// Category of a live collider, as seen when it is first registered
    pub fn of(view: &ColliderView<'_>) -> Self {
        Self::from_motion(view.body, view.is_sensor)
    }

    /// Fixed and kinematic geometry is never highlighted
    pub fn is_highlightable(self) -> bool {
        !matches!(self, BodyCategory::Fixed | BodyCategory::Kinematic)
    }
}

impl fmt::Display for BodyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A category plus an index into that category's color list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PaletteBucket {
    /// Body category
    pub category: BodyCategory,
    /// Index into the category's colors
    pub color_index: u8,
}

impl PaletteBucket {
    /// Create a bucket
    pub const fn new(category: BodyCategory, color_index: u8) -> Self {
        Self { category, color_index }
    }

    /// The single highlight bucket
    pub const fn highlighted() -> Self {
        Self::new(BodyCategory::Highlighted, 0)
    }
}

impl fmt::Display for PaletteBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.category, self.color_index)
    }
}

/// Color lookup and bucket assignment
#[derive(Debug, Clone)]
pub struct Palette {
    colors: PaletteConfig,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(PaletteConfig::default())
    }
}

impl Palette {
    /// Build from a validated palette table
    pub fn new(colors: PaletteConfig) -> Self {
        Self { colors }
    }

    /// Number of colors available to a category
    pub fn color_count(&self, category: BodyCategory) -> usize {
        self.colors.colors(category).len()
    }

    /// Pick a bucket for a newly registered collider
    ///
    /// Single-color categories do not consume randomness, so adding a fixed
    /// body does not shift the colors of the dynamic bodies that follow.
    pub fn bucket_for<R: Rng>(&self, category: BodyCategory, rng: &mut R) -> PaletteBucket {
        let count = self.color_count(category);
        let color_index = if count > 1 { rng.gen_range(0..count) } else { 0 };
        PaletteBucket::new(category, u8::try_from(color_index).unwrap_or(0))
    }

    /// Resolve a bucket to its color
    ///
    /// Out-of-range indices wrap, so a bucket never fails to resolve.
    pub fn color(&self, bucket: PaletteBucket) -> Color {
        let colors = self.colors.colors(bucket.category);
        if colors.is_empty() {
            return Color(0xFF00FF);
        }
        colors[usize::from(bucket.color_index) % colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_category_from_motion() {
        assert_eq!(BodyCategory::from_motion(None, false), BodyCategory::Fixed);
        assert_eq!(BodyCategory::from_motion(Some(BodyMotion::Fixed), false), BodyCategory::Fixed);
        assert_eq!(
            BodyCategory::from_motion(Some(BodyMotion::KinematicVelocityBased), false),
            BodyCategory::Kinematic
        );
        assert_eq!(
            BodyCategory::from_motion(Some(BodyMotion::Dynamic { ccd: true }), false),
            BodyCategory::CcdEnabled
        );
        assert_eq!(
            BodyCategory::from_motion(Some(BodyMotion::Dynamic { ccd: false }), true),
            BodyCategory::Sensor
        );
    }

    #[test]
    fn test_single_color_category_consumes_no_randomness() {
        let palette = Palette::default();
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);

        assert_eq!(palette.bucket_for(BodyCategory::Fixed, &mut a), PaletteBucket::new(BodyCategory::Fixed, 0));
        assert_eq!(
            palette.bucket_for(BodyCategory::Dynamic, &mut a),
            palette.bucket_for(BodyCategory::Dynamic, &mut b)
        );
    }

    #[test]
    fn test_same_seed_same_assignment() {
        let palette = Palette::default();
        let draw = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..32)
                .map(|_| palette.bucket_for(BodyCategory::Dynamic, &mut rng).color_index)
                .collect::<Vec<_>>()
        };

        let first = draw(1234);
        assert_eq!(first, draw(1234));
        assert!(first.iter().all(|&index| index < 4));
        // 32 draws over 4 colors should not all land on one
        assert!(first.iter().any(|&index| index != first[0]));
    }

    #[test]
    fn test_color_resolution() {
        let palette = Palette::default();
        assert_eq!(palette.color(PaletteBucket::highlighted()), Color(0xFF0000));
        assert_eq!(palette.color(PaletteBucket::new(BodyCategory::Dynamic, 1)), Color(0x98C1D9));
        assert_eq!(Color(0xFF8000).rgba(), [1.0, 128.0 / 255.0, 0.0, 1.0]);
        assert_eq!(Color(0x0A0B0C).to_string(), "#0A0B0C");
    }
}
