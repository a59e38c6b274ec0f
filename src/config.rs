//! Sculpt configuration: brush defaults, tile layout and optional noise seeding.
//!
//! Loaded from TOML; every table and field is optional and falls back to the
//! editor defaults below.

use std::path::Path;

use serde::Deserialize;

use crate::brush::BrushTool;
use crate::error::SculptError;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SculptConfig {
    pub brush: BrushConfig,
    pub tiles: TileLayoutConfig,
    pub noise: Option<NoiseConfig>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BrushConfig {
    /// Tool active when a session starts
    pub tool: BrushTool,
    /// Brush radius in world units
    pub radius: f32,
    /// Raise/lower rate in height units per second at full falloff
    pub strength: f32,
    /// Radius change per second while a radius key is held
    pub radius_rate: f32,
    /// Floor for key-driven radius shrinking
    pub min_radius: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            tool: BrushTool::Raise,
            radius: 5.0,
            strength: 40.0,
            radius_rate: 10.0,
            min_radius: 0.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TileLayoutConfig {
    /// Tiles along world X
    pub columns: u32,
    /// Tiles along world Z
    pub rows: u32,
    /// Samples per tile row
    pub width: usize,
    /// Rows per tile
    pub height: usize,
    pub spacing: f32,
    /// Neighbouring tiles repeat each other's border samples
    pub shared_edges: bool,
}

impl Default for TileLayoutConfig {
    fn default() -> Self {
        Self {
            columns: 2,
            rows: 2,
            width: 33,
            height: 33,
            spacing: 1.0,
            shared_edges: true,
        }
    }
}

impl TileLayoutConfig {
    /// Largest radius whose circle stays inside the 3x3 block of tiles
    /// around the one under the cursor.
    pub fn max_brush_radius(&self) -> f32 {
        let (x, z) = self.stride();
        x.min(z)
    }

    /// World distance between the origins of adjacent tiles along (X, Z).
    pub fn stride(&self) -> (f32, f32) {
        if self.shared_edges {
            (
                self.width.saturating_sub(1) as f32 * self.spacing,
                self.height.saturating_sub(1) as f32 * self.spacing,
            )
        } else {
            (
                self.width as f32 * self.spacing,
                self.height as f32 * self.spacing,
            )
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    pub seed: u32,
    pub octaves: usize,
    pub frequency: f32,
    pub amplitude: f32,
    pub height_offset: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 4,
            frequency: 0.02,
            amplitude: 8.0,
            height_offset: 0.0,
        }
    }
}

impl SculptConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, SculptError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, SculptError> {
        let s = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&s)?;
        log::info!("loaded sculpt config from {}", path.display());
        Ok(config)
    }
}
