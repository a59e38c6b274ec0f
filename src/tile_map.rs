//! Spatial index of terrain tiles keyed by tile-grid coordinate.

use std::collections::HashMap;

use crate::config::{NoiseConfig, TileLayoutConfig};
use crate::error::SculptError;
use crate::noise_field::NoiseField;
use crate::ray::Ray;
use crate::tile::{HeightTile, TerrainTile, TileCoord};

/// Tiles in the 3x3 block around the tile under the cursor, hit tile
/// included. Rebuilt every frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileNeighborhood {
    pub center: Option<TileCoord>,
    /// Existing tiles, row-major (`y` then `x`)
    pub tiles: Vec<TileCoord>,
}

impl TileNeighborhood {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        self.tiles.contains(&coord)
    }

    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles.iter().copied()
    }
}

/// Closest tile hit by the cursor ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorHit {
    pub tile: TileCoord,
    pub distance: f32,
    pub point: [f32; 3],
}

pub struct TileMap<T> {
    tiles: HashMap<TileCoord, T>,
}

impl<T> Default for TileMap<T> {
    fn default() -> Self {
        Self {
            tiles: HashMap::new(),
        }
    }
}

impl<T: HeightTile> TileMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tile at its own grid position, returning any tile it replaced.
    pub fn insert(&mut self, tile: T) -> Option<T> {
        self.tiles.insert(tile.grid_position(), tile)
    }

    pub fn get(&self, coord: TileCoord) -> Option<&T> {
        self.tiles.get(&coord)
    }

    pub fn get_mut(&mut self, coord: TileCoord) -> Option<&mut T> {
        self.tiles.get_mut(&coord)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> Vec<TileCoord> {
        let mut coords: Vec<TileCoord> = self.tiles.keys().copied().collect();
        coords.sort_by_key(|c| (c.y, c.x));
        coords
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TileCoord, &T)> {
        self.tiles.iter()
    }

    /// Existing tiles in the 3x3 block centered on `center`.
    pub fn neighborhood(&self, center: TileCoord) -> TileNeighborhood {
        let mut tiles = Vec::with_capacity(9);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let coord = TileCoord::new(center.x + dx, center.y + dy);
                if self.tiles.contains_key(&coord) {
                    tiles.push(coord);
                }
            }
        }
        TileNeighborhood {
            center: Some(center),
            tiles,
        }
    }

    /// Closest tile intersected by `ray`. Ties keep the first tile in
    /// row-major order.
    pub fn pick(&self, ray: &Ray) -> Option<CursorHit> {
        let mut best: Option<(TileCoord, f32)> = None;
        for coord in self.coords() {
            let Some(tile) = self.tiles.get(&coord) else {
                continue;
            };
            if let Some(distance) = tile.ray_intersection(ray) {
                if best.map_or(true, |(_, lowest)| distance < lowest) {
                    best = Some((coord, distance));
                }
            }
        }

        best.map(|(tile, distance)| CursorHit {
            tile,
            distance,
            point: ray.point_at(distance),
        })
    }

    /// Commit pending edits of the given tiles, each once.
    pub fn flush(&mut self, coords: &[TileCoord]) {
        for coord in coords {
            if let Some(tile) = self.tiles.get_mut(coord) {
                tile.flush();
            }
        }
    }
}

impl TileMap<TerrainTile> {
    /// Build a `columns x rows` block of tiles starting at world origin,
    /// seeded from noise when configured.
    pub fn generate(
        layout: &TileLayoutConfig,
        noise: Option<&NoiseConfig>,
    ) -> Result<Self, SculptError> {
        let field = noise.map(NoiseField::from_config);
        let (stride_x, stride_z) = layout.stride();
        let mut map = Self::new();

        for gy in 0..layout.rows as i32 {
            for gx in 0..layout.columns as i32 {
                let origin = (gx as f32 * stride_x, gy as f32 * stride_z);
                let mut heights = vec![0.0; layout.width * layout.height];
                if let Some(ref field) = field {
                    for y in 0..layout.height {
                        for x in 0..layout.width {
                            let wx = origin.0 + x as f32 * layout.spacing;
                            let wz = origin.1 + y as f32 * layout.spacing;
                            heights[y * layout.width + x] = field.height_at(wx, wz);
                        }
                    }
                }

                let tile = TerrainTile::from_heights(
                    TileCoord::new(gx, gy),
                    origin,
                    layout.spacing,
                    layout.width,
                    layout.height,
                    heights,
                )?
                .with_shared_edges(layout.shared_edges);
                map.insert(tile);
            }
        }

        log::info!(
            "generated {}x{} terrain tiles ({}x{} samples, spacing {})",
            layout.columns,
            layout.rows,
            layout.width,
            layout.height,
            layout.spacing
        );
        Ok(map)
    }
}
