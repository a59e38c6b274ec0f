//! Brush sampling: the accumulate half of a tool pass.
//!
//! Walks the square bounding the brush circle at unit world step, maps every
//! point into each neighborhood tile, and records the snapped grid cell with
//! its falloff weight. Heights are only read here; tools write afterwards.

use std::collections::HashSet;

use crate::brush::falloff;
use crate::tile::{HeightTile, TileCoord, TileIndex};
use crate::tile_map::{TileMap, TileNeighborhood};

/// One affected grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushSample {
    pub index: TileIndex,
    pub weight: f32,
}

/// Samples of one tile plus the sum of their pre-edit heights.
#[derive(Clone, Debug, PartialEq)]
pub struct TileSamples {
    pub coord: TileCoord,
    pub samples: Vec<BrushSample>,
    pub height_sum: f32,
}

impl TileSamples {
    fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            samples: Vec::new(),
            height_sum: 0.0,
        }
    }

    /// Mean pre-edit height, `None` for a tile without samples.
    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.height_sum / self.samples.len() as f32)
    }
}

/// Immutable result of one brush pass, in neighborhood order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBatch {
    pub tiles: Vec<TileSamples>,
}

impl SampleBatch {
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Total samples across all tiles.
    pub fn sample_count(&self) -> usize {
        self.tiles.iter().map(|t| t.samples.len()).sum()
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&TileSamples> {
        self.tiles.iter().find(|t| t.coord == coord)
    }

    /// Pre-edit average of the first tile with samples, in neighborhood order.
    pub fn leading_average(&self) -> Option<f32> {
        self.tiles.first().and_then(TileSamples::average)
    }
}

/// Sample the brush circle at `center` (world XZ) across the neighborhood.
/// Each grid cell is recorded at most once.
pub fn sample_brush<T: HeightTile>(
    map: &TileMap<T>,
    neighborhood: &TileNeighborhood,
    center: (f32, f32),
    radius: f32,
) -> SampleBatch {
    let (cx, cy) = center;
    let mut per_tile: Vec<TileSamples> = neighborhood.iter().map(TileSamples::new).collect();
    let mut seen: Vec<HashSet<TileIndex>> = vec![HashSet::new(); per_tile.len()];

    let mut i = 0u32;
    loop {
        let x = cx - radius + i as f32;
        if !(x < cx + radius) {
            break;
        }

        let mut j = 0u32;
        loop {
            let y = cy - radius + j as f32;
            if !(y < cy + radius) {
                break;
            }

            for (slot, entry) in per_tile.iter_mut().enumerate() {
                let Some(tile) = map.get(entry.coord) else {
                    continue;
                };
                let Some(index) = tile.world_to_index(x, y) else {
                    continue;
                };
                let (sx, sy) = tile.index_to_world(index);
                let distance = ((sx - cx).powi(2) + (sy - cy).powi(2)).sqrt();
                let Some(weight) = falloff(distance, radius) else {
                    continue;
                };
                if !seen[slot].insert(index) {
                    continue;
                }
                let Some(height) = tile.height_at(index) else {
                    continue;
                };

                entry.height_sum += height;
                entry.samples.push(BrushSample { index, weight });
            }
            j += 1;
        }
        i += 1;
    }

    per_tile.retain(|t| !t.samples.is_empty());
    log::trace!(
        "brush pass at ({cx:.2}, {cy:.2}) r={radius:.2}: {} samples in {} tiles",
        per_tile.iter().map(|t| t.samples.len()).sum::<usize>(),
        per_tile.len()
    );
    SampleBatch { tiles: per_tile }
}
