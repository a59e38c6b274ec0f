//! Cross-tile consistency: kernel lookups that leave the owning tile and the
//! seam partners that must receive the same height as a cell.

use crate::tile::{HeightTile, TileCoord, TileIndex};
use crate::tile_map::{TileMap, TileNeighborhood};

/// A grid cell in a specific tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCell {
    pub tile: TileCoord,
    pub index: TileIndex,
}

/// Result of a 3x3 box filter around one sample.
#[derive(Clone, Debug, PartialEq)]
pub struct KernelResult {
    pub average: f32,
    /// Kernel cells that contributed (1..=9)
    pub count: usize,
    /// Other tiles' cells at the same world position as the center
    pub shared: Vec<TileCell>,
}

/// Height at world `(x, z)` from the first neighborhood tile other than
/// `owner` that covers it. `None` at a true terrain edge.
pub fn height_across_seam<T: HeightTile>(
    map: &TileMap<T>,
    neighborhood: &TileNeighborhood,
    owner: TileCoord,
    world: (f32, f32),
) -> Option<f32> {
    neighborhood
        .iter()
        .filter(|&coord| coord != owner)
        .find_map(|coord| {
            let tile = map.get(coord)?;
            let index = tile.world_to_index(world.0, world.1)?;
            tile.height_at(index)
        })
}

/// Every other neighborhood tile cell covering world `(x, z)`.
pub fn shared_cells<T: HeightTile>(
    map: &TileMap<T>,
    neighborhood: &TileNeighborhood,
    owner: TileCoord,
    world: (f32, f32),
) -> Vec<TileCell> {
    neighborhood
        .iter()
        .filter(|&coord| coord != owner)
        .filter_map(|coord| {
            let tile = map.get(coord)?;
            let index = tile.world_to_index(world.0, world.1)?;
            tile.contains_index(index).then_some(TileCell { tile: coord, index })
        })
        .collect()
}

/// 3x3 box filter centered on `index` of `owner`. Kernel cells outside the
/// owner are looked up in the other neighborhood tiles at
/// `index_to_world(index) + (dx, dz) * spacing`; cells found nowhere are left
/// out of the average.
pub fn box_filter<T: HeightTile>(
    map: &TileMap<T>,
    neighborhood: &TileNeighborhood,
    owner: TileCoord,
    index: TileIndex,
) -> Option<KernelResult> {
    let tile = map.get(owner)?;
    let center = tile.height_at(index)?;
    let (wx, wz) = tile.index_to_world(index);
    let spacing = tile.spacing();

    let mut sum = center;
    let mut count = 1usize;

    for dz in -1i32..=1 {
        for dx in -1i32..=1 {
            if dx == 0 && dz == 0 {
                continue;
            }

            let local = index
                .offset(dx, dz)
                .filter(|i| tile.contains_index(*i))
                .and_then(|i| tile.height_at(i));
            let height = match local {
                Some(h) => Some(h),
                None => {
                    let world = (wx + dx as f32 * spacing, wz + dz as f32 * spacing);
                    height_across_seam(map, neighborhood, owner, world)
                }
            };

            if let Some(h) = height {
                sum += h;
                count += 1;
            }
        }
    }

    Some(KernelResult {
        average: sum / count as f32,
        count,
        shared: shared_cells(map, neighborhood, owner, (wx, wz)),
    })
}
