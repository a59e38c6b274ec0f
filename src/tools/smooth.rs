use crate::sampler::SampleBatch;
use crate::seam::{box_filter, TileCell};
use crate::tile::{HeightTile, TileCoord};
use crate::tile_map::{TileMap, TileNeighborhood};

use super::HeightWriter;

struct SmoothedCell {
    cell: TileCell,
    value: f32,
    shared: Vec<TileCell>,
}

/// Blend every sample toward its 3x3 average by its falloff weight.
///
/// All kernels read the heights as they were before the pass. Each result is
/// written to its own tile and to every seam partner of the cell, so tiles
/// agree at shared positions.
pub fn apply_smooth<T: HeightTile>(
    map: &mut TileMap<T>,
    neighborhood: &TileNeighborhood,
    batch: &SampleBatch,
) -> Vec<TileCoord> {
    let mut results = Vec::with_capacity(batch.sample_count());
    for entry in &batch.tiles {
        let Some(tile) = map.get(entry.coord) else {
            continue;
        };
        for sample in &entry.samples {
            let Some(current) = tile.height_at(sample.index) else {
                continue;
            };
            let Some(kernel) = box_filter(map, neighborhood, entry.coord, sample.index) else {
                continue;
            };
            let value = current + (kernel.average - current) * sample.weight;
            results.push(SmoothedCell {
                cell: TileCell {
                    tile: entry.coord,
                    index: sample.index,
                },
                value,
                shared: kernel.shared,
            });
        }
    }

    let mut writer = HeightWriter::default();
    for result in &results {
        writer.write(map, result.cell.tile, result.cell.index, result.value);
        for partner in &result.shared {
            writer.write(map, partner.tile, partner.index, result.value);
        }
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::sample_brush;
    use crate::tile::{TerrainTile, TileIndex};

    fn pair(width: usize, stride: f32) -> TileMap<TerrainTile> {
        let mut map = TileMap::new();
        for gx in 0..2 {
            map.insert(
                TerrainTile::flat(
                    TileCoord::new(gx, 0),
                    (gx as f32 * stride, 0.0),
                    1.0,
                    width,
                    width,
                )
                .unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_uniform_field_is_a_fixed_point() {
        let mut map = TileMap::new();
        map.insert(
            TerrainTile::from_heights(TileCoord::new(0, 0), (0.0, 0.0), 1.0, 8, 8, vec![3.0; 64])
                .unwrap(),
        );
        let n = map.neighborhood(TileCoord::new(0, 0));
        // Brush reaches past the terrain edge
        let batch = sample_brush(&map, &n, (1.0, 1.0), 4.0);
        apply_smooth(&mut map, &n, &batch);
        assert!(map
            .get(TileCoord::new(0, 0))
            .unwrap()
            .heights()
            .iter()
            .all(|&h| (h - 3.0).abs() < 1e-6));
    }

    #[test]
    fn test_spike_spreads_into_neighbor() {
        let mut map = pair(10, 10.0);
        let a = TileCoord::new(0, 0);
        let b = TileCoord::new(1, 0);
        map.get_mut(a).unwrap().set_height(TileIndex::new(9, 5), 10.0).unwrap();

        let n = map.neighborhood(a);
        let batch = sample_brush(&map, &n, (9.5, 5.0), 2.0);
        let written = apply_smooth(&mut map, &n, &batch);
        assert!(written.contains(&b));

        let b0 = map.get(b).unwrap().height_at(TileIndex::new(0, 5)).unwrap();
        // Average (10 / 9) blended with weight 0.75
        assert!((b0 - 10.0 / 9.0 * 0.75).abs() < 1e-5, "b0 = {b0}");
        let a9 = map.get(a).unwrap().height_at(TileIndex::new(9, 5)).unwrap();
        assert!(a9 < 10.0);
    }

    #[test]
    fn test_shared_edge_heights_match() {
        // 11 wide tiles one stride apart overlap on world x = 10
        let mut map = pair(11, 10.0);
        let a = TileCoord::new(0, 0);
        let b = TileCoord::new(1, 0);
        for y in 0..11 {
            for x in 0..11 {
                let h = ((x * 7 + y * 3) % 5) as f32;
                map.get_mut(a).unwrap().set_height(TileIndex::new(x, y), h).unwrap();
            }
        }
        // Make the overlap consistent before smoothing
        for y in 0..11 {
            let h = map.get(a).unwrap().height_at(TileIndex::new(10, y)).unwrap();
            map.get_mut(b).unwrap().set_height(TileIndex::new(0, y), h).unwrap();
        }

        let n = map.neighborhood(a);
        let batch = sample_brush(&map, &n, (10.0, 5.0), 3.0);
        apply_smooth(&mut map, &n, &batch);

        let ta = map.get(a).unwrap();
        let tb = map.get(b).unwrap();
        for y in 0..11 {
            assert_eq!(
                ta.height_at(TileIndex::new(10, y)),
                tb.height_at(TileIndex::new(0, y)),
                "seam mismatch at row {y}"
            );
        }
    }

    #[test]
    fn test_reads_pre_pass_heights() {
        let mut map = TileMap::new();
        let mut heights = vec![0.0; 25];
        heights[2 * 5 + 2] = 9.0;
        map.insert(
            TerrainTile::from_heights(TileCoord::new(0, 0), (0.0, 0.0), 1.0, 5, 5, heights)
                .unwrap(),
        );
        let n = map.neighborhood(TileCoord::new(0, 0));
        let batch = sample_brush(&map, &n, (2.0, 2.0), 2.0);
        apply_smooth(&mut map, &n, &batch);

        // Every edge neighbour of the spike sees the same pre-pass kernel
        let tile = map.get(TileCoord::new(0, 0)).unwrap();
        let left = tile.height_at(TileIndex::new(1, 2)).unwrap();
        let right = tile.height_at(TileIndex::new(3, 2)).unwrap();
        let up = tile.height_at(TileIndex::new(2, 1)).unwrap();
        let down = tile.height_at(TileIndex::new(2, 3)).unwrap();
        assert!((left - right).abs() < 1e-6);
        assert!((up - down).abs() < 1e-6);
        assert!((left - up).abs() < 1e-6);
        assert!(left > 0.0);
    }
}
