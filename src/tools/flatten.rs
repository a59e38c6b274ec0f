use crate::brush::GestureState;
use crate::sampler::SampleBatch;
use crate::tile::{HeightTile, TileCoord};
use crate::tile_map::TileMap;

use super::HeightWriter;

/// Write the gesture's reference height into every sample. The reference is
/// locked on the first frame of the press to the pre-edit average of the
/// first sampled tile in neighborhood order.
/// Returns the written tiles and whether the lock was taken this frame.
pub fn apply_flatten<T: HeightTile>(
    map: &mut TileMap<T>,
    batch: &SampleBatch,
    gesture: &mut GestureState,
) -> (Vec<TileCoord>, bool) {
    let Some(average) = batch.leading_average() else {
        return (Vec::new(), false);
    };
    let (reference, began) = gesture.hold_flatten(average);
    if began {
        log::debug!("flatten reference locked at {reference:.3}");
    }

    let mut writer = HeightWriter::default();
    for entry in &batch.tiles {
        for sample in &entry.samples {
            writer.write(map, entry.coord, sample.index, reference);
        }
    }
    (writer.finish(), began)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::sample_brush;
    use crate::tile::{TerrainTile, TileIndex};

    #[test]
    fn test_reference_is_locked_for_the_press() {
        let mut map = TileMap::new();
        let heights: Vec<f32> = (0..100).map(|i| (i % 10) as f32).collect();
        map.insert(
            TerrainTile::from_heights(TileCoord::new(0, 0), (0.0, 0.0), 1.0, 10, 10, heights)
                .unwrap(),
        );
        let n = map.neighborhood(TileCoord::new(0, 0));
        let mut gesture = GestureState::default();

        let batch = sample_brush(&map, &n, (5.0, 5.0), 2.0);
        let first = batch.leading_average().unwrap();
        let (written, began) = apply_flatten(&mut map, &batch, &mut gesture);
        assert!(began);
        assert_eq!(written, vec![TileCoord::new(0, 0)]);
        assert_eq!(gesture.flatten_reference(), Some(first));

        // Move the brush so the instantaneous average changes
        let batch = sample_brush(&map, &n, (7.0, 5.0), 2.0);
        assert!((batch.leading_average().unwrap() - first).abs() > 1e-3);
        let (_, began) = apply_flatten(&mut map, &batch, &mut gesture);
        assert!(!began);

        let tile = map.get(TileCoord::new(0, 0)).unwrap();
        for s in &batch.tiles[0].samples {
            assert_eq!(tile.height_at(s.index), Some(first));
        }
        // Untouched by either pass
        assert_eq!(tile.height_at(TileIndex::new(0, 0)), Some(0.0));
    }

    #[test]
    fn test_reference_comes_from_first_tile_across_seam() {
        let mut map = TileMap::new();
        map.insert(TerrainTile::flat(TileCoord::new(0, 0), (0.0, 0.0), 1.0, 10, 10).unwrap());
        map.insert(
            TerrainTile::from_heights(
                TileCoord::new(1, 0),
                (10.0, 0.0),
                1.0,
                10,
                10,
                vec![10.0; 100],
            )
            .unwrap(),
        );
        let n = map.neighborhood(TileCoord::new(0, 0));
        let mut gesture = GestureState::default();

        let batch = sample_brush(&map, &n, (9.5, 5.0), 2.0);
        assert_eq!(batch.tiles.len(), 2);
        let (written, began) = apply_flatten(&mut map, &batch, &mut gesture);
        assert!(began);
        assert_eq!(written, vec![TileCoord::new(0, 0), TileCoord::new(1, 0)]);
        assert_eq!(gesture.flatten_reference(), Some(0.0));

        let a = map.get(TileCoord::new(0, 0)).unwrap();
        let b = map.get(TileCoord::new(1, 0)).unwrap();
        assert_eq!(a.height_at(TileIndex::new(9, 5)), Some(0.0));
        assert_eq!(b.height_at(TileIndex::new(0, 5)), Some(0.0));
        // Outside the circle keeps its height
        assert_eq!(b.height_at(TileIndex::new(5, 5)), Some(10.0));
    }

    #[test]
    fn test_empty_batch_leaves_gesture_alone() {
        let mut map: TileMap<TerrainTile> = TileMap::new();
        let mut gesture = GestureState::default();
        let (written, began) = apply_flatten(&mut map, &SampleBatch::default(), &mut gesture);
        assert!(written.is_empty());
        assert!(!began);
        assert!(!gesture.is_flattening());
    }
}
