use crate::brush::ease_in_out_quintic;
use crate::sampler::SampleBatch;
use crate::tile::{HeightTile, TileCoord};
use crate::tile_map::TileMap;

use super::{HeightWriter, ToolInput};

/// Raise (primary) or lower (secondary) every sample by the eased falloff
/// scaled by `dt * strength`. Primary wins when both are held.
pub fn apply_raise<T: HeightTile>(
    map: &mut TileMap<T>,
    batch: &SampleBatch,
    input: ToolInput,
) -> Vec<TileCoord> {
    let sign = if input.primary {
        1.0
    } else if input.secondary {
        -1.0
    } else {
        return Vec::new();
    };

    let mut writer = HeightWriter::default();
    for entry in &batch.tiles {
        for sample in &entry.samples {
            let Some(current) = map.get(entry.coord).and_then(|t| t.height_at(sample.index))
            else {
                continue;
            };
            let delta = input.dt * ease_in_out_quintic(sample.weight) * input.strength;
            writer.write(map, entry.coord, sample.index, current + sign * delta);
        }
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::falloff;
    use crate::sampler::sample_brush;
    use crate::tile::{TerrainTile, TileIndex};

    fn pair() -> TileMap<TerrainTile> {
        let mut map = TileMap::new();
        for gx in 0..2 {
            map.insert(
                TerrainTile::flat(TileCoord::new(gx, 0), (gx as f32 * 10.0, 0.0), 1.0, 10, 10)
                    .unwrap(),
            );
        }
        map
    }

    fn input(primary: bool, secondary: bool) -> ToolInput {
        ToolInput {
            dt: 1.0,
            strength: 40.0,
            primary,
            secondary,
        }
    }

    #[test]
    fn test_raise_across_seam() {
        let mut map = pair();
        let n = map.neighborhood(TileCoord::new(0, 0));
        let batch = sample_brush(&map, &n, (9.5, 5.0), 2.0);
        let written = apply_raise(&mut map, &batch, input(true, false));
        assert_eq!(written, vec![TileCoord::new(0, 0), TileCoord::new(1, 0)]);

        let a = map.get(TileCoord::new(0, 0)).unwrap();
        let b = map.get(TileCoord::new(1, 0)).unwrap();

        // (9, 5) is 0.5 from the center
        let expected = 40.0 * ease_in_out_quintic(falloff(0.5, 2.0).unwrap());
        assert!((a.height_at(TileIndex::new(9, 5)).unwrap() - expected).abs() < 1e-4);
        assert!((b.height_at(TileIndex::new(0, 5)).unwrap() - expected).abs() < 1e-4);
        assert!(a.height_at(TileIndex::new(8, 5)).unwrap() > 0.0);

        // Distance >= radius untouched
        assert_eq!(a.height_at(TileIndex::new(7, 5)), Some(0.0));
        assert_eq!(b.height_at(TileIndex::new(2, 5)), Some(0.0));
        assert_eq!(a.height_at(TileIndex::new(9, 3)), Some(0.0));
    }

    #[test]
    fn test_lower_with_secondary() {
        let mut map = pair();
        let n = map.neighborhood(TileCoord::new(0, 0));
        let batch = sample_brush(&map, &n, (4.0, 4.0), 3.0);
        apply_raise(&mut map, &batch, input(false, true));

        let a = map.get(TileCoord::new(0, 0)).unwrap();
        for s in &batch.tiles[0].samples {
            assert!(a.height_at(s.index).unwrap() < 0.0);
        }
    }

    #[test]
    fn test_no_button_no_change() {
        let mut map = pair();
        let n = map.neighborhood(TileCoord::new(0, 0));
        let batch = sample_brush(&map, &n, (4.0, 4.0), 3.0);
        assert!(apply_raise(&mut map, &batch, input(false, false)).is_empty());
        assert!(!map.get(TileCoord::new(0, 0)).unwrap().is_dirty());
    }
}
