//! Heightmap terrain tiles: grid index mapping, height storage and flushing.
//!
//! A tile covers the half-open world square `[origin, origin + n * spacing)`
//! on each horizontal axis (X and Z). Sample `(x, y)` sits at
//! `origin + (x, y) * spacing`, `y` being the row along world Z.

use crate::error::SculptError;
use crate::ray::Ray;

/// Tolerance (in index units) applied before flooring, so that a world
/// position produced by `index_to_world` maps back to the same index.
const SNAP_EPSILON: f32 = 1e-3;

/// March step for ray intersection, as a fraction of the sample spacing.
const RAY_STEP_FRACTION: f32 = 0.25;

/// Bisection rounds used to refine a ray hit after a sign change.
const RAY_REFINE_STEPS: usize = 16;

/// Vertical padding added to the tile bounds so flat tiles still have volume.
const BOUNDS_PADDING: f32 = 1e-3;

/// Position of a tile among its siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev adjacency, including diagonals and the tile itself.
    pub fn is_neighbor_of(&self, other: TileCoord) -> bool {
        (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

/// Grid index of a height sample inside one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub x: usize,
    pub y: usize,
}

impl TileIndex {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Offset by a signed step; `None` if either component would go negative.
    pub fn offset(&self, dx: i32, dy: i32) -> Option<TileIndex> {
        let x = self.x.checked_add_signed(dx as isize)?;
        let y = self.y.checked_add_signed(dy as isize)?;
        Some(TileIndex { x, y })
    }
}

/// The per-tile terrain object the sculpting core works against.
pub trait HeightTile {
    /// Grid index covering a world XZ position, `None` outside this tile.
    fn world_to_index(&self, x: f32, z: f32) -> Option<TileIndex>;

    /// World XZ position of a grid sample.
    fn index_to_world(&self, index: TileIndex) -> (f32, f32);

    fn height_at(&self, index: TileIndex) -> Option<f32>;

    fn set_height(&mut self, index: TileIndex, value: f32) -> Result<(), SculptError>;

    /// Samples per row.
    fn width(&self) -> usize;

    /// Number of rows.
    fn height(&self) -> usize;

    /// World distance between neighbouring samples.
    fn spacing(&self) -> f32;

    fn grid_position(&self) -> TileCoord;

    /// Commit pending height edits to the renderable/collision form.
    fn flush(&mut self);

    /// Distance along `ray` to the first surface hit, if any.
    fn ray_intersection(&self, ray: &Ray) -> Option<f32>;

    fn contains_index(&self, index: TileIndex) -> bool {
        index.x < self.width() && index.y < self.height()
    }
}

/// In-memory heightmap tile.
#[derive(Clone, Debug)]
pub struct TerrainTile {
    coord: TileCoord,
    origin: (f32, f32),
    spacing: f32,
    width: usize,
    height: usize,
    /// Row-major heights: `heights[y * width + x]`
    heights: Vec<f32>,
    dirty: bool,
    revision: u64,
    /// Last row and column repeat the first ones of the next tile
    shared_edges: bool,
}

impl TerrainTile {
    /// Flat tile at height 0.
    pub fn flat(
        coord: TileCoord,
        origin: (f32, f32),
        spacing: f32,
        width: usize,
        height: usize,
    ) -> Result<Self, SculptError> {
        Self::from_heights(coord, origin, spacing, width, height, vec![0.0; width * height])
    }

    pub fn from_heights(
        coord: TileCoord,
        origin: (f32, f32),
        spacing: f32,
        width: usize,
        height: usize,
        heights: Vec<f32>,
    ) -> Result<Self, SculptError> {
        if width < 2 || height < 2 {
            return Err(SculptError::InvalidDimensions { width, height });
        }
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(SculptError::InvalidSpacing(spacing));
        }
        if heights.len() != width * height {
            return Err(SculptError::HeightCountMismatch {
                expected: width * height,
                actual: heights.len(),
            });
        }
        if let Some(i) = heights.iter().position(|h| !h.is_finite()) {
            return Err(SculptError::NonFiniteHeight {
                tile: coord,
                index: TileIndex::new(i % width, i / width),
                value: heights[i],
            });
        }

        Ok(Self {
            coord,
            origin,
            spacing,
            width,
            height,
            heights,
            dirty: false,
            revision: 0,
            shared_edges: false,
        })
    }

    /// Mark the tile as overlapping its neighbors by one sample.
    pub fn with_shared_edges(mut self, shared: bool) -> Self {
        self.shared_edges = shared;
        self
    }

    pub fn shares_edges(&self) -> bool {
        self.shared_edges
    }

    pub fn origin(&self) -> (f32, f32) {
        self.origin
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Whether heights were written since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of flushes that committed changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// World XZ extent of the tile surface: `(min, max)` corners.
    ///
    /// Matches the index coverage `origin + n * spacing`. With shared edges
    /// the last sample is the neighbor's first, so the surface stops there.
    pub fn bounds(&self) -> ((f32, f32), (f32, f32)) {
        let cells = |n: usize| {
            let n = if self.shared_edges { n - 1 } else { n };
            n as f32
        };
        let max_x = self.origin.0 + cells(self.width) * self.spacing;
        let max_z = self.origin.1 + cells(self.height) * self.spacing;
        (self.origin, (max_x, max_z))
    }

    pub fn min_max_height(&self) -> (f32, f32) {
        self.heights
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }

    /// Bilinear surface height at a world XZ position, clamped to the last
    /// sample past the grid.
    pub fn sample_height(&self, x: f32, z: f32) -> f32 {
        let u = ((x - self.origin.0) / self.spacing).clamp(0.0, (self.width - 1) as f32);
        let v = ((z - self.origin.1) / self.spacing).clamp(0.0, (self.height - 1) as f32);

        let x0 = u.floor() as usize;
        let y0 = v.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = u - x0 as f32;
        let fy = v - y0 as f32;

        let h00 = self.heights[self.offset(x0, y0)];
        let h10 = self.heights[self.offset(x1, y0)];
        let h01 = self.heights[self.offset(x0, y1)];
        let h11 = self.heights[self.offset(x1, y1)];

        let top = h00 + (h10 - h00) * fx;
        let bottom = h01 + (h11 - h01) * fx;
        top + (bottom - top) * fy
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Height of the ray point above the surface at distance `t`.
    fn clearance(&self, ray: &Ray, t: f32) -> f32 {
        let p = ray.point_at(t);
        p[1] - self.sample_height(p[0], p[2])
    }

    fn axis_index(&self, world: f32, origin: f32, count: usize) -> Option<usize> {
        let u = (world - origin) / self.spacing + SNAP_EPSILON;
        if !u.is_finite() || u < 0.0 {
            return None;
        }
        let i = u.floor() as usize;
        (i < count).then_some(i)
    }
}

impl HeightTile for TerrainTile {
    fn world_to_index(&self, x: f32, z: f32) -> Option<TileIndex> {
        let ix = self.axis_index(x, self.origin.0, self.width)?;
        let iy = self.axis_index(z, self.origin.1, self.height)?;
        Some(TileIndex::new(ix, iy))
    }

    fn index_to_world(&self, index: TileIndex) -> (f32, f32) {
        (
            self.origin.0 + index.x as f32 * self.spacing,
            self.origin.1 + index.y as f32 * self.spacing,
        )
    }

    fn height_at(&self, index: TileIndex) -> Option<f32> {
        if !self.contains_index(index) {
            return None;
        }
        Some(self.heights[self.offset(index.x, index.y)])
    }

    fn set_height(&mut self, index: TileIndex, value: f32) -> Result<(), SculptError> {
        if !self.contains_index(index) {
            return Err(SculptError::IndexOutOfBounds {
                tile: self.coord,
                index,
                width: self.width,
                height: self.height,
            });
        }
        if !value.is_finite() {
            return Err(SculptError::NonFiniteHeight {
                tile: self.coord,
                index,
                value,
            });
        }

        let i = self.offset(index.x, index.y);
        self.heights[i] = value;
        self.dirty = true;
        Ok(())
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn spacing(&self) -> f32 {
        self.spacing
    }

    fn grid_position(&self) -> TileCoord {
        self.coord
    }

    fn flush(&mut self) {
        if self.dirty {
            self.dirty = false;
            self.revision += 1;
        }
    }

    fn ray_intersection(&self, ray: &Ray) -> Option<f32> {
        let ((min_x, min_z), (max_x, max_z)) = self.bounds();
        let (lo, hi) = self.min_max_height();
        let (enter, exit) = ray.clip_to_box(
            [min_x, lo - BOUNDS_PADDING, min_z],
            [max_x, hi + BOUNDS_PADDING, max_z],
        )?;

        let length = (ray.direction[0] * ray.direction[0]
            + ray.direction[1] * ray.direction[1]
            + ray.direction[2] * ray.direction[2])
            .sqrt();
        if length < f32::EPSILON {
            return None;
        }
        let step = self.spacing * RAY_STEP_FRACTION / length;

        let mut prev_t = enter;
        let mut prev_gap = self.clearance(ray, prev_t);
        if prev_gap <= 0.0 {
            return Some(prev_t);
        }

        while prev_t < exit {
            let t = (prev_t + step).min(exit);
            let gap = self.clearance(ray, t);
            if gap <= 0.0 {
                // Refine between the last point above and the first below
                let (mut above, mut below) = (prev_t, t);
                for _ in 0..RAY_REFINE_STEPS {
                    let mid = 0.5 * (above + below);
                    if self.clearance(ray, mid) > 0.0 {
                        above = mid;
                    } else {
                        below = mid;
                    }
                }
                return Some(below);
            }
            prev_t = t;
            prev_gap = gap;
        }

        log::trace!(
            "ray passed tile {:?} without crossing the surface (last clearance {prev_gap})",
            self.coord
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tile_10() -> TerrainTile {
        TerrainTile::flat(TileCoord::new(0, 0), (0.0, 0.0), 1.0, 10, 10).unwrap()
    }

    #[test]
    fn test_world_to_index_in_bounds() {
        let tile = tile_10();
        assert_eq!(tile.world_to_index(0.0, 0.0), Some(TileIndex::new(0, 0)));
        assert_eq!(tile.world_to_index(3.7, 8.2), Some(TileIndex::new(3, 8)));
        assert_eq!(tile.world_to_index(9.99, 9.5), Some(TileIndex::new(9, 9)));
    }

    #[test]
    fn test_world_to_index_out_of_coverage() {
        let tile = tile_10();
        assert_eq!(tile.world_to_index(-0.5, 2.0), None);
        assert_eq!(tile.world_to_index(2.0, -0.5), None);
        assert_eq!(tile.world_to_index(10.0, 2.0), None);
        assert_eq!(tile.world_to_index(2.0, 10.5), None);
        assert_eq!(tile.world_to_index(f32::NAN, 2.0), None);
    }

    #[test]
    fn test_world_to_index_with_origin_and_spacing() {
        let tile = TerrainTile::flat(TileCoord::new(1, 0), (10.0, -4.0), 2.0, 5, 5).unwrap();
        assert_eq!(tile.world_to_index(10.0, -4.0), Some(TileIndex::new(0, 0)));
        assert_eq!(tile.world_to_index(13.9, 1.0), Some(TileIndex::new(1, 2)));
        assert_eq!(tile.world_to_index(20.0, 0.0), None);
        assert_eq!(tile.index_to_world(TileIndex::new(4, 2)), (18.0, 0.0));
    }

    #[test]
    fn test_get_set_height() {
        let mut tile = tile_10();
        let index = TileIndex::new(4, 7);
        tile.set_height(index, 3.5).unwrap();
        assert_eq!(tile.height_at(index), Some(3.5));
        assert_eq!(tile.heights()[7 * 10 + 4], 3.5);
        assert!(tile.is_dirty());
    }

    #[test]
    fn test_set_height_out_of_bounds() {
        let mut tile = tile_10();
        let err = tile.set_height(TileIndex::new(10, 0), 1.0).unwrap_err();
        assert!(matches!(err, SculptError::IndexOutOfBounds { .. }));
        assert_eq!(tile.height_at(TileIndex::new(0, 10)), None);
        assert!(!tile.is_dirty());
    }

    #[test]
    fn test_set_height_rejects_non_finite() {
        let mut tile = tile_10();
        let err = tile.set_height(TileIndex::new(1, 1), f32::INFINITY).unwrap_err();
        assert!(matches!(err, SculptError::NonFiniteHeight { .. }));
        assert_eq!(tile.height_at(TileIndex::new(1, 1)), Some(0.0));
    }

    #[test]
    fn test_construction_validation() {
        let coord = TileCoord::new(0, 0);
        assert!(matches!(
            TerrainTile::flat(coord, (0.0, 0.0), 1.0, 1, 4),
            Err(SculptError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            TerrainTile::flat(coord, (0.0, 0.0), 0.0, 4, 4),
            Err(SculptError::InvalidSpacing(_))
        ));
        assert!(matches!(
            TerrainTile::from_heights(coord, (0.0, 0.0), 1.0, 2, 2, vec![0.0; 3]),
            Err(SculptError::HeightCountMismatch { expected: 4, actual: 3 })
        ));
        assert!(matches!(
            TerrainTile::from_heights(coord, (0.0, 0.0), 1.0, 2, 2, vec![0.0, 0.0, f32::NAN, 0.0]),
            Err(SculptError::NonFiniteHeight { .. })
        ));
    }

    #[test]
    fn test_flush_bumps_revision_only_when_dirty() {
        let mut tile = tile_10();
        tile.flush();
        assert_eq!(tile.revision(), 0);

        tile.set_height(TileIndex::new(2, 2), 1.0).unwrap();
        tile.flush();
        assert_eq!(tile.revision(), 1);
        assert!(!tile.is_dirty());

        tile.flush();
        assert_eq!(tile.revision(), 1);
    }

    #[test]
    fn test_sample_height_bilinear() {
        let mut tile = tile_10();
        tile.set_height(TileIndex::new(1, 0), 2.0).unwrap();
        assert!((tile.sample_height(0.5, 0.0) - 1.0).abs() < 1e-6);
        assert!((tile.sample_height(1.0, 0.5) - 1.0).abs() < 1e-6);
        // Clamped outside the tile
        assert_eq!(tile.sample_height(-5.0, -5.0), 0.0);
    }

    #[test]
    fn test_ray_straight_down_hits_flat_tile() {
        let tile = TerrainTile::from_heights(
            TileCoord::new(0, 0),
            (0.0, 0.0),
            1.0,
            10,
            10,
            vec![2.0; 100],
        )
        .unwrap();
        let ray = Ray::new([4.5, 10.0, 4.5], [0.0, -1.0, 0.0]);
        let distance = tile.ray_intersection(&ray).unwrap();
        assert!((distance - 8.0).abs() < 1e-2, "distance was {distance}");
    }

    #[test]
    fn test_ray_oblique_hits_slope() {
        // Heights rise along x: h = x
        let heights = (0..100).map(|i| (i % 10) as f32).collect();
        let tile =
            TerrainTile::from_heights(TileCoord::new(0, 0), (0.0, 0.0), 1.0, 10, 10, heights)
                .unwrap();
        let ray = Ray::new([0.0, 6.0, 5.0], [1.0, 0.0, 0.0]);
        let distance = tile.ray_intersection(&ray).unwrap();
        assert!((distance - 6.0).abs() < 1e-2, "distance was {distance}");
    }

    #[test]
    fn test_ray_missing_tile() {
        let tile = tile_10();
        let beside = Ray::new([20.0, 10.0, 4.0], [0.0, -1.0, 0.0]);
        assert!(tile.ray_intersection(&beside).is_none());
        let upward = Ray::new([4.0, 10.0, 4.0], [0.0, 1.0, 0.0]);
        assert!(tile.ray_intersection(&upward).is_none());
    }

    #[test]
    fn test_ray_hits_strip_past_last_sample() {
        // Samples end at x = 9, coverage runs to x = 10
        let tile = TerrainTile::from_heights(
            TileCoord::new(0, 0),
            (0.0, 0.0),
            1.0,
            10,
            10,
            vec![3.0; 100],
        )
        .unwrap();
        assert_eq!(tile.bounds(), ((0.0, 0.0), (10.0, 10.0)));
        assert_eq!(tile.world_to_index(9.5, 5.0), Some(TileIndex::new(9, 5)));

        let ray = Ray::new([9.5, 10.0, 5.0], [0.0, -1.0, 0.0]);
        let distance = tile.ray_intersection(&ray).unwrap();
        assert!((distance - 7.0).abs() < 1e-2, "distance was {distance}");
    }

    #[test]
    fn test_shared_edges_stop_at_last_sample() {
        let tile = TerrainTile::flat(TileCoord::new(0, 0), (0.0, 0.0), 1.0, 11, 11)
            .unwrap()
            .with_shared_edges(true);
        assert!(tile.shares_edges());
        assert_eq!(tile.bounds(), ((0.0, 0.0), (10.0, 10.0)));
        let past = Ray::new([10.5, 10.0, 5.0], [0.0, -1.0, 0.0]);
        assert!(tile.ray_intersection(&past).is_none());
    }

    #[test]
    fn test_index_offset() {
        let index = TileIndex::new(0, 3);
        assert_eq!(index.offset(-1, 0), None);
        assert_eq!(index.offset(1, -1), Some(TileIndex::new(1, 2)));
    }

    #[test]
    fn test_coord_adjacency() {
        let c = TileCoord::new(2, 2);
        assert!(c.is_neighbor_of(TileCoord::new(1, 3)));
        assert!(c.is_neighbor_of(c));
        assert!(!c.is_neighbor_of(TileCoord::new(4, 2)));
    }

    proptest! {
        #[test]
        fn prop_index_round_trip(
            ox in -1000i32..1000,
            oz in -1000i32..1000,
            spacing in prop::sample::select(vec![0.5f32, 1.0, 2.0, 4.0]),
            width in 2usize..64,
            height in 2usize..64,
            fx in 0.0f64..1.0,
            fy in 0.0f64..1.0,
        ) {
            let tile = TerrainTile::flat(
                TileCoord::new(0, 0),
                (ox as f32 * 0.25, oz as f32 * 0.25),
                spacing,
                width,
                height,
            ).unwrap();
            let index = TileIndex::new(
                ((fx * width as f64) as usize).min(width - 1),
                ((fy * height as f64) as usize).min(height - 1),
            );
            let (x, z) = tile.index_to_world(index);
            prop_assert_eq!(tile.world_to_index(x, z), Some(index));
        }
    }
}
