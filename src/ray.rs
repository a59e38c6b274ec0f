//! Cursor rays and the box clipping used by tile ray intersection.

/// A world-space ray. `direction` does not have to be normalized; distances
/// are measured in multiples of its length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
}

impl Ray {
    pub fn new(origin: [f32; 3], direction: [f32; 3]) -> Self {
        Self { origin, direction }
    }

    /// Point reached after travelling `distance` along the ray.
    pub fn point_at(&self, distance: f32) -> [f32; 3] {
        [
            self.origin[0] + self.direction[0] * distance,
            self.origin[1] + self.direction[1] * distance,
            self.origin[2] + self.direction[2] * distance,
        ]
    }

    /// Clip the ray against an axis-aligned box.
    /// Returns the `(enter, exit)` distances, with `enter` clamped to 0 when
    /// the origin is inside the box. `None` if the box is missed or behind.
    pub fn clip_to_box(&self, min: [f32; 3], max: [f32; 3]) -> Option<(f32, f32)> {
        let mut enter = 0.0f32;
        let mut exit = f32::INFINITY;

        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];

            if d.abs() < f32::EPSILON {
                // Parallel to this slab: inside or never
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (min[axis] - o) * inv;
            let mut t1 = (max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            enter = enter.max(t0);
            exit = exit.min(t1);
            if enter > exit {
                return None;
            }
        }

        Some((enter, exit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_at() {
        let ray = Ray::new([1.0, 10.0, 2.0], [0.0, -1.0, 0.5]);
        assert_eq!(ray.point_at(4.0), [1.0, 6.0, 4.0]);
        assert_eq!(ray.point_at(0.0), ray.origin);
    }

    #[test]
    fn test_clip_straight_down() {
        let ray = Ray::new([5.0, 10.0, 5.0], [0.0, -1.0, 0.0]);
        let (enter, exit) = ray.clip_to_box([0.0, 0.0, 0.0], [9.0, 2.0, 9.0]).unwrap();
        assert!((enter - 8.0).abs() < 1e-5);
        assert!((exit - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_clip_misses_box() {
        let ray = Ray::new([20.0, 10.0, 5.0], [0.0, -1.0, 0.0]);
        assert!(ray.clip_to_box([0.0, 0.0, 0.0], [9.0, 2.0, 9.0]).is_none());
    }

    #[test]
    fn test_clip_box_behind_origin() {
        let ray = Ray::new([5.0, 10.0, 5.0], [0.0, 1.0, 0.0]);
        assert!(ray.clip_to_box([0.0, 0.0, 0.0], [9.0, 2.0, 9.0]).is_none());
    }

    #[test]
    fn test_clip_origin_inside() {
        let ray = Ray::new([5.0, 1.0, 5.0], [1.0, 0.0, 0.0]);
        let (enter, exit) = ray.clip_to_box([0.0, 0.0, 0.0], [9.0, 2.0, 9.0]).unwrap();
        assert_eq!(enter, 0.0);
        assert!((exit - 4.0).abs() < 1e-5);
    }
}
