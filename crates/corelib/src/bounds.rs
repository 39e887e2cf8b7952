//! Axis-aligned bounds accumulated in a single pass over vertex positions.

use crate::Vec3;

/// Running min/max accumulator. Starts empty; every `include` widens it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    #[inline]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Fold one point into the box.
    #[inline]
    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Freeze into extents. An empty accumulator yields zero extents at the origin.
    pub fn extents(&self) -> Extents {
        if self.is_empty() {
            Extents::default()
        } else {
            Extents {
                min: self.min,
                max: self.max,
            }
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Final min/max of a model plus the derived size queries renderers need.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Extents {
    pub min: Vec3,
    pub max: Vec3,
}

impl Extents {
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn depth(&self) -> f32 {
        self.max.z - self.min.z
    }

    /// Lowest Y value; models are anchored on it when re-centered.
    #[inline]
    pub fn ground(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Largest of width/height/depth.
    #[inline]
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    /// Offset that centers X/Z on their midpoints and puts the ground at Y = 0.
    pub fn recenter_offset(&self) -> Vec3 {
        let c = self.center();
        Vec3::new(-c.x, -self.min.y, -c.z)
    }

    /// Extents moved by `offset`.
    #[inline]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    #[test]
    fn accumulates_min_max_in_one_pass() {
        let mut aabb = Aabb::new();
        for p in [
            vec3(-5.0, -3.0, 2.0),
            vec3(7.0, 1.0, 10.0),
            vec3(0.0, 4.0, -6.0),
        ] {
            aabb.include(p);
        }
        let e = aabb.extents();
        assert_eq!(e.min, vec3(-5.0, -3.0, -6.0));
        assert_eq!(e.max, vec3(7.0, 4.0, 10.0));
        assert_eq!(e.width(), 12.0);
        assert_eq!(e.height(), 7.0);
        assert_eq!(e.depth(), 16.0);
        assert_eq!(e.ground(), -3.0);
        assert_eq!(e.max_dimension(), 16.0);
    }

    #[test]
    fn empty_accumulator_gives_zero_extents() {
        let aabb = Aabb::default();
        assert!(aabb.is_empty());
        assert_eq!(aabb.extents(), Extents::default());
    }

    #[test]
    fn recenter_anchors_ground_and_centers_xz() {
        let e = Extents {
            min: vec3(2.0, 1.0, -4.0),
            max: vec3(6.0, 3.0, 0.0),
        };
        let moved = e.translated(e.recenter_offset());
        assert_eq!(moved.min, vec3(-2.0, 0.0, -2.0));
        assert_eq!(moved.max, vec3(2.0, 2.0, 2.0));
        assert_eq!(moved.size(), e.size());
    }

    #[test]
    fn contains_is_inclusive() {
        let e = Extents {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        assert!(e.contains(Vec3::ONE));
        assert!(e.contains(Vec3::ZERO));
        assert!(!e.contains(vec3(0.5, 1.01, 0.5)));
    }
}
