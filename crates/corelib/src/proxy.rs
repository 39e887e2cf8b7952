//! Proxy cube standing in for a model during pick tests and highlight outlines.

use crate::{Vec3, bounds::Extents};

/// Corners of a unit cube centered on the origin.
pub const UNIT_CORNERS: [Vec3; 8] = [
    Vec3::new(-0.5, 0.5, -0.5),
    Vec3::new(-0.5, 0.5, 0.5),
    Vec3::new(0.5, 0.5, 0.5),
    Vec3::new(0.5, 0.5, -0.5),
    Vec3::new(-0.5, -0.5, 0.5),
    Vec3::new(0.5, -0.5, 0.5),
    Vec3::new(0.5, -0.5, -0.5),
    Vec3::new(-0.5, -0.5, -0.5),
];

/// Quads into `UNIT_CORNERS`, each a closed loop.
pub const FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [2, 5, 6, 3],
    [1, 4, 5, 2],
    [0, 7, 4, 1],
    [0, 7, 6, 3],
    [4, 7, 6, 5],
];

/// Outward normal of each entry in `FACES`.
pub const NORMALS: [Vec3; 6] = [
    Vec3::Y,
    Vec3::X,
    Vec3::Z,
    Vec3::NEG_X,
    Vec3::NEG_Z,
    Vec3::NEG_Y,
];

/// The unit cube scaled to a model's extents.
///
/// Built once per model; renderers draw it as quads for picking and as line
/// loops per face for highlighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub center: Vec3,
    pub size: Vec3,
}

impl BoundingBox {
    pub fn from_extents(extents: &Extents) -> Self {
        Self {
            center: extents.center(),
            size: extents.size(),
        }
    }

    #[inline]
    pub fn corner(&self, i: usize) -> Vec3 {
        self.center + UNIT_CORNERS[i] * self.size
    }

    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| self.corner(i))
    }

    /// Scaled corners of face `i` in loop order, with its outward normal.
    pub fn face(&self, i: usize) -> ([Vec3; 4], Vec3) {
        let quad = FACES[i];
        (std::array::from_fn(|k| self.corner(quad[k])), NORMALS[i])
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    #[test]
    fn every_face_lies_on_its_normal_plane() {
        for (quad, n) in FACES.iter().zip(NORMALS) {
            for &c in quad {
                assert!((UNIT_CORNERS[c].dot(n) - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn scaled_corners_match_extents() {
        let extents = Extents {
            min: vec3(-1.0, 0.0, -2.0),
            max: vec3(1.0, 3.0, 2.0),
        };
        let bbox = BoundingBox::from_extents(&extents);
        assert_eq!(bbox.min(), extents.min);
        assert_eq!(bbox.max(), extents.max);
        for c in bbox.corners() {
            assert!(extents.contains(c));
        }
        let (top, n) = bbox.face(0);
        assert_eq!(n, Vec3::Y);
        assert!(top.iter().all(|p| p.y == 3.0));
    }
}
