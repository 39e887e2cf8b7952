//! Core math shared by the loaders: glam re-exports, bounds, proxy cube.

pub use glam::{Vec3, vec3};

pub mod bounds;
pub mod proxy;

pub use bounds::{Aabb, Extents};
pub use proxy::BoundingBox;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_from_accumulated_points() {
        let mut aabb = Aabb::new();
        aabb.include(vec3(0.0, 0.0, 0.0));
        aabb.include(vec3(1.0, 0.0, 0.0));
        aabb.include(vec3(0.0, 1.0, 0.0));
        let bbox = BoundingBox::from_extents(&aabb.extents());
        assert_eq!(bbox.min(), Vec3::ZERO);
        assert_eq!(bbox.max(), vec3(1.0, 1.0, 0.0));
        assert!(bbox.corners().iter().all(|c| c.is_finite()));
    }
}
