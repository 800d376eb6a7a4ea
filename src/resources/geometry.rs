use std::fmt::Debug;

use glam::Vec3;

use crate::resources::bounds::{Aabb, Obb};

/// Local-space bounds of a leaf's geometry.
///
/// The scene graph never looks at vertex data; a leaf node only asks its
/// geometry for a local box, which is then carried into world space with the
/// node's world matrix.
pub trait GeometryBounds: Debug {
    /// Axis-aligned bounds in the node's local space.
    fn local_aabb(&self) -> Aabb;

    /// Oriented bounds in the node's local space.
    ///
    /// Defaults to the 8-corner box of [`GeometryBounds::local_aabb`]. Override
    /// when a tighter fitted box is available.
    fn local_obb(&self) -> Obb {
        Obb::from_aabb(&self.local_aabb())
    }
}

impl GeometryBounds for Aabb {
    fn local_aabb(&self) -> Aabb {
        *self
    }
}

/// Bounds of a raw point cloud, computed once at construction.
#[derive(Debug, Clone)]
pub struct PointBounds {
    aabb: Aabb,
}

impl PointBounds {
    #[must_use]
    pub fn new(positions: &[Vec3]) -> Self {
        Self {
            aabb: Aabb::from_points(positions.iter().copied()),
        }
    }
}

impl GeometryBounds for PointBounds {
    fn local_aabb(&self) -> Aabb {
        self.aabb
    }
}
