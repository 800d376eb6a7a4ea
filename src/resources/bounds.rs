//! Bounding Volumes
//!
//! World-space bounding volumes maintained by the boundary engine:
//!
//! - [`Aabb`]: axis-aligned box stored as `min`/`max` corners. The empty box
//!   is a collapsed sentinel (`min > max` on every axis) so that it acts as
//!   the identity of [`Aabb::union`].
//! - [`Obb`]: oriented box stored as its 8 homogeneous corner vertices.

use glam::{Mat4, Vec3, Vec4};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The collapsed sentinel: `min = +MAX`, `max = -MAX` on every axis.
    ///
    /// This is *not* a zero-sized box at the origin; check with [`Aabb::is_empty`].
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(-f32::MAX),
    };

    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Builds a box from the 6-scalar `[xmin, ymin, zmin, xmax, ymax, zmax]` layout.
    #[must_use]
    pub fn from_array(v: [f32; 6]) -> Self {
        Self {
            min: Vec3::new(v[0], v[1], v[2]),
            max: Vec3::new(v[3], v[4], v[5]),
        }
    }

    /// Smallest box containing all `points`; [`Aabb::EMPTY`] when there are none.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |acc, p| acc.expand_point(p))
    }

    /// Returns `true` for the collapsed sentinel (any axis with `min > max`).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Midpoint of the box. The empty sentinel has its center at the origin.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis (`Vec3::ZERO` for an empty box).
    #[must_use]
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn expand_point(&self, p: Vec3) -> Aabb {
        Aabb {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// The 8 corners, in the same order as [`Obb::corners`].
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }

    /// Axis-aligned box of the transformed corners. Empty stays empty.
    #[must_use]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self::from_points(self.corners().into_iter().map(|c| matrix.transform_point3(c)))
    }

    /// The 6-scalar `[xmin, ymin, zmin, xmax, ymax, zmax]` layout.
    #[must_use]
    pub fn to_array(&self) -> [f32; 6] {
        [self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z]
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Oriented bounding box as 8 homogeneous vertices (`w = 1`).
///
/// Vertex order: the bottom face (`z = min`) counter-clockwise starting at
/// `(min, min)`, then the top face in the same order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    pub corners: [Vec4; 8],
}

impl Obb {
    /// The 8-corner box of an axis-aligned box.
    #[must_use]
    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self {
            corners: aabb.corners().map(|c| c.extend(1.0)),
        }
    }

    /// Transforms every vertex by `matrix`.
    #[must_use]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        Self {
            corners: self.corners.map(|c| *matrix * c),
        }
    }

    /// Axis-aligned box enclosing the vertices.
    #[must_use]
    pub fn to_aabb(&self) -> Aabb {
        Aabb::from_points(self.corners.iter().map(|c| c.truncate()))
    }

    /// The 32-scalar flat layout (8 × xyzw).
    #[must_use]
    pub fn to_array(&self) -> [f32; 32] {
        let mut out = [0.0; 32];
        for (chunk, c) in out.chunks_exact_mut(4).zip(self.corners.iter()) {
            chunk.copy_from_slice(&c.to_array());
        }
        out
    }
}

impl Default for Obb {
    fn default() -> Self {
        Self::from_aabb(&Aabb::EMPTY)
    }
}
